// src/canonical.rs

//! Canonicalization and stable identity assignment.
//!
//! Every posting id has the form `<source>:<slug>`. The slug prefers the
//! source's own stable reference and falls back to a normalized form of the
//! listing URL. Process-local hashes are never used as ids: they are not
//! stable across runs, and an unstable id splits one real posting into
//! duplicate entries and false deactivations.

use url::Url;

use crate::models::{CanonicalPosting, RawObservation};

/// An observation carrying no usable stable identity.
///
/// Such records are dropped and counted by the caller; they are never
/// inserted under a synthetic id.
#[derive(Debug, thiserror::Error)]
#[error("unidentifiable record from {source_name}: no stable reference or usable url for '{title}'")]
pub struct UnidentifiableRecord {
    pub source_name: String,
    pub title: String,
}

/// Convert a raw observation into a canonical posting.
///
/// Identity priority: the adapter-reported reference, then a reference
/// recognized inside the listing URL, then the normalized URL itself.
pub fn canonicalize(obs: RawObservation) -> Result<CanonicalPosting, UnidentifiableRecord> {
    let slug = obs
        .reference
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            reference_from_url(&obs.url)
                .map(|r| slugify(&r))
                .filter(|s| !s.is_empty())
        })
        .or_else(|| url_slug(&obs.url));

    let Some(slug) = slug else {
        return Err(UnidentifiableRecord {
            source_name: obs.source,
            title: obs.title,
        });
    };

    Ok(CanonicalPosting {
        id: format!("{}:{}", obs.source, slug),
        source: obs.source,
        title: collapse_whitespace(&obs.title),
        team: clean_optional(obs.team),
        location: clean_optional(obs.location),
        url: obs.url.trim().to_string(),
        description: obs.description.filter(|d| !d.trim().is_empty()),
        posted_at: obs.posted_at,
    })
}

/// Normalize raw text into a slug.
///
/// Lower-cases, collapses every run of non-alphanumeric characters into a
/// single `-`, and trims separators at both ends.
///
/// # Examples
/// ```
/// use jobwatch::canonical::slugify;
///
/// assert_eq!(slugify("Software Engineer, Intern (Summer)"), "software-engineer-intern-summer");
/// ```
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Extract a stable job reference from a URL (looks for common patterns).
pub fn reference_from_url(url: &str) -> Option<String> {
    // Common patterns: ?gh_jid=123, /jobs/123, Lever posting UUIDs, R-0000143096
    let patterns = [
        regex::Regex::new(r"[?&](?:gh_jid|jobid|job_id|req_id|reqid)=([A-Za-z0-9_-]+)").ok()?,
        regex::Regex::new(r"/(?:jobs?|positions?|openings?|postings?)/(\d+)(?:[/?#]|$)").ok()?,
        regex::Regex::new(
            r"([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})",
        )
        .ok()?,
        // Underscore precedes the requisition in Workday-style URLs, so \b
        // alone would miss it
        regex::Regex::new(r"(?:^|[^A-Za-z])(R-\d{6,})\b").ok()?,
    ];

    for pattern in &patterns {
        if let Some(caps) = pattern.captures(url) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

/// Normalize a URL for identity purposes: lowercase host plus path, query
/// and fragment stripped, trailing slash trimmed.
pub fn normalize_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let path = parsed.path().trim_end_matches('/');
    Some(format!("{host}{path}"))
}

fn url_slug(raw: &str) -> Option<String> {
    let slug = slugify(&normalize_url(raw)?);
    (!slug.is_empty()).then_some(slug)
}

/// Whole-word, case-insensitive keyword test against a title.
///
/// "intern" matches "SWE Intern (Summer)" but not "International Sales".
pub fn title_contains_word(title: &str, keyword: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return false;
    }
    let title = title.to_lowercase();

    let mut start = 0;
    while let Some(pos) = title[start..].find(&keyword) {
        let begin = start + pos;
        let end = begin + keyword.len();

        let boundary_before = title[..begin]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let boundary_after = title[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if boundary_before && boundary_after {
            return true;
        }
        start = end;
    }
    false
}

/// Whether any of the keywords whole-word-matches the title.
pub fn title_matches_any(title: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| title_contains_word(title, k))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}
