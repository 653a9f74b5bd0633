//! Read-side filtering over catalog entries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::title_matches_any;
use crate::models::CatalogEntry;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

/// Filter and pagination parameters for listing postings.
///
/// Doubles as the query-string shape of the listing endpoint, so every
/// field is optional and `keywords` is a comma-separated list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    pub source: Option<String>,
    pub active_only: Option<bool>,
    pub keywords: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One page of query results.
#[derive(Debug, Serialize)]
pub struct QueryPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub jobs: Vec<CatalogEntry>,
}

pub(crate) fn run(entries: &HashMap<String, CatalogEntry>, query: &JobQuery) -> QueryPage {
    let active_only = query.active_only.unwrap_or(true);
    let keywords: Vec<String> = query
        .keywords
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    let mut matched: Vec<&CatalogEntry> = entries
        .values()
        .filter(|e| !active_only || e.is_active)
        .filter(|e| query.source.as_deref().is_none_or(|s| e.source == s))
        .filter(|e| keywords.is_empty() || title_matches_any(&e.title, &keywords))
        .collect();
    sort_newest_first(&mut matched);

    let total = matched.len();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let jobs = matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    QueryPage {
        total,
        limit,
        offset,
        jobs,
    }
}

pub(crate) fn new_since(
    entries: &HashMap<String, CatalogEntry>,
    cutoff: DateTime<Utc>,
    source: Option<&str>,
) -> Vec<CatalogEntry> {
    let mut matched: Vec<&CatalogEntry> = entries
        .values()
        .filter(|e| e.is_active && e.first_seen >= cutoff)
        .filter(|e| source.is_none_or(|s| e.source == s))
        .collect();
    sort_newest_first(&mut matched);
    matched.into_iter().cloned().collect()
}

// Ties broken by id so pagination is stable across identical timestamps
fn sort_newest_first(entries: &mut [&CatalogEntry]) {
    entries.sort_by(|a, b| b.first_seen.cmp(&a.first_seen).then(a.id.cmp(&b.id)));
}
