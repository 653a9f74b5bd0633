//! Canonical posting and catalog entry data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized job posting with a stable identity.
///
/// Produced by canonicalization, consumed exactly once by reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPosting {
    /// Stable composite key, `<source>:<slug>`
    pub id: String,

    /// Source name
    pub source: String,

    /// Listing title
    pub title: String,

    /// Team/department, if known
    pub team: Option<String>,

    /// Location, if known
    pub location: Option<String>,

    /// Canonical listing URL
    pub url: String,

    /// Description, if known
    pub description: Option<String>,

    /// Posting timestamp, if known
    pub posted_at: Option<DateTime<Utc>>,
}

/// A durable catalog record for one posting.
///
/// Entries are never deleted by the pipeline; withdrawal is expressed by
/// `is_active = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    /// Stable composite key, immutable for the lifetime of the entry
    pub id: String,

    /// Source name
    pub source: String,

    /// Listing title
    pub title: String,

    /// Team/department, if known
    #[serde(default)]
    pub team: Option<String>,

    /// Location, if known
    #[serde(default)]
    pub location: Option<String>,

    /// Canonical listing URL
    pub url: String,

    /// Description, if known
    #[serde(default)]
    pub description: Option<String>,

    /// Posting timestamp, if known
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,

    /// When the posting was first observed; set once, never changed
    pub first_seen: DateTime<Utc>,

    /// When the posting was last observed; monotonically non-decreasing
    pub last_seen: DateTime<Utc>,

    /// Whether the source's most recently completed pass observed it
    pub is_active: bool,

    /// Number of passes that observed this posting
    pub times_seen: u64,
}

impl CatalogEntry {
    /// Create an entry for a posting observed for the first time.
    pub fn new(posting: CanonicalPosting, observed_at: DateTime<Utc>) -> Self {
        Self {
            id: posting.id,
            source: posting.source,
            title: posting.title,
            team: posting.team,
            location: posting.location,
            url: posting.url,
            description: posting.description,
            posted_at: posting.posted_at,
            first_seen: observed_at,
            last_seen: observed_at,
            is_active: true,
            times_seen: 1,
        }
    }

    /// Fold a re-observation of the same posting into the entry.
    ///
    /// Advances `last_seen`, bumps `times_seen`, reactivates, and backfills
    /// optional fields that are still unset. Previously-set values are never
    /// overwritten; content history is out of scope.
    pub fn mark_seen(&mut self, posting: CanonicalPosting, observed_at: DateTime<Utc>) {
        self.last_seen = self.last_seen.max(observed_at);
        self.times_seen += 1;
        self.is_active = true;

        if self.team.is_none() {
            self.team = posting.team;
        }
        if self.location.is_none() {
            self.location = posting.location;
        }
        if self.description.is_none() {
            self.description = posting.description;
        }
        if self.posted_at.is_none() {
            self.posted_at = posting.posted_at;
        }
    }

    /// Mark the entry as no longer observed by its source.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_posting() -> CanonicalPosting {
        CanonicalPosting {
            id: "acme:12345".to_string(),
            source: "acme".to_string(),
            title: "Software Engineer Intern".to_string(),
            team: None,
            location: Some("Toronto, ON".to_string()),
            url: "https://careers.acme.com/jobs/12345".to_string(),
            description: None,
            posted_at: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_entry_fields() {
        let entry = CatalogEntry::new(sample_posting(), at(0));
        assert_eq!(entry.id, "acme:12345");
        assert_eq!(entry.first_seen, at(0));
        assert_eq!(entry.last_seen, at(0));
        assert!(entry.is_active);
        assert_eq!(entry.times_seen, 1);
    }

    #[test]
    fn test_mark_seen_advances_without_touching_first_seen() {
        let mut entry = CatalogEntry::new(sample_posting(), at(0));
        entry.mark_seen(sample_posting(), at(60));

        assert_eq!(entry.first_seen, at(0));
        assert_eq!(entry.last_seen, at(60));
        assert_eq!(entry.times_seen, 2);
        assert!(entry.is_active);
    }

    #[test]
    fn test_mark_seen_backfills_only_unset_fields() {
        let mut entry = CatalogEntry::new(sample_posting(), at(0));

        let mut update = sample_posting();
        update.team = Some("Infrastructure".to_string());
        update.location = Some("Remote".to_string());
        update.posted_at = Some(at(-3600));
        entry.mark_seen(update, at(60));

        assert_eq!(entry.team.as_deref(), Some("Infrastructure"));
        assert_eq!(entry.posted_at, Some(at(-3600)));
        // Already-set values survive
        assert_eq!(entry.location.as_deref(), Some("Toronto, ON"));
    }

    #[test]
    fn test_mark_seen_keeps_last_seen_monotonic() {
        let mut entry = CatalogEntry::new(sample_posting(), at(100));
        entry.mark_seen(sample_posting(), at(40));
        assert_eq!(entry.last_seen, at(100));
    }

    #[test]
    fn test_reactivation_preserves_first_seen() {
        let mut entry = CatalogEntry::new(sample_posting(), at(0));
        entry.deactivate();
        assert!(!entry.is_active);

        entry.mark_seen(sample_posting(), at(120));
        assert!(entry.is_active);
        assert_eq!(entry.first_seen, at(0));
    }

    #[test]
    fn test_deserializes_snapshot_without_optional_fields() {
        // Snapshots written before a field existed must still load
        let json = r#"{
            "id": "acme:1",
            "source": "acme",
            "title": "Intern",
            "url": "https://careers.acme.com/jobs/1",
            "first_seen": "2026-01-01T00:00:00Z",
            "last_seen": "2026-01-02T00:00:00Z",
            "is_active": true,
            "times_seen": 2
        }"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.team, None);
        assert_eq!(entry.posted_at, None);
        assert_eq!(entry.times_seen, 2);
    }
}
