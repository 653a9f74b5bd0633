//! Raw adapter output.

use chrono::{DateTime, Utc};

/// A single job listing as observed by one adapter call.
///
/// Transient: owned by the polling pass that produced it and discarded after
/// canonicalization. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    /// Name of the source that produced this observation
    pub source: String,

    /// Source-native stable job reference, when the source exposes one
    pub reference: Option<String>,

    /// Raw listing title
    pub title: String,

    /// Raw listing URL
    pub url: String,

    /// Raw team/department string
    pub team: Option<String>,

    /// Raw location string
    pub location: Option<String>,

    /// Raw description, when the source provides one inline
    pub description: Option<String>,

    /// Posting timestamp, when the source provides one
    pub posted_at: Option<DateTime<Utc>>,
}

impl RawObservation {
    /// Create an observation carrying only the required fields.
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            reference: None,
            title: title.into(),
            url: url.into(),
            team: None,
            location: None,
            description: None,
            posted_at: None,
        }
    }
}
