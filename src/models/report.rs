//! Structured per-cycle reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts produced by reconciling one source's completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Entries created for postings never seen before
    pub inserted: usize,

    /// Existing entries matched by this batch (includes reactivations)
    pub updated: usize,

    /// Subset of `updated` that was inactive before this batch
    pub reactivated: usize,

    /// Previously active entries of this source absent from the batch
    pub deactivated: usize,
}

impl ReconcileStats {
    /// Sum two stat sets field by field.
    pub fn merge(&self, other: &ReconcileStats) -> ReconcileStats {
        ReconcileStats {
            inserted: self.inserted + other.inserted,
            updated: self.updated + other.updated,
            reactivated: self.reactivated + other.reactivated,
            deactivated: self.deactivated + other.deactivated,
        }
    }
}

/// How one source fared within a cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Poll and reconciliation both completed
    Succeeded {
        /// Observations returned by the adapter
        fetched: usize,
        /// Observations dropped for lacking a stable identity
        dropped: usize,
        #[serde(flatten)]
        stats: ReconcileStats,
    },

    /// Poll or reconciliation failed; the source's catalog state is untouched
    Failed { kind: String, message: String },
}

/// Outcome of one source within a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceOutcome {
    pub fn succeeded(
        source: impl Into<String>,
        fetched: usize,
        dropped: usize,
        stats: ReconcileStats,
    ) -> Self {
        Self {
            source: source.into(),
            status: SourceStatus::Succeeded {
                fetched,
                dropped,
                stats,
            },
        }
    }

    pub fn failed(
        source: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            status: SourceStatus::Failed {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }

    /// Whether the source completed its poll and reconciliation.
    pub fn is_success(&self) -> bool {
        matches!(self.status, SourceStatus::Succeeded { .. })
    }
}

/// Structured result of one polling cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceOutcome>,
}

impl CycleReport {
    /// Number of sources the cycle attempted.
    pub fn attempted(&self) -> usize {
        self.sources.len()
    }

    /// Number of sources that polled and reconciled successfully.
    pub fn succeeded(&self) -> usize {
        self.sources.iter().filter(|s| s.is_success()).count()
    }

    /// Number of sources excluded from the cycle.
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Catalog changes summed over all successful sources.
    pub fn totals(&self) -> ReconcileStats {
        self.sources
            .iter()
            .filter_map(|s| match &s.status {
                SourceStatus::Succeeded { stats, .. } => Some(stats),
                SourceStatus::Failed { .. } => None,
            })
            .fold(ReconcileStats::default(), |acc, s| acc.merge(s))
    }
}
