//! Durable posting catalog.
//!
//! Holds every posting ever observed, keyed by stable id, and persists the
//! whole set as a JSON snapshot replaced atomically (write temp, then
//! rename). Reconciliation is commit-then-swap: the next state is built on a
//! copy, persisted to disk, and only then swapped into memory, so a failed
//! persist leaves both views unchanged.
//!
//! The pipeline never deletes entries; `purge` exists for explicit
//! administrative cleanup only.

mod query;

pub use query::{JobQuery, QueryPage};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPosting, CatalogEntry, ReconcileStats};
use crate::storage;

/// Snapshot file layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: Vec<CatalogEntry>,
}

/// Aggregate catalog counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub new_today: usize,
    pub new_this_week: usize,
    pub sources: Vec<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// The durable catalog of postings.
pub struct Catalog {
    path: PathBuf,
    state: RwLock<HashMap<String, CatalogEntry>>,
}

impl Catalog {
    /// Open a catalog backed by the given snapshot file.
    ///
    /// A missing file is an empty catalog, not an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: HashMap<String, CatalogEntry> = match storage::read_json::<Snapshot>(&path)
            .await?
        {
            Some(snapshot) => snapshot
                .entries
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect(),
            None => HashMap::new(),
        };

        tracing::info!(entries = entries.len(), path = %path.display(), "catalog opened");
        Ok(Self {
            path,
            state: RwLock::new(entries),
        })
    }

    /// Apply one source's completed batch as a single atomic unit.
    ///
    /// The caller asserts that `batch` is the complete result of a
    /// successful poll of `source`; active entries of that source absent
    /// from the batch are deactivated. Entries of every other source are
    /// untouched no matter what the batch contains.
    pub async fn reconcile(
        &self,
        source: &str,
        batch: Vec<CanonicalPosting>,
        observed_at: DateTime<Utc>,
    ) -> Result<ReconcileStats> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let mut stats = ReconcileStats::default();

        let mut batch_ids: HashSet<String> = HashSet::with_capacity(batch.len());
        for posting in batch {
            if posting.source != source {
                return Err(AppError::validation(format!(
                    "batch for '{}' contains posting '{}' from source '{}'",
                    source, posting.id, posting.source
                )));
            }
            batch_ids.insert(posting.id.clone());

            match next.get_mut(&posting.id) {
                Some(entry) => {
                    if !entry.is_active {
                        stats.reactivated += 1;
                    }
                    entry.mark_seen(posting, observed_at);
                    stats.updated += 1;
                }
                None => {
                    next.insert(posting.id.clone(), CatalogEntry::new(posting, observed_at));
                    stats.inserted += 1;
                }
            }
        }

        // Withdrawals: active entries of this source the pass did not observe
        for entry in next.values_mut() {
            if entry.source == source && entry.is_active && !batch_ids.contains(&entry.id) {
                entry.deactivate();
                stats.deactivated += 1;
            }
        }

        persist(&self.path, &next).await?;
        *state = next;
        Ok(stats)
    }

    /// Look up one entry by id.
    pub async fn get(&self, id: &str) -> Option<CatalogEntry> {
        self.state.read().await.get(id).cloned()
    }

    /// Run a filtered, paginated query.
    pub async fn query(&self, query: &JobQuery) -> QueryPage {
        let state = self.state.read().await;
        query::run(&state, query)
    }

    /// Active entries first seen at or after the cutoff, newest first.
    pub async fn new_since(
        &self,
        cutoff: DateTime<Utc>,
        source: Option<&str>,
    ) -> Vec<CatalogEntry> {
        let state = self.state.read().await;
        query::new_since(&state, cutoff, source)
    }

    /// Every entry, optionally including inactive ones, newest first.
    pub async fn all(&self, include_inactive: bool) -> Vec<CatalogEntry> {
        let state = self.state.read().await;
        let mut entries: Vec<CatalogEntry> = state
            .values()
            .filter(|e| include_inactive || e.is_active)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.first_seen.cmp(&a.first_seen).then(a.id.cmp(&b.id)));
        entries
    }

    /// Aggregate counters over the whole catalog.
    pub async fn stats(&self) -> CatalogStats {
        let state = self.state.read().await;
        let now = Utc::now();
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        let week_ago = now - Duration::days(7);

        let mut sources: Vec<String> = state
            .values()
            .map(|e| e.source.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        sources.sort();

        CatalogStats {
            total: state.len(),
            active: state.values().filter(|e| e.is_active).count(),
            // Arrival counts, not live counts: a posting withdrawn the same
            // day it appeared still arrived that day
            new_today: state.values().filter(|e| e.first_seen >= midnight).count(),
            new_this_week: state.values().filter(|e| e.first_seen >= week_ago).count(),
            sources,
            last_refresh: state.values().map(|e| e.last_seen).max(),
        }
    }

    /// Administrative deletion, outside the pipeline.
    ///
    /// Removes entries for one source (or all sources), optionally only
    /// inactive ones. Returns the number of removed entries.
    pub async fn purge(&self, source: Option<&str>, inactive_only: bool) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let before = next.len();

        next.retain(|_, entry| {
            let in_scope = source.is_none_or(|s| entry.source == s);
            let matches = in_scope && (!inactive_only || !entry.is_active);
            !matches
        });

        let removed = before - next.len();
        if removed > 0 {
            persist(&self.path, &next).await?;
            *state = next;
        }
        Ok(removed)
    }
}

/// Persist the snapshot, ids sorted for stable file diffs.
async fn persist(path: &Path, entries: &HashMap<String, CatalogEntry>) -> Result<()> {
    let mut sorted: Vec<CatalogEntry> = entries.values().cloned().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let snapshot = Snapshot {
        updated_at: Some(Utc::now()),
        entries: sorted,
    };
    storage::write_json_atomic(path, &snapshot).await
}
