// src/scheduler.rs

//! Cycle execution and periodic polling.
//!
//! One cycle polls every enabled source with bounded concurrency and a
//! per-source deadline, canonicalizes each successful batch, and reconciles
//! it into the catalog. Sources are isolated: a failure or timeout in one
//! never blocks the others, and reconciliations already committed stay
//! committed regardless of what later sources do.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{StreamExt, stream};
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;

use crate::canonical::canonicalize;
use crate::catalog::Catalog;
use crate::error::{AppError, Result, ScrapeError};
use crate::models::{CycleReport, RawObservation, SchedulerConfig, SourceOutcome};
use crate::sources::SourceAdapter;

/// Drives polling cycles over a fixed set of source adapters.
pub struct Scheduler {
    catalog: Arc<Catalog>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    config: SchedulerConfig,
    // Held for the whole cycle; manual triggers queue behind it while
    // periodic ticks skip instead
    in_flight: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        catalog: Arc<Catalog>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            catalog,
            adapters,
            config,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one cycle, waiting first for any cycle already in flight.
    ///
    /// `scope` restricts the cycle to a single named source.
    pub async fn run_cycle(&self, scope: Option<&str>) -> Result<CycleReport> {
        let _flight = self.in_flight.lock().await;
        self.execute(scope).await
    }

    /// Poll forever at the configured interval until `shutdown` fires.
    ///
    /// Signal shutdown with `notify_one` so a notification arriving while a
    /// cycle is running is not lost. The in-flight cycle always finishes;
    /// its committed reconciliations are never rolled back.
    pub async fn run_periodic(self: Arc<Self>, shutdown: Arc<Notify>) {
        let period = Duration::from_secs(self.config.interval_minutes * 60);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        if self.config.run_on_start {
            self.tick().await;
        }

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = shutdown.notified() => {
                    tracing::info!("scheduler stopping");
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        match self.in_flight.try_lock() {
            Ok(_guard) => {
                if let Err(error) = self.execute(None).await {
                    tracing::error!(error = %error, "scheduled cycle failed");
                }
            }
            Err(_) => {
                tracing::warn!("previous cycle still running, skipping this tick");
            }
        }
    }

    async fn execute(&self, scope: Option<&str>) -> Result<CycleReport> {
        let started_at = Utc::now();
        let adapters: Vec<Arc<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|a| scope.is_none_or(|s| a.name() == s))
            .cloned()
            .collect();
        if adapters.is_empty() {
            if let Some(name) = scope {
                return Err(AppError::validation(format!("unknown source '{name}'")));
            }
        }

        tracing::info!(sources = adapters.len(), "cycle started");
        let deadline = Duration::from_secs(self.config.source_timeout_secs);

        let polls: Vec<_> = adapters
            .into_iter()
            .map(|adapter| poll_one(adapter, deadline))
            .collect();
        let mut polls = stream::iter(polls).buffer_unordered(self.config.max_concurrent);

        let mut outcomes = Vec::new();
        while let Some((adapter, result)) = polls.next().await {
            let source = adapter.name();
            match result {
                Ok(observations) => outcomes.push(self.commit(source, observations).await),
                Err(error) => {
                    tracing::warn!(source, kind = error.kind(), error = %error, "source poll failed");
                    outcomes.push(SourceOutcome::failed(source, error.kind(), error.to_string()));
                }
            }
        }

        // buffer_unordered emits in completion order
        outcomes.sort_by(|a, b| a.source.cmp(&b.source));

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            sources: outcomes,
        };
        let totals = report.totals();
        tracing::info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            inserted = totals.inserted,
            updated = totals.updated,
            deactivated = totals.deactivated,
            "cycle finished"
        );
        Ok(report)
    }

    /// Canonicalize one source's observations and reconcile the batch.
    async fn commit(&self, source: &str, observations: Vec<RawObservation>) -> SourceOutcome {
        let fetched = observations.len();
        let mut dropped = 0usize;
        let mut seen: HashSet<String> = HashSet::new();
        let mut batch = Vec::with_capacity(fetched);

        for observation in observations {
            match canonicalize(observation) {
                // Keep-first when a source repeats an id within one pass
                Ok(posting) => {
                    if seen.insert(posting.id.clone()) {
                        batch.push(posting);
                    }
                }
                Err(record) => {
                    dropped += 1;
                    tracing::warn!(source, error = %record, "dropped observation");
                }
            }
        }

        match self.catalog.reconcile(source, batch, Utc::now()).await {
            Ok(stats) => {
                tracing::info!(
                    source,
                    fetched,
                    dropped,
                    inserted = stats.inserted,
                    updated = stats.updated,
                    reactivated = stats.reactivated,
                    deactivated = stats.deactivated,
                    "source reconciled"
                );
                SourceOutcome::succeeded(source, fetched, dropped, stats)
            }
            Err(error) => {
                tracing::error!(source, error = %error, "reconcile failed, batch discarded");
                SourceOutcome::failed(source, "reconcile", error.to_string())
            }
        }
    }
}

/// Poll one adapter under the cycle deadline.
async fn poll_one(
    adapter: Arc<dyn SourceAdapter>,
    deadline: Duration,
) -> (
    Arc<dyn SourceAdapter>,
    std::result::Result<Vec<RawObservation>, ScrapeError>,
) {
    let result = match tokio::time::timeout(deadline, adapter.scrape()).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Timeout(deadline)),
    };
    (adapter, result)
}
