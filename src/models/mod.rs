// src/models/mod.rs

//! Domain models for the aggregator application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod observation;
mod posting;
mod report;

// Re-export all public types
pub use config::{
    BoardSelectors, Config, HttpConfig, SchedulerConfig, ServerConfig, SourceConfig, SourceKind,
    StorageConfig,
};
pub use observation::RawObservation;
pub use posting::{CanonicalPosting, CatalogEntry};
pub use report::{CycleReport, ReconcileStats, SourceOutcome, SourceStatus};
