// src/lib.rs

//! jobwatch: job-listing aggregation pipeline and catalog.
//!
//! Polls external job sources, assigns every listing a stable identity, and
//! reconciles the results into a durable catalog that records when each
//! posting appeared, when it was last observed, and whether its source still
//! lists it.

pub mod canonical;
pub mod catalog;
pub mod error;
pub mod export;
pub mod models;
pub mod scheduler;
pub mod server;
pub mod sources;

mod storage;
