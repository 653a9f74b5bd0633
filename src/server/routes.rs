// src/server/routes.rs

//! Request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogStats, JobQuery, QueryPage};
use crate::error::AppError;
use crate::models::{CatalogEntry, CycleReport};

use super::AppState;

/// JSON error payload with a matching status code.
#[derive(Debug)]
pub(super) struct ApiError {
    pub(super) status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Body {
            error: String,
        }
        (self.status, Json(Body { error: self.message })).into_response()
    }
}

#[derive(Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    entries: usize,
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.catalog.stats().await;
    Json(HealthResponse {
        status: "ok",
        entries: stats.total,
    })
}

pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> Json<QueryPage> {
    Json(state.catalog.query(&query).await)
}

pub(super) async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    state
        .catalog
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no posting '{id}'")))
}

#[derive(Deserialize, Default)]
pub(super) struct NewTodayParams {
    source: Option<String>,
}

#[derive(Serialize)]
pub(super) struct NewTodayResponse {
    date: NaiveDate,
    count: usize,
    jobs: Vec<CatalogEntry>,
}

pub(super) async fn new_today(
    State(state): State<AppState>,
    Query(params): Query<NewTodayParams>,
) -> Json<NewTodayResponse> {
    let now = Utc::now();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);

    let jobs = state
        .catalog
        .new_since(midnight, params.source.as_deref())
        .await;
    Json(NewTodayResponse {
        date: now.date_naive(),
        count: jobs.len(),
        jobs,
    })
}

pub(super) async fn stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.catalog.stats().await)
}

#[derive(Deserialize, Default)]
pub(super) struct ScrapeParams {
    source: Option<String>,
}

#[derive(Deserialize, Default)]
pub(super) struct ScrapeRequest {
    source: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeResponse {
    attempted: usize,
    succeeded: usize,
    failed: usize,
    #[serde(flatten)]
    report: CycleReport,
}

/// Run one cycle now and return its report.
///
/// Waits for any cycle already in flight before starting. A `source` in the
/// query string or the body polls only that source; the query string wins
/// when both are present.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
    request: Option<Json<ScrapeRequest>>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let scope = params.source.or_else(|| request.and_then(|Json(r)| r.source));

    match state.scheduler.run_cycle(scope.as_deref()).await {
        Ok(report) => Ok(Json(ScrapeResponse {
            attempted: report.attempted(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            report,
        })),
        Err(AppError::Validation(message)) => Err(ApiError::not_found(message)),
        Err(error) => {
            tracing::error!(error = %error, "triggered cycle failed");
            Err(ApiError::internal(error.to_string()))
        }
    }
}
