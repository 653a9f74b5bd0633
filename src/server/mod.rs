// src/server/mod.rs

//! HTTP API over the catalog.
//!
//! Read endpoints serve catalog state; the one write-ish endpoint triggers a
//! polling cycle and waits for its report. No authentication: deploy behind
//! whatever fronting proxy the host already has.

mod routes;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::scheduler::Scheduler;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub scheduler: Arc<Scheduler>,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/jobs", get(routes::list_jobs))
        .route("/api/jobs/new/today", get(routes::new_today))
        .route("/api/jobs/:id", get(routes::get_job))
        .route("/api/stats", get(routes::stats))
        .route("/api/scrape", post(routes::trigger_scrape))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until the shutdown future resolves.
pub async fn serve(
    state: AppState,
    bind_addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "api server listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
