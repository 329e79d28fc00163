//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::catalog::ReadDiagnostic;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok", or "degraded" once a read has failed
    pub status: String,
    pub module: String,
    pub version: String,
    /// Configured backing store
    pub source: String,
    pub uptime_seconds: u64,
    pub read_error_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_error: Option<ReadDiagnostic>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let diagnostics = state.catalog.diagnostics();
    let last_read_error = diagnostics.last();

    Json(HealthResponse {
        status: if last_read_error.is_some() { "degraded" } else { "ok" }.to_string(),
        module: "gallery-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: state.catalog.source().name().to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        read_error_count: diagnostics.count(),
        last_read_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
