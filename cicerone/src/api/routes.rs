//! API routes for the cicerone server

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::ServiceError;
use crate::service::ManifestService;

/// Application state
pub struct AppState {
    pub service: Arc<ManifestService>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub healthy: bool,
    pub response_time_ms: u64,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const LANDING_PAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>cicerone IIIF Manifest Service</title></head>
<body>
<h1>cicerone IIIF Manifest Service</h1>
<p>Use the following URL to retrieve a manifest:</p>
<pre>/manifest/{item_type}/{item_id}</pre>
</body>
</html>";

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/manifest/:item_type/:item_id", get(manifest))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Landing page with usage instructions
pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Manifest endpoint
///
/// Resolves (or re-serves) the IIIF manifest for one item. Error responses
/// follow the service error mapping: unknown subjects are 404, endpoint
/// failures are 502.
pub async fn manifest(
    State(state): State<Arc<AppState>>,
    Path((item_type, item_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let manifest = state.service.manifest(&item_type, &item_id).await?;
    Ok(Json(manifest))
}

/// Health check endpoint, probing the SPARQL endpoint on every call
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let probe = state.service.probe().await;
    Json(HealthResponse {
        status: if probe.healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        healthy: probe.healthy,
        response_time_ms: probe.response_time_ms,
        checked_at: probe.timestamp,
        error: probe.error,
    })
}
