use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::mail::ProviderStatus;
use crate::state::AppState;

/// Health response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub smtp: ProviderStatus,
}

/// Health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /api/health - Liveness plus the last known SMTP provider status.
///
/// `status` only reflects this process. A provider outage shows up under
/// `smtp` without failing the check.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        service: state.config.service_name.clone(),
        timestamp: Utc::now().to_rfc3339(),
        smtp: state.provider_health.snapshot(),
    })
}
