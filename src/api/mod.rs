pub mod cors;
pub mod email;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new().nest("/api", api_routes()).with_state(state)
}

/// API routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(email::email_routes())
        .merge(health::health_routes())
}

/// The router as served: API routes behind CORS and request tracing.
pub fn create_app(state: AppState) -> Router {
    let cors = cors::cors_layer(&state.config.allowed_origins);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
