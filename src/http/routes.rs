use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording page
        .route("/", get(handlers::index))
        // Session queries
        .route("/api/prompts", get(handlers::get_prompts))
        .route("/api/session", get(handlers::session_status))
        // Session mutations
        .route("/api/upload", post(handlers::upload_take))
        .route("/api/finalize", post(handlers::finalize))
        .layer(DefaultBodyLimit::max(body_limit))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
