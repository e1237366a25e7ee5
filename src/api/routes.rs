//! API route definitions

use axum::routing::get;
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/health", get(handlers::health::status))
        .route("/api/proxies", get(handlers::proxy::list_proxies))
        .route("/api/stats", get(handlers::stats::get_stats))
        .route("/api/tasks", get(handlers::tasks::list_tasks))
        .route("/api/metrics", get(handlers::metrics::metrics))
        .with_state(state)
}
