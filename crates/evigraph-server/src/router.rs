//! Router assembly for the evidence graph HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with CORS
//! and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. CORS is permissive (catalog
/// frontends call from various origins). TraceLayer provides request-level
/// logging via tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Build requests
        .route("/graphs", post(handlers::graphs::request_build))
        // Persisted graphs
        .route(
            "/graphs/{graph_id}",
            get(handlers::graphs::get_graph).delete(handlers::graphs::delete_graph),
        )
        // Task polling
        .route("/tasks/{task_id}", get(handlers::tasks::get_task))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
