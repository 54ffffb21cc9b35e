//! Binary entrypoint for the evidence graph HTTP server.
//!
//! Reads configuration from environment variables:
//! - `EVIGRAPH_DB_PATH`: SQLite database file path (default: "evigraph.db")
//! - `EVIGRAPH_PORT`: Server listen port (default: "4000")
//! - `EVIGRAPH_MAX_NODES`: per-build traversal ceiling (default: 10000)
//! - `EVIGRAPH_MAX_CONCURRENT_BUILDS`: worker parallelism (default: 4)

use evigraph_server::router::build_router;
use evigraph_server::state::{AppState, ServerOptions};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let db_path = std::env::var("EVIGRAPH_DB_PATH")
        .unwrap_or_else(|_| "evigraph.db".to_string());
    let port = std::env::var("EVIGRAPH_PORT")
        .unwrap_or_else(|_| "4000".to_string());

    let mut options = ServerOptions::default();
    if let Some(max_nodes) = env_usize("EVIGRAPH_MAX_NODES") {
        options.build.max_nodes = max_nodes;
    }
    if let Some(max_builds) = env_usize("EVIGRAPH_MAX_CONCURRENT_BUILDS") {
        options.max_concurrent_builds = max_builds;
    }

    let state = AppState::new(&db_path, options)
        .expect("Failed to initialize application state");

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("evigraph server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Reads a positive integer from the environment, ignoring unset or
/// unparsable values.
fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.parse().ok().filter(|v| *v > 0)
}
