//! Application state with shared `GraphService` for concurrent access.
//!
//! [`AppState`] wraps the service in `Arc<tokio::sync::Mutex<>>` for use
//! with axum handlers and build workers. Uses `tokio::sync::Mutex`
//! (async-aware) instead of `std::sync::Mutex` (blocking) so tasks await
//! the lock without blocking the tokio runtime; `GraphService` contains a
//! `rusqlite::Connection`, which is `!Sync` and cannot sit behind an
//! `RwLock`.
//!
//! Build concurrency is bounded by the [`TaskCoordinator`] semaphore, and
//! each build owns its traversal state outright -- the shared mutex only
//! serializes store access.

use std::sync::Arc;

use evigraph_engine::BuildConfig;

use crate::error::ApiError;
use crate::service::GraphService;
use crate::tasks::TaskCoordinator;

/// Tunables for the server as a whole.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Per-build traversal tunables.
    pub build: BuildConfig,
    /// How many builds may execute simultaneously.
    pub max_concurrent_builds: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            build: BuildConfig::default(),
            max_concurrent_builds: 4,
        }
    }
}

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The shared graph service (async Mutex -- non-blocking await).
    pub service: Arc<tokio::sync::Mutex<GraphService>>,
    /// Build task registry and scheduler.
    pub coordinator: Arc<TaskCoordinator>,
}

impl AppState {
    /// Creates an `AppState` backed by the given SQLite database path.
    pub fn new(db_path: &str, options: ServerOptions) -> Result<Self, ApiError> {
        let service = GraphService::new(db_path, options.build)?;
        Ok(AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
            coordinator: Arc::new(TaskCoordinator::new(options.max_concurrent_builds)),
        })
    }

    /// Creates an `AppState` with an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        AppState::in_memory_with(ServerOptions::default())
    }

    /// Creates an in-memory `AppState` with explicit tunables (for
    /// testing).
    pub fn in_memory_with(options: ServerOptions) -> Result<Self, ApiError> {
        let service = GraphService::in_memory(options.build)?;
        Ok(AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
            coordinator: Arc::new(TaskCoordinator::new(options.max_concurrent_builds)),
        })
    }
}
