//! Build error types for evigraph-engine.
//!
//! Individual unresolvable references never surface here -- they degrade to
//! stub nodes during rendering. [`BuildError`] covers only whole-build
//! faults: a store that cannot be reached at all, or a closure that blows
//! past the configured ceiling.

use thiserror::Error;

use evigraph_storage::StorageError;

/// Errors that abort an entire evidence graph build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The metadata store failed wholesale (connectivity, corruption).
    #[error("metadata store unavailable: {0}")]
    Store(#[from] StorageError),

    /// The reachable record set exceeded the configured ceiling.
    ///
    /// Fails closed: no artifact is produced for a graph this large.
    #[error("evidence graph exceeds the configured ceiling of {limit} nodes")]
    GraphTooLarge { limit: usize },
}
