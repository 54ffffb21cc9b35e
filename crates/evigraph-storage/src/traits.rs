//! The [`NodeStore`] trait defining the metadata catalog contract.
//!
//! Two-layer API design:
//! - **Low-level operations** form the trait foundation: point get, batched
//!   multi-get, graph insert/get/delete, and back-link write/clear/read.
//! - **High-level convenience** (`find_linked_graph`) composes the
//!   low-level operations for the cache-hit lookup.
//!
//! All backends (InMemoryStore, SqliteStore) implement this trait, ensuring
//! they are fully swappable without changing engine logic. The trait is
//! synchronous; the server serializes access behind an async mutex.
//!
//! Read semantics: an id that is absent -- or whose stored document cannot
//! be deserialized -- is reported by omission (`None`, or missing from the
//! batched result map), never as an error. Errors mean the store itself
//! failed.

use std::collections::HashMap;

use evigraph_core::{EvidenceGraph, MetadataNode};

use crate::error::StorageError;
use crate::types::{GraphInsert, LinkOutcome};

/// The metadata catalog contract consumed by the traversal engine and the
/// graph service.
pub trait NodeStore {
    // -------------------------------------------------------------------
    // Catalog record reads
    // -------------------------------------------------------------------

    /// Point lookup of one catalog record.
    ///
    /// Returns `None` for absent ids and for documents that fail to
    /// deserialize (the latter is warn-logged by backends).
    fn get_node(&self, id: &str) -> Result<Option<MetadataNode>, StorageError>;

    /// Batched lookup of many catalog records in one call.
    ///
    /// Ids absent from the result map were not found (or unreadable).
    fn get_nodes(&self, ids: &[String]) -> Result<HashMap<String, MetadataNode>, StorageError>;

    /// Inserts (or replaces) a catalog record.
    ///
    /// Catalog authoring is an upstream concern; this exists so tests and
    /// ingestion boundaries can seed a store.
    fn insert_node(&mut self, node: &MetadataNode) -> Result<(), StorageError>;

    // -------------------------------------------------------------------
    // Evidence graph persistence
    // -------------------------------------------------------------------

    /// Persists an evidence graph for the given root record.
    ///
    /// At most one graph exists per root: when one is already present the
    /// insert is discarded and [`GraphInsert::Conflict`] carries the
    /// winning artifact.
    fn insert_graph(
        &mut self,
        root_id: &str,
        graph: &EvidenceGraph,
    ) -> Result<GraphInsert, StorageError>;

    /// Retrieves a persisted evidence graph by its own id.
    fn get_graph(&self, graph_id: &str) -> Result<Option<EvidenceGraph>, StorageError>;

    /// The root record id a graph was built from, if the graph exists.
    fn graph_root(&self, graph_id: &str) -> Result<Option<String>, StorageError>;

    /// Deletes a persisted evidence graph. Deleting an absent graph is a
    /// no-op.
    fn delete_graph(&mut self, graph_id: &str) -> Result<(), StorageError>;

    // -------------------------------------------------------------------
    // Back-links (root record -> graph)
    // -------------------------------------------------------------------

    /// Writes the back-reference from a root record to its graph.
    ///
    /// Idempotent when the record already points at `graph_id`; reports
    /// [`LinkOutcome::AlreadyLinked`] (leaving the link untouched) when it
    /// points elsewhere. Fails with [`StorageError::NodeNotFound`] when the
    /// record does not exist.
    fn link_graph(&mut self, node_id: &str, graph_id: &str) -> Result<LinkOutcome, StorageError>;

    /// Clears a record's back-reference. A record without one -- or an
    /// absent record -- is a no-op.
    fn unlink_graph(&mut self, node_id: &str) -> Result<(), StorageError>;

    /// The graph id a record's back-reference points at, if any.
    fn linked_graph_id(&self, node_id: &str) -> Result<Option<String>, StorageError>;

    // -------------------------------------------------------------------
    // High-level convenience
    // -------------------------------------------------------------------

    /// Follows a record's back-reference to the persisted graph.
    ///
    /// A dangling back-reference (graph deleted underneath it) resolves to
    /// `None` so callers fall through to a rebuild.
    fn find_linked_graph(&self, node_id: &str) -> Result<Option<EvidenceGraph>, StorageError> {
        match self.linked_graph_id(node_id)? {
            Some(graph_id) => self.get_graph(&graph_id),
            None => Ok(None),
        }
    }
}
