//! GraphService: the single coordinator between HTTP handlers, the build
//! workers, and the traversal/storage crates.
//!
//! All graph business logic flows through [`GraphService`]: the
//! idempotency check against an existing back-link, the build pipeline,
//! first-writer-wins conflict resolution at persistence, back-link writing
//! with degraded-success reporting, and owner-checked deletion.

use uuid::Uuid;

use evigraph_core::{EvidenceGraph, MetadataNode};
use evigraph_engine::{BuildConfig, GraphBuilder};
use evigraph_storage::{GraphInsert, LinkOutcome, NodeStore, SqliteStore};

use crate::error::ApiError;

/// The result of a satisfied build request.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The evidence graph to hand back to the requester.
    pub graph: EvidenceGraph,
    /// `true` when an already-persisted graph was returned instead of a
    /// freshly built one (cache hit or lost insert race).
    pub reused: bool,
    /// Set when the artifact was persisted but is degraded: the root's
    /// back-link could not be written, so the graph is retrievable by id
    /// but not yet cached for future root-level hits.
    pub warning: Option<String>,
}

/// Coordinates evidence graph builds against the catalog store.
///
/// Holds the storage backend and the build tunables. Shared across
/// handlers and build workers behind `Arc<tokio::sync::Mutex<_>>`.
pub struct GraphService {
    store: SqliteStore,
    build_config: BuildConfig,
}

impl GraphService {
    /// Creates a service backed by a SQLite database at `db_path`.
    pub fn new(db_path: &str, build_config: BuildConfig) -> Result<Self, ApiError> {
        let store = SqliteStore::new(db_path)
            .map_err(|e| ApiError::InternalError(format!("failed to open store: {}", e)))?;
        Ok(GraphService {
            store,
            build_config,
        })
    }

    /// Creates a service backed by an in-memory database (for testing).
    pub fn in_memory(build_config: BuildConfig) -> Result<Self, ApiError> {
        let store = SqliteStore::in_memory()
            .map_err(|e| ApiError::InternalError(format!("failed to open store: {}", e)))?;
        Ok(GraphService {
            store,
            build_config,
        })
    }

    /// Inserts a catalog record. Catalog authoring proper lives upstream;
    /// this is the seeding boundary for tests and ingestion.
    pub fn insert_node(&mut self, node: &MetadataNode) -> Result<(), ApiError> {
        Ok(self.store.insert_node(node)?)
    }

    /// The graph already linked from a root record, if any.
    pub fn find_linked_graph(&self, root_id: &str) -> Result<Option<EvidenceGraph>, ApiError> {
        Ok(self.store.find_linked_graph(root_id)?)
    }

    /// Returns the evidence graph for a root record, building it if none
    /// is linked yet.
    ///
    /// Exactly one graph survives per root: a concurrent builder that
    /// loses the persistence race discards its local result and returns
    /// the winner. A persisted graph whose back-link cannot be written is
    /// reported as a degraded success, not an error.
    pub fn get_or_build(&mut self, root_id: &str, owner: &str) -> Result<BuildOutcome, ApiError> {
        if let Some(existing) = self.store.find_linked_graph(root_id)? {
            tracing::info!(root = %root_id, graph = %existing.id, "returning linked evidence graph");
            return Ok(BuildOutcome {
                graph: existing,
                reused: true,
                warning: None,
            });
        }

        let builder = GraphBuilder::with_config(&self.store, self.build_config.clone());
        let built = builder.build(root_id)?;

        let graph = EvidenceGraph {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            name: Some(format!("Evidence graph for {}", root_id)),
            description: Some(format!(
                "Provenance lineage reconstructed from {}",
                root_id
            )),
            outputs: built.outputs,
            nodes: built.nodes,
        };

        match self.store.insert_graph(root_id, &graph)? {
            GraphInsert::Inserted => {}
            GraphInsert::Conflict(winner) => {
                tracing::info!(
                    root = %root_id,
                    graph = %winner.id,
                    "concurrent build already persisted a graph; returning the winner"
                );
                // Repair the root's back-link if the winner never managed
                // to write it.
                if let Err(err) = self.store.link_graph(root_id, &winner.id) {
                    tracing::warn!(root = %root_id, error = %err, "back-link repair failed");
                }
                return Ok(BuildOutcome {
                    graph: winner,
                    reused: true,
                    warning: None,
                });
            }
        }

        let warning = match self.store.link_graph(root_id, &graph.id) {
            Ok(LinkOutcome::Linked) => None,
            Ok(LinkOutcome::AlreadyLinked(other)) => Some(format!(
                "root {} already references graph {}; new graph remains retrievable by id",
                root_id, other
            )),
            Err(err) => Some(format!(
                "graph persisted but back-link to {} failed: {}",
                root_id, err
            )),
        };
        if let Some(message) = &warning {
            tracing::warn!(root = %root_id, graph = %graph.id, "{}", message);
        }

        Ok(BuildOutcome {
            graph,
            reused: false,
            warning,
        })
    }

    /// Retrieves a persisted evidence graph by id.
    pub fn get_graph(&self, graph_id: &str) -> Result<EvidenceGraph, ApiError> {
        self.store
            .get_graph(graph_id)?
            .ok_or_else(|| ApiError::NotFound(format!("evidence graph {}", graph_id)))
    }

    /// Deletes an evidence graph and clears its root's back-reference.
    ///
    /// Only the owner may delete. The root becomes buildable again
    /// afterwards.
    pub fn delete_graph(&mut self, graph_id: &str, requester: &str) -> Result<(), ApiError> {
        let graph = self.get_graph(graph_id)?;
        if graph.owner != requester {
            return Err(ApiError::Unauthorized(format!(
                "only the owner may delete evidence graph {}",
                graph_id
            )));
        }

        let root = self.store.graph_root(graph_id)?;
        self.store.delete_graph(graph_id)?;
        if let Some(root_id) = root {
            // A failed unlink leaves a dangling reference, which lookups
            // already treat as absent.
            if let Err(err) = self.store.unlink_graph(&root_id) {
                tracing::warn!(root = %root_id, error = %err, "failed to clear back-link");
            }
        }
        tracing::info!(graph = %graph_id, "evidence graph deleted");
        Ok(())
    }
}
