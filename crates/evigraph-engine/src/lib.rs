//! Provenance traversal engine: closure building and graph rendering.
//!
//! Reconstructs the lineage of a research artifact by walking the
//! relationships stored in a metadata catalog. The walk happens in two
//! cache-driven passes over a per-build [`BuildContext`]:
//!
//! 1. **Closure** ([`closure`]): a level-by-level reachability walk from
//!    the seed frontier, batch-fetching records and recording misses, until
//!    every record needed for rendering is cached.
//! 2. **Render** ([`render`]): a recursive, memoized pass over the cache
//!    producing a flat adjacency map of `{id}`-reference nodes, applying
//!    container indirection to activity relations.
//!
//! [`GraphBuilder`] ties the passes together behind a single `build` call.

pub mod closure;
pub mod context;
pub mod error;
pub mod indirection;
pub mod render;

use indexmap::IndexMap;

use evigraph_core::{NodeRef, RenderedNode};
use evigraph_storage::NodeStore;

pub use context::{BuildContext, CacheEntry};
pub use error::BuildError;

/// Tunables for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Ceiling on the number of fetched ids before the build fails closed
    /// with [`BuildError::GraphTooLarge`].
    pub max_nodes: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig { max_nodes: 10_000 }
    }
}

/// The result of one build: the resolved output roots and the rendered
/// adjacency map, ready to be wrapped into a persistable artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltGraph {
    /// The resolved seed references, in seed order.
    pub outputs: Vec<NodeRef>,
    /// Every rendered node, keyed by id.
    pub nodes: IndexMap<String, RenderedNode>,
}

/// Runs the full seed -> closure -> render pipeline against a store.
pub struct GraphBuilder<'a, S: NodeStore> {
    store: &'a S,
    config: BuildConfig,
}

impl<'a, S: NodeStore> GraphBuilder<'a, S> {
    /// A builder with default tunables.
    pub fn new(store: &'a S) -> Self {
        GraphBuilder {
            store,
            config: BuildConfig::default(),
        }
    }

    /// A builder with explicit tunables.
    pub fn with_config(store: &'a S, config: BuildConfig) -> Self {
        GraphBuilder { store, config }
    }

    /// Builds the evidence graph reachable from `root_id`.
    ///
    /// Unresolvable references degrade to stub nodes; only a wholesale
    /// store failure or a closure past the configured ceiling is an error.
    pub fn build(&self, root_id: &str) -> Result<BuiltGraph, BuildError> {
        let mut ctx = BuildContext::new();

        let seeds = closure::resolve_seeds(self.store, &mut ctx, root_id)?;
        closure::build_closure(self.store, &mut ctx, &seeds, self.config.max_nodes)?;
        render::render(&mut ctx, &seeds);

        let outputs = seeds.iter().map(|id| NodeRef::new(id.as_str())).collect();
        let nodes = ctx.into_nodes();
        tracing::info!(root = %root_id, nodes = nodes.len(), "evidence graph rendered");

        Ok(BuiltGraph { outputs, nodes })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use evigraph_core::MetadataNode;
    use evigraph_storage::InMemoryStore;

    use super::*;

    fn store_with(docs: Vec<serde_json::Value>) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for doc in docs {
            let node: MetadataNode = serde_json::from_value(doc).unwrap();
            store.insert_node(&node).unwrap();
        }
        store
    }

    fn lineage_fixture() -> InMemoryStore {
        store_with(vec![
            json!({
                "id": "d1",
                "types": ["Dataset"],
                "name": "Result matrix",
                "generatedBy": { "id": "c1" }
            }),
            json!({
                "id": "c1",
                "types": ["Computation"],
                "usedDataset": [{ "id": "d0" }],
                "usedSoftware": [{ "id": "s1" }],
                "usedInstrument": [{ "id": "i1" }]
            }),
            json!({ "id": "d0", "types": ["Dataset"] }),
            json!({ "id": "s1", "types": ["Software"] }),
            json!({ "id": "i1", "types": ["Instrument"] }),
        ])
    }

    #[test]
    fn builds_full_lineage_from_entity_root() {
        let store = lineage_fixture();
        let built = GraphBuilder::new(&store).build("d1").unwrap();

        assert_eq!(built.outputs, vec![NodeRef::new("d1")]);
        assert_eq!(built.nodes.len(), 5);
        assert_eq!(
            built.nodes["c1"].used_software,
            Some(vec![NodeRef::new("s1")])
        );
    }

    #[test]
    fn independent_builds_are_identical() {
        let store = lineage_fixture();
        let first = GraphBuilder::new(&store).build("d1").unwrap();
        let second = GraphBuilder::new(&store).build("d1").unwrap();

        assert_eq!(first, second);
        // Same serialized form too: node insertion order is reproducible.
        assert_eq!(
            serde_json::to_string(&first.nodes).unwrap(),
            serde_json::to_string(&second.nodes).unwrap()
        );
    }

    #[test]
    fn container_root_outputs_become_graph_outputs() {
        let mut docs = vec![json!({
            "id": "r1",
            "types": ["https://w3id.org/EVI#ROCrate"],
            "outputs": [{ "id": "d1" }]
        })];
        docs.push(json!({
            "id": "d1",
            "types": ["Dataset"],
            "generatedBy": { "id": "c1" }
        }));
        docs.push(json!({ "id": "c1", "types": ["Computation"] }));
        let store = store_with(docs);

        let built = GraphBuilder::new(&store).build("r1").unwrap();
        assert_eq!(built.outputs, vec![NodeRef::new("d1")]);
        assert!(built.nodes.contains_key("c1"));
        assert!(!built.nodes.contains_key("r1"));
    }

    #[test]
    fn ceiling_aborts_oversized_builds() {
        let store = lineage_fixture();
        let config = BuildConfig { max_nodes: 2 };
        let result = GraphBuilder::with_config(&store, config).build("d1");
        assert!(matches!(result, Err(BuildError::GraphTooLarge { .. })));
    }

    #[test]
    fn unknown_root_builds_a_single_stub() {
        let store = InMemoryStore::new();
        let built = GraphBuilder::new(&store).build("ghost").unwrap();

        assert_eq!(built.outputs, vec![NodeRef::new("ghost")]);
        assert_eq!(built.nodes.len(), 1);
        assert!(built.nodes["ghost"].is_stub());
    }
}
