//! In-memory implementation of [`NodeStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and ephemeral use.
//! It stores raw JSON documents in HashMaps with identical semantics to the
//! SQLite backend, including the malformed-document degradation rules.

use std::collections::HashMap;

use serde_json::Value;

use evigraph_core::{EvidenceGraph, MetadataNode};

use crate::doc;
use crate::error::StorageError;
use crate::traits::NodeStore;
use crate::types::{GraphInsert, LinkOutcome};

/// A persisted evidence graph plus the root it was built from.
#[derive(Debug, Clone)]
struct StoredGraph {
    root_id: String,
    graph: EvidenceGraph,
}

/// HashMap-backed implementation of [`NodeStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Catalog records as raw JSON documents, keyed by id.
    nodes: HashMap<String, Value>,
    /// Evidence graphs keyed by graph id.
    graphs: HashMap<String, StoredGraph>,
    /// Root-record id -> graph id, enforcing one graph per root.
    roots: HashMap<String, String>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    /// Inserts a raw document without validating its shape.
    ///
    /// The ingestion boundary hands over documents as-is; anything the
    /// engine cannot deserialize later degrades to absence on read.
    pub fn insert_document(&mut self, id: &str, document: Value) {
        self.nodes.insert(id.to_string(), document);
    }
}

impl NodeStore for InMemoryStore {
    fn get_node(&self, id: &str) -> Result<Option<MetadataNode>, StorageError> {
        Ok(self
            .nodes
            .get(id)
            .and_then(|document| doc::parse_node(id, document.clone())))
    }

    fn get_nodes(&self, ids: &[String]) -> Result<HashMap<String, MetadataNode>, StorageError> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.get_node(id)? {
                found.insert(id.clone(), node);
            }
        }
        Ok(found)
    }

    fn insert_node(&mut self, node: &MetadataNode) -> Result<(), StorageError> {
        let document = serde_json::to_value(node)?;
        self.nodes.insert(node.id.clone(), document);
        Ok(())
    }

    fn insert_graph(
        &mut self,
        root_id: &str,
        graph: &EvidenceGraph,
    ) -> Result<GraphInsert, StorageError> {
        if let Some(existing_id) = self.roots.get(root_id) {
            if let Some(existing) = self.graphs.get(existing_id) {
                return Ok(GraphInsert::Conflict(existing.graph.clone()));
            }
        }
        self.roots.insert(root_id.to_string(), graph.id.clone());
        self.graphs.insert(
            graph.id.clone(),
            StoredGraph {
                root_id: root_id.to_string(),
                graph: graph.clone(),
            },
        );
        Ok(GraphInsert::Inserted)
    }

    fn get_graph(&self, graph_id: &str) -> Result<Option<EvidenceGraph>, StorageError> {
        Ok(self.graphs.get(graph_id).map(|stored| stored.graph.clone()))
    }

    fn graph_root(&self, graph_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .graphs
            .get(graph_id)
            .map(|stored| stored.root_id.clone()))
    }

    fn delete_graph(&mut self, graph_id: &str) -> Result<(), StorageError> {
        if let Some(stored) = self.graphs.remove(graph_id) {
            self.roots.remove(&stored.root_id);
        }
        Ok(())
    }

    fn link_graph(&mut self, node_id: &str, graph_id: &str) -> Result<LinkOutcome, StorageError> {
        let document = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| StorageError::NodeNotFound(node_id.to_string()))?;
        if let Some(existing) = doc::linked_id(document) {
            if existing != graph_id {
                return Ok(LinkOutcome::AlreadyLinked(existing));
            }
        }
        doc::set_link(document, graph_id);
        Ok(LinkOutcome::Linked)
    }

    fn unlink_graph(&mut self, node_id: &str) -> Result<(), StorageError> {
        if let Some(document) = self.nodes.get_mut(node_id) {
            doc::clear_link(document);
        }
        Ok(())
    }

    fn linked_graph_id(&self, node_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.nodes.get(node_id).and_then(doc::linked_id))
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use evigraph_core::NodeRef;

    use super::*;

    fn node(value: serde_json::Value) -> MetadataNode {
        serde_json::from_value(value).unwrap()
    }

    fn graph(id: &str, owner: &str) -> EvidenceGraph {
        EvidenceGraph {
            id: id.to_string(),
            owner: owner.to_string(),
            name: None,
            description: None,
            outputs: vec![NodeRef::new("d1")],
            nodes: IndexMap::new(),
        }
    }

    #[test]
    fn test_get_node_roundtrip() {
        let mut store = InMemoryStore::new();
        store
            .insert_node(&node(json!({ "id": "d1", "types": ["Dataset"] })))
            .unwrap();

        let loaded = store.get_node("d1").unwrap().unwrap();
        assert_eq!(loaded.id, "d1");
        assert!(store.get_node("missing").unwrap().is_none());
    }

    #[test]
    fn test_get_nodes_omits_absent_ids() {
        let mut store = InMemoryStore::new();
        store
            .insert_node(&node(json!({ "id": "d1", "types": ["Dataset"] })))
            .unwrap();
        store
            .insert_node(&node(json!({ "id": "d2", "types": ["Dataset"] })))
            .unwrap();

        let ids = vec!["d1".to_string(), "ghost".to_string(), "d2".to_string()];
        let found = store.get_nodes(&ids).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key("d1"));
        assert!(!found.contains_key("ghost"));
    }

    #[test]
    fn test_malformed_document_degrades_to_absent() {
        let mut store = InMemoryStore::new();
        // No id field at all -- cannot deserialize.
        store.insert_document("broken", json!({ "types": 42 }));

        assert!(store.get_node("broken").unwrap().is_none());
        let found = store.get_nodes(&["broken".to_string()]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_insert_graph_conflict_returns_winner() {
        let mut store = InMemoryStore::new();
        let first = graph("graph-1", "alice");
        let second = graph("graph-2", "bob");

        assert!(matches!(
            store.insert_graph("d1", &first).unwrap(),
            GraphInsert::Inserted
        ));
        match store.insert_graph("d1", &second).unwrap() {
            GraphInsert::Conflict(winner) => assert_eq!(winner.id, "graph-1"),
            other => panic!("expected conflict, got: {:?}", other),
        }
        // The loser was discarded.
        assert!(store.get_graph("graph-2").unwrap().is_none());
    }

    #[test]
    fn test_link_and_find_linked_graph() {
        let mut store = InMemoryStore::new();
        store
            .insert_node(&node(json!({ "id": "d1", "types": ["Dataset"] })))
            .unwrap();
        store.insert_graph("d1", &graph("graph-1", "alice")).unwrap();

        assert_eq!(
            store.link_graph("d1", "graph-1").unwrap(),
            LinkOutcome::Linked
        );
        assert_eq!(
            store.linked_graph_id("d1").unwrap().as_deref(),
            Some("graph-1")
        );
        let found = store.find_linked_graph("d1").unwrap().unwrap();
        assert_eq!(found.id, "graph-1");

        // Re-linking the same graph is idempotent; a different graph is a
        // conflict that leaves the existing link untouched.
        assert_eq!(
            store.link_graph("d1", "graph-1").unwrap(),
            LinkOutcome::Linked
        );
        assert_eq!(
            store.link_graph("d1", "graph-9").unwrap(),
            LinkOutcome::AlreadyLinked("graph-1".to_string())
        );
        assert_eq!(
            store.linked_graph_id("d1").unwrap().as_deref(),
            Some("graph-1")
        );
    }

    #[test]
    fn test_link_missing_node_fails() {
        let mut store = InMemoryStore::new();
        let result = store.link_graph("ghost", "graph-1");
        assert!(matches!(result, Err(StorageError::NodeNotFound(_))));
    }

    #[test]
    fn test_dangling_link_resolves_to_none() {
        let mut store = InMemoryStore::new();
        store
            .insert_node(&node(json!({ "id": "d1", "types": ["Dataset"] })))
            .unwrap();
        store.insert_graph("d1", &graph("graph-1", "alice")).unwrap();
        store.link_graph("d1", "graph-1").unwrap();

        store.delete_graph("graph-1").unwrap();
        assert!(store.find_linked_graph("d1").unwrap().is_none());
    }

    #[test]
    fn test_delete_graph_frees_root_for_rebuild() {
        let mut store = InMemoryStore::new();
        store.insert_graph("d1", &graph("graph-1", "alice")).unwrap();
        assert_eq!(store.graph_root("graph-1").unwrap().as_deref(), Some("d1"));

        store.delete_graph("graph-1").unwrap();
        assert!(store.get_graph("graph-1").unwrap().is_none());
        assert!(matches!(
            store.insert_graph("d1", &graph("graph-3", "alice")).unwrap(),
            GraphInsert::Inserted
        ));
    }

    #[test]
    fn test_unlink_clears_back_reference() {
        let mut store = InMemoryStore::new();
        store
            .insert_node(&node(json!({ "id": "d1", "types": ["Dataset"] })))
            .unwrap();
        store.insert_graph("d1", &graph("graph-1", "alice")).unwrap();
        store.link_graph("d1", "graph-1").unwrap();

        store.unlink_graph("d1").unwrap();
        assert!(store.linked_graph_id("d1").unwrap().is_none());
        // Unlinking an absent record is a no-op.
        store.unlink_graph("ghost").unwrap();
    }
}
