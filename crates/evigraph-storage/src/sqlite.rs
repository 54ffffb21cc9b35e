//! SQLite implementation of [`NodeStore`].
//!
//! [`SqliteStore`] persists catalog documents and evidence graphs as JSON
//! TEXT columns in a SQLite database with WAL mode and automatic schema
//! migrations. The UNIQUE constraint on `graphs.root_id` is what arbitrates
//! concurrent builds: the first writer's insert succeeds, later writers get
//! the winning row back as a conflict.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use evigraph_core::{EvidenceGraph, MetadataNode};

use crate::doc;
use crate::error::StorageError;
use crate::traits::NodeStore;
use crate::types::{GraphInsert, LinkOutcome};

/// SQLite-backed implementation of [`NodeStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    /// Inserts a raw document without validating its shape.
    ///
    /// The ingestion boundary hands over documents as-is; anything the
    /// engine cannot deserialize later degrades to absence on read.
    pub fn insert_document(&mut self, id: &str, document: &Value) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO nodes (id, doc) VALUES (?1, ?2)",
            params![id, document.to_string()],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Reads a record's raw document, if the row exists.
    fn read_doc(&self, id: &str) -> Result<Option<Value>, StorageError> {
        let text: Option<String> = self
            .conn
            .query_row("SELECT doc FROM nodes WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        match text {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    tracing::warn!(%id, error = %err, "stored document is not valid JSON");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Writes a record's raw document back.
    fn write_doc(&mut self, id: &str, document: &Value) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE nodes SET doc = ?2 WHERE id = ?1",
            params![id, document.to_string()],
        )?;
        Ok(())
    }

    /// Loads the graph persisted for a root record, if any.
    fn graph_for_root(&self, root_id: &str) -> Result<Option<EvidenceGraph>, StorageError> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM graphs WHERE root_id = ?1",
                params![root_id],
                |row| row.get(0),
            )
            .optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }
}

impl NodeStore for SqliteStore {
    fn get_node(&self, id: &str) -> Result<Option<MetadataNode>, StorageError> {
        Ok(self
            .read_doc(id)?
            .and_then(|document| doc::parse_node(id, document)))
    }

    fn get_nodes(&self, ids: &[String]) -> Result<HashMap<String, MetadataNode>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT id, doc FROM nodes WHERE id IN ({placeholders})");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut found = HashMap::with_capacity(ids.len());
        for row in rows {
            let (id, text) = row?;
            let value: Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(%id, error = %err, "stored document is not valid JSON");
                    continue;
                }
            };
            if let Some(node) = doc::parse_node(&id, value) {
                found.insert(id, node);
            }
        }
        Ok(found)
    }

    fn insert_node(&mut self, node: &MetadataNode) -> Result<(), StorageError> {
        let document = serde_json::to_value(node)?;
        self.insert_document(&node.id, &document)
    }

    fn insert_graph(
        &mut self,
        root_id: &str,
        graph: &EvidenceGraph,
    ) -> Result<GraphInsert, StorageError> {
        let graph_doc = serde_json::to_string(graph)?;
        let result = self.conn.execute(
            "INSERT INTO graphs (id, root_id, owner, doc) VALUES (?1, ?2, ?3, ?4)",
            params![graph.id, root_id, graph.owner, graph_doc],
        );
        match result {
            Ok(_) => Ok(GraphInsert::Inserted),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Another build already persisted a graph for this root.
                match self.graph_for_root(root_id)? {
                    Some(winner) => Ok(GraphInsert::Conflict(winner)),
                    None => Err(StorageError::GraphNotFound(root_id.to_string())),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_graph(&self, graph_id: &str) -> Result<Option<EvidenceGraph>, StorageError> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM graphs WHERE id = ?1",
                params![graph_id],
                |row| row.get(0),
            )
            .optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn graph_root(&self, graph_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT root_id FROM graphs WHERE id = ?1",
                params![graph_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn delete_graph(&mut self, graph_id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM graphs WHERE id = ?1", params![graph_id])?;
        Ok(())
    }

    fn link_graph(&mut self, node_id: &str, graph_id: &str) -> Result<LinkOutcome, StorageError> {
        let mut document = self
            .read_doc(node_id)?
            .ok_or_else(|| StorageError::NodeNotFound(node_id.to_string()))?;
        if let Some(existing) = doc::linked_id(&document) {
            if existing != graph_id {
                return Ok(LinkOutcome::AlreadyLinked(existing));
            }
        }
        doc::set_link(&mut document, graph_id);
        self.write_doc(node_id, &document)?;
        Ok(LinkOutcome::Linked)
    }

    fn unlink_graph(&mut self, node_id: &str) -> Result<(), StorageError> {
        if let Some(mut document) = self.read_doc(node_id)? {
            doc::clear_link(&mut document);
            self.write_doc(node_id, &document)?;
        }
        Ok(())
    }

    fn linked_graph_id(&self, node_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_doc(node_id)?.and_then(|document| doc::linked_id(&document)))
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
            name: Some(format!("Evidence graph {id}")),
            description: None,
            outputs: vec![NodeRef::new("d1")],
            nodes: IndexMap::new(),
        }
    }

    #[test]
    fn test_node_roundtrip_and_batched_get() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .insert_node(&node(json!({
                "id": "d1",
                "types": ["Dataset"],
                "generatedBy": { "id": "c1" }
            })))
            .unwrap();
        store
            .insert_node(&node(json!({ "id": "c1", "types": ["Computation"] })))
            .unwrap();

        let loaded = store.get_node("d1").unwrap().unwrap();
        assert_eq!(loaded.generated_by, Some(NodeRef::new("c1")));

        let ids = vec!["d1".to_string(), "c1".to_string(), "ghost".to_string()];
        let found = store.get_nodes(&ids).unwrap();
        assert_eq!(found.len(), 2);
        assert!(!found.contains_key("ghost"));
    }

    #[test]
    fn test_malformed_document_degrades_to_absent() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .insert_document("broken", &json!({ "types": ["Dataset"] }))
            .unwrap();

        assert!(store.get_node("broken").unwrap().is_none());
        assert!(store
            .get_nodes(&["broken".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_insert_graph_unique_root_conflict() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.insert_graph("d1", &graph("graph-1", "alice")).unwrap(),
            GraphInsert::Inserted
        ));
        match store.insert_graph("d1", &graph("graph-2", "bob")).unwrap() {
            GraphInsert::Conflict(winner) => assert_eq!(winner.id, "graph-1"),
            other => panic!("expected conflict, got: {:?}", other),
        }
        assert!(store.get_graph("graph-2").unwrap().is_none());
    }

    #[test]
    fn test_graph_roundtrip_and_delete() {
        let mut store = SqliteStore::in_memory().unwrap();
        let persisted = graph("graph-1", "alice");
        store.insert_graph("d1", &persisted).unwrap();

        let loaded = store.get_graph("graph-1").unwrap().unwrap();
        assert_eq!(loaded, persisted);
        assert_eq!(store.graph_root("graph-1").unwrap().as_deref(), Some("d1"));

        store.delete_graph("graph-1").unwrap();
        assert!(store.get_graph("graph-1").unwrap().is_none());
        // Root is free again.
        assert!(matches!(
            store.insert_graph("d1", &graph("graph-3", "alice")).unwrap(),
            GraphInsert::Inserted
        ));
    }

    #[test]
    fn test_link_lifecycle() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .insert_node(&node(json!({ "id": "d1", "types": ["Dataset"] })))
            .unwrap();
        store.insert_graph("d1", &graph("graph-1", "alice")).unwrap();

        assert!(matches!(
            store.link_graph("ghost", "graph-1"),
            Err(StorageError::NodeNotFound(_))
        ));

        assert_eq!(
            store.link_graph("d1", "graph-1").unwrap(),
            LinkOutcome::Linked
        );
        let found = store.find_linked_graph("d1").unwrap().unwrap();
        assert_eq!(found.id, "graph-1");

        assert_eq!(
            store.link_graph("d1", "graph-9").unwrap(),
            LinkOutcome::AlreadyLinked("graph-1".to_string())
        );

        store.unlink_graph("d1").unwrap();
        assert!(store.linked_graph_id("d1").unwrap().is_none());

        // Linking preserves attributes the engine does not model.
        store
            .insert_node(&node(json!({
                "id": "d2",
                "types": ["Dataset"],
                "keywords": ["genomics"]
            })))
            .unwrap();
        store.link_graph("d2", "graph-1").unwrap();
        let relinked = store.get_node("d2").unwrap().unwrap();
        assert_eq!(relinked.evidence_graph, Some(NodeRef::new("graph-1")));
        assert_eq!(relinked.extra["keywords"], json!(["genomics"]));
    }
}
