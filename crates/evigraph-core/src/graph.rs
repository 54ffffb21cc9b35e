//! Rendered nodes and the persisted evidence graph artifact.
//!
//! An evidence graph is a flat adjacency map: every relation field on a
//! [`RenderedNode`] holds bare `{id}` references into the same `nodes` map,
//! never nested objects. The map is insertion-ordered so that two builds
//! from the same store snapshot serialize identically.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::node::{MetadataNode, NodeRef};

/// One node of a rendered evidence graph.
///
/// Either a snapshot of a catalog record (id, types, display fields, and
/// the relation references appropriate to its category) or a stub for a
/// reference that could not be resolved, in which case only `id` and
/// `error` are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNode {
    /// The record's identifier.
    pub id: String,
    /// Type tags carried over from the catalog record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    /// Display name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set on stub nodes for unresolvable references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The activity that generated this entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<NodeRef>,
    /// Datasets used by this activity (container references resolved).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_dataset: Option<Vec<NodeRef>>,
    /// Software used by this activity (container references resolved).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_software: Option<Vec<NodeRef>>,
    /// Samples used by this activity (container references resolved).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_sample: Option<Vec<NodeRef>>,
    /// Instruments used by this activity (container references resolved).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_instrument: Option<Vec<NodeRef>>,
    /// ML models used by this activity (container references resolved).
    #[serde(
        default,
        rename = "usedMLModel",
        skip_serializing_if = "Option::is_none"
    )]
    pub used_ml_model: Option<Vec<NodeRef>>,
}

impl RenderedNode {
    /// A base rendered node carrying a record's display fields.
    ///
    /// Relation fields start empty; the renderer fills them in after the
    /// referenced nodes have themselves been rendered.
    pub fn from_node(node: &MetadataNode) -> Self {
        RenderedNode {
            id: node.id.clone(),
            types: node.types.to_vec(),
            name: node.name.clone(),
            description: node.description.clone(),
            error: None,
            generated_by: None,
            used_dataset: None,
            used_software: None,
            used_sample: None,
            used_instrument: None,
            used_ml_model: None,
        }
    }

    /// A stub for a reference that does not resolve to a stored record.
    pub fn not_found(id: impl Into<String>) -> Self {
        RenderedNode {
            id: id.into(),
            types: Vec::new(),
            name: None,
            description: None,
            error: Some("not found".to_string()),
            generated_by: None,
            used_dataset: None,
            used_software: None,
            used_sample: None,
            used_instrument: None,
            used_ml_model: None,
        }
    }

    /// Returns `true` if this node is an unresolved-reference stub.
    pub fn is_stub(&self) -> bool {
        self.error.is_some()
    }
}

/// The persisted evidence graph artifact.
///
/// Built once per root record and cached via a back-reference on that
/// record; subsequent requests return the existing artifact instead of
/// rebuilding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceGraph {
    /// The artifact's own identifier.
    pub id: String,
    /// The account that requested the build.
    pub owner: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The root references this graph was built to explain, in seed order.
    pub outputs: Vec<NodeRef>,
    /// Flat adjacency map of every rendered node, keyed by id.
    pub nodes: IndexMap<String, RenderedNode>,
}
