//! Catalog record snapshots and reference normalization.
//!
//! The metadata catalog stores loosely shaped JSON(-LD) documents: a type
//! field may be a bare string or a list, a to-one relation may be a bare
//! reference or a list of one, and `@id`/`@type` spellings coexist with
//! `id`/`types`. All of that variance is absorbed here, at deserialization
//! time, by funneling the raw document through `RawNode` -- the rest of
//! the engine only ever sees the canonical [`MetadataNode`] shape and never
//! branches on raw document structure.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::category::NodeCategory;

/// Canonical type-tag list. Records almost always carry one or two tags.
pub type TypeList = SmallVec<[String; 2]>;

/// A reference to another catalog record, always represented as `{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// The referenced record's identifier.
    #[serde(alias = "@id")]
    pub id: String,
}

impl NodeRef {
    /// Creates a reference to the given id.
    pub fn new(id: impl Into<String>) -> Self {
        NodeRef { id: id.into() }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A snapshot of one catalog record as seen during a build.
///
/// Relation fields are only meaningful for the record's category (entities
/// record `generated_by`, activities record the five `used_*` relations,
/// containers record `outputs`); fields that do not apply are simply
/// absent. Attributes the engine does not model are preserved verbatim in
/// `extra` so that link updates round-trip the full document.
///
/// The category is computed exactly once, when the document is
/// deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", rename_all = "camelCase")]
pub struct MetadataNode {
    /// Opaque record identifier, unique within the store.
    pub id: String,
    /// Canonical ordered type tags.
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub types: TypeList,
    /// Display name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The activity that generated this entity (zero or one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<NodeRef>,
    /// Datasets used by this activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_dataset: Option<Vec<NodeRef>>,
    /// Software used by this activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_software: Option<Vec<NodeRef>>,
    /// Samples used by this activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_sample: Option<Vec<NodeRef>>,
    /// Instruments used by this activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_instrument: Option<Vec<NodeRef>>,
    /// ML models used by this activity.
    #[serde(rename = "usedMLModel", skip_serializing_if = "Option::is_none")]
    pub used_ml_model: Option<Vec<NodeRef>>,
    /// The entities a container meaningfully exposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<NodeRef>>,
    /// Back-reference to the evidence graph built from this record.
    #[serde(rename = "hasEvidenceGraph", skip_serializing_if = "Option::is_none")]
    pub evidence_graph: Option<NodeRef>,
    /// Attributes not modeled here, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Category derived from `types`; computed at load, never stored.
    #[serde(skip)]
    pub category: NodeCategory,
}

impl MetadataNode {
    /// Raw outbound provenance references, by category.
    ///
    /// Entities contribute their `generated_by` reference; activities the
    /// union of their five `used_*` relations. Containers and other records
    /// contribute nothing -- a container's `outputs` are followed through
    /// indirection, not treated as provenance edges.
    pub fn edge_ids(&self) -> Vec<String> {
        match self.category {
            NodeCategory::Entity => self
                .generated_by
                .iter()
                .map(|r| r.id.clone())
                .collect(),
            NodeCategory::Activity => self
                .used_relations()
                .into_iter()
                .flat_map(|(_, refs)| refs.unwrap_or_default())
                .map(|r| r.id.clone())
                .collect(),
            NodeCategory::Container | NodeCategory::Other => Vec::new(),
        }
    }

    /// The five activity relation fields, with their canonical names.
    pub fn used_relations(&self) -> [(&'static str, Option<&[NodeRef]>); 5] {
        [
            ("usedDataset", self.used_dataset.as_deref()),
            ("usedSoftware", self.used_software.as_deref()),
            ("usedSample", self.used_sample.as_deref()),
            ("usedInstrument", self.used_instrument.as_deref()),
            ("usedMLModel", self.used_ml_model.as_deref()),
        ]
    }

    /// The ids a container declares as outputs, in declaration order.
    pub fn output_ids(&self) -> Vec<String> {
        self.outputs
            .iter()
            .flatten()
            .map(|r| r.id.clone())
            .collect()
    }
}

/// A value that the store may represent as a single item or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(vs) => vs,
        }
    }

    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::One(v) => Some(v),
            OneOrMany::Many(vs) => vs.into_iter().next(),
        }
    }
}

/// The lenient wire shape of a catalog document.
///
/// Accepts single-or-list variance on every relation and is converted into
/// the canonical [`MetadataNode`] via `TryFrom`, which is where the
/// JSON-LD spellings (`@id`, `@type`) are folded in and classification
/// happens. The JSON-LD keys land in `extra` (they are not valid Rust
/// field names under the camelCase rename) and are pulled out during
/// conversion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    types: Option<OneOrMany<String>>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    generated_by: Option<OneOrMany<NodeRef>>,
    #[serde(default)]
    used_dataset: Option<OneOrMany<NodeRef>>,
    #[serde(default)]
    used_software: Option<OneOrMany<NodeRef>>,
    #[serde(default)]
    used_sample: Option<OneOrMany<NodeRef>>,
    #[serde(default)]
    used_instrument: Option<OneOrMany<NodeRef>>,
    #[serde(default, rename = "usedMLModel")]
    used_ml_model: Option<OneOrMany<NodeRef>>,
    #[serde(default)]
    outputs: Option<OneOrMany<NodeRef>>,
    #[serde(default, rename = "hasEvidenceGraph")]
    evidence_graph: Option<OneOrMany<NodeRef>>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawNode> for MetadataNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let mut extra = raw.extra;

        let id = match raw.id {
            Some(id) => id,
            None => match extra.remove("@id") {
                Some(serde_json::Value::String(id)) => id,
                _ => return Err("document has no id".to_string()),
            },
        };

        let raw_types = match raw.types {
            Some(types) => Some(types),
            None => match extra.remove("@type") {
                Some(value) => Some(
                    serde_json::from_value::<OneOrMany<String>>(value)
                        .map_err(|e| format!("invalid type field: {}", e))?,
                ),
                None => None,
            },
        };
        let types: TypeList = raw_types
            .map(|t| t.into_vec().into_iter().collect())
            .unwrap_or_default();
        let category = NodeCategory::classify(&types);

        Ok(MetadataNode {
            id,
            types,
            name: raw.name,
            description: raw.description,
            generated_by: raw.generated_by.and_then(OneOrMany::into_first),
            used_dataset: raw.used_dataset.map(OneOrMany::into_vec),
            used_software: raw.used_software.map(OneOrMany::into_vec),
            used_sample: raw.used_sample.map(OneOrMany::into_vec),
            used_instrument: raw.used_instrument.map(OneOrMany::into_vec),
            used_ml_model: raw.used_ml_model.map(OneOrMany::into_vec),
            outputs: raw.outputs.map(OneOrMany::into_vec),
            evidence_graph: raw.evidence_graph.and_then(OneOrMany::into_first),
            extra,
            category,
        })
    }
}
