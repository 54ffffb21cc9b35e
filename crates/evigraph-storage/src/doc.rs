//! Raw-document helpers shared by the storage backends.
//!
//! Backends persist catalog records as raw JSON so that documents the
//! engine cannot model (or cannot even deserialize) survive untouched.
//! Back-link manipulation therefore edits the raw document rather than
//! round-tripping through [`MetadataNode`], which would reject exactly the
//! malformed documents a link update must tolerate.

use evigraph_core::MetadataNode;
use serde_json::Value;

/// JSON key of the back-reference from a root record to its graph.
pub(crate) const GRAPH_LINK_KEY: &str = "hasEvidenceGraph";

/// Deserializes a stored document, degrading malformed content to `None`.
pub(crate) fn parse_node(id: &str, doc: Value) -> Option<MetadataNode> {
    match serde_json::from_value(doc) {
        Ok(node) => Some(node),
        Err(err) => {
            tracing::warn!(%id, error = %err, "stored document is malformed; treating as absent");
            None
        }
    }
}

/// Reads the graph id a document's back-reference points at.
///
/// Tolerates the same shape variance as record references: a `{id}` or
/// `{@id}` object, or a list of one.
pub(crate) fn linked_id(doc: &Value) -> Option<String> {
    let mut link = doc.get(GRAPH_LINK_KEY)?;
    if let Some(items) = link.as_array() {
        link = items.first()?;
    }
    let obj = link.as_object()?;
    obj.get("id")
        .or_else(|| obj.get("@id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Writes the canonical back-reference onto a document.
pub(crate) fn set_link(doc: &mut Value, graph_id: &str) {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(
            GRAPH_LINK_KEY.to_string(),
            serde_json::json!({ "id": graph_id }),
        );
    }
}

/// Removes a document's back-reference, if present.
pub(crate) fn clear_link(doc: &mut Value) {
    if let Some(obj) = doc.as_object_mut() {
        obj.remove(GRAPH_LINK_KEY);
    }
}
