//! Evidence graph build request types.

use serde::Deserialize;

/// Request to build (or fetch) the evidence graph for a root record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// The root record to reconstruct lineage for.
    pub root_id: String,
    /// The requesting account; becomes the graph's owner.
    pub owner: String,
}
