//! Per-build traversal state.
//!
//! [`BuildContext`] is owned by exactly one build from seed resolution
//! through rendering. Builds never share context -- even two concurrent
//! builds of the same root each walk the store independently, and
//! deduplication happens only when the finished artifacts reach the
//! persistence layer.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use evigraph_core::{MetadataNode, RenderedNode};

/// What one fetch attempt learned about an id.
///
/// `NotFound` is recorded explicitly so an id is never fetched twice: once
/// an id has any entry, the cache is the sole source of truth for it.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// The record as snapshotted by the fetch.
    Found(MetadataNode),
    /// The store had no (readable) record for this id.
    NotFound,
}

/// Traversal state scoped to a single evidence graph build.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Append-only fetch results, keyed by id.
    pub(crate) cache: HashMap<String, CacheEntry>,
    /// Ids whose outbound closure edges have been expanded. Distinct from
    /// cache membership: a record can be cached but not yet processed.
    pub(crate) processed: HashSet<String>,
    /// Rendered nodes keyed by id. Membership is the cycle guard during
    /// recursive rendering.
    pub(crate) rendered: IndexMap<String, RenderedNode>,
}

impl BuildContext {
    /// Creates an empty context for one build.
    pub fn new() -> Self {
        BuildContext::default()
    }

    /// The cached record for an id, if it was fetched and found.
    pub fn cached_node(&self, id: &str) -> Option<&MetadataNode> {
        match self.cache.get(id) {
            Some(CacheEntry::Found(node)) => Some(node),
            _ => None,
        }
    }

    /// Number of ids with a cache entry (found or not).
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Consumes the context, yielding the rendered adjacency map.
    pub fn into_nodes(self) -> IndexMap<String, RenderedNode> {
        self.rendered
    }
}
