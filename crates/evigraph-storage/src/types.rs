//! Storage-layer outcome types for graph persistence and back-linking.
//!
//! These live here (not in evigraph-core) because conflict arbitration is a
//! storage concern -- a graph only competes with another graph once both
//! reach the persistence layer.

use evigraph_core::EvidenceGraph;

/// Outcome of persisting a newly built evidence graph.
///
/// At most one graph may exist per root record. When a concurrent builder
/// already persisted one, the insert reports [`GraphInsert::Conflict`]
/// carrying the winning artifact so the caller can discard its local result
/// and return the winner (first writer wins).
#[derive(Debug, Clone)]
pub enum GraphInsert {
    /// The graph was persisted; the caller's artifact is the winner.
    Inserted,
    /// Another graph already exists for this root. Carries the winner.
    Conflict(EvidenceGraph),
}

/// Outcome of writing a back-reference from a root record to its graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The back-reference was written (or already pointed at this graph).
    Linked,
    /// The record already references a different graph. Carries that
    /// graph's id; the existing link is left untouched.
    AlreadyLinked(String),
}
