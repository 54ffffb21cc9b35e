//! Reachability closure over the metadata store.
//!
//! A level-by-level walk from the seed frontier: each iteration batch
//! fetches the frontier ids not yet cached, then expands the raw
//! provenance edges of every newly processed record into the next
//! frontier. Cycles terminate because `processed` only grows -- a revisited
//! id contributes no new frontier members.

use evigraph_storage::NodeStore;

use crate::context::{BuildContext, CacheEntry};
use crate::error::BuildError;
use crate::indirection;

/// Fetches the root record and resolves the seed frontier.
///
/// A container root stands for its declared outputs: the seeds are exactly
/// the resolved outputs, and the container id itself is not among them. A
/// container without declared outputs -- like any non-container or unknown
/// root -- seeds the walk with just the root id.
pub fn resolve_seeds<S: NodeStore>(
    store: &S,
    ctx: &mut BuildContext,
    root_id: &str,
) -> Result<Vec<String>, BuildError> {
    let entry = match store.get_node(root_id)? {
        Some(node) => CacheEntry::Found(node),
        None => CacheEntry::NotFound,
    };
    ctx.cache.insert(root_id.to_string(), entry);
    Ok(indirection::resolve(ctx, root_id).into_vec())
}

/// Populates the context cache with every record reachable from the seeds.
///
/// Any id the store does not return is recorded as
/// [`CacheEntry::NotFound`]; only a wholesale store failure aborts the
/// walk. Fails closed with [`BuildError::GraphTooLarge`] once the cache
/// grows past `max_nodes`.
pub fn build_closure<S: NodeStore>(
    store: &S,
    ctx: &mut BuildContext,
    seeds: &[String],
    max_nodes: usize,
) -> Result<(), BuildError> {
    let mut frontier: Vec<String> = seeds.to_vec();

    while !frontier.is_empty() {
        let mut to_fetch: Vec<String> = frontier
            .iter()
            .filter(|id| !ctx.cache.contains_key(id.as_str()))
            .cloned()
            .collect();
        to_fetch.sort();
        to_fetch.dedup();

        if !to_fetch.is_empty() {
            let mut fetched = store.get_nodes(&to_fetch)?;
            for id in &to_fetch {
                let entry = match fetched.remove(id) {
                    Some(node) => CacheEntry::Found(node),
                    None => {
                        tracing::debug!(%id, "referenced record not in store");
                        CacheEntry::NotFound
                    }
                };
                ctx.cache.insert(id.clone(), entry);
            }
            if ctx.cache.len() > max_nodes {
                return Err(BuildError::GraphTooLarge { limit: max_nodes });
            }
        }

        let mut next = Vec::new();
        for id in frontier {
            if !ctx.processed.insert(id.clone()) {
                continue;
            }
            if let Some(CacheEntry::Found(node)) = ctx.cache.get(&id) {
                next.extend(node.edge_ids());
            }
        }
        frontier = next;
    }

    Ok(())
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

    #[test]
    fn seed_plain_entity_is_the_root_itself() {
        let store = store_with(vec![json!({ "id": "d1", "types": ["Dataset"] })]);
        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "d1").unwrap();
        assert_eq!(seeds, ["d1"]);
    }

    #[test]
    fn seed_container_with_outputs_excludes_root() {
        let store = store_with(vec![json!({
            "id": "r1",
            "types": ["https://w3id.org/EVI#ROCrate"],
            "outputs": [{ "id": "d1" }, { "id": "d2" }]
        })]);
        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "r1").unwrap();
        // The container stands for its outputs; r1 itself is not a seed.
        assert_eq!(seeds, ["d1", "d2"]);
    }

    #[test]
    fn seed_container_without_outputs_is_the_root() {
        let store = store_with(vec![json!({ "id": "r1", "types": ["ROCrate"] })]);
        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "r1").unwrap();
        assert_eq!(seeds, ["r1"]);
    }

    #[test]
    fn seed_unknown_root_passes_through() {
        let store = InMemoryStore::new();
        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "ghost").unwrap();
        assert_eq!(seeds, ["ghost"]);
    }

    #[test]
    fn closure_walks_generated_by_and_used_relations() {
        let store = store_with(vec![
            json!({
                "id": "d1",
                "types": ["Dataset"],
                "generatedBy": { "id": "c1" }
            }),
            json!({
                "id": "c1",
                "types": ["Computation"],
                "usedDataset": [{ "id": "d0" }],
                "usedSoftware": [{ "id": "s1" }]
            }),
            json!({ "id": "d0", "types": ["Dataset"] }),
            json!({ "id": "s1", "types": ["Software"] }),
        ]);

        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "d1").unwrap();
        build_closure(&store, &mut ctx, &seeds, 10_000).unwrap();

        for id in ["d1", "c1", "d0", "s1"] {
            assert!(ctx.cached_node(id).is_some(), "{id} should be cached");
        }
    }

    #[test]
    fn missing_reference_is_cached_as_not_found() {
        let store = store_with(vec![json!({
            "id": "d1",
            "types": ["Dataset"],
            "generatedBy": [{ "id": "ghost" }]
        })]);

        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "d1").unwrap();
        build_closure(&store, &mut ctx, &seeds, 10_000).unwrap();

        assert!(matches!(
            ctx.cache.get("ghost"),
            Some(CacheEntry::NotFound)
        ));
    }

    #[test]
    fn cyclic_provenance_terminates() {
        let store = store_with(vec![
            json!({
                "id": "a",
                "types": ["Dataset"],
                "generatedBy": { "id": "b" }
            }),
            json!({
                "id": "b",
                "types": ["Computation"],
                "usedDataset": [{ "id": "a" }]
            }),
        ]);

        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "a").unwrap();
        build_closure(&store, &mut ctx, &seeds, 10_000).unwrap();

        assert_eq!(ctx.cached_count(), 2);
        assert!(ctx.processed.contains("a"));
        assert!(ctx.processed.contains("b"));
    }

    #[test]
    fn closure_fails_closed_past_the_ceiling() {
        // d0 <- c0 <- d1 <- c1 <- ... a chain longer than the ceiling.
        let mut docs = Vec::new();
        for i in 0..6 {
            docs.push(json!({
                "id": format!("d{i}"),
                "types": ["Dataset"],
                "generatedBy": { "id": format!("c{i}") }
            }));
            docs.push(json!({
                "id": format!("c{i}"),
                "types": ["Computation"],
                "usedDataset": [{ "id": format!("d{}", i + 1) }]
            }));
        }
        let store = store_with(docs);

        let mut ctx = BuildContext::new();
        let seeds = resolve_seeds(&store, &mut ctx, "d0").unwrap();
        let result = build_closure(&store, &mut ctx, &seeds, 4);
        assert!(matches!(
            result,
            Err(BuildError::GraphTooLarge { limit: 4 })
        ));
    }
}
