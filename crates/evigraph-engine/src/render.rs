//! Rendering the cached closure into a flat adjacency map.
//!
//! Rendering is driven entirely by the context cache -- never by further
//! fetches -- so the result is deterministic for a fixed store snapshot
//! regardless of fetch order. Container indirection is applied here, at
//! render time, to the activity `used_*` relations: a rendered activity
//! references the entities a container exposes, never the container
//! itself.

use evigraph_core::{NodeCategory, NodeRef, RenderedNode};

use crate::context::BuildContext;
use crate::indirection;

/// Renders every output id (and, transitively, everything they reference)
/// into the context's `rendered` map.
pub fn render(ctx: &mut BuildContext, output_ids: &[String]) {
    for id in output_ids {
        render_one(ctx, id);
    }
}

/// Renders one id, recursing into its references.
///
/// The bare entry is inserted before any recursion; its presence in
/// `rendered` is what stops cyclic provenance from recursing forever.
/// Relation fields are filled in afterwards, once the referenced nodes
/// exist.
fn render_one(ctx: &mut BuildContext, id: &str) {
    if ctx.rendered.contains_key(id) {
        return;
    }

    let node = match ctx.cached_node(id) {
        Some(node) => node.clone(),
        None => {
            ctx.rendered
                .insert(id.to_string(), RenderedNode::not_found(id));
            return;
        }
    };

    ctx.rendered
        .insert(id.to_string(), RenderedNode::from_node(&node));

    match node.category {
        NodeCategory::Entity => {
            if let Some(generated_by) = &node.generated_by {
                render_one(ctx, &generated_by.id);
                if let Some(entry) = ctx.rendered.get_mut(id) {
                    entry.generated_by = Some(generated_by.clone());
                }
            }
        }
        NodeCategory::Activity => {
            let used_dataset = node
                .used_dataset
                .as_deref()
                .map(|refs| resolve_and_render(ctx, refs));
            let used_software = node
                .used_software
                .as_deref()
                .map(|refs| resolve_and_render(ctx, refs));
            let used_sample = node
                .used_sample
                .as_deref()
                .map(|refs| resolve_and_render(ctx, refs));
            let used_instrument = node
                .used_instrument
                .as_deref()
                .map(|refs| resolve_and_render(ctx, refs));
            let used_ml_model = node
                .used_ml_model
                .as_deref()
                .map(|refs| resolve_and_render(ctx, refs));

            if let Some(entry) = ctx.rendered.get_mut(id) {
                entry.used_dataset = used_dataset;
                entry.used_software = used_software;
                entry.used_sample = used_sample;
                entry.used_instrument = used_instrument;
                entry.used_ml_model = used_ml_model;
            }
        }
        NodeCategory::Container | NodeCategory::Other => {}
    }
}

/// Applies container indirection to a reference list, renders every
/// concrete id, and returns the resolved references.
fn resolve_and_render(ctx: &mut BuildContext, refs: &[NodeRef]) -> Vec<NodeRef> {
    let mut resolved = Vec::with_capacity(refs.len());
    for reference in refs {
        for concrete in indirection::resolve(ctx, &reference.id) {
            render_one(ctx, &concrete);
            resolved.push(NodeRef::new(concrete));
        }
    }
    resolved
}
