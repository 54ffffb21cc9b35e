//! Container indirection: expanding a reference through an RO-Crate.
//!
//! A reference that lands on a container is replaced by the container's
//! declared outputs -- one level only; the outputs themselves are taken as
//! raw references. A container with no declared outputs stands for itself.

use smallvec::{smallvec, SmallVec};

use crate::context::BuildContext;

/// Expands one reference through container indirection.
///
/// Non-containers and ids without a cached record pass through unchanged,
/// so unresolvable references still reach the renderer to be stubbed.
pub fn resolve(ctx: &BuildContext, id: &str) -> SmallVec<[String; 1]> {
    match ctx.cached_node(id) {
        Some(node) if node.category.is_container() => {
            let outputs = node.output_ids();
            if outputs.is_empty() {
                smallvec![id.to_string()]
            } else {
                outputs.into_iter().collect()
            }
        }
        _ => smallvec![id.to_string()],
    }
}
