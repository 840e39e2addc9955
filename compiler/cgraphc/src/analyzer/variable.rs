//! The variable analyzer drains the unanalyzed-variables queue, walking each
//! initializer to discover further references.

use crate::context::Context;
use crate::error::IceError;
use crate::front_end::FrontEnd;
use crate::walker::walk_tree;

/// Drains the queue fully. Returns whether it was non-empty — callers loop on this until it
/// is `false`, since walking one variable's initializer can enqueue more.
#[tracing::instrument(level = "debug", skip_all)]
pub fn drain_variable_analyzer<F: FrontEnd>(ctx: &mut Context<F>) -> Result<bool, IceError> {
    let mut drained_any = false;
    while let Some(id) = ctx.worklist.pop_variable_unanalyzed() {
        drained_any = true;
        let decl = ctx.store().variable(id).decl;
        if let Some(init) = ctx.front_end().variable_initializer(decl) {
            ctx.store_mut().variable_mut(id).body_present = true;
            walk_tree(ctx, &init)?;
        }
        ctx.store_mut().variable_mut(id).analyzed = true;
        tracing::trace!(?decl, "variable analyzed");
    }
    Ok(drained_any)
}
