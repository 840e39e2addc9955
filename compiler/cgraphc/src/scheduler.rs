//! The emission scheduler computes a reverse-postorder over the callgraph and
//! drives `expand` on every node marked `output`.

use petgraph::visit::DfsPostOrder;

use crate::context::Context;
use crate::error::IceError;
use crate::front_end::FrontEnd;
use crate::store::FunctionId;

/// Allocate an order array of size `n_nodes`, compute a postorder over the callgraph,
/// filter to `output` nodes, and drive `expand_function` over the filtered array in postorder
/// (which is already the desired callees-before-callers emission order), clearing `output` as
/// each node is visited.
///
/// Emitting callees before callers maximizes information propagation (size, flags) across the
/// back-end; the stack-based postorder also keeps a function close to its callees in the
/// output stream, which helps instruction-cache locality. Deterministic given the callgraph's
/// insertion-stable node/edge ordering.
#[tracing::instrument(level = "info", skip_all)]
pub fn expand_all_functions<F: FrontEnd>(ctx: &mut Context<F>) -> Result<(), IceError> {
    let postorder = compute_postorder(ctx);

    // A DFS postorder already finishes a node's subtree (its callees) before the node
    // itself, so walking it front-to-back visits callees before callers — e.g. for
    // `main -> a -> b -> c` the postorder is `[c, b, a, main]`, and iterating it forward
    // emits `c` first and `main` last.
    for id in postorder {
        if !ctx.store().try_function(id).is_some_and(|n| n.output) {
            continue;
        }
        ctx.store_mut().function_mut(id).output = false;
        expand_function(ctx, id)?;
    }
    Ok(())
}

/// A plain postorder DFS over the callgraph, seeded from every node in insertion order so
/// disconnected components are all covered (petgraph's `DfsPostOrder` only walks nodes
/// reachable from its start; the outer loop restarts it for every unvisited node, same idea
/// as a standard postorder-over-a-possibly-cyclic-graph algorithm).
fn compute_postorder<F: FrontEnd>(ctx: &Context<F>) -> Vec<FunctionId> {
    let graph = ctx.store().graph();
    let mut dfs = DfsPostOrder::empty(graph);
    let mut order = Vec::with_capacity(ctx.store().function_count());
    for start in ctx.store().function_ids() {
        dfs.move_to(start);
        while let Some(id) = dfs.next(graph) {
            order.push(id);
        }
    }
    order
}

/// Preconditions: not `inlined_to`, lowered. Drops the body (unless `preserve_body`
/// says otherwise) and severs all callees afterward, so dead call expressions in a released
/// body cannot be re-traversed by a later pass.
#[tracing::instrument(level = "debug", skip_all, fields(node = ?id))]
pub fn expand_function<F: FrontEnd>(ctx: &mut Context<F>, id: FunctionId) -> Result<(), IceError> {
    {
        let node = ctx.store().function(id);
        if node.inlined_to.is_some() {
            return Err(IceError::ExpandInlinedNode);
        }
        if !node.lowered {
            return Err(IceError::ExpandNotLowered);
        }
    }

    let decl = ctx.store().function(id).decl;
    tracing::info!(?decl, "expanding function");
    ctx.front_end().expand_function(decl)?;
    if !ctx.front_end().asm_written(decl) {
        return Err(IceError::AsmNotWritten);
    }
    ctx.store_mut().function_mut(id).asm_written = true;

    if !ctx.front_end().preserve_body(decl) {
        ctx.store_mut().function_mut(id).body_present = false;
        ctx.store_mut().remove_callees(id);
    }
    Ok(())
}
