//! The edge builder iterates a lowered function body's control-flow graph in block
//! order and emits block-weighted call edges, delegating everything else to the reference
//! walker.

use crate::context::{Context, Mode};
use crate::error::IceError;
use crate::front_end::{Expr, FrontEnd, FunctionBody};
use crate::store::FunctionId;
use crate::walker::walk_tree;

/// Builds every call edge for `caller`'s already-lowered body (fetched fresh from the
/// front-end), and walks everything that isn't a resolvable call with the reference walker.
///
/// Precondition (enforced by the function analyzer): `caller` is lowered and has a
/// body. A missing body degrades to "no statements, no local statics" rather than erroring,
/// since by construction the driver never reaches this point for a body-less node.
#[tracing::instrument(level = "debug", skip_all, fields(caller = ?caller))]
pub fn build_edges<F: FrontEnd>(ctx: &mut Context<F>, caller: FunctionId) -> Result<(), IceError> {
    let decl = ctx.store.function(caller).decl;
    let body = ctx.front_end.function_body(decl).unwrap_or_default();

    for stmt in &body.statements {
        match &stmt.call {
            Some(call) => {
                if let Some(callee_decl) = call.callee {
                    let callee = ctx.store.function_node(callee_decl);
                    tracing::trace!(?callee_decl, count = stmt.count, "edge builder: call edge");
                    ctx.store
                        .create_edge(caller, callee, stmt.handle, stmt.count, stmt.loop_depth);
                }
                for arg in &call.args {
                    walk_tree(ctx, arg)?;
                }
                if let Some(target) = &stmt.assign_target {
                    walk_tree(ctx, target)?;
                }
            }
            None => walk_tree(ctx, &stmt.body)?,
        }
    }

    walk_local_statics(ctx, &body)
}

/// Walks the initializers of locally-declared static variables; in whole-unit mode, finalizes
/// each such variable (promoting it into the variable worklist) rather than waiting for a
/// standalone `finalize_variable` call that will never come for a block-scoped static.
fn walk_local_statics<F: FrontEnd>(
    ctx: &mut Context<F>,
    body: &FunctionBody<F::D, F::Stmt>,
) -> Result<(), IceError> {
    for (decl, init) in &body.local_statics {
        walk_tree(ctx, init)?;
        if ctx.mode() == Mode::WholeUnit {
            let var = ctx.store.variable_node(*decl);
            let node = ctx.store.variable_mut(var);
            node.finalized = true;
            node.body_present = true;
            ctx.worklist.push_variable_unanalyzed(var);
        }
    }
    Ok(())
}

/// Used by callers that already have an owned [`Expr`] handy and want the walker without
/// going through a full statement; kept thin on purpose — it is a one-line re-export seam, not
/// a distinct behavior.
pub fn walk_initializer<F: FrontEnd>(
    ctx: &mut Context<F>,
    init: &Expr<F::D>,
) -> Result<(), IceError> {
    walk_tree(ctx, init)
}
