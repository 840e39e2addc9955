//! The verifier runs self-consistency checks over the callgraph, run at every
//! quiescence point guarded by [`crate::context::DriverConfig::verify_at_quiescence`].
//!
//! Per the Design Notes, the scratch state this pass needs (which edges a statement has
//! already claimed) is a per-invocation side table (`AHashMap`/`AHashSet` keyed by edge/stmt
//! identity) rather than a slot on the shared [`crate::store::CallEdge`] — "absent outside
//! scope" is then true by construction rather than by discipline.

use ahash::{AHashMap, AHashSet};

use crate::context::Context;
use crate::error::IceError;
use crate::front_end::FrontEnd;
use crate::store::{EdgeId, FunctionId};

#[tracing::instrument(level = "debug", skip_all)]
pub fn verify_callgraph<F: FrontEnd>(ctx: &Context<F>) -> Result<(), IceError> {
    for id in ctx.store().function_ids() {
        verify_node(ctx, id)?;
    }
    Ok(())
}

fn verify_node<F: FrontEnd>(ctx: &Context<F>, id: FunctionId) -> Result<(), IceError> {
    let node = ctx.store().function(id);

    if node.inlined_to == Some(id) {
        return Err(IceError::SelfInline);
    }
    if ctx.store().find_function(node.decl) != Some(id) {
        return Err(IceError::NotInInternTable);
    }

    let inlined_callers: Vec<EdgeId> = node
        .callers
        .iter()
        .copied()
        .filter(|&e| ctx.store().edge(e).is_inlined())
        .collect();

    match node.inlined_to {
        Some(target) => {
            if inlined_callers.len() != 1 {
                return Err(IceError::MultipleInliningCallers);
            }
            let (caller, _) = ctx
                .store()
                .edge_endpoints(inlined_callers[0])
                .ok_or(IceError::DanglingNodeRef)?;
            if effective_inline_target(ctx, caller) != target {
                return Err(IceError::InlinedToMismatch);
            }
        }
        None => {
            if !inlined_callers.is_empty() {
                return Err(IceError::InlinedToWithoutInlinedCaller);
            }
        }
    }

    if node.analyzed && node.body_present {
        verify_cfg_bijection(ctx, id)?;
    }

    Ok(())
}

/// Follows a chain of `inlined_to` links to the node that ultimately stands alone in the
/// output — the "transitive inline root" of the inlining-consistency invariant. Bounded by the function count
/// so a would-be cycle (itself an invariant violation elsewhere) cannot loop forever here.
fn effective_inline_target<F: FrontEnd>(ctx: &Context<F>, mut id: FunctionId) -> FunctionId {
    let bound = ctx.store().function_count();
    for _ in 0..bound {
        match ctx.store().try_function(id).and_then(|n| n.inlined_to) {
            Some(next) => id = next,
            None => return id,
        }
    }
    id
}

/// The CFG/edge bijection check: every call statement must pair with exactly one graph
/// edge and vice versa.
fn verify_cfg_bijection<F: FrontEnd>(ctx: &Context<F>, id: FunctionId) -> Result<(), IceError> {
    let decl = ctx.store().function(id).decl;
    let Some(body) = ctx.front_end().function_body(decl) else {
        // The body may already have been released post-expansion; nothing left to check.
        return Ok(());
    };

    let mut edge_by_stmt: AHashMap<F::Stmt, EdgeId> = AHashMap::default();
    for &edge_id in &ctx.store().function(id).callees {
        let stmt = ctx.store().edge(edge_id).stmt;
        if edge_by_stmt.insert(stmt, edge_id).is_some() {
            return Err(IceError::CallEdgeBijectionViolated);
        }
    }

    let mut matched: AHashSet<EdgeId> = AHashSet::default();
    for stmt in &body.statements {
        let Some(call) = &stmt.call else { continue };
        if call.callee.is_none() {
            continue;
        }
        let edge_id = edge_by_stmt
            .get(&stmt.handle)
            .copied()
            .ok_or(IceError::CallEdgeBijectionViolated)?;
        if !matched.insert(edge_id) {
            return Err(IceError::SharedEdgeAux);
        }
    }

    if matched.len() != edge_by_stmt.len() {
        return Err(IceError::CallEdgeBijectionViolated);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DriverConfig;
    use crate::front_end::{CallShape, Expr, FunctionBody, Statement};
    use crate::test_support::TestFrontEnd;

    #[test]
    fn empty_graph_verifies() {
        let ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        verify_callgraph(&ctx).unwrap();
    }

    #[test]
    fn self_inline_is_rejected() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let f = ctx.store_mut().function_node(1u32);
        ctx.store_mut().function_mut(f).inlined_to = Some(f);
        let err = verify_callgraph(&ctx).unwrap_err();
        assert_eq!(err, IceError::SelfInline);
    }

    #[test]
    fn inlined_to_without_inlined_caller_is_rejected() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let caller = ctx.store_mut().function_node(1u32);
        let callee = ctx.store_mut().function_node(2u32);
        ctx.store_mut().create_edge(caller, callee, 0u32, 1, 0);
        // Edge still has `inline_failed` set (not inlined), but inlined_to claims otherwise.
        ctx.store_mut().function_mut(callee).inlined_to = Some(caller);
        let err = verify_callgraph(&ctx).unwrap_err();
        assert_eq!(err, IceError::InlinedToWithoutInlinedCaller);
    }

    #[test]
    fn consistent_single_inline_verifies() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let caller = ctx.store_mut().function_node(1u32);
        let callee = ctx.store_mut().function_node(2u32);
        let edge = ctx.store_mut().create_edge(caller, callee, 0u32, 1, 0);
        ctx.store_mut().edge_mut(edge).inline_failed = None;
        ctx.store_mut().function_mut(callee).inlined_to = Some(caller);
        verify_callgraph(&ctx).unwrap();
    }

    #[test]
    fn multiple_inlining_callers_is_rejected() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let caller_a = ctx.store_mut().function_node(1u32);
        let caller_b = ctx.store_mut().function_node(2u32);
        let callee = ctx.store_mut().function_node(3u32);
        let e1 = ctx.store_mut().create_edge(caller_a, callee, 0u32, 1, 0);
        let e2 = ctx.store_mut().create_edge(caller_b, callee, 1u32, 1, 0);
        ctx.store_mut().edge_mut(e1).inline_failed = None;
        ctx.store_mut().edge_mut(e2).inline_failed = None;
        ctx.store_mut().function_mut(callee).inlined_to = Some(caller_a);
        let err = verify_callgraph(&ctx).unwrap_err();
        assert_eq!(err, IceError::MultipleInliningCallers);
    }

    #[test]
    fn cfg_edge_bijection_holds_for_matching_body() {
        let fe = TestFrontEnd::new();
        fe.set_body(
            1,
            FunctionBody {
                statements: vec![Statement {
                    handle: 10u32,
                    count: 1,
                    loop_depth: 0,
                    call: Some(CallShape {
                        callee: Some(2u32),
                        args: vec![],
                    }),
                    assign_target: None,
                    body: Expr::Leaf,
                }],
                local_statics: vec![],
            },
        );
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let caller = ctx.store_mut().function_node(1u32);
        let callee = ctx.store_mut().function_node(2u32);
        ctx.store_mut().function_mut(caller).analyzed = true;
        ctx.store_mut().function_mut(caller).body_present = true;
        ctx.store_mut().create_edge(caller, callee, 10u32, 1, 0);
        verify_callgraph(&ctx).unwrap();
    }

    #[test]
    fn edge_with_no_matching_call_statement_fails_bijection() {
        let fe = TestFrontEnd::new();
        fe.set_body(
            1,
            FunctionBody {
                statements: vec![],
                local_statics: vec![],
            },
        );
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let caller = ctx.store_mut().function_node(1u32);
        let callee = ctx.store_mut().function_node(2u32);
        ctx.store_mut().function_mut(caller).analyzed = true;
        ctx.store_mut().function_mut(caller).body_present = true;
        ctx.store_mut().create_edge(caller, callee, 10u32, 1, 0);
        let err = verify_callgraph(&ctx).unwrap_err();
        assert_eq!(err, IceError::CallEdgeBijectionViolated);
    }
}
