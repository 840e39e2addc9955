//! The function analyzer lowers a function, builds its edges, computes local
//! inlinability/size, and sets `analyzed`.

use crate::context::Context;
use crate::edge_builder::build_edges;
use crate::error::IceError;
use crate::front_end::FrontEnd;
use crate::store::FunctionId;
use crate::store::edge::InlineFailedReason;

/// Preconditions: `finalized`, `reachable`, body present, not yet `analyzed` (checked here so
/// both the whole-unit driver and the streaming path get the same guard).
#[tracing::instrument(level = "debug", skip_all, fields(node = ?id))]
pub fn analyze_function<F: FrontEnd>(
    ctx: &mut Context<F>,
    id: FunctionId,
) -> Result<(), IceError> {
    {
        let node = ctx.store().function(id);
        if node.analyzed || !node.reachable || !node.finalized {
            return Err(IceError::NotReachableOrAlreadyAnalyzed);
        }
    }

    ctx.with_current_function(id, |ctx| {
        // Step 2: lowering is idempotent, but re-analysis after redefinition clears
        // `lowered` via `reset_node`, so this is the one point it actually runs again.
        ctx.lower_function_id(id)?;

        // Step 3: clear stale callees before rebuilding them — important for re-analysis
        // after redefinition, where `reset_node` already did this, but harmless to repeat.
        ctx.store_mut().remove_callees(id);

        // Step 4.
        build_edges(ctx, id)?;

        // Step 5.
        let decl = ctx.store().function(id).decl;
        let inlinable = ctx.front_end().inlinable(decl);
        let self_insns = ctx.front_end().estimate_size(decl);
        let disregard_inline_limits = ctx.front_end().disregard_inline_limits(decl);

        let redefined_extern_inline = {
            let node = ctx.store_mut().function_mut(id);
            node.inlinable = inlinable;
            node.disregard_inline_limits = disregard_inline_limits;
            node.self_insns = self_insns;
            node.insns = self_insns;
            node.redefined_extern_inline
        };

        // Step 6: deterministic priority order, "redefined extern inline" > "not inlinable"
        // > "not considered" (lifted verbatim from `initialize_inline_failed`).
        let reason = InlineFailedReason::seed(redefined_extern_inline, inlinable);
        let caller_edges = ctx.store().function(id).callers.clone();
        for edge_id in caller_edges {
            ctx.store_mut().edge_mut(edge_id).inline_failed = Some(reason);
        }

        // Step 7.
        ctx.store_mut().function_mut(id).analyzed = true;
        tracing::debug!(?decl, self_insns, inlinable, "function analyzed");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DriverConfig;
    use crate::front_end::{CallShape, FunctionBody, Statement};
    use crate::test_support::TestFrontEnd;

    fn finalize<F: FrontEnd>(ctx: &mut Context<F>, decl: F::D) -> FunctionId {
        let id = ctx.store_mut().function_node(decl);
        ctx.store_mut().function_mut(id).finalized = true;
        ctx.store_mut().function_mut(id).body_present = true;
        ctx.mark_function_reachable(id).unwrap();
        id
    }

    #[test]
    fn rejects_unreachable_node() {
        let fe = TestFrontEnd::new();
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let id = ctx.store_mut().function_node(1u32);
        ctx.store_mut().function_mut(id).finalized = true;
        let err = analyze_function(&mut ctx, id).unwrap_err();
        assert_eq!(err, IceError::NotReachableOrAlreadyAnalyzed);
    }

    #[test]
    fn sets_analyzed_and_local_attributes() {
        let fe = TestFrontEnd::new();
        fe.set_inlinable(1, true);
        fe.set_size(1, 7);
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let id = finalize(&mut ctx, 1u32);
        analyze_function(&mut ctx, id).unwrap();
        let node = ctx.store().function(id);
        assert!(node.analyzed);
        assert!(node.inlinable);
        assert_eq!(node.self_insns, 7);
        assert_eq!(node.insns, 7);
        assert!(ctx.front_end().is_lowered(1));
    }

    #[test]
    fn seeds_inbound_edges_with_priority_order() {
        let fe = TestFrontEnd::new();
        fe.set_inlinable(2, false);
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let caller = finalize(&mut ctx, 1u32);
        let callee = finalize(&mut ctx, 2u32);
        ctx.store_mut().create_edge(caller, callee, 0u32, 1, 0);
        analyze_function(&mut ctx, callee).unwrap();
        let edge_id = ctx.store().function(callee).callers[0];
        assert_eq!(
            ctx.store().edge(edge_id).inline_failed,
            Some(InlineFailedReason::NotInlinable)
        );
    }

    #[test]
    fn redefined_extern_inline_wins_priority_regardless_of_inlinability() {
        let fe = TestFrontEnd::new();
        fe.set_inlinable(2, true);
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let caller = finalize(&mut ctx, 1u32);
        let callee = finalize(&mut ctx, 2u32);
        ctx.store_mut().create_edge(caller, callee, 0u32, 1, 0);
        ctx.store_mut().function_mut(callee).redefined_extern_inline = true;
        analyze_function(&mut ctx, callee).unwrap();
        let edge_id = ctx.store().function(callee).callers[0];
        assert_eq!(
            ctx.store().edge(edge_id).inline_failed,
            Some(InlineFailedReason::RedefinedExternInline)
        );
    }

    #[test]
    fn rebuilds_edges_from_scratch_clearing_stale_callees() {
        let fe = TestFrontEnd::new();
        fe.set_body(
            1,
            FunctionBody {
                statements: vec![Statement {
                    handle: 0u32,
                    count: 1,
                    loop_depth: 0,
                    call: Some(CallShape {
                        callee: Some(2u32),
                        args: vec![],
                    }),
                    assign_target: None,
                    body: crate::front_end::Expr::Leaf,
                }],
                local_statics: vec![],
            },
        );
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let caller = finalize(&mut ctx, 1u32);
        let stale_callee = ctx.store_mut().function_node(3u32);
        ctx.store_mut().create_edge(caller, stale_callee, 99u32, 1, 0);
        analyze_function(&mut ctx, caller).unwrap();
        assert_eq!(ctx.store().function(caller).callees.len(), 1);
        let (_, callee) = ctx
            .store()
            .edge_endpoints(ctx.store().function(caller).callees[0])
            .unwrap();
        assert_eq!(ctx.store().function(callee).decl, 2u32);
    }
}
