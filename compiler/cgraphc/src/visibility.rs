//! The visibility resolver classifies nodes local vs. externally visible, rewrites
//! linkage flags accordingly, and removes nodes proven unreachable.

use itertools::Itertools;

use crate::context::Context;
use crate::front_end::FrontEnd;

/// Two-pass resolution, mirrored across functions and variables:
///
/// 1. Mark externally visible if reachable/needed *and* (COMDAT or publicly declared outside
///    whole-program mode).
/// 2. Clear `public` on reachable-but-non-visible nodes (only expected to trigger under
///    whole-program mode — checked with a `debug_assert!` rather than silently").
/// 3. Compute `local` for functions (not defined for variables).
///
/// Concludes with a reclamation sweep (`before_inlining = true`).
#[tracing::instrument(level = "info", skip_all)]
pub fn resolve_visibility<F: FrontEnd>(ctx: &mut Context<F>) {
    let whole_program = ctx.config().whole_program;

    let function_ids = ctx.store().function_ids().collect_vec();
    for &id in &function_ids {
        let node = ctx.store().function(id);
        if node.reachable {
            let externally_visible = node.comdat || (node.public && !whole_program);
            ctx.store_mut().function_mut(id).externally_visible = externally_visible;
        }
    }
    for &id in &function_ids {
        let node = ctx.store().function(id);
        if node.reachable && node.public && !node.externally_visible {
            debug_assert!(
                whole_program,
                "clearing `public` on a reachable, non-externally-visible function outside \
                 whole-program mode"
            );
            ctx.store_mut().function_mut(id).public = false;
        }
    }
    for &id in &function_ids {
        let node = ctx.store_mut().function_mut(id);
        // "external" (not external) is "has no body here" — a pure declaration.
        let external = !node.body_present;
        node.local = !node.needed && node.analyzed && !external && !node.externally_visible;
    }

    let variable_ids = ctx.store().variable_ids().collect_vec();
    for &id in &variable_ids {
        let node = ctx.store().variable(id);
        if node.needed {
            let externally_visible = node.comdat || (node.public && !whole_program);
            ctx.store_mut().variable_mut(id).externally_visible = externally_visible;
        }
    }
    for &id in &variable_ids {
        let node = ctx.store().variable(id);
        if node.needed && node.public && !node.externally_visible {
            debug_assert!(
                whole_program,
                "clearing `public` on a needed, non-externally-visible variable outside \
                 whole-program mode"
            );
            ctx.store_mut().variable_mut(id).public = false;
        }
    }

    remove_unreachable(ctx, true);
}

/// Removes every function not `reachable` and not `needed`, and every variable not `needed`
/// and not `force_output`.
///
/// `before_inlining` is threaded through since it affects how aggressively
/// cross-unit-visible survivors are retained; this crate's simplified model (no real inliner
/// substitution pass — see DESIGN.md) does not yet differentiate the two sweeps by behavior,
/// but the parameter is kept so a future inliner integration has somewhere to plug in.
#[tracing::instrument(level = "debug", skip(ctx))]
pub fn remove_unreachable<F: FrontEnd>(ctx: &mut Context<F>, before_inlining: bool) {
    let _ = before_inlining;

    let dead_functions: Vec<_> = ctx
        .store()
        .function_ids()
        .filter(|&id| {
            let node = ctx.store().function(id);
            !node.reachable && !node.needed
        })
        .collect();
    for id in dead_functions {
        tracing::debug!(?id, "reclaiming unreachable function");
        ctx.store_mut()
            .remove_function(id)
            .expect("removing an unreachable node cannot violate the reset_node precondition");
    }

    let dead_variables: Vec<_> = ctx
        .store()
        .variable_ids()
        .filter(|&id| {
            let node = ctx.store().variable(id);
            !node.needed && !node.force_output
        })
        .collect();
    for id in dead_variables {
        tracing::debug!(?id, "reclaiming unreachable variable");
        ctx.store_mut().remove_variable(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DriverConfig;
    use crate::test_support::TestFrontEnd;

    #[test]
    fn dead_comdat_function_is_reclaimed() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let t = ctx.store_mut().function_node(1u32);
        {
            let node = ctx.store_mut().function_mut(t);
            node.finalized = true;
            node.analyzed = true;
            node.comdat = true;
            node.public = true;
            // not reachable: no callers, not address-taken.
        }
        resolve_visibility(&mut ctx);
        assert!(ctx.store().try_function(t).is_none());
    }

    #[test]
    fn reachable_public_function_becomes_externally_visible() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let f = ctx.store_mut().function_node(1u32);
        {
            let node = ctx.store_mut().function_mut(f);
            node.finalized = true;
            node.analyzed = true;
            node.reachable = true;
            node.needed = true;
            node.public = true;
            node.body_present = true;
        }
        resolve_visibility(&mut ctx);
        let node = ctx.store().function(f);
        assert!(node.externally_visible);
        assert!(node.public);
        assert!(!node.local);
    }

    #[test]
    fn whole_program_mode_clears_public_on_non_visible_reachable_function() {
        let mut ctx = Context::new(
            TestFrontEnd::new(),
            DriverConfig::whole_unit().with_whole_program(true),
        );
        let f = ctx.store_mut().function_node(1u32);
        {
            let node = ctx.store_mut().function_mut(f);
            node.finalized = true;
            node.analyzed = true;
            node.reachable = true;
            node.needed = true;
            node.public = true;
            node.body_present = true;
        }
        resolve_visibility(&mut ctx);
        let node = ctx.store().function(f);
        assert!(!node.externally_visible);
        assert!(!node.public);
    }

    #[test]
    fn unneeded_non_force_output_variable_is_reclaimed() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let v = ctx.store_mut().variable_node(1u32);
        ctx.store_mut().variable_mut(v).finalized = true;
        resolve_visibility(&mut ctx);
        assert!(ctx.store().try_variable(v).is_none());
    }
}
