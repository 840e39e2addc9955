//! The reference walker recursively scans a declaration's initializer or body,
//! marking referenced functions/variables as needed.
//!
//! Because [`Expr`] trees are owned (no aliased sub-trees, unlike a pointer-based
//! tree nodes), "visits each sub-node at most once per invocation" is true by construction for
//! the shapes this crate walks natively. The one place aliasing can still occur is a front-end
//! returning the same [`UnknownTag`] more than once from nested [`Expr::Unknown`] nodes inside a
//! single walk; the scratch dedup set below covers exactly that case, scoped to one invocation
//! per the Design Notes' "scratch fields" guidance.

use ahash::AHashSet;

use crate::context::{Context, Mode};
use crate::error::IceError;
use crate::front_end::{Expr, ExprHookOutcome, FrontEnd, UnknownTag};

struct WalkerScratch {
    seen_unknown: AHashSet<UnknownTag>,
}

impl WalkerScratch {
    fn new() -> Self {
        Self {
            seen_unknown: AHashSet::default(),
        }
    }
}

/// Walk `root`, marking every variable reference needed and, in whole-unit mode, every
/// function-address expression needed — address-taken functions are reachable unconditionally.
///
/// Idempotent: walking the same tree twice produces the same set of marks, with the second
/// walk having no further effect (the marks themselves are idempotent at the store layer).
#[tracing::instrument(level = "trace", skip_all)]
pub fn walk_tree<F: FrontEnd>(ctx: &mut Context<F>, root: &Expr<F::D>) -> Result<(), IceError> {
    let mut scratch = WalkerScratch::new();
    walk_inner(ctx, root, &mut scratch)
}

fn walk_inner<F: FrontEnd>(
    ctx: &mut Context<F>,
    node: &Expr<F::D>,
    scratch: &mut WalkerScratch,
) -> Result<(), IceError> {
    match node {
        Expr::VariableRef(decl) => {
            tracing::trace!(?decl, "walker: variable reference");
            let var = ctx.store.variable_node(*decl);
            ctx.store.mark_variable_needed(var, &mut ctx.worklist);
            Ok(())
        }
        Expr::FunctionAddr(decl) => {
            // Address-taken functions are reachable unconditionally, but only in
            // whole-unit mode — streaming mode has no later whole-unit sweep to reconsider
            // an address-taken-but-uncalled function against, so it relies on the more
            // conservative neededness test applied at finalize time instead.
            if ctx.config.mode == Mode::WholeUnit {
                tracing::trace!(?decl, "walker: function address taken");
                let f = ctx.store.function_node(*decl);
                ctx.mark_function_needed(f)?;
            }
            Ok(())
        }
        // Type and declaration sub-trees are pruned: they cannot contain references by
        // construction, so recursing into them would only waste work.
        Expr::TypeOrDecl | Expr::Leaf => Ok(()),
        Expr::Seq(children) => {
            for child in children {
                walk_inner(ctx, child, scratch)?;
            }
            Ok(())
        }
        Expr::Unknown(tag) => {
            if !scratch.seen_unknown.insert(*tag) {
                return Ok(());
            }
            match ctx.front_end.analyze_expr(*tag) {
                ExprHookOutcome::Handled => Ok(()),
                ExprHookOutcome::WalkFurther(children) => {
                    for child in children {
                        walk_inner(ctx, &child, scratch)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DriverConfig;
    use crate::test_support::TestFrontEnd as FE;

    #[test]
    fn walking_a_variable_ref_marks_it_needed() {
        let mut ctx = Context::new(FE::new(), DriverConfig::whole_unit());
        let v = ctx.store.variable_node(1u32);
        walk_tree(&mut ctx, &Expr::VariableRef(1u32)).unwrap();
        assert!(ctx.store.variable(v).needed);
    }

    #[test]
    fn walking_twice_is_idempotent() {
        let mut ctx = Context::new(FE::new(), DriverConfig::whole_unit());
        let tree = Expr::Seq(vec![Expr::VariableRef(1u32), Expr::VariableRef(1u32)]);
        walk_tree(&mut ctx, &tree).unwrap();
        let v = ctx.store.find_variable(1u32).unwrap();
        assert!(ctx.store.variable(v).needed);
        // Second walk: no panics, no new state (mark_variable_needed is idempotent).
        walk_tree(&mut ctx, &tree).unwrap();
        assert!(ctx.store.variable(v).needed);
    }

    #[test]
    fn function_addr_marks_needed_in_whole_unit_mode_only() {
        let mut ctx = Context::new(FE::new(), DriverConfig::whole_unit());
        walk_tree(&mut ctx, &Expr::FunctionAddr(7u32)).unwrap();
        let f = ctx.store.find_function(7u32).unwrap();
        assert!(ctx.store.function(f).needed);

        let mut ctx = Context::new(FE::new(), DriverConfig::streaming());
        walk_tree(&mut ctx, &Expr::FunctionAddr(7u32)).unwrap();
        assert!(ctx.store.find_function(7u32).is_none());
    }

    #[test]
    fn type_or_decl_and_leaf_are_pruned() {
        let mut ctx = Context::new(FE::new(), DriverConfig::whole_unit());
        walk_tree(&mut ctx, &Expr::TypeOrDecl).unwrap();
        walk_tree(&mut ctx, &Expr::Leaf).unwrap();
        assert_eq!(ctx.store.variable_count(), 0);
        assert_eq!(ctx.store.function_count(), 0);
    }
}
