//! The ctor/dtor synthesizer materializes artificial functions for static
//! initialization and inserts them into the callgraph.

use crate::analyzer::function::analyze_function;
use crate::context::Context;
use crate::driver::finalize_function;
use crate::error::IceError;
use crate::front_end::{FrontEnd, FunctionBody};
use crate::scheduler::expand_function;
use crate::store::FunctionId;

/// The single-character discriminator `build_static_cdtor` accepts: `'I'` for a
/// static constructor, `'D'` for a static destructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdtorKind {
    Constructor,
    Destructor,
}

impl CdtorKind {
    fn from_char(which: char) -> Result<Self, IceError> {
        match which {
            'I' => Ok(Self::Constructor),
            'D' => Ok(Self::Destructor),
            other => Err(IceError::BadCdtorDiscriminator(other)),
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Constructor => 'I',
            Self::Destructor => 'D',
        }
    }
}

/// Manufactures a synthetic void/void function named `<which>_<counter>` (following
/// `cgraph_build_static_cdtor`'s `"%c_%d"` scheme), attaches `body`, marks it artificial and a
/// static constructor/destructor, gimplifies it, and routes it into either `finalize_function`
/// (pre-IPA) or directly through lowering + emission (post-IPA, i.e. once `global_info_ready`
/// has been asserted and the emission scheduler has already run once).
#[tracing::instrument(level = "info", skip(ctx, body), fields(which, priority))]
pub fn build_static_cdtor<F: FrontEnd>(
    ctx: &mut Context<F>,
    which: char,
    body: FunctionBody<F::D, F::Stmt>,
    priority: u32,
) -> Result<FunctionId, IceError> {
    let kind = CdtorKind::from_char(which)?;

    let counter = ctx.cdtor_counter;
    ctx.cdtor_counter += 1;
    let name = format!("{}_{counter}", kind.letter());
    tracing::info!(name, priority, ?kind, "synthesizing static constructor/destructor");

    let decl = ctx.front_end().synthesize_cdtor_decl(&name);
    ctx.front_end().install_synthesized_body(decl, body);

    let id = ctx.store_mut().function_node(decl);
    {
        let node = ctx.store_mut().function_mut(id);
        node.artificial = true;
        node.static_constructor = kind == CdtorKind::Constructor;
        node.static_destructor = kind == CdtorKind::Destructor;
        // Never a profitable inline target: it runs exactly once, at a fixed program point.
        node.inlinable = false;
    }
    ctx.lower_function_id(id)?;

    if ctx.global_info_ready() {
        {
            let node = ctx.store_mut().function_mut(id);
            node.finalized = true;
            node.body_present = true;
        }
        ctx.mark_function_reachable(id)?;
        ctx.mark_function_needed(id)?;
        analyze_function(ctx, id)?;
        expand_function(ctx, id)?;
    } else {
        finalize_function(ctx, decl, false)?;
    }

    if ctx.front_end().has_ctor_dtor_sections() {
        ctx.front_end().emit_priority_tagged_reference(decl, priority);
    } else {
        // No native ctor/dtor sections: leave it publicly visible so the runtime can find it
        // by name, the way a backend's ctor/dtor-section support is usually probed.
        ctx.store_mut().function_mut(id).public = true;
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DriverConfig;
    use crate::test_support::TestFrontEnd;

    #[test]
    fn rejects_bad_discriminator() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let err = build_static_cdtor(&mut ctx, 'X', FunctionBody::default(), 0).unwrap_err();
        assert_eq!(err, IceError::BadCdtorDiscriminator('X'));
    }

    #[test]
    fn pre_ipa_ctor_is_reachable_and_public_without_native_sections() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        let id = build_static_cdtor(&mut ctx, 'I', FunctionBody::default(), 100).unwrap();
        let node = ctx.store().function(id);
        assert!(node.static_constructor);
        assert!(node.artificial);
        assert!(node.reachable);
        assert!(node.public);
    }

    #[test]
    fn native_sections_skip_public_fallback() {
        let fe = TestFrontEnd::new();
        fe.set_has_ctor_dtor_sections(true);
        let mut ctx = Context::new(fe, DriverConfig::whole_unit());
        let id = build_static_cdtor(&mut ctx, 'D', FunctionBody::default(), 50).unwrap();
        assert!(!ctx.store().function(id).public);
        assert_eq!(
            ctx.front_end().priority_tagged(),
            vec![(1_000_000u32, 50u32)]
        );
    }

    #[test]
    fn post_ipa_ctor_is_expanded_immediately() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        ctx.global_info_ready = true;
        let id = build_static_cdtor(&mut ctx, 'I', FunctionBody::default(), 1).unwrap();
        assert!(ctx.store().function(id).asm_written);
        assert_eq!(ctx.front_end().expanded(), vec![1_000_000u32]);
    }

    #[test]
    fn synthesized_names_are_monotonically_counted() {
        let mut ctx = Context::new(TestFrontEnd::new(), DriverConfig::whole_unit());
        build_static_cdtor(&mut ctx, 'I', FunctionBody::default(), 0).unwrap();
        build_static_cdtor(&mut ctx, 'I', FunctionBody::default(), 0).unwrap();
        assert_eq!(ctx.cdtor_counter, 2);
    }
}
