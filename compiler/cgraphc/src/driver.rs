//! The unit driver orchestrates the whole-unit pipeline — reachability propagation,
//! dead-node reclamation, visibility, expansion — and the streaming pipeline's per-function
//! analyze-then-emit loop. Also home to the two front-end-facing `finalize_*` entry points
//! since both modes' finalize semantics are driver concerns.

use crate::analyzer::function::analyze_function;
use crate::analyzer::variable::drain_variable_analyzer;
use crate::context::{Context, Mode};
use crate::error::IceError;
use crate::front_end::FrontEnd;
use crate::scheduler::{expand_all_functions, expand_function};
use crate::store::FunctionId;
use crate::verifier::verify_callgraph;
use crate::visibility::resolve_visibility;

/// Commit a function body (`finalize_function`). `nested` forbids the GC safe point at the
/// end of this call: a caller mid-recursion through some other GC-unsafe operation passes
/// `true`.
#[tracing::instrument(level = "debug", skip_all, fields(nested))]
pub fn finalize_function<F: FrontEnd>(
    ctx: &mut Context<F>,
    decl: F::D,
    nested: bool,
) -> Result<(), IceError> {
    let id = ctx.store_mut().function_node(decl);
    let already_finalized = ctx.store().function(id).finalized;

    if already_finalized {
        if ctx.mode() == Mode::WholeUnit && ctx.global_info_ready() {
            return Err(IceError::UnsupportedRedefinition);
        }
        ctx.reset_node(id)?;
    }

    {
        let node = ctx.store_mut().function_mut(id);
        node.finalized = true;
        node.body_present = true;
    }

    // Roots: externally visible definitions and static constructors/
    // destructors are reachable unconditionally. A hosted front-end marks its program entry
    // point (`main` or analogue) `public`, which falls out of this same rule.
    let is_root = {
        let node = ctx.store().function(id);
        node.public || node.static_constructor || node.static_destructor
    };
    if is_root {
        ctx.mark_function_needed(id)?;
    }

    match ctx.mode() {
        Mode::WholeUnit => {
            // Queued; `analyze_compilation_unit` drains the reachable-worklist later.
        }
        Mode::Streaming => {
            ctx.mark_function_reachable(id)?;
            analyze_function(ctx, id)?;
            enqueue_reachable_callees(ctx, id)?;
            drain_variable_analyzer(ctx)?;

            // Streaming's more conservative neededness test — a static function is
            // needed even when uninlinable and otherwise uncalled, since there is no later
            // whole-unit sweep left to reconsider it against.
            let node = ctx.store().function(id);
            if !node.public && !node.inlinable && !node.needed {
                ctx.mark_function_needed(id)?;
            }

            if ctx.config().verify_at_quiescence {
                verify_callgraph(ctx)?;
            }

            if ctx.store().function(id).needed {
                ctx.worklist.push_pending_emission(id);
            }
            if !nested {
                drain_pending_emission(ctx)?;
            }
        }
    }

    if !nested {
        ctx.front_end().collection_point();
    }
    Ok(())
}

/// Commit a variable (`finalize_variable`).
#[tracing::instrument(level = "debug", skip_all)]
pub fn finalize_variable<F: FrontEnd>(ctx: &mut Context<F>, decl: F::D) -> Result<(), IceError> {
    let id = ctx.store_mut().variable_node(decl);
    {
        let node = ctx.store_mut().variable_mut(id);
        node.finalized = true;
        node.body_present = true;
    }

    let is_root = {
        let node = ctx.store().variable(id);
        node.public || node.force_output
    };
    if is_root {
        ctx.store_mut().mark_variable_needed(id, &mut ctx.worklist);
    }

    if ctx.mode() == Mode::Streaming {
        // "variables are emitted directly without a varpool" (glossary): analyze immediately
        // rather than waiting on a batched sweep that streaming mode never runs.
        drain_variable_analyzer(ctx)?;
    }
    Ok(())
}

/// Signal end-of-input (`finalize_compilation_unit`): triggers whole-unit analysis, or a
/// final quiescence check in streaming mode (which has nothing left to batch).
pub fn finalize_compilation_unit<F: FrontEnd>(ctx: &mut Context<F>) -> Result<(), IceError> {
    match ctx.mode() {
        Mode::WholeUnit => analyze_compilation_unit(ctx),
        Mode::Streaming => verify_at_quiescence_if_clean(ctx),
    }
}

/// Whole-unit mode pipeline.
#[tracing::instrument(level = "info", skip_all)]
pub fn analyze_compilation_unit<F: FrontEnd>(ctx: &mut Context<F>) -> Result<(), IceError> {
    debug_assert_eq!(
        ctx.mode(),
        Mode::WholeUnit,
        "analyze_compilation_unit is whole-unit only; streaming has its own path"
    );

    // Step 1: alias finalization is an external collaborator this crate does not model (no
    // front-end hook for it exists); a front-end with aliasing support is expected to have
    // already routed alias targets through ordinary `finalize_function`/`finalize_variable`.

    // Step 2: seed reachability from initializers.
    drain_variable_analyzer(ctx)?;

    // Step 3: drain the reachable-worklist.
    while let Some(id) = ctx.worklist.pop_reachable() {
        if !ctx.store().function(id).body_present {
            // Body vanished, e.g. killed by a late weak alias.
            ctx.reset_node(id)?;
            continue;
        }
        {
            let node = ctx.store().function(id);
            if node.analyzed || !node.reachable {
                return Err(IceError::NotReachableOrAlreadyAnalyzed);
            }
        }
        analyze_function(ctx, id)?;
        enqueue_reachable_callees(ctx, id)?;
        drain_variable_analyzer(ctx)?;
    }

    // Step 4: reclamation sweep over nodes introduced since the last call.
    let introduced: Vec<FunctionId> = ctx.store().function_ids_from(ctx.first_analyzed).collect();
    for id in introduced {
        let Some(node) = ctx.store().try_function(id) else {
            continue;
        };
        if node.finalized && !node.body_present {
            ctx.reset_node(id)?;
        } else if !node.reachable && node.body_present {
            ctx.store_mut().remove_function(id)?;
        } else if node.analyzed != node.finalized {
            return Err(IceError::AnalyzedFinalizedMismatch);
        }
    }

    // Step 5: remember the boundary for the next intermodule re-entry.
    ctx.first_analyzed = ctx.store().function_insertion_len();

    // Step 6.
    ctx.front_end().collection_point();

    verify_at_quiescence_if_clean(ctx)
}

/// `optimize`: run the inter-procedural passes (visibility + reclamation) and drive
/// emission. Streaming mode has already analyzed and (for needed nodes) expanded
/// everything as each function was finalized, so there is nothing left to batch here.
#[tracing::instrument(level = "info", skip_all)]
pub fn optimize<F: FrontEnd>(ctx: &mut Context<F>) -> Result<(), IceError> {
    if ctx.mode() == Mode::Streaming {
        return verify_at_quiescence_if_clean(ctx);
    }

    resolve_visibility(ctx);
    ctx.global_info_ready = true;
    mark_functions_to_output(ctx);

    if ctx.error_tally().has_errors() {
        // Front-end errors short-circuit verification and emission; partial output is
        // acceptable.
        return Ok(());
    }

    verify_at_quiescence_if_clean(ctx)?;
    expand_all_functions(ctx)
}

/// Sets `output = true` on every surviving, non-inlined, analyzed function, once
/// inter-procedural visibility has settled. The emission scheduler filters on this flag.
fn mark_functions_to_output<F: FrontEnd>(ctx: &mut Context<F>) {
    let ids: Vec<_> = ctx.store().function_ids().collect();
    for id in ids {
        let node = ctx.store().function(id);
        if node.reachable && node.analyzed && node.inlined_to.is_none() {
            ctx.store_mut().function_mut(id).output = true;
        }
    }
}

fn verify_at_quiescence_if_clean<F: FrontEnd>(ctx: &Context<F>) -> Result<(), IceError> {
    if ctx.config().verify_at_quiescence && !ctx.error_tally().has_errors() {
        verify_callgraph(ctx)?;
    }
    Ok(())
}

fn drain_pending_emission<F: FrontEnd>(ctx: &mut Context<F>) -> Result<(), IceError> {
    while let Some(id) = ctx.worklist.pop_pending_emission() {
        let Some(node) = ctx.store().try_function(id) else {
            continue; // reclaimed before its turn.
        };
        if node.inlined_to.is_some() || !node.needed || node.asm_written {
            continue;
        }
        expand_function(ctx, id)?;
    }
    Ok(())
}

fn enqueue_reachable_callees<F: FrontEnd>(
    ctx: &mut Context<F>,
    id: FunctionId,
) -> Result<(), IceError> {
    let callees: Vec<FunctionId> = ctx
        .store()
        .function(id)
        .callees
        .iter()
        .filter_map(|&e| ctx.store().edge_endpoints(e).map(|(_, callee)| callee))
        .collect();
    for callee in callees {
        if !ctx.store().function(callee).reachable {
            ctx.mark_function_reachable(callee)?;
        }
    }
    Ok(())
}
