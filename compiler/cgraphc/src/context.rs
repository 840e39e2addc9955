//! The reentrant context value ("Global singletons") that bundles the callgraph
//! store, both worklists, the ambient "current function" cursor, the `global_info_ready` /
//! `function_flags_ready` latches, the synthesizer's naming counter, and a `FrontEnd`
//! implementation, bundled into one explicit value rather than a set of process-wide mutable statics.

use crate::error::{ErrorTally, IceError};
use crate::front_end::FrontEnd;
use crate::store::{CallgraphStore, FunctionId};
use crate::worklist::Worklist;

/// Selects the two invariant sets whole-unit and streaming mode describe. Fixed for the lifetime of a `Context` — a
/// context is built for one mode and stays there; there is no way to flip it
/// mid-compilation, so a mixed-mode context can never arise in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Deferred analysis of all functions until end-of-input; enables inter-procedural
    /// decisions (`analyze_compilation_unit`).
    WholeUnit,
    /// Each function is analyzed and emitted as it is finalized; variables bypass the
    /// varpool.
    Streaming,
}

/// Constructed once via [`DriverConfig::whole_unit`]/[`DriverConfig::streaming`] and threaded
/// through [`Context`] by reference thereafter, in the small `*Config`-then-by-reference idiom
/// this codebase favors for build-once configuration values.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub mode: Mode,
    /// Whether to run the verifier at every quiescence point. Defaults to
    /// `cfg!(debug_assertions)`, the same tradeoff `ENABLE_CHECKING`-gated passes make;
    /// overridable so an embedder can force it on in a release build or off in debug.
    pub verify_at_quiescence: bool,
    /// Mirrors GCC's separate `-fwhole-program` flag: when set, a publicly-declared
    /// but otherwise non-externally-used symbol is *not* treated as externally visible, since
    /// the whole program is known to this compilation. Independent of [`Mode`] — a unit can
    /// run whole-unit analysis without whole-program visibility assumptions, and vice versa.
    pub whole_program: bool,
}

impl DriverConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            verify_at_quiescence: cfg!(debug_assertions) || cfg!(feature = "debug_assertions"),
            whole_program: false,
        }
    }

    pub fn with_whole_program(mut self, whole_program: bool) -> Self {
        self.whole_program = whole_program;
        self
    }

    pub fn whole_unit() -> Self {
        Self::new(Mode::WholeUnit)
    }

    pub fn streaming() -> Self {
        Self::new(Mode::Streaming)
    }

    pub fn with_verify_at_quiescence(mut self, verify: bool) -> Self {
        self.verify_at_quiescence = verify;
        self
    }
}

/// Bundles the callgraph store, worklists, latches, and a [`FrontEnd`] implementation into one
/// explicit, reentrant value. A caller wanting concurrent compilation
/// units runs one `Context` per unit.
pub struct Context<F: FrontEnd> {
    pub(crate) store: CallgraphStore<F>,
    pub(crate) worklist: Worklist,
    pub(crate) front_end: F,
    pub(crate) config: DriverConfig,

    /// One-way latch: once set, reachability can only decrease.
    pub(crate) global_info_ready: bool,
    /// One-way latch set once the visibility resolver has run.
    pub(crate) function_flags_ready: bool,

    /// The ambient "current function" cursor the analyzer sets while lowering/analyzing a
    /// body, so front-end hooks invoked mid-analysis can ask "what am I
    /// analyzing right now" without it being threaded through every call.
    pub(crate) current_function: Option<FunctionId>,

    /// Monotonically-counted synthesizer naming scheme: `<which>_<counter>`.
    pub(crate) cdtor_counter: u32,

    /// Resumption cursor for intermodule re-entry (`first_analyzed`): the
    /// number of function ids that existed at the end of the last `analyze_compilation_unit`
    /// call, so a later call's reclamation sweep only considers nodes introduced since.
    pub(crate) first_analyzed: usize,

    pub(crate) error_tally: ErrorTally,
}

impl<F: FrontEnd> Context<F> {
    pub fn new(front_end: F, config: DriverConfig) -> Self {
        Self {
            store: CallgraphStore::new(),
            worklist: Worklist::new(),
            front_end,
            config,
            global_info_ready: false,
            function_flags_ready: false,
            current_function: None,
            cdtor_counter: 0,
            first_analyzed: 0,
            error_tally: ErrorTally::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn front_end(&self) -> &F {
        &self.front_end
    }

    pub fn store(&self) -> &CallgraphStore<F> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CallgraphStore<F> {
        &mut self.store
    }

    pub fn global_info_ready(&self) -> bool {
        self.global_info_ready
    }

    /// The externally-maintained error tally: front-end errors propagate through this
    /// value rather than a sampled global.
    pub fn error_tally(&self) -> ErrorTally {
        self.error_tally
    }

    pub fn error_tally_mut(&mut self) -> &mut ErrorTally {
        &mut self.error_tally
    }

    /// Idempotent; forbidden once `global_info_ready` unless the node is already reachable
    /// (reachability monotonicity) — the store itself has no notion of the latch, so the check
    /// lives here.
    pub fn mark_function_reachable(&mut self, id: FunctionId) -> Result<(), IceError> {
        if self.global_info_ready && !self.store.function(id).reachable {
            return Err(IceError::ReachableAfterGlobalInfoReady);
        }
        self.store.mark_reachable(id, &mut self.worklist);
        Ok(())
    }

    /// `mark_needed` implies `reachable`, so it is subject to the same latch.
    pub fn mark_function_needed(&mut self, id: FunctionId) -> Result<(), IceError> {
        if self.global_info_ready && !self.store.function(id).reachable {
            return Err(IceError::ReachableAfterGlobalInfoReady);
        }
        self.store.mark_needed(id, &mut self.worklist);
        Ok(())
    }

    /// External "used" notification (`mark_needed_node`).
    pub fn mark_needed_node(&mut self, decl: F::D) -> Result<(), IceError> {
        let id = self.store.function_node(decl);
        self.mark_function_needed(id)
    }

    /// External "used" notification for variables (`varpool_mark_needed_node`).
    pub fn varpool_mark_needed_node(&mut self, decl: F::D) {
        let id = self.store.variable_node(decl);
        self.store.mark_variable_needed(id, &mut self.worklist);
    }

    /// Idempotent body-lowering trigger (`lower_function`).
    pub fn lower_function(&mut self, decl: F::D) -> Result<(), IceError> {
        let id = self.store.function_node(decl);
        self.lower_function_id(id)
    }

    pub(crate) fn lower_function_id(&mut self, id: FunctionId) -> Result<(), IceError> {
        if self.store.function(id).lowered {
            return Ok(());
        }
        self.front_end.lower_function(self.store.function(id).decl)?;
        self.store.function_mut(id).lowered = true;
        Ok(())
    }

    /// Sets the ambient "current function" cursor for the duration of `f`, restoring the
    /// previous value on every exit path including error exits.
    pub(crate) fn with_current_function<T>(
        &mut self,
        id: FunctionId,
        f: impl FnOnce(&mut Self) -> Result<T, IceError>,
    ) -> Result<T, IceError> {
        let previous = self.current_function.replace(id);
        let result = f(self);
        self.current_function = previous;
        result
    }

    pub fn current_function(&self) -> Option<FunctionId> {
        self.current_function
    }

    /// Resets a node's analysis state ("Finalization with redefinition", the reachable-worklist drain's
    /// "body vanished" path). Asserts `!output` (nothing already scheduled for emission may be
    /// reset out from under the scheduler), zeroes local/global state, clears `analyzed`, marks
    /// `redefined_extern_inline = true`, removes existing callees, and — in streaming mode —
    /// unlinks any inlined clones so a stale `inlined_to` cannot dangle past the reset.
    pub(crate) fn reset_node(&mut self, id: FunctionId) -> Result<(), IceError> {
        if self.store.function(id).output {
            return Err(IceError::ResetOutputNode);
        }
        self.store.remove_callees(id);
        if self.config.mode == Mode::Streaming {
            // The new body fully replaces the old one for inlining purposes: any clone that
            // had been inlined against the stale body no longer has a body to stand for.
            let clones = std::mem::take(&mut self.store.function_mut(id).next_clone);
            for clone in clones {
                if let Some(node) = self.store.try_function(clone) {
                    if node.inlined_to == Some(id) {
                        self.store.function_mut(clone).inlined_to = None;
                    }
                }
            }
        }
        let node = self.store.function_mut(id);
        node.reset_analysis_state();
        node.redefined_extern_inline = true;
        Ok(())
    }
}
