//! Fatal invariant violations and the front-end error tally.
//!
//! A process-abort policy (`internal_error`, `gcc_assert`-style checks) would fire the moment one of
//! these conditions is observed. Embedded as a library, that's too heavy a hammer: callers
//! propagate an [`IceError`] instead and decide for themselves whether to abort, log, or
//! surface it through their own diagnostic pipeline.

use thiserror::Error;

/// An "internal compiler error": a fatal violation of one of the data model invariants.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum IceError {
    #[error("reset_node called on a node already marked for output")]
    ResetOutputNode,

    #[error("finalize_function called on a node already analyzed in whole-unit mode")]
    UnsupportedRedefinition,

    #[error("mark_reachable called after global_info_ready was asserted")]
    ReachableAfterGlobalInfoReady,

    #[error("analyze_compilation_unit invariant violated: node is not both reachable and unanalyzed")]
    NotReachableOrAlreadyAnalyzed,

    #[error("analyzed != finalized at quiescence")]
    AnalyzedFinalizedMismatch,

    #[error("verifier: edge aux slot was not empty outside verifier scope")]
    SharedEdgeAux,

    #[error("verifier: inbound non-inlined edge found but inlined_to is set")]
    InlinedToWithoutInlinedCaller,

    #[error("verifier: inlined_to does not match the unique inlining caller")]
    InlinedToMismatch,

    #[error("verifier: a node has more than one caller with inline_failed absent")]
    MultipleInliningCallers,

    #[error("verifier: a node's inlined_to points to itself")]
    SelfInline,

    #[error("verifier: node is not reachable via its declaration-hash chain")]
    NotInInternTable,

    #[error("verifier: call statement / call-edge bijection violated")]
    CallEdgeBijectionViolated,

    #[error("expand_function called on a node that is inlined_to another node")]
    ExpandInlinedNode,

    #[error("expand_function called on a node that is not lowered")]
    ExpandNotLowered,

    #[error("expand_function's back-end hook did not set asm_written")]
    AsmNotWritten,

    #[error("build_static_cdtor received a discriminator other than 'I' or 'D'")]
    BadCdtorDiscriminator(char),

    #[error("front-end hook reported a fatal error: {0}")]
    FrontEnd(String),

    #[error("dangling reference: node index no longer present in the callgraph")]
    DanglingNodeRef,
}

/// The externally-maintained count of front-end-reported errors (`errorcount`) and
/// recoverable-but-unimplemented constructs (`sorrycount` in compiler-diagnostics terms).
///
/// Rather than a pair of global counters, this is an explicit value threaded through the
/// driver; a non-zero tally short-circuits variable emission, verification, and the final
/// consistency sweep, but is never itself a fatal [`IceError`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorTally {
    pub error_count: u32,
    pub sorry_count: u32,
}

impl ErrorTally {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0 || self.sorry_count > 0
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn record_sorry(&mut self) {
        self.sorry_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tally_starts_clean() {
        let tally = ErrorTally::default();
        assert!(!tally.has_errors());
    }

    #[test]
    fn error_tally_flags_either_counter() {
        let mut tally = ErrorTally::default();
        tally.record_sorry();
        assert!(tally.has_errors());

        let mut tally = ErrorTally::default();
        tally.record_error();
        assert!(tally.has_errors());
    }
}
