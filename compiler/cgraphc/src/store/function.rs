use crate::front_end::Decl;
use crate::store::{EdgeId, FunctionId};

/// One function declaration's record in the callgraph.
///
/// Lifecycle flags are independent and monotonic unless explicitly reset by
/// [`crate::driver::reset_node`]; local/global attributes are only meaningful once
/// `analyzed`/the inter-procedural pass has run, respectively.
#[derive(Debug, Clone)]
pub struct FunctionNode<D: Decl> {
    pub decl: D,

    // --- Lifecycle flags ---
    pub finalized: bool,
    pub reachable: bool,
    pub needed: bool,
    pub analyzed: bool,
    pub lowered: bool,
    pub output: bool,
    pub asm_written: bool,

    // --- Local attributes (valid once `analyzed`) ---
    pub inlinable: bool,
    pub disregard_inline_limits: bool,
    pub self_insns: u32,
    pub externally_visible: bool,
    pub local: bool,
    pub redefined_extern_inline: bool,

    // --- Global attributes (valid once the inter-procedural pass has run) ---
    pub inlined_to: Option<FunctionId>,
    pub insns: u32,

    // --- Relational fields ---
    pub callers: Vec<EdgeId>,
    pub callees: Vec<EdgeId>,
    pub next_clone: Vec<FunctionId>,

    // --- Classification, consumed by the visibility resolver and synthesizer ---
    pub artificial: bool,
    pub static_constructor: bool,
    pub static_destructor: bool,
    pub comdat: bool,
    pub public: bool,
    /// Whether a body is currently attached (distinct from `finalized`: a body can be
    /// dropped post-expansion, or vanish before analysis due to a late weak alias).
    pub body_present: bool,
}

impl<D: Decl> FunctionNode<D> {
    pub fn new(decl: D) -> Self {
        Self {
            decl,
            finalized: false,
            reachable: false,
            needed: false,
            analyzed: false,
            lowered: false,
            output: false,
            asm_written: false,
            inlinable: false,
            disregard_inline_limits: false,
            self_insns: 0,
            externally_visible: false,
            local: false,
            redefined_extern_inline: false,
            inlined_to: None,
            insns: 0,
            callers: Vec::new(),
            callees: Vec::new(),
            next_clone: Vec::new(),
            artificial: false,
            static_constructor: false,
            static_destructor: false,
            comdat: false,
            public: false,
            body_present: false,
        }
    }

    /// Zeroes local/global analysis state while keeping identity, lifecycle flags the reset
    /// caller is responsible for, and relational fields the caller clears separately.
    ///
    /// Mirrors the subset of `reset_node` that lives on the node itself; clearing
    /// `callees`/worklist membership is the store/driver's responsibility since it touches
    /// shared structures.
    pub(crate) fn reset_analysis_state(&mut self) {
        self.analyzed = false;
        self.lowered = false;
        self.inlinable = false;
        self.disregard_inline_limits = false;
        self.self_insns = 0;
        self.externally_visible = false;
        self.local = false;
        self.inlined_to = None;
        self.insns = 0;
    }
}
