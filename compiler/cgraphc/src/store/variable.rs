use crate::front_end::Decl;

/// One variable declaration's record in the callgraph.
///
/// Simpler than [`crate::store::FunctionNode`]: variables carry no outbound call edges, only
/// a neededness/reachability lifecycle and the visibility attributes the resolver assigns.
#[derive(Debug, Clone)]
pub struct VariableNode<D: Decl> {
    pub decl: D,

    pub finalized: bool,
    pub needed: bool,
    pub analyzed: bool,
    pub externally_visible: bool,
    pub alias: bool,
    pub force_output: bool,

    pub comdat: bool,
    pub public: bool,
    /// Whether an initializer is currently attached.
    pub body_present: bool,
}

impl<D: Decl> VariableNode<D> {
    pub fn new(decl: D) -> Self {
        Self {
            decl,
            finalized: false,
            needed: false,
            analyzed: false,
            externally_visible: false,
            alias: false,
            force_output: false,
            comdat: false,
            public: false,
            body_present: false,
        }
    }
}
