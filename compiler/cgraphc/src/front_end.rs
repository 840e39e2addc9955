//! The capability set a front-end must implement to drive [`crate::Context`].
//!
//! The distilled design calls this set of hooks "callbacks"; we externalize it as a single
//! trait (`FrontEnd`) plus a small owned expression tree (`Expr`) so that the core never
//! depends on a concrete tree representation. Front-ends lower their own AST/IR into `Expr`
//! once per body; anything that doesn't fit the handful of shapes the walker understands
//! natively becomes an `Expr::Unknown` tag that round-trips through [`FrontEnd::analyze_expr`].

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::IceError;

/// A stable, hashable identity for a declaration as seen by the front-end.
///
/// Implemented automatically for any type that is `Copy + Eq + Hash + Debug`; front-ends
/// typically use an interned symbol id or a pointer-sized handle.
pub trait Decl: Copy + Eq + Hash + Debug {}
impl<T: Copy + Eq + Hash + Debug> Decl for T {}

/// A statement handle, used to key call edges. Kept distinct from [`Decl`] because the two
/// domains are conceptually disjoint even when a front-end happens to represent both as the
/// same primitive type.
pub trait StmtHandle: Copy + Eq + Hash + Debug {}
impl<T: Copy + Eq + Hash + Debug> StmtHandle for T {}

/// An opaque tag a front-end attaches to an `Expr` node it wants to classify itself. Resolved
/// back into front-end-specific state by [`FrontEnd::analyze_expr`]; the core never inspects
/// it beyond equality/identity for the walker's dedup set.
pub type UnknownTag = u64;

/// A front-end-agnostic expression/initializer tree, as consumed by the reference walker
/// and the edge builder.
///
/// Front-ends lower their native tree into this shape once; `Unknown` is the escape hatch for
/// anything that doesn't map onto the handful of reference-bearing shapes the walker needs to
/// recognize natively: unknown tree shapes delegate to `analyze_expr` rather than failing closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<D: Decl> {
    /// A reference to a static or external variable.
    VariableRef(D),
    /// A function-address expression (`&f`, or a descriptor form).
    FunctionAddr(D),
    /// A type or declaration sub-tree: pruned unconditionally, cannot contain references.
    TypeOrDecl,
    /// A leaf with no references and no children.
    Leaf,
    /// A generic interior node with children to walk in order.
    Seq(Vec<Expr<D>>),
    /// A node the front-end wants to classify itself.
    Unknown(UnknownTag),
}

/// What a front-end's [`FrontEnd::analyze_expr`] hook decided about an `Unknown` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprHookOutcome<D: Decl> {
    /// The front-end fully handled this node (e.g. it marked everything needed itself via a
    /// language-specific side channel); the walker does not recurse further into it.
    Handled,
    /// The front-end lowered the unknown shape into sub-expressions the walker should now
    /// walk generically (the equivalent of `walk_subtrees = true`).
    WalkFurther(Vec<Expr<D>>),
}

/// One statement inside a lowered function body's control-flow graph, as seen by the edge
/// builder.
#[derive(Debug, Clone)]
pub struct Statement<D: Decl, S: StmtHandle> {
    pub handle: S,
    /// The enclosing basic block's execution-count estimate.
    pub count: u64,
    pub loop_depth: u32,
    /// Present when this statement is a call; `callee` is `None` when the callee could not
    /// be statically resolved (e.g. an indirect call through a function pointer).
    pub call: Option<CallShape<D>>,
    /// Present when this statement assigns its result (directly, or as a call's return
    /// value) to a location that must itself be walked for references.
    pub assign_target: Option<Expr<D>>,
    /// The statement's full tree, walked generically whenever `call` is `None`.
    pub body: Expr<D>,
}

#[derive(Debug, Clone)]
pub struct CallShape<D: Decl> {
    pub callee: Option<D>,
    pub args: Vec<Expr<D>>,
}

/// A lowered function body: its statements in block order, plus the initializers of any
/// locally-declared static variables (walks initializers of locally-declared static
/// variables").
#[derive(Debug, Clone, Default)]
pub struct FunctionBody<D: Decl, S: StmtHandle> {
    pub statements: Vec<Statement<D, S>>,
    pub local_statics: Vec<(D, Expr<D>)>,
}

/// The capability set a front-end supplies to [`crate::Context`].
pub trait FrontEnd {
    /// The front-end's declaration handle type. Functions and variables share one handle
    /// domain; callers are expected to keep the two disjoint.
    type D: Decl;
    /// The front-end's statement handle type, used to key call edges.
    type Stmt: StmtHandle;

    /// Lower/handle an `Expr::Unknown` node the walker doesn't understand generically.
    fn analyze_expr(&self, tag: UnknownTag) -> ExprHookOutcome<Self::D>;

    /// Produce machine code for a lowered, analyzed function. Invoked by the scheduler
    /// once a node's dependency information is believed final.
    fn expand_function(&self, decl: Self::D) -> Result<(), IceError>;

    /// Whether the back-end actually produced code for `decl`, checked immediately after
    /// `expand_function` returns ("assert `asm_written` afterward"). Default `true`: a hook
    /// returning `Ok(())` is assumed to have done its job unless a front-end tracks this
    /// explicitly (e.g. to simulate a back-end that silently no-ops).
    fn asm_written(&self, decl: Self::D) -> bool {
        let _ = decl;
        true
    }

    /// Whether this declaration should be exempted from inline-size limits.
    fn disregard_inline_limits(&self, decl: Self::D) -> bool;

    /// Idempotent body-lowering trigger (a GENERIC -> GIMPLE-style transform).
    /// Returning `Ok(())` when already lowered is expected and not an error.
    fn lower_function(&self, decl: Self::D) -> Result<(), IceError>;

    /// Fetch the (already-lowered) body of a function, for the edge builder to walk.
    fn function_body(&self, decl: Self::D) -> Option<FunctionBody<Self::D, Self::Stmt>>;

    /// Fetch a variable's initializer, if any, for the variable analyzer to walk.
    fn variable_initializer(&self, decl: Self::D) -> Option<Expr<Self::D>>;

    /// The inliner oracle's verdict on whether `decl` is locally inlinable.
    fn inlinable(&self, decl: Self::D) -> bool;

    /// The cost estimator's verdict on `decl`'s own instruction count.
    fn estimate_size(&self, decl: Self::D) -> u32;

    /// Whether `decl`'s body storage must survive past expansion (debug dumping, or because
    /// inline clones still reference it). Defaults to `false`.
    fn preserve_body(&self, decl: Self::D) -> bool {
        let _ = decl;
        false
    }

    /// Whether the target supports native ctor/dtor sections. When `false`, a
    /// synthesized static constructor/destructor is left publicly visible instead, so the
    /// runtime can find it by name.
    fn has_ctor_dtor_sections(&self) -> bool {
        false
    }

    /// A safe point for the externally-managed tree-IR collector to run ("Suspension
    /// points for GC"). Invoked at the end of `finalize_function` when `nested` is `false`,
    /// and at the end of `analyze_compilation_unit`. Default is a no-op; a front-end that owns
    /// a real collector overrides it to actually run one.
    fn collection_point(&self) {}

    /// Mint a fresh declaration identity for a synthesized static constructor/destructor
    /// named `name` (the `"<which>_<counter>"` scheme the synthesizer builds).
    fn synthesize_cdtor_decl(&self, name: &str) -> Self::D;

    /// Attach a caller-provided body to a synthesized declaration, so a later
    /// [`FrontEnd::function_body`] call returns it ("attaches a caller-provided
    /// statement body").
    fn install_synthesized_body(&self, decl: Self::D, body: FunctionBody<Self::D, Self::Stmt>);

    /// Emit a priority-tagged reference into the target's native ctor/dtor section, for
    /// targets where [`FrontEnd::has_ctor_dtor_sections`] returns `true`. No-op default for
    /// targets without native section support, where the synthesizer instead leaves the
    /// symbol publicly visible.
    fn emit_priority_tagged_reference(&self, decl: Self::D, priority: u32) {
        let _ = (decl, priority);
    }
}
