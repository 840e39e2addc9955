//! [`TextFrontEnd`]: the toy [`cgraphc::FrontEnd`] implementation this crate wires the parser
//! ([`crate::parser`]) into, purely for manual inspection and end-to-end testing of the
//! library — not a real language front-end.

use std::cell::RefCell;
use std::collections::HashMap;

use ahash::AHashMap;
use cgraphc::{CallShape, Context, Expr, ExprHookOutcome, FrontEnd, FunctionBody, IceError, Statement};

use crate::parser::RefAtom;

/// An interned declaration handle: functions and variables share one symbol namespace, as in
/// `cgraphc`'s data model.
pub type Sym = u32;

/// Interns declaration names to stable [`Sym`] handles, so the rest of the crate never has to
/// compare strings.
#[derive(Default)]
pub struct Symbols {
    by_name: AHashMap<String, Sym>,
    names: Vec<String>,
}

impl Symbols {
    pub fn intern(&mut self, name: &str) -> Sym {
        if let Some(&sym) = self.by_name.get(name) {
            return sym;
        }
        let sym = self.names.len() as Sym;
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), sym);
        sym
    }

    pub fn name(&self, sym: Sym) -> &str {
        self.names
            .get(sym as usize)
            .map(String::as_str)
            .unwrap_or("<synthesized>")
    }
}

/// The toy front-end: holds interned names, parsed bodies/initializers, and every knob the
/// CLI's flags expose (`preserve_body`, `has_ctor_dtor_sections`).
#[derive(Default)]
pub struct TextFrontEnd {
    pub symbols: RefCell<Symbols>,
    bodies: RefCell<HashMap<Sym, FunctionBody<Sym, Sym>>>,
    initializers: RefCell<HashMap<Sym, Expr<Sym>>>,
    preserve: RefCell<std::collections::HashSet<Sym>>,
    has_ctor_dtor_sections: bool,
    expanded: RefCell<Vec<Sym>>,
    priority_tagged: RefCell<Vec<(Sym, u32)>>,
    collection_points: RefCell<u32>,
    next_stmt_handle: RefCell<Sym>,
    next_synthesized: RefCell<Sym>,
}

impl TextFrontEnd {
    pub fn new(has_ctor_dtor_sections: bool) -> Self {
        Self {
            next_synthesized: RefCell::new(1 << 30),
            has_ctor_dtor_sections,
            ..Self::default()
        }
    }

    pub fn intern(&self, name: &str) -> Sym {
        self.symbols.borrow_mut().intern(name)
    }

    pub fn name_of(&self, sym: Sym) -> String {
        self.symbols.borrow().name(sym).to_string()
    }

    pub fn set_body(&self, decl: Sym, body: FunctionBody<Sym, Sym>) {
        self.bodies.borrow_mut().insert(decl, body);
    }

    pub fn set_initializer(&self, decl: Sym, init: Expr<Sym>) {
        self.initializers.borrow_mut().insert(decl, init);
    }

    pub fn set_preserve_body(&self, decl: Sym) {
        self.preserve.borrow_mut().insert(decl);
    }

    pub fn expanded(&self) -> Vec<Sym> {
        self.expanded.borrow().clone()
    }

    pub fn priority_tagged(&self) -> Vec<(Sym, u32)> {
        self.priority_tagged.borrow().clone()
    }

    pub fn collection_points(&self) -> u32 {
        *self.collection_points.borrow()
    }

    fn fresh_stmt_handle(&self) -> Sym {
        let mut next = self.next_stmt_handle.borrow_mut();
        let handle = *next;
        *next += 1;
        handle
    }

    /// Lowers a parsed statement list into the [`cgraphc`] front-end's owned [`Expr`] shape
    /// plus resolvable [`Statement`]s, interning every referenced name along the way.
    pub fn lower_stmts(&self, stmts: &[crate::parser::StmtSrc]) -> FunctionBody<Sym, Sym> {
        let mut statements = Vec::new();
        let mut local_statics = Vec::new();
        for stmt in stmts {
            match stmt {
                crate::parser::StmtSrc::Call {
                    callee,
                    count,
                    loop_depth,
                } => {
                    let callee = self.intern(callee);
                    statements.push(Statement {
                        handle: self.fresh_stmt_handle(),
                        count: *count,
                        loop_depth: *loop_depth,
                        call: Some(CallShape {
                            callee: Some(callee),
                            args: vec![],
                        }),
                        assign_target: None,
                        body: Expr::Leaf,
                    });
                }
                crate::parser::StmtSrc::Refs(atoms) => {
                    let body = self.lower_refs(atoms);
                    statements.push(Statement {
                        handle: self.fresh_stmt_handle(),
                        count: 1,
                        loop_depth: 0,
                        call: None,
                        assign_target: None,
                        body,
                    });
                }
                crate::parser::StmtSrc::Static { name, init } => {
                    let decl = self.intern(name);
                    local_statics.push((decl, self.lower_atom(init)));
                }
            }
        }
        FunctionBody {
            statements,
            local_statics,
        }
    }

    fn lower_refs(&self, atoms: &[RefAtom]) -> Expr<Sym> {
        Expr::Seq(atoms.iter().map(|atom| self.lower_atom(atom)).collect())
    }

    /// Lowers a single reference atom. `pub(crate)` rather than private since
    /// [`install_and_finalize`] needs it for variable initializers, which are a single atom
    /// rather than a statement list.
    pub(crate) fn lower_atom(&self, atom: &RefAtom) -> Expr<Sym> {
        match atom {
            RefAtom::Addr(name) => Expr::FunctionAddr(self.intern(name)),
            RefAtom::Ref(name) => Expr::VariableRef(self.intern(name)),
        }
    }
}

impl FrontEnd for TextFrontEnd {
    type D = Sym;
    type Stmt = Sym;

    fn analyze_expr(&self, _tag: cgraphc::front_end::UnknownTag) -> ExprHookOutcome<Self::D> {
        // The toy DSL never emits `Expr::Unknown`; nothing to delegate.
        ExprHookOutcome::Handled
    }

    fn expand_function(&self, decl: Self::D) -> Result<(), IceError> {
        self.expanded.borrow_mut().push(decl);
        Ok(())
    }

    fn disregard_inline_limits(&self, _decl: Self::D) -> bool {
        false
    }

    fn lower_function(&self, _decl: Self::D) -> Result<(), IceError> {
        Ok(())
    }

    fn function_body(&self, decl: Self::D) -> Option<FunctionBody<Self::D, Self::Stmt>> {
        self.bodies.borrow().get(&decl).cloned()
    }

    fn variable_initializer(&self, decl: Self::D) -> Option<Expr<Self::D>> {
        self.initializers.borrow().get(&decl).cloned()
    }

    fn inlinable(&self, _decl: Self::D) -> bool {
        // The toy DSL has no real cost model; treat every leaf-ish function as a plausible
        // inline candidate and let `self_insns` (statement count) do the rest.
        true
    }

    fn estimate_size(&self, decl: Self::D) -> u32 {
        self.bodies
            .borrow()
            .get(&decl)
            .map(|b| b.statements.len() as u32 + 1)
            .unwrap_or(1)
    }

    fn preserve_body(&self, decl: Self::D) -> bool {
        self.preserve.borrow().contains(&decl)
    }

    fn has_ctor_dtor_sections(&self) -> bool {
        self.has_ctor_dtor_sections
    }

    fn collection_point(&self) {
        *self.collection_points.borrow_mut() += 1;
    }

    fn synthesize_cdtor_decl(&self, _name: &str) -> Self::D {
        let mut next = self.next_synthesized.borrow_mut();
        let decl = *next;
        *next += 1;
        decl
    }

    fn install_synthesized_body(&self, decl: Self::D, body: FunctionBody<Self::D, Self::Stmt>) {
        self.bodies.borrow_mut().insert(decl, body);
    }

    fn emit_priority_tagged_reference(&self, decl: Self::D, priority: u32) {
        self.priority_tagged.borrow_mut().push((decl, priority));
    }
}

/// Installs every item of a parsed [`crate::parser::Program`] into a [`Context`] in source
/// order: function/variable flags are set before `finalize_*` runs (so the root check inside
/// `finalize_function`/`finalize_variable` sees them), mirroring the pattern `cgraphc`'s own
/// end-to-end tests use.
pub fn install_and_finalize(
    ctx: &mut Context<TextFrontEnd>,
    program: &crate::parser::Program,
) -> Result<(), IceError> {
    use crate::parser::Item;

    for item in &program.items {
        match item {
            Item::Function { name, flags, stmts } => {
                let decl = ctx.front_end().intern(name);
                let body = ctx.front_end().lower_stmts(stmts);
                ctx.front_end().set_body(decl, body);
                let id = ctx.store_mut().function_node(decl);
                {
                    let node = ctx.store_mut().function_mut(id);
                    node.public = flags.public;
                    node.comdat = flags.comdat;
                    node.disregard_inline_limits = flags.disregard_inline_limits;
                }
                cgraphc::driver::finalize_function(ctx, decl, false)?;
            }
            Item::Variable { name, flags, init } => {
                let decl = ctx.front_end().intern(name);
                if let Some(atom) = init {
                    let expr = ctx.front_end().lower_atom(atom);
                    ctx.front_end().set_initializer(decl, expr);
                }
                let id = ctx.store_mut().variable_node(decl);
                {
                    let node = ctx.store_mut().variable_mut(id);
                    node.public = flags.public;
                    node.comdat = flags.comdat;
                    node.force_output = flags.force_output;
                }
                cgraphc::driver::finalize_variable(ctx, decl)?;
            }
            Item::Ctor { priority, stmts } => {
                let body = ctx.front_end().lower_stmts(stmts);
                cgraphc::synthesizer::build_static_cdtor(ctx, 'I', body, *priority)?;
            }
            Item::Dtor { priority, stmts } => {
                let body = ctx.front_end().lower_stmts(stmts);
                cgraphc::synthesizer::build_static_cdtor(ctx, 'D', body, *priority)?;
            }
        }
    }
    Ok(())
}
