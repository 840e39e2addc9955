//! A small in-memory [`FrontEnd`] implementation shared by unit tests across this crate.
//!
//! Not a front-end any real caller would use — it exists purely so each module's test block
//! can build a [`crate::context::Context`] without reimplementing the capability set.

#![cfg(test)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::IceError;
use crate::front_end::{Expr, ExprHookOutcome, FrontEnd, FunctionBody, UnknownTag};

#[derive(Default)]
pub struct TestFrontEnd {
    bodies: RefCell<HashMap<u32, FunctionBody<u32, u32>>>,
    initializers: RefCell<HashMap<u32, Expr<u32>>>,
    inlinable: RefCell<HashMap<u32, bool>>,
    sizes: RefCell<HashMap<u32, u32>>,
    lowered: RefCell<HashSet<u32>>,
    expanded: RefCell<Vec<u32>>,
    preserve: RefCell<HashSet<u32>>,
    disregard: RefCell<HashSet<u32>>,
    fail_expand: RefCell<HashSet<u32>>,
    skip_asm_write: RefCell<HashSet<u32>>,
    has_ctor_dtor_sections: RefCell<bool>,
    collection_points: RefCell<u32>,
    next_synthesized_decl: RefCell<u32>,
    priority_tagged: RefCell<Vec<(u32, u32)>>,
}

impl TestFrontEnd {
    pub fn new() -> Self {
        Self {
            next_synthesized_decl: RefCell::new(1_000_000),
            ..Self::default()
        }
    }

    pub fn priority_tagged(&self) -> Vec<(u32, u32)> {
        self.priority_tagged.borrow().clone()
    }

    pub fn set_body(&self, decl: u32, body: FunctionBody<u32, u32>) {
        self.bodies.borrow_mut().insert(decl, body);
    }

    pub fn clear_body(&self, decl: u32) {
        self.bodies.borrow_mut().remove(&decl);
    }

    pub fn set_initializer(&self, decl: u32, init: Expr<u32>) {
        self.initializers.borrow_mut().insert(decl, init);
    }

    pub fn set_inlinable(&self, decl: u32, inlinable: bool) {
        self.inlinable.borrow_mut().insert(decl, inlinable);
    }

    pub fn set_size(&self, decl: u32, insns: u32) {
        self.sizes.borrow_mut().insert(decl, insns);
    }

    pub fn set_disregard_inline_limits(&self, decl: u32) {
        self.disregard.borrow_mut().insert(decl);
    }

    pub fn set_preserve_body(&self, decl: u32) {
        self.preserve.borrow_mut().insert(decl);
    }

    pub fn set_has_ctor_dtor_sections(&self, value: bool) {
        *self.has_ctor_dtor_sections.borrow_mut() = value;
    }

    pub fn fail_expand_for(&self, decl: u32) {
        self.fail_expand.borrow_mut().insert(decl);
    }

    /// Simulates a back-end that silently no-ops instead of producing code.
    pub fn skip_asm_write_for(&self, decl: u32) {
        self.skip_asm_write.borrow_mut().insert(decl);
    }

    pub fn expanded(&self) -> Vec<u32> {
        self.expanded.borrow().clone()
    }

    pub fn is_lowered(&self, decl: u32) -> bool {
        self.lowered.borrow().contains(&decl)
    }

    pub fn collection_points(&self) -> u32 {
        *self.collection_points.borrow()
    }
}

impl FrontEnd for TestFrontEnd {
    type D = u32;
    type Stmt = u32;

    fn analyze_expr(&self, _tag: UnknownTag) -> ExprHookOutcome<Self::D> {
        ExprHookOutcome::Handled
    }

    fn expand_function(&self, decl: Self::D) -> Result<(), IceError> {
        if self.fail_expand.borrow().contains(&decl) {
            return Err(IceError::FrontEnd(format!("expand failed for {decl}")));
        }
        self.expanded.borrow_mut().push(decl);
        Ok(())
    }

    fn asm_written(&self, decl: Self::D) -> bool {
        !self.skip_asm_write.borrow().contains(&decl)
    }

    fn disregard_inline_limits(&self, decl: Self::D) -> bool {
        self.disregard.borrow().contains(&decl)
    }

    fn lower_function(&self, decl: Self::D) -> Result<(), IceError> {
        self.lowered.borrow_mut().insert(decl);
        Ok(())
    }

    fn function_body(&self, decl: Self::D) -> Option<FunctionBody<Self::D, Self::Stmt>> {
        self.bodies.borrow().get(&decl).cloned()
    }

    fn variable_initializer(&self, decl: Self::D) -> Option<Expr<Self::D>> {
        self.initializers.borrow().get(&decl).cloned()
    }

    fn inlinable(&self, decl: Self::D) -> bool {
        self.inlinable.borrow().get(&decl).copied().unwrap_or(true)
    }

    fn estimate_size(&self, decl: Self::D) -> u32 {
        self.sizes.borrow().get(&decl).copied().unwrap_or(1)
    }

    fn preserve_body(&self, decl: Self::D) -> bool {
        self.preserve.borrow().contains(&decl)
    }

    fn has_ctor_dtor_sections(&self) -> bool {
        *self.has_ctor_dtor_sections.borrow()
    }

    fn collection_point(&self) {
        *self.collection_points.borrow_mut() += 1;
    }

    fn synthesize_cdtor_decl(&self, _name: &str) -> Self::D {
        let mut next = self.next_synthesized_decl.borrow_mut();
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
