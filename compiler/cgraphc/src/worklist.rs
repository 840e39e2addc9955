//! The two function worklists plus the variable analyzer's queue.
//!
//! Realized as explicit `VecDeque`s rather than intrusive `next_needed`-style
//! pointer — the redesign the Design Notes call for, trading one singly-linked field per
//! node for ordinary queue ownership.

use std::collections::VecDeque;

use crate::store::{FunctionId, NodeRef, VariableId};

#[derive(Default)]
pub struct Worklist {
    reachable_queue: VecDeque<FunctionId>,
    /// Every declaration ever marked needed, in the order it happened. Not drained by a
    /// processing loop (neededness is a protection flag the reclamation/visibility passes
    /// consult directly) but kept for introspection and for the verifier's bookkeeping.
    needed_log: Vec<NodeRef>,
    unanalyzed_variables: VecDeque<VariableId>,
    /// Streaming mode's deferred-emission queue: a node lands here once it is needed
    /// and analyzed, and is drained only at a top-level (non-nested) `finalize_function` call,
    /// since GC cannot run — and therefore neither can emission — mid-nested-call.
    pending_emission: VecDeque<FunctionId>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reachable(&mut self, id: FunctionId) {
        self.reachable_queue.push_back(id);
    }

    pub fn pop_reachable(&mut self) -> Option<FunctionId> {
        self.reachable_queue.pop_front()
    }

    pub fn reachable_is_empty(&self) -> bool {
        self.reachable_queue.is_empty()
    }

    pub fn push_needed(&mut self, node: NodeRef) {
        self.needed_log.push(node);
    }

    pub fn needed_log(&self) -> &[NodeRef] {
        &self.needed_log
    }

    pub fn push_variable_unanalyzed(&mut self, id: VariableId) {
        self.unanalyzed_variables.push_back(id);
    }

    pub fn pop_variable_unanalyzed(&mut self) -> Option<VariableId> {
        self.unanalyzed_variables.pop_front()
    }

    pub fn variable_queue_is_empty(&self) -> bool {
        self.unanalyzed_variables.is_empty()
    }

    pub fn push_pending_emission(&mut self, id: FunctionId) {
        self.pending_emission.push_back(id);
    }

    pub fn pop_pending_emission(&mut self) -> Option<FunctionId> {
        self.pending_emission.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachable_queue_is_fifo() {
        let mut wl = Worklist::new();
        let a = FunctionId::new(0);
        let b = FunctionId::new(1);
        wl.push_reachable(a);
        wl.push_reachable(b);
        assert_eq!(wl.pop_reachable(), Some(a));
        assert_eq!(wl.pop_reachable(), Some(b));
        assert_eq!(wl.pop_reachable(), None);
    }
}
