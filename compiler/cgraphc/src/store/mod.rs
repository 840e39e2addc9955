//! The callgraph store holds the node/edge data model, the intern table keyed by
//! declaration identity, and insertion/removal primitives.
//!
//! Functions are nodes in a [`petgraph::stable_graph::StableDiGraph`] — tombstoning removal
//! gives O(1) deletion with indices that stay valid for every surviving node, which is the
//! arena-allocated-nodes-addressed-by-stable-indices property this store is built around.
//! Variables carry no edges, so they live in a simpler tombstoning slab.
//! `callers`/`callees` are *also* tracked as explicit insertion-ordered `Vec<EdgeId>` on each
//! node rather than relying on the graph's own
//! edge-list order, which petgraph does not guarantee to be insertion order.

pub mod edge;
pub mod function;
pub mod variable;

use ahash::AHashMap;
use petgraph::stable_graph::StableDiGraph;

pub use edge::{CallEdge, InlineFailedReason};
pub use function::FunctionNode;
pub use variable::VariableNode;

use crate::error::IceError;
use crate::front_end::FrontEnd;

/// Identity of a function node. Stable across removal of *other* nodes (petgraph's
/// `StableDiGraph` tombstones rather than shifting indices).
pub type FunctionId = petgraph::graph::NodeIndex<u32>;
/// Identity of a call edge.
pub type EdgeId = petgraph::graph::EdgeIndex<u32>;
/// Identity of a variable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(u32);

/// A node-kind-agnostic reference, used where the walker or driver needs to mark "whatever
/// this declaration resolves to" without first knowing if it's a function or a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Function(FunctionId),
    Variable(VariableId),
}

/// The callgraph store: functions-as-a-graph, variables-as-a-slab, and the two
/// declaration-to-id intern maps ("intern table keyed by declaration identity").
pub struct CallgraphStore<F: FrontEnd> {
    functions: StableDiGraph<FunctionNode<F::D>, CallEdge<F::Stmt>, u32>,
    function_by_decl: AHashMap<F::D, FunctionId>,

    variables: Vec<Option<VariableNode<F::D>>>,
    variable_by_decl: AHashMap<F::D, VariableId>,

    /// Insertion order of every function node ever created, for deterministic full-graph
    /// iteration ("iteration over all nodes in insertion order").
    function_insertion_order: Vec<FunctionId>,
    variable_insertion_order: Vec<VariableId>,
}

impl<F: FrontEnd> Default for CallgraphStore<F> {
    fn default() -> Self {
        Self {
            functions: StableDiGraph::default(),
            function_by_decl: AHashMap::default(),
            variables: Vec::new(),
            variable_by_decl: AHashMap::default(),
            function_insertion_order: Vec::new(),
            variable_insertion_order: Vec::new(),
        }
    }
}

impl<F: FrontEnd> CallgraphStore<F> {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Functions -----

    /// Look up (interning on first use) the function node for `decl`.
    ///
    /// Intern-table bijection: repeated calls with an equal `decl` return the same id.
    pub fn function_node(&mut self, decl: F::D) -> FunctionId {
        if let Some(id) = self.function_by_decl.get(&decl) {
            return *id;
        }
        let id = self.functions.add_node(FunctionNode::new(decl));
        self.function_by_decl.insert(decl, id);
        self.function_insertion_order.push(id);
        id
    }

    /// Look up an already-interned function node without creating one.
    pub fn find_function(&self, decl: F::D) -> Option<FunctionId> {
        self.function_by_decl.get(&decl).copied()
    }

    pub fn function(&self, id: FunctionId) -> &FunctionNode<F::D> {
        &self.functions[id]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionNode<F::D> {
        &mut self.functions[id]
    }

    pub fn try_function(&self, id: FunctionId) -> Option<&FunctionNode<F::D>> {
        self.functions.node_weight(id)
    }

    /// All function ids, in insertion order. Tombstoned (removed) ids are skipped.
    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> + '_ {
        self.function_insertion_order
            .iter()
            .copied()
            .filter(move |id| self.functions.contains_node(*id))
    }

    pub fn function_count(&self) -> usize {
        self.functions.node_count()
    }

    /// Total number of function ids ever interned (alive or tombstoned). Used by the unit
    /// driver as the `first_analyzed` resumption cursor.
    pub fn function_insertion_len(&self) -> usize {
        self.function_insertion_order.len()
    }

    /// Function ids interned since insertion-order index `start`, in insertion order,
    /// skipping tombstoned ones. Used by the reclamation sweep to consider only
    /// nodes introduced since the last `analyze_compilation_unit` call.
    pub fn function_ids_from(&self, start: usize) -> impl Iterator<Item = FunctionId> + '_ {
        self.function_insertion_order[start.min(self.function_insertion_order.len())..]
            .iter()
            .copied()
            .filter(move |id| self.functions.contains_node(*id))
    }

    /// The underlying graph, for algorithms (e.g. the emission scheduler's postorder)
    /// that need a `petgraph` traversal primitive rather than the store's own accessors.
    pub fn graph(&self) -> &StableDiGraph<FunctionNode<F::D>, CallEdge<F::Stmt>, u32> {
        &self.functions
    }

    /// Create a call edge `caller -> callee`, appending it to both nodes'
    /// insertion-ordered edge lists.
    pub fn create_edge(
        &mut self,
        caller: FunctionId,
        callee: FunctionId,
        stmt: F::Stmt,
        count: u64,
        loop_depth: u32,
    ) -> EdgeId {
        let edge = CallEdge::new(stmt, count, loop_depth);
        let edge_id = self.functions.add_edge(caller, callee, edge);
        self.functions[caller].callees.push(edge_id);
        self.functions[callee].callers.push(edge_id);
        edge_id
    }

    pub fn edge(&self, id: EdgeId) -> &CallEdge<F::Stmt> {
        &self.functions[id]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut CallEdge<F::Stmt> {
        &mut self.functions[id]
    }

    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(FunctionId, FunctionId)> {
        self.functions.edge_endpoints(id)
    }

    /// Remove every outbound edge of `node` ("clear any stale callees").
    pub fn remove_callees(&mut self, node: FunctionId) {
        let callees = std::mem::take(&mut self.functions[node].callees);
        for edge_id in callees {
            if let Some((_, callee)) = self.functions.edge_endpoints(edge_id) {
                self.functions[callee].callers.retain(|e| *e != edge_id);
            }
            self.functions.remove_edge(edge_id);
        }
    }

    /// Remove a function node: unlinks from all caller/callee edge lists, removes it from
    /// the intern table, and detaches clones.
    pub fn remove_function(&mut self, node: FunctionId) -> Result<(), IceError> {
        let decl = self.functions[node].decl;
        self.remove_callees(node);
        let callers = std::mem::take(&mut self.functions[node].callers);
        for edge_id in callers {
            if let Some((caller, _)) = self.functions.edge_endpoints(edge_id) {
                self.functions[caller].callees.retain(|e| *e != edge_id);
            }
            self.functions.remove_edge(edge_id);
        }
        for clone in std::mem::take(&mut self.functions[node].next_clone) {
            if let Some(clone_node) = self.functions.node_weight_mut(clone) {
                clone_node.inlined_to = None;
            }
        }
        self.functions.remove_node(node);
        self.function_by_decl.remove(&decl);
        Ok(())
    }

    /// Idempotent: enqueues `node` onto the needed-worklist on first call. `needed` implies
    /// `reachable`.
    pub fn mark_needed(&mut self, node: FunctionId, queue: &mut crate::worklist::Worklist) {
        if self.functions[node].needed {
            return;
        }
        self.functions[node].needed = true;
        self.mark_reachable_unchecked(node, queue);
        queue.push_needed(NodeRef::Function(node));
    }

    /// Idempotent; forbidden once `global_info_ready` — the caller is responsible for that
    /// check (the store itself has no notion of the latch; see [`crate::driver::Context`]).
    pub fn mark_reachable(&mut self, node: FunctionId, queue: &mut crate::worklist::Worklist) {
        self.mark_reachable_unchecked(node, queue);
    }

    fn mark_reachable_unchecked(&mut self, node: FunctionId, queue: &mut crate::worklist::Worklist) {
        if self.functions[node].reachable {
            return;
        }
        self.functions[node].reachable = true;
        queue.push_reachable(node);
    }

    // ----- Variables -----

    pub fn variable_node(&mut self, decl: F::D) -> VariableId {
        if let Some(id) = self.variable_by_decl.get(&decl) {
            return *id;
        }
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(Some(VariableNode::new(decl)));
        self.variable_by_decl.insert(decl, id);
        self.variable_insertion_order.push(id);
        id
    }

    pub fn find_variable(&self, decl: F::D) -> Option<VariableId> {
        self.variable_by_decl.get(&decl).copied()
    }

    pub fn variable(&self, id: VariableId) -> &VariableNode<F::D> {
        self.variables[id.0 as usize]
            .as_ref()
            .expect("VariableId from a live lookup must index a live slot")
    }

    pub fn variable_mut(&mut self, id: VariableId) -> &mut VariableNode<F::D> {
        self.variables[id.0 as usize]
            .as_mut()
            .expect("VariableId from a live lookup must index a live slot")
    }

    pub fn try_variable(&self, id: VariableId) -> Option<&VariableNode<F::D>> {
        self.variables[id.0 as usize].as_ref()
    }

    pub fn variable_ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.variable_insertion_order
            .iter()
            .copied()
            .filter(move |id| self.variables[id.0 as usize].is_some())
    }

    pub fn variable_count(&self) -> usize {
        self.variable_ids().count()
    }

    pub fn remove_variable(&mut self, node: VariableId) {
        let decl = self.variable(node).decl;
        self.variables[node.0 as usize] = None;
        self.variable_by_decl.remove(&decl);
    }

    pub fn mark_variable_needed(
        &mut self,
        node: VariableId,
        queue: &mut crate::worklist::Worklist,
    ) {
        let var = &mut self.variables[node.0 as usize]
            .as_mut()
            .expect("VariableId from a live lookup must index a live slot");
        if var.needed {
            return;
        }
        var.needed = true;
        queue.push_variable_unanalyzed(node);
    }
}
