//! Dependency-graph representation of an operation trace.

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex as PetNodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::node::{NodeKind, NodeSignature, OpNode};
use crate::op::Trace;
use crate::wire::{Wire, WireId, WireRole};

/// Node id type for the circuit graph. Stable across removals.
pub type NodeId = PetNodeIndex<u32>;

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepKind {
    /// Consecutive operation instances on the same wire, in wire order.
    Target,
    /// A controlling node influencing a node on another wire.
    Control,
    /// Ordering constraint with no data flow, introduced by uncomputation.
    Antidep,
}

/// Dependency graph over the operations of a trace.
///
/// Nodes are `Init`/`Comp`/`Uncomp` operation instances; edges are `Target`
/// (per-wire chains), `Control` (cross-wire data dependencies) and `Antidep`
/// (ordering constraints from uncomputation). The graph is built once from a
/// trace and then rewritten by the uncomputation passes.
///
/// A `tails` index maps each wire to the last node of its target chain,
/// giving O(1) chain appends; it is kept consistent by [`append_to_chain`]
/// and [`remove_chain_node`].
///
/// [`append_to_chain`]: CircuitGraph::append_to_chain
/// [`remove_chain_node`]: CircuitGraph::remove_chain_node
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    /// The underlying graph.
    graph: StableDiGraph<OpNode, DepKind>,
    /// The declared wires, indexed by `WireId`.
    wires: Vec<Wire>,
    /// Map from wire to its init node.
    inits: FxHashMap<WireId, NodeId>,
    /// Map from wire to the current last node of its target chain.
    tails: FxHashMap<WireId, NodeId>,
    /// Next global creation index.
    next_seq: u32,
}

impl CircuitGraph {
    /// Build the dependency graph of a trace.
    ///
    /// Creates one `Init` node per wire and one `Comp` node per operation,
    /// with `Target` edges chaining same-wire operations in program order and
    /// `Control` edges from each controlling wire's latest node. Fails on the
    /// malformed-trace family of [`IrError`] without producing a graph.
    pub fn from_trace(trace: &Trace) -> IrResult<Self> {
        let mut cg = Self {
            graph: StableDiGraph::default(),
            wires: trace.wires().to_vec(),
            inits: FxHashMap::default(),
            tails: FxHashMap::default(),
            next_seq: 0,
        };

        for wire in trace.wires() {
            let seq = cg.alloc_seq();
            let node = OpNode::init(wire.id, wire.label(), seq, wire.role);
            let id = cg.graph.add_node(node);
            cg.inits.insert(wire.id, id);
            cg.tails.insert(wire.id, id);
        }

        for (op_index, op) in trace.ops().iter().enumerate() {
            let target = trace.wire(op.target).ok_or(IrError::UnknownWire {
                op_index,
                name: op.name.clone(),
                wire: op.target,
            })?;

            // Resolve control sources before touching the target chain.
            let mut seen: FxHashSet<WireId> = FxHashSet::default();
            let mut sources = vec![];
            for &ctrl in &op.controls {
                if ctrl == op.target {
                    return Err(IrError::SelfControl {
                        op_index,
                        name: op.name.clone(),
                        wire: ctrl,
                    });
                }
                if trace.wire(ctrl).is_none() {
                    return Err(IrError::UnknownWire {
                        op_index,
                        name: op.name.clone(),
                        wire: ctrl,
                    });
                }
                if !seen.insert(ctrl) {
                    continue;
                }
                let src = cg
                    .tails
                    .get(&ctrl)
                    .copied()
                    .ok_or(IrError::MissingControlSource { wire: ctrl })?;
                sources.push(src);
            }

            let tail_num = cg.node(cg.tails[&op.target]).map_or(0, |n| n.node_num);
            let seq = cg.alloc_seq();
            let node = OpNode::comp(
                op.target,
                target.label(),
                seq,
                tail_num + 1,
                op.name.clone(),
                target.role,
            );
            let id = cg.append_to_chain(node)?;
            for src in sources {
                cg.add_dep(src, id, DepKind::Control);
            }
        }

        Ok(cg)
    }

    /// Allocate the next global creation index.
    pub fn alloc_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get a node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&OpNode> {
        self.graph.node_weight(id)
    }

    /// Get a mutable node by id.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut OpNode> {
        self.graph.node_weight_mut(id)
    }

    /// The declared wires.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Look up a wire by id.
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.0 as usize)
    }

    /// Ids of all wires with the given role.
    pub fn wires_with_role(&self, role: WireRole) -> Vec<WireId> {
        self.wires
            .iter()
            .filter(|w| w.role == role)
            .map(|w| w.id)
            .collect()
    }

    /// The init node of a wire.
    pub fn init_node(&self, wire: WireId) -> Option<NodeId> {
        self.inits.get(&wire).copied()
    }

    /// The current last node of a wire's target chain.
    pub fn tail(&self, wire: WireId) -> Option<NodeId> {
        self.tails.get(&wire).copied()
    }

    /// Iterate over all node ids.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Total node count, init nodes included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of operation nodes (`Comp` and `Uncomp`).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.graph.node_count().saturating_sub(self.wires.len())
    }

    /// Number of `Uncomp` nodes.
    pub fn num_uncomp(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&id| self.graph[id].kind == NodeKind::Uncomp)
            .count()
    }

    /// Total edge count.
    #[inline]
    pub fn num_deps(&self) -> usize {
        self.graph.edge_count()
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Add a dependency edge.
    pub fn add_dep(&mut self, from: NodeId, to: NodeId, kind: DepKind) {
        self.graph.add_edge(from, to, kind);
    }

    /// Add a dependency edge unless an identical one already exists.
    pub fn add_dep_once(&mut self, from: NodeId, to: NodeId, kind: DepKind) {
        if !self.has_dep(from, to, kind) {
            self.graph.add_edge(from, to, kind);
        }
    }

    /// Check whether a dependency edge exists.
    pub fn has_dep(&self, from: NodeId, to: NodeId, kind: DepKind) -> bool {
        self.graph
            .edges_directed(from, Direction::Outgoing)
            .any(|e| e.target() == to && *e.weight() == kind)
    }

    /// Remove a dependency edge if present. Returns whether one was removed.
    pub fn remove_dep(&mut self, from: NodeId, to: NodeId, kind: DepKind) -> bool {
        let edge = self
            .graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.target() == to && *e.weight() == kind)
            .map(|e| e.id());
        match edge {
            Some(e) => {
                self.graph.remove_edge(e);
                true
            }
            None => false,
        }
    }

    /// The node following `id` on its wire's target chain.
    pub fn target_successor(&self, id: NodeId) -> Option<NodeId> {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .find(|e| *e.weight() == DepKind::Target)
            .map(|e| e.target())
    }

    /// The node preceding `id` on its wire's target chain.
    pub fn target_predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.graph
            .edges_directed(id, Direction::Incoming)
            .find(|e| *e.weight() == DepKind::Target)
            .map(|e| e.source())
    }

    /// Nodes influenced by `id` through `Control` edges.
    pub fn control_successors(&self, id: NodeId) -> Vec<NodeId> {
        self.deps_from(id, DepKind::Control)
    }

    /// Nodes influencing `id` through `Control` edges.
    pub fn control_predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.deps_into(id, DepKind::Control)
    }

    /// Sources of `Antidep` edges into `id`.
    pub fn antidep_sources(&self, id: NodeId) -> Vec<NodeId> {
        self.deps_into(id, DepKind::Antidep)
    }

    /// Targets of `Antidep` edges out of `id`.
    pub fn antidep_targets(&self, id: NodeId) -> Vec<NodeId> {
        self.deps_from(id, DepKind::Antidep)
    }

    /// Targets of all outgoing edges of the given kind.
    pub fn deps_from(&self, id: NodeId, kind: DepKind) -> Vec<NodeId> {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .filter(|e| *e.weight() == kind)
            .map(|e| e.target())
            .collect()
    }

    /// Sources of all incoming edges of the given kind.
    pub fn deps_into(&self, id: NodeId, kind: DepKind) -> Vec<NodeId> {
        self.graph
            .edges_directed(id, Direction::Incoming)
            .filter(|e| *e.weight() == kind)
            .map(|e| e.source())
            .collect()
    }

    /// Sources of all incoming edges regardless of kind. One entry per edge.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.graph
            .neighbors_directed(id, Direction::Incoming)
            .collect()
    }

    /// Targets of all outgoing edges regardless of kind. One entry per edge.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect()
    }

    // =========================================================================
    // Chain mutation
    // =========================================================================

    /// Append a node to its wire's target chain.
    ///
    /// Adds the node, a `Target` edge from the current chain tail, and moves
    /// the tail to the new node.
    pub fn append_to_chain(&mut self, node: OpNode) -> IrResult<NodeId> {
        let wire = node.wire;
        let tail = self
            .tails
            .get(&wire)
            .copied()
            .ok_or(IrError::MissingControlSource { wire })?;
        let id = self.graph.add_node(node);
        self.graph.add_edge(tail, id, DepKind::Target);
        self.tails.insert(wire, id);
        Ok(id)
    }

    /// Remove a node and every edge touching it, reconnecting its wire's
    /// target chain around the gap.
    ///
    /// Other node ids stay valid; only edges touching the removed node are
    /// invalidated. `Init` nodes cannot be removed.
    pub fn remove_chain_node(&mut self, id: NodeId) -> IrResult<OpNode> {
        let node = self.graph.node_weight(id).ok_or(IrError::InvalidNode)?;
        if node.is_init() {
            return Err(IrError::BrokenChain(format!(
                "cannot remove init node of wire {}",
                node.label
            )));
        }
        let wire = node.wire;
        let pred = self.target_predecessor(id).ok_or_else(|| {
            IrError::BrokenChain(format!("node {} has no chain predecessor", self.graph[id]))
        })?;
        let succ = self.target_successor(id);

        let removed = self
            .graph
            .remove_node(id)
            .expect("node existence checked above");

        match succ {
            Some(s) => {
                self.graph.add_edge(pred, s, DepKind::Target);
            }
            None => {
                self.tails.insert(wire, pred);
            }
        }
        Ok(removed)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Node ids in topological order, optionally reversed.
    ///
    /// The order is invalidated by any structural change; recompute after
    /// mutation. Fails with [`IrError::CyclicGraph`] on a cyclic graph.
    pub fn topological_order(&self, reverse: bool) -> IrResult<Vec<NodeId>> {
        let mut order =
            petgraph::algo::toposort(&self.graph, None).map_err(|_| IrError::CyclicGraph)?;
        if reverse {
            order.reverse();
        }
        Ok(order)
    }

    /// Find a dependency cycle, if any.
    ///
    /// The sole acyclicity oracle: returns the nodes of one cycle in order,
    /// or `None` for an acyclic graph. O(V + E).
    pub fn find_cycle(&self) -> Option<Vec<NodeId>> {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        let mut color: FxHashMap<NodeId, u8> = FxHashMap::default();

        for start in self.graph.node_indices() {
            if color.get(&start).copied().unwrap_or(WHITE) != WHITE {
                continue;
            }
            let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(
                start,
                self.graph.neighbors(start).collect::<Vec<_>>(),
                0,
            )];
            color.insert(start, GRAY);

            while !stack.is_empty() {
                let step = {
                    let (_, succs, cursor) = stack.last_mut().expect("stack is non-empty");
                    if *cursor < succs.len() {
                        let next = succs[*cursor];
                        *cursor += 1;
                        Some(next)
                    } else {
                        None
                    }
                };
                match step {
                    Some(next) => match color.get(&next).copied().unwrap_or(WHITE) {
                        WHITE => {
                            color.insert(next, GRAY);
                            let next_succs = self.graph.neighbors(next).collect::<Vec<_>>();
                            stack.push((next, next_succs, 0));
                        }
                        GRAY => {
                            // Back edge: the cycle is the stack suffix from
                            // the first occurrence of `next`.
                            let pos = stack
                                .iter()
                                .position(|(n, _, _)| *n == next)
                                .expect("gray node must be on the stack");
                            return Some(stack[pos..].iter().map(|(n, _, _)| *n).collect());
                        }
                        _ => {}
                    },
                    None => {
                        let (node, _, _) = stack.pop().expect("stack is non-empty");
                        color.insert(node, BLACK);
                    }
                }
            }
        }
        None
    }

    /// Check whether the graph currently contains a cycle.
    pub fn is_cyclic(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Structural identities of all nodes, for cross-graph matching.
    pub fn signatures(&self) -> FxHashSet<NodeSignature> {
        self.graph
            .node_indices()
            .map(|id| self.graph[id].signature())
            .collect()
    }

    /// Verify that every wire's `Target` edges form one simple chain from its
    /// init node to the recorded tail, with strictly increasing occurrence
    /// counters.
    pub fn verify_chains(&self) -> IrResult<()> {
        let mut on_chain: FxHashSet<NodeId> = FxHashSet::default();

        for wire in &self.wires {
            let init = self
                .inits
                .get(&wire.id)
                .copied()
                .ok_or_else(|| IrError::BrokenChain(format!("wire {} has no init node", wire)))?;
            let tail = self.tails[&wire.id];

            let mut current = init;
            let mut last_num = None;
            let max_steps = self.graph.node_count() + 1;
            let mut steps = 0;

            loop {
                let node = self.node(current).ok_or(IrError::InvalidNode)?;
                if node.wire != wire.id {
                    return Err(IrError::BrokenChain(format!(
                        "node {node} sits on the chain of wire {wire}"
                    )));
                }
                if let Some(prev) = last_num {
                    if node.node_num <= prev {
                        return Err(IrError::BrokenChain(format!(
                            "occurrence counter not increasing at {node}"
                        )));
                    }
                }
                last_num = Some(node.node_num);
                on_chain.insert(current);

                let outgoing = self.deps_from(current, DepKind::Target);
                if outgoing.len() > 1 {
                    return Err(IrError::BrokenChain(format!(
                        "node {node} has {} outgoing target edges",
                        outgoing.len()
                    )));
                }
                match outgoing.first() {
                    Some(&next) => current = next,
                    None => {
                        if current != tail {
                            return Err(IrError::BrokenChain(format!(
                                "chain of wire {wire} ends before its recorded tail"
                            )));
                        }
                        break;
                    }
                }
                steps += 1;
                if steps > max_steps {
                    return Err(IrError::BrokenChain(format!(
                        "chain of wire {wire} does not terminate"
                    )));
                }
            }
        }

        // Every node must sit on exactly the chain of its own wire.
        for id in self.graph.node_indices() {
            if !on_chain.contains(&id) {
                return Err(IrError::BrokenChain(format!(
                    "node {} is not reachable on any wire chain",
                    self.graph[id]
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::TraceOp;

    fn three_op_trace() -> Trace {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let q1 = trace.add_wire("q", 1, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cx", a0, q1));
        trace.push(TraceOp::controlled("cx", q1, a0));
        trace
    }

    #[test]
    fn test_build_counts() {
        let g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        assert_eq!(g.num_nodes(), 6);
        assert_eq!(g.num_ops(), 3);
        assert_eq!(g.num_uncomp(), 0);
        g.verify_chains().unwrap();
    }

    #[test]
    fn test_build_chains_and_controls() {
        let trace = three_op_trace();
        let g = CircuitGraph::from_trace(&trace).unwrap();
        let a0 = WireId(2);

        // a0's chain: init -> cx(1) -> cx(2).
        let init = g.init_node(a0).unwrap();
        let first = g.target_successor(init).unwrap();
        let second = g.target_successor(first).unwrap();
        assert_eq!(g.node(first).unwrap().node_num, 1);
        assert_eq!(g.node(second).unwrap().node_num, 2);
        assert_eq!(g.tail(a0), Some(second));
        assert!(g.target_successor(second).is_none());

        // The second write of a0 is controlled by q1's operation node.
        let q1_op = g.target_successor(g.init_node(WireId(1)).unwrap()).unwrap();
        assert_eq!(g.control_predecessors(second), vec![q1_op]);
    }

    #[test]
    fn test_unknown_wire_rejected() {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        trace.push(TraceOp::controlled("cx", WireId(9), q0));
        match CircuitGraph::from_trace(&trace) {
            Err(IrError::UnknownWire { wire, op_index, .. }) => {
                assert_eq!(wire, WireId(9));
                assert_eq!(op_index, 0);
            }
            other => panic!("expected UnknownWire, got {other:?}"),
        }
    }

    #[test]
    fn test_self_control_rejected() {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        trace.push(TraceOp::controlled("cx", q0, q0));
        assert!(matches!(
            CircuitGraph::from_trace(&trace),
            Err(IrError::SelfControl { .. })
        ));
    }

    #[test]
    fn test_forward_graph_is_acyclic() {
        let g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        assert!(g.find_cycle().is_none());
        let order = g.topological_order(false).unwrap();
        assert_eq!(order.len(), g.num_nodes());
    }

    #[test]
    fn test_reverse_topological_order() {
        let g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        let fwd = g.topological_order(false).unwrap();
        let mut rev = g.topological_order(true).unwrap();
        rev.reverse();
        assert_eq!(fwd, rev);
    }

    #[test]
    fn test_find_cycle_reports_injected_cycle() {
        let mut g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        let a0_first = g.target_successor(g.init_node(WireId(2)).unwrap()).unwrap();
        let a0_second = g.target_successor(a0_first).unwrap();
        g.add_dep(a0_second, a0_first, DepKind::Antidep);
        let cycle = g.find_cycle().expect("cycle expected");
        assert!(cycle.contains(&a0_first));
        assert!(cycle.contains(&a0_second));
    }

    #[test]
    fn test_clone_is_independent() {
        let g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        let mut copy = g.clone();
        let a0_first = copy
            .target_successor(copy.init_node(WireId(2)).unwrap())
            .unwrap();
        copy.remove_chain_node(a0_first).unwrap();
        assert_eq!(copy.num_ops(), 2);
        assert_eq!(g.num_ops(), 3);
    }

    #[test]
    fn test_remove_chain_node_reconnects() {
        let mut g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        let a0 = WireId(2);
        let init = g.init_node(a0).unwrap();
        let first = g.target_successor(init).unwrap();
        let second = g.target_successor(first).unwrap();

        g.remove_chain_node(first).unwrap();
        assert_eq!(g.target_successor(init), Some(second));
        assert_eq!(g.tail(a0), Some(second));

        g.remove_chain_node(second).unwrap();
        assert_eq!(g.tail(a0), Some(init));
        assert!(g.target_successor(init).is_none());
    }

    #[test]
    fn test_init_node_cannot_be_removed() {
        let mut g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        let init = g.init_node(WireId(0)).unwrap();
        assert!(matches!(
            g.remove_chain_node(init),
            Err(IrError::BrokenChain(_))
        ));
    }

    #[test]
    fn test_dep_edge_helpers() {
        let mut g = CircuitGraph::from_trace(&three_op_trace()).unwrap();
        let x = g.init_node(WireId(0)).unwrap();
        let y = g.init_node(WireId(1)).unwrap();
        assert!(!g.has_dep(x, y, DepKind::Antidep));
        g.add_dep_once(x, y, DepKind::Antidep);
        g.add_dep_once(x, y, DepKind::Antidep);
        assert_eq!(g.antidep_targets(x), vec![y]);
        assert!(g.remove_dep(x, y, DepKind::Antidep));
        assert!(!g.remove_dep(x, y, DepKind::Antidep));
    }

    #[test]
    fn test_duplicate_controls_collapse() {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::new("ccx", a0, [q0, q0]));
        let g = CircuitGraph::from_trace(&trace).unwrap();
        let op = g.target_successor(g.init_node(a0).unwrap()).unwrap();
        assert_eq!(g.control_predecessors(op).len(), 1);
    }
}
