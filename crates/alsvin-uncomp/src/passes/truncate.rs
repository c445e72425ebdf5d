//! Truncation of borrowed-wire uncomputation chains.
//!
//! Borrowed wires only need restoring as far as the ancilla cleanup requires.
//! Everything an ancilla twin depends on, transitively, is important; any
//! newer twin on a borrowed wire that nothing important hangs off is dead
//! weight and is removed.

use alsvin_ir::{CircuitGraph, DepKind, IrError, NodeId, NodeKind, WireRole};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::UncompResult;
use crate::pass::{CycleStatus, UncompPass};
use crate::step::remove_uncompute_step;

/// Nodes backward-reachable from ancilla-role `Uncomp` nodes over incoming
/// `Control` and `Target` edges. Each node is expanded at most once.
fn important_nodes(graph: &CircuitGraph) -> FxHashSet<NodeId> {
    let mut important: FxHashSet<NodeId> = FxHashSet::default();
    let mut stack: Vec<NodeId> = graph
        .node_ids()
        .filter(|&id| {
            graph
                .node(id)
                .is_some_and(|n| n.kind == NodeKind::Uncomp && n.role == WireRole::Ancilla)
        })
        .collect();

    while let Some(id) = stack.pop() {
        if !important.insert(id) {
            continue;
        }
        stack.extend(graph.deps_into(id, DepKind::Control));
        stack.extend(graph.deps_into(id, DepKind::Target));
    }
    important
}

/// Trim each borrowed wire's twin chain to the suffix the ancilla cleanup
/// actually needs.
///
/// Walks every `Input` wire from its chain tail backward, removing `Uncomp`
/// nodes until the first important node or forward operation. Returns the
/// number of twins removed.
pub fn truncate_unrequired_inputs(graph: &mut CircuitGraph) -> UncompResult<usize> {
    let important = important_nodes(graph);

    let mut removed = 0;
    for wire in graph.wires_with_role(WireRole::Input) {
        let mut current = graph.tail(wire);
        while let Some(id) = current {
            let node = graph.node(id).ok_or(IrError::InvalidNode)?;
            if node.kind != NodeKind::Uncomp || important.contains(&id) {
                break;
            }
            let original = node.twin.ok_or(IrError::InvalidNode)?;
            let previous = graph.target_predecessor(id);
            debug!("removing unrequired twin {}", node);
            remove_uncompute_step(graph, original)?;
            removed += 1;
            current = previous;
        }
    }
    Ok(removed)
}

/// Borrowed-chain truncation as a pipeline pass.
pub struct TruncateInputs;

impl UncompPass for TruncateInputs {
    fn name(&self) -> &'static str {
        "TruncateInputs"
    }

    fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
        let removed = truncate_unrequired_inputs(graph)?;
        debug!("truncated {removed} borrowed-wire twins");
        Ok(CycleStatus::of(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::greedy::break_cycles_greedy;
    use crate::passes::reversal::{full_reversal, uncompute_ancillas};
    use alsvin_ir::{Trace, TraceOp, WireRole};

    #[test]
    fn test_truncates_borrowed_twins_nothing_needs() {
        // Borrowed-only work after the ancilla is finished: its twins serve
        // no cleanup and must go.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let q1 = trace.add_wire("q", 1, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cx", q0, q1));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();
        full_reversal(&mut g).unwrap();
        assert_eq!(g.num_uncomp(), 2);

        let removed = truncate_unrequired_inputs(&mut g).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(g.num_uncomp(), 1);

        let q1_op = g.target_successor(g.init_node(q1).unwrap()).unwrap();
        assert!(!g.node(q1_op).unwrap().is_uncomputed);
        g.verify_chains().unwrap();
    }

    #[test]
    fn test_keeps_borrowed_twins_the_cleanup_reads() {
        // The greedy repair reroutes an ancilla twin through a borrowed
        // twin; truncation must keep that twin.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::local("x", q0));
        trace.push(TraceOp::controlled("cx", q0, a0));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();
        uncompute_ancillas(&mut g).unwrap();
        break_cycles_greedy(&mut g).unwrap();
        let uncomp_before = g.num_uncomp();

        let removed = truncate_unrequired_inputs(&mut g).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(g.num_uncomp(), uncomp_before);
        assert!(g.find_cycle().is_none());
    }

    #[test]
    fn test_truncation_removes_conflicting_borrowed_twin() {
        // Full reversal wedges the borrowed twin between a restored read and
        // the forward overwrite; nothing important needs it, so truncation
        // resolves the conflict by dropping it.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let q1 = trace.add_wire("q", 1, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cx", a0, q1));
        trace.push(TraceOp::controlled("cx", q1, a0));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();
        full_reversal(&mut g).unwrap();
        assert!(g.find_cycle().is_some());

        let removed = truncate_unrequired_inputs(&mut g).unwrap();
        assert_eq!(removed, 1);
        assert!(g.find_cycle().is_none());
        g.verify_chains().unwrap();
    }
}
