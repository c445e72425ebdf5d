//! Linearization of a finished graph back into an operation trace.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use alsvin_ir::{CircuitGraph, DepKind, IrError, NodeId, NodeKind, Trace, TraceOp};
use rustc_hash::FxHashMap;

use crate::error::{UncompError, UncompResult};

/// Fail with [`UncompError::CycleStillPresent`] unless the graph is acyclic.
///
/// The gate every consumer-facing boundary goes through: a cyclic graph is
/// never handed onward as a result.
pub fn require_acyclic(graph: &CircuitGraph, stage: &str) -> UncompResult<()> {
    match graph.find_cycle() {
        Some(cycle) => Err(UncompError::CycleStillPresent {
            stage: stage.into(),
            len: cycle.len(),
        }),
        None => Ok(()),
    }
}

/// Emit the graph's operations as a trace in dependency order.
///
/// Ready nodes are emitted oldest first, so forward operations keep their
/// program order and twins land as early as their dependencies allow.
/// Controls are recovered from the `Control` edges into each node. Refuses
/// cyclic graphs.
pub fn linearize(graph: &CircuitGraph) -> UncompResult<Trace> {
    require_acyclic(graph, "linearize")?;

    let mut in_degree: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut ready: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
    let mut by_key: FxHashMap<usize, NodeId> = FxHashMap::default();

    for id in graph.node_ids() {
        let degree = graph.predecessors(id).len();
        in_degree.insert(id, degree);
        by_key.insert(id.index(), id);
        if degree == 0 {
            let seq = graph.node(id).ok_or(IrError::InvalidNode)?.seq;
            ready.push(Reverse((seq, id.index())));
        }
    }

    let mut trace = Trace::with_wires(graph.wires().to_vec());
    while let Some(Reverse((_, key))) = ready.pop() {
        let id = by_key[&key];
        let node = graph.node(id).ok_or(IrError::InvalidNode)?;

        if matches!(node.kind, NodeKind::Comp | NodeKind::Uncomp) {
            let name = node.name.clone().unwrap_or_default();
            let mut controls: Vec<_> = graph
                .control_predecessors(id)
                .into_iter()
                .filter_map(|src| graph.node(src).map(|n| n.wire))
                .collect();
            controls.sort_unstable();
            controls.dedup();
            trace.push(TraceOp::new(name, node.wire, controls));
        }

        for succ in graph.successors(id) {
            let degree = in_degree
                .get_mut(&succ)
                .ok_or(IrError::InvalidNode)?;
            *degree -= 1;
            if *degree == 0 {
                let seq = graph.node(succ).ok_or(IrError::InvalidNode)?.seq;
                ready.push(Reverse((seq, succ.index())));
            }
        }
    }

    debug_assert_eq!(trace.len(), graph.num_ops());
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::reversal::{full_reversal, uncompute_ancillas};
    use alsvin_ir::{WireId, WireRole};

    fn simple_trace() -> Trace {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cz", q0, a0));
        trace
    }

    #[test]
    fn test_linearize_preserves_forward_order() {
        let trace = simple_trace();
        let graph = CircuitGraph::from_trace(&trace).unwrap();
        let emitted = linearize(&graph).unwrap();
        assert_eq!(emitted.ops(), trace.ops());
    }

    #[test]
    fn test_linearize_appends_twins_in_dependency_order() {
        let trace = simple_trace();
        let mut graph = CircuitGraph::from_trace(&trace).unwrap();
        uncompute_ancillas(&mut graph).unwrap();

        let emitted = linearize(&graph).unwrap();
        assert_eq!(emitted.len(), 4);
        // Forward run first, then the suffix in unwind order.
        assert_eq!(emitted.ops()[..2], trace.ops()[..]);
        assert_eq!(emitted.ops()[2].name, "cz");
        assert_eq!(emitted.ops()[3].name, "cx");
        assert_eq!(emitted.ops()[2].target, WireId(1));
    }

    #[test]
    fn test_linearize_refuses_cycles() {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let q1 = trace.add_wire("q", 1, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cx", a0, q1));
        trace.push(TraceOp::controlled("cx", q1, a0));
        let mut graph = CircuitGraph::from_trace(&trace).unwrap();
        full_reversal(&mut graph).unwrap();

        assert!(matches!(
            linearize(&graph),
            Err(UncompError::CycleStillPresent { .. })
        ));
    }

    #[test]
    fn test_linearize_recovers_controls() {
        let trace = simple_trace();
        let mut graph = CircuitGraph::from_trace(&trace).unwrap();
        uncompute_ancillas(&mut graph).unwrap();
        let emitted = linearize(&graph).unwrap();
        for op in emitted.ops() {
            assert_eq!(op.controls, vec![WireId(0)]);
        }
    }
}
