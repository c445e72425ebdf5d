//! The atomic insert/remove primitive for uncompute twins.
//!
//! [`add_uncompute_step`] appends the inverse twin of one forward operation
//! to its wire's chain and wires up the dependencies that keep the rewritten
//! program schedulable:
//!
//! - every node reading the value the twin unwinds gets an `Antidep` edge
//!   into the twin (reads must finish before the value disappears),
//! - the twin's own controls mirror the forward node's, sourced from the
//!   restoring twin of the controller's successor when that value has
//!   already been unwound and re-established,
//! - when a controller's wire is overwritten by a later forward operation,
//!   the twin gets an `Antidep` edge to that overwrite.
//!
//! The last two rules can disagree: a twin can be pinned both after a
//! restoring twin and before the overwrite that precedes it. That shows up
//! as a dependency cycle, which is exactly how a borrowed-wire conflict is
//! surfaced to the cycle-breaking pass instead of being silently
//! mis-scheduled. The primitive therefore reports, but never rejects,
//! a cycle.

use alsvin_ir::{CircuitGraph, DepKind, IrError, NodeId, NodeKind, OpNode};

use crate::error::{UncompError, UncompResult};

/// Insert the uncompute twin of `node`.
///
/// Preconditions: `node` is a `Comp` node without a twin. Violations fail
/// before the graph is touched. Returns the twin's id and whether the graph
/// now contains a cycle; callers must check the flag.
pub fn add_uncompute_step(
    graph: &mut CircuitGraph,
    node: NodeId,
) -> UncompResult<(NodeId, bool)> {
    let n = graph.node(node).ok_or(IrError::InvalidNode)?;
    if n.kind != NodeKind::Comp {
        return Err(UncompError::NotComp {
            label: n.to_string(),
        });
    }
    if n.is_uncomputed {
        return Err(UncompError::AlreadyUncomputed {
            label: n.to_string(),
        });
    }
    let wire = n.wire;
    let label = n.label.clone();
    let role = n.role;
    let Some(name) = n.name.clone() else {
        return Err(UncompError::NotComp {
            label: n.to_string(),
        });
    };

    let tail = graph.tail(wire).ok_or(IrError::InvalidNode)?;
    let tail_num = graph.node(tail).ok_or(IrError::InvalidNode)?.node_num;

    // Readers of the value the twin unwinds: nodes controlled by the forward
    // operation, plus nodes controlled by the chain tail when the tail is a
    // twin that re-established that value.
    let mut readers = graph.control_successors(node);
    if tail != node {
        readers.extend(graph.control_successors(tail));
    }

    // Mirror plan for the forward node's controls. For a controller `k` whose
    // value was already unwound and restored, the restorer (the twin of `k`'s
    // chain successor) is the live source; otherwise `k` itself is. A later
    // forward overwrite of `k`'s wire additionally bounds the twin from above.
    let mut mirrors: Vec<(NodeId, Option<NodeId>)> = vec![];
    for k in graph.control_predecessors(node) {
        let succ = graph.target_successor(k);
        let restored = succ.and_then(|s| {
            let sn = graph.node(s)?;
            if sn.kind == NodeKind::Comp && sn.is_uncomputed {
                sn.twin
            } else {
                None
            }
        });
        let source = restored.unwrap_or(k);
        let overwrite = succ.filter(|&s| {
            graph
                .node(s)
                .is_some_and(|sn| sn.kind == NodeKind::Comp)
        });
        mirrors.push((source, overwrite));
    }

    let seq = graph.alloc_seq();
    let twin_node = OpNode::uncomp(wire, label, seq, tail_num + 1, name, role, node);
    let twin = graph.append_to_chain(twin_node)?;

    for r in readers {
        graph.add_dep_once(r, twin, DepKind::Antidep);
    }
    for (source, overwrite) in mirrors {
        graph.add_dep_once(source, twin, DepKind::Control);
        if let Some(s) = overwrite {
            graph.add_dep_once(twin, s, DepKind::Antidep);
        }
    }

    let n = graph.node_mut(node).ok_or(IrError::InvalidNode)?;
    n.is_uncomputed = true;
    n.twin = Some(twin);

    Ok((twin, graph.find_cycle().is_some()))
}

/// Remove the uncompute twin of `node`, restoring the pre-insertion
/// structure.
///
/// Deletes the twin and every edge touching it and reconnects the wire chain
/// around the gap. Fails with [`UncompError::NotUncomputed`] when `node` has
/// no twin.
pub fn remove_uncompute_step(graph: &mut CircuitGraph, node: NodeId) -> UncompResult<()> {
    let n = graph.node(node).ok_or(IrError::InvalidNode)?;
    if n.kind != NodeKind::Comp {
        return Err(UncompError::NotComp {
            label: n.to_string(),
        });
    }
    let Some(twin) = n.twin else {
        return Err(UncompError::NotUncomputed {
            label: n.to_string(),
        });
    };

    graph.remove_chain_node(twin)?;

    let n = graph.node_mut(node).ok_or(IrError::InvalidNode)?;
    n.is_uncomputed = false;
    n.twin = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::{Trace, TraceOp, WireId, WireRole};

    fn controlled_pair() -> (CircuitGraph, NodeId, NodeId) {
        // q0 controls the single write of a0.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        let g = CircuitGraph::from_trace(&trace).unwrap();
        let q_init = g.init_node(q0).unwrap();
        let a_op = g.target_successor(g.init_node(a0).unwrap()).unwrap();
        (g, q_init, a_op)
    }

    #[test]
    fn test_add_appends_twin_to_chain() {
        let (mut g, q_init, a_op) = controlled_pair();
        let (twin, cyclic) = add_uncompute_step(&mut g, a_op).unwrap();
        assert!(!cyclic);

        let tn = g.node(twin).unwrap();
        assert_eq!(tn.kind, NodeKind::Uncomp);
        assert_eq!(tn.node_num, 2);
        assert_eq!(tn.name.as_deref(), Some("cx"));
        assert_eq!(tn.twin, Some(a_op));

        assert_eq!(g.target_successor(a_op), Some(twin));
        assert_eq!(g.tail(WireId(1)), Some(twin));
        assert!(g.node(a_op).unwrap().is_uncomputed);
        assert_eq!(g.node(a_op).unwrap().twin, Some(twin));

        // The control is mirrored from the untouched controller.
        assert!(g.has_dep(q_init, twin, DepKind::Control));
        g.verify_chains().unwrap();
    }

    #[test]
    fn test_add_protects_readers() {
        // a0's write is read by q1's operation; the twin must come after it.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let q1 = trace.add_wire("q", 1, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cx", a0, q1));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();

        let a_op = g.target_successor(g.init_node(a0).unwrap()).unwrap();
        let q1_op = g.target_successor(g.init_node(q1).unwrap()).unwrap();

        let (twin, cyclic) = add_uncompute_step(&mut g, a_op).unwrap();
        assert!(!cyclic);
        assert!(g.has_dep(q1_op, twin, DepKind::Antidep));
    }

    #[test]
    fn test_add_bounds_twin_by_controller_overwrite() {
        // The controller's wire is written again later; the twin must land
        // before that overwrite.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::local("x", q0));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();

        let q_init = g.init_node(q0).unwrap();
        let q_overwrite = g.target_successor(q_init).unwrap();
        let a_op = g.target_successor(g.init_node(a0).unwrap()).unwrap();

        let (twin, cyclic) = add_uncompute_step(&mut g, a_op).unwrap();
        assert!(!cyclic);
        assert!(g.has_dep(q_init, twin, DepKind::Control));
        assert!(g.has_dep(twin, q_overwrite, DepKind::Antidep));
    }

    #[test]
    fn test_add_rejects_double_uncompute() {
        let (mut g, _, a_op) = controlled_pair();
        add_uncompute_step(&mut g, a_op).unwrap();
        assert!(matches!(
            add_uncompute_step(&mut g, a_op),
            Err(UncompError::AlreadyUncomputed { .. })
        ));
    }

    #[test]
    fn test_add_rejects_init_node() {
        let (mut g, q_init, _) = controlled_pair();
        assert!(matches!(
            add_uncompute_step(&mut g, q_init),
            Err(UncompError::NotComp { .. })
        ));
    }

    #[test]
    fn test_remove_requires_twin() {
        let (mut g, _, a_op) = controlled_pair();
        assert!(matches!(
            remove_uncompute_step(&mut g, a_op),
            Err(UncompError::NotUncomputed { .. })
        ));
    }

    #[test]
    fn test_add_remove_round_trip() {
        let (mut g, _, a_op) = controlled_pair();
        let nodes_before = g.num_nodes();
        let deps_before = g.num_deps();
        let signatures_before = g.signatures();

        add_uncompute_step(&mut g, a_op).unwrap();
        remove_uncompute_step(&mut g, a_op).unwrap();

        assert_eq!(g.num_nodes(), nodes_before);
        assert_eq!(g.num_deps(), deps_before);
        assert_eq!(g.signatures(), signatures_before);
        assert!(!g.node(a_op).unwrap().is_uncomputed);
        assert_eq!(g.node(a_op).unwrap().twin, None);
        g.verify_chains().unwrap();
    }

    #[test]
    fn test_chain_stays_simple_under_stacked_twins() {
        // Two writes to the same ancilla, uncomputed newest first.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cz", q0, a0));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();

        let first = g.target_successor(g.init_node(a0).unwrap()).unwrap();
        let second = g.target_successor(first).unwrap();

        let (twin2, _) = add_uncompute_step(&mut g, second).unwrap();
        let (twin1, _) = add_uncompute_step(&mut g, first).unwrap();

        // Chain: init -> cx(1) -> cz(2) -> cz(3)* -> cx(4)*.
        assert_eq!(g.target_successor(second), Some(twin2));
        assert_eq!(g.target_successor(twin2), Some(twin1));
        assert_eq!(g.node(twin1).unwrap().node_num, 4);
        g.verify_chains().unwrap();
    }
}
