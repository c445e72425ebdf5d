//! Greedy cycle breaking over borrowed wires.
//!
//! After the ancilla-scoped reversal, a cycle means some ancilla twin reads a
//! borrowed-wire value that a later forward operation overwrites. Uncomputing
//! that borrowed operation re-establishes the value, so the stuck reader can
//! be rerouted through the new twin and the conflict disappears. The pass
//! picks the borrowed operation blocking the most pending ancilla cleanups
//! first.

use alsvin_ir::{CircuitGraph, DepKind, IrError, NodeId, NodeKind, WireRole};
use tracing::debug;

use crate::error::{UncompError, UncompResult};
use crate::pass::{CycleStatus, UncompPass};
use crate::step::add_uncompute_step;

/// Greedy metric: incoming `Antidep` edges sourced at ancilla-role `Uncomp`
/// nodes. Each one is a pending ancilla cleanup waiting on this node's wire
/// value.
pub fn antidep_pressure(graph: &CircuitGraph, node: NodeId) -> usize {
    graph
        .antidep_sources(node)
        .into_iter()
        .filter(|&src| {
            graph
                .node(src)
                .is_some_and(|n| n.kind == NodeKind::Uncomp && n.role == WireRole::Ancilla)
        })
        .count()
}

/// The borrowed-wire operation to uncompute next: an `Input`-role `Comp`
/// node without a twin, maximizing [`antidep_pressure`]. Ties keep the
/// first-encountered node.
fn select_candidate(graph: &CircuitGraph) -> Option<NodeId> {
    let mut best: Option<(NodeId, usize)> = None;
    for id in graph.node_ids() {
        let eligible = graph
            .node(id)
            .is_some_and(|n| n.role == WireRole::Input && n.kind == NodeKind::Comp && !n.is_uncomputed);
        if !eligible {
            continue;
        }
        let pressure = antidep_pressure(graph, id);
        match best {
            Some((_, b)) if pressure <= b => {}
            _ => best = Some((id, pressure)),
        }
    }
    best.map(|(id, _)| id)
}

/// Uncompute a borrowed-wire operation, keeping its wire's twin chain
/// contiguous from the newest operation backward.
///
/// A later operation on the same wire is recursively uncomputed first when it
/// has no twin yet. After insertion, control edges from the chain predecessor
/// into `Uncomp` readers are rerouted through the new twin, and the
/// anti-dependency each such reader held against this node is dropped: the
/// rerouted control already orders the reader after the restored value.
pub fn uncompute_borrowed(graph: &mut CircuitGraph, node: NodeId) -> UncompResult<NodeId> {
    if let Some(next) = graph.target_successor(node) {
        let pending = graph
            .node(next)
            .is_some_and(|n| n.kind == NodeKind::Comp && !n.is_uncomputed);
        if pending {
            debug!(
                "uncomputing {} first, its wire continues past the requested node",
                graph.node(next).ok_or(IrError::InvalidNode)?
            );
            uncompute_borrowed(graph, next)?;
        }
    }

    let pred = graph.target_predecessor(node).ok_or(IrError::InvalidNode)?;
    let (twin, _) = add_uncompute_step(graph, node)?;

    for reader in graph.control_successors(pred) {
        let is_uncomp = graph
            .node(reader)
            .is_some_and(|n| n.kind == NodeKind::Uncomp);
        if is_uncomp {
            graph.remove_dep(pred, reader, DepKind::Control);
            graph.add_dep_once(twin, reader, DepKind::Control);
            graph.remove_dep(reader, node, DepKind::Antidep);
        }
    }
    Ok(twin)
}

/// Drop anti-dependency edges whose ordering is already implied: the reader
/// holds a control edge from the restoring twin of the very node the
/// anti-dependency points at, so it is pinned after the restore and the
/// before-the-overwrite constraint is stale. Returns the number dropped.
pub fn drop_stale_antideps(graph: &mut CircuitGraph) -> usize {
    let mut stale = vec![];
    for reader in graph.node_ids() {
        let is_uncomp = graph
            .node(reader)
            .is_some_and(|n| n.kind == NodeKind::Uncomp);
        if !is_uncomp {
            continue;
        }
        for overwrite in graph.antidep_targets(reader) {
            let restorer = graph
                .node(overwrite)
                .filter(|n| n.kind == NodeKind::Comp)
                .and_then(|n| n.twin);
            if let Some(restorer) = restorer {
                if graph.has_dep(restorer, reader, DepKind::Control) {
                    stale.push((reader, overwrite));
                }
            }
        }
    }
    for &(reader, overwrite) in &stale {
        graph.remove_dep(reader, overwrite, DepKind::Antidep);
    }
    stale.len()
}

/// Break every dependency cycle by uncomputing borrowed-wire operations.
///
/// Loop: drop stale anti-dependencies (free repairs, no new operations),
/// then uncompute the highest-pressure borrowed candidate. Fails with
/// [`UncompError::CycleStillPresent`] when cycles remain but neither repair
/// applies. Terminates: every iteration removes an anti-dependency edge or
/// uncomputes a borrowed operation, and both are finite.
pub fn break_cycles_greedy(graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
    while let Some(cycle) = graph.find_cycle() {
        if drop_stale_antideps(graph) > 0 {
            continue;
        }
        match select_candidate(graph) {
            Some(candidate) => {
                debug!(
                    "uncomputing {} (pressure {})",
                    graph.node(candidate).ok_or(IrError::InvalidNode)?,
                    antidep_pressure(graph, candidate)
                );
                uncompute_borrowed(graph, candidate)?;
            }
            None => {
                return Err(UncompError::CycleStillPresent {
                    stage: "break_cycles_greedy".into(),
                    len: cycle.len(),
                });
            }
        }
    }
    Ok(CycleStatus::Acyclic)
}

/// Greedy cycle breaking as a pipeline pass.
pub struct GreedyCycleBreak;

impl UncompPass for GreedyCycleBreak {
    fn name(&self) -> &'static str {
        "GreedyCycleBreak"
    }

    fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
        break_cycles_greedy(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::reversal::{full_reversal, uncompute_ancillas};
    use alsvin_ir::{Trace, TraceOp, WireRole};

    /// A borrowed wire feeds an ancilla, is overwritten, and the overwritten
    /// value feeds the ancilla again. Ancilla reversal alone deadlocks on the
    /// overwrite.
    fn overwrite_conflict_trace() -> Trace {
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::local("x", q0));
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace
    }

    #[test]
    fn test_ancilla_reversal_deadlocks_on_overwrite() {
        let mut g = CircuitGraph::from_trace(&overwrite_conflict_trace()).unwrap();
        let status = uncompute_ancillas(&mut g).unwrap();
        assert_eq!(status, CycleStatus::Cyclic);
    }

    #[test]
    fn test_greedy_resolves_overwrite_conflict() {
        let mut g = CircuitGraph::from_trace(&overwrite_conflict_trace()).unwrap();
        uncompute_ancillas(&mut g).unwrap();

        let status = break_cycles_greedy(&mut g).unwrap();
        assert!(status.is_acyclic());
        assert!(g.find_cycle().is_none());
        g.verify_chains().unwrap();

        // The overwrite on the borrowed wire had to be undone.
        let q_init = g.init_node(alsvin_ir::WireId(0)).unwrap();
        let x_op = g.target_successor(q_init).unwrap();
        assert!(g.node(x_op).unwrap().is_uncomputed);
    }

    #[test]
    fn test_greedy_noop_on_acyclic_graph() {
        let mut g = CircuitGraph::from_trace(&overwrite_conflict_trace()).unwrap();
        let uncomp_before = g.num_uncomp();
        let status = break_cycles_greedy(&mut g).unwrap();
        assert!(status.is_acyclic());
        assert_eq!(g.num_uncomp(), uncomp_before);
    }

    #[test]
    fn test_greedy_repairs_full_reversal_without_new_twins() {
        // Full reversal of the read-rewrite-read trace is cyclic, but every
        // operation already has a twin; the repair is edge-only.
        let mut trace = Trace::new();
        let q0 = trace.add_wire("q", 0, WireRole::Input);
        let q1 = trace.add_wire("q", 1, WireRole::Input);
        let a0 = trace.add_wire("a", 0, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q0, a0));
        trace.push(TraceOp::controlled("cx", a0, q1));
        trace.push(TraceOp::controlled("cx", q1, a0));
        let mut g = CircuitGraph::from_trace(&trace).unwrap();

        let status = full_reversal(&mut g).unwrap();
        assert_eq!(status, CycleStatus::Cyclic);

        let uncomp_before = g.num_uncomp();
        let status = break_cycles_greedy(&mut g).unwrap();
        assert!(status.is_acyclic());
        assert_eq!(g.num_uncomp(), uncomp_before);
        g.verify_chains().unwrap();
    }

    #[test]
    fn test_pressure_counts_only_ancilla_twins() {
        let mut g = CircuitGraph::from_trace(&overwrite_conflict_trace()).unwrap();
        uncompute_ancillas(&mut g).unwrap();

        let q_init = g.init_node(alsvin_ir::WireId(0)).unwrap();
        let x_op = g.target_successor(q_init).unwrap();
        // The first ancilla twin is stuck behind the overwrite of q0.
        assert_eq!(antidep_pressure(&g, x_op), 1);
    }
}
