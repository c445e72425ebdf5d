//! Reversal passes: uncompute forward operations wholesale.

use alsvin_ir::{CircuitGraph, IrError, NodeId, NodeKind, WireId, WireRole};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::UncompResult;
use crate::pass::{CycleStatus, UncompPass};
use crate::step::add_uncompute_step;

/// `Comp` nodes newest first.
///
/// Construction only adds edges from earlier to later operations, so reverse
/// program order is a reverse topological order of the forward graph, and it
/// stays well defined once twins have been inserted.
fn comp_nodes_newest_first(graph: &CircuitGraph) -> Vec<NodeId> {
    let mut nodes: Vec<NodeId> = graph
        .node_ids()
        .filter(|&id| graph.node(id).is_some_and(|n| n.kind == NodeKind::Comp))
        .collect();
    nodes.sort_by_key(|&id| std::cmp::Reverse(graph.node(id).map_or(0, |n| n.seq)));
    nodes
}

/// Uncompute every eligible forward operation, newest first.
///
/// Eligible means: not on an `Output` wire and not yet uncomputed. The full
/// reversal does not attempt cycle avoidance; a borrowed wire whose forward
/// value feeds an earlier uncomputation shows up as a cycle in the result,
/// which the cycle-breaking pass resolves. Running the pass again on its own
/// output uncomputes nothing further.
pub fn full_reversal(graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
    for id in comp_nodes_newest_first(graph) {
        let node = graph.node(id).ok_or(IrError::InvalidNode)?;
        if node.role == WireRole::Output || node.is_uncomputed {
            continue;
        }
        let label = node.to_string();
        let (_, cyclic) = add_uncompute_step(graph, id)?;
        if cyclic {
            debug!("cycle present after uncomputing {label}");
        }
    }
    Ok(CycleStatus::of(graph))
}

/// Uncompute every forward operation on the given wires, newest first.
///
/// `Output` wires are skipped even if listed.
pub fn uncompute_wires(graph: &mut CircuitGraph, wires: &[WireId]) -> UncompResult<CycleStatus> {
    let scope: FxHashSet<WireId> = wires.iter().copied().collect();
    for id in comp_nodes_newest_first(graph) {
        let node = graph.node(id).ok_or(IrError::InvalidNode)?;
        if !scope.contains(&node.wire) || node.role == WireRole::Output || node.is_uncomputed {
            continue;
        }
        let label = node.to_string();
        let (_, cyclic) = add_uncompute_step(graph, id)?;
        if cyclic {
            debug!("cycle present after uncomputing {label}");
        }
    }
    Ok(CycleStatus::of(graph))
}

/// Uncompute every forward operation on ancilla wires, newest first.
///
/// The usual first stage of the greedy pipeline: ancillas must end clean,
/// borrowed wires are only uncomputed afterwards if cycles force it.
pub fn uncompute_ancillas(graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
    let wires = graph.wires_with_role(WireRole::Ancilla);
    uncompute_wires(graph, &wires)
}

/// Full reversal as a pipeline pass.
pub struct FullReversal;

impl UncompPass for FullReversal {
    fn name(&self) -> &'static str {
        "FullReversal"
    }

    fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
        full_reversal(graph)
    }
}

/// Ancilla-scoped reversal as a pipeline pass.
pub struct AncillaReversal;

impl UncompPass for AncillaReversal {
    fn name(&self) -> &'static str {
        "AncillaReversal"
    }

    fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
        uncompute_ancillas(graph)
    }
}
