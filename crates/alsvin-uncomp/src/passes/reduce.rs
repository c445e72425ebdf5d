//! Suffix-reversal reference and reference-directed pruning.
//!
//! The suffix reversal is the cheap, rewrite-free uncomputation: replay the
//! trace backwards after the forward run, skipping the leading operations
//! that never touch an ancilla. It usually inserts more inverses than
//! necessary but it is trivially correct, which makes it a useful yardstick:
//! pruning removes every twin the full reversal inserted that the yardstick
//! would not have.

use alsvin_ir::{CircuitGraph, IrError, NodeId, NodeKind, NodeSignature, Trace, WireId};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{UncompError, UncompResult};
use crate::pass::{CycleStatus, UncompPass};
use crate::step::{add_uncompute_step, remove_uncompute_step};

/// A trace extended with its own reversed suffix, remembering where the
/// forward part ends.
#[derive(Debug, Clone)]
pub struct SuffixReference {
    /// Forward operations followed by the reversed suffix.
    pub trace: Trace,
    /// Number of forward operations.
    pub forward_len: usize,
    /// Leading operations dropped because they touch no ancilla wire.
    pub skipped: usize,
}

impl SuffixReference {
    /// Build the dependency graph of the reference, replaying each appended
    /// operation as the uncompute twin of the newest pending forward
    /// operation on its target wire.
    ///
    /// The appended suffix is the forward suffix reversed, so each appended
    /// operation must name the same operation as that pending node; anything
    /// else is a [`UncompError::ReferenceMismatch`].
    pub fn to_graph(&self) -> UncompResult<CircuitGraph> {
        let forward = self.trace.prefix(self.forward_len);
        let mut graph = CircuitGraph::from_trace(&forward)?;

        for (offset, op) in self.trace.ops()[self.forward_len..].iter().enumerate() {
            let index = self.forward_len + offset;
            let pending = latest_pending_comp(&graph, op.target).ok_or_else(|| {
                UncompError::ReferenceMismatch {
                    index,
                    expected: "a pending forward operation".into(),
                    found: op.name.clone(),
                }
            })?;
            let node = graph.node(pending).ok_or(IrError::InvalidNode)?;
            if node.name.as_deref() != Some(op.name.as_str()) {
                return Err(UncompError::ReferenceMismatch {
                    index,
                    expected: node.name.clone().unwrap_or_default(),
                    found: op.name.clone(),
                });
            }
            add_uncompute_step(&mut graph, pending)?;
        }
        Ok(graph)
    }
}

/// The newest `Comp` node on `wire` that has no twin yet.
fn latest_pending_comp(graph: &CircuitGraph, wire: WireId) -> Option<NodeId> {
    let mut current = graph.tail(wire)?;
    loop {
        let node = graph.node(current)?;
        match node.kind {
            NodeKind::Comp if !node.is_uncomputed => return Some(current),
            NodeKind::Init => return None,
            _ => current = graph.target_predecessor(current)?,
        }
    }
}

/// Append the reversed ancilla-relevant suffix of the first `cutoff`
/// operations to a copy of the trace.
///
/// The longest prefix touching no ancilla wire cannot affect ancilla
/// cleanliness and is left out of the reversal.
pub fn suffix_reversal_reference(
    trace: &Trace,
    ancillas: &[WireId],
    cutoff: usize,
) -> SuffixReference {
    let cutoff = cutoff.min(trace.len());
    let scope: FxHashSet<WireId> = ancillas.iter().copied().collect();
    let considered = &trace.ops()[..cutoff];

    let skipped = considered
        .iter()
        .take_while(|op| !scope.iter().any(|&w| op.touches(w)))
        .count();
    debug!(
        "first {skipped} operations touch no ancilla wire, dropped from the reversal suffix"
    );

    let mut extended = trace.clone();
    for op in considered[skipped..].iter().rev() {
        extended.push(op.clone());
    }
    SuffixReference {
        trace: extended,
        forward_len: trace.len(),
        skipped,
    }
}

/// Remove every `Uncomp` node whose signature fails the matcher, newest
/// twins first so the chains unwind cleanly. Returns the number removed.
pub fn prune_with(
    graph: &mut CircuitGraph,
    matcher: impl Fn(&NodeSignature) -> bool,
) -> UncompResult<usize> {
    let mut doomed: Vec<(u32, NodeId)> = vec![];
    for id in graph.node_ids() {
        let node = graph.node(id).ok_or(IrError::InvalidNode)?;
        if node.kind == NodeKind::Uncomp && !matcher(&node.signature()) {
            let original = node.twin.ok_or(IrError::InvalidNode)?;
            doomed.push((node.seq, original));
        }
    }
    doomed.sort_by_key(|&(seq, _)| std::cmp::Reverse(seq));

    let removed = doomed.len();
    for (_, original) in doomed {
        remove_uncompute_step(graph, original)?;
    }
    Ok(removed)
}

/// Remove every `Uncomp` node with no structural match in the reference
/// graph. Matching is signature equality: wire label, occurrence counter,
/// operation name and kind.
pub fn prune_to_reference(
    graph: &mut CircuitGraph,
    reference: &CircuitGraph,
) -> UncompResult<usize> {
    let keep = reference.signatures();
    prune_with(graph, |sig| keep.contains(sig))
}

/// Reference-directed pruning as a pipeline pass.
pub struct PruneToReference {
    /// The reference graph twins are matched against.
    pub reference: CircuitGraph,
}

impl UncompPass for PruneToReference {
    fn name(&self) -> &'static str {
        "PruneToReference"
    }

    fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
        let removed = prune_to_reference(graph, &self.reference)?;
        debug!("pruned {removed} twins not present in the reference");
        Ok(CycleStatus::of(graph))
    }
}
