//! Uncomputation strategies: preset pass compositions.

use std::fmt;

use alsvin_ir::{CircuitGraph, Trace};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::UncompResult;
use crate::passes::greedy::{break_cycles_greedy, drop_stale_antideps};
use crate::passes::reduce::{prune_to_reference, suffix_reversal_reference};
use crate::passes::reversal::{full_reversal, uncompute_ancillas};
use crate::passes::truncate::truncate_unrequired_inputs;
use crate::schedule::require_acyclic;

/// A preset composition of uncomputation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Uncompute every non-output operation (Bennett-style full reversal).
    Bennett,
    /// Uncompute ancillas, then break cycles by uncomputing borrowed
    /// operations greedily.
    GreedyInput,
    /// Full reversal pruned against the suffix-reversal reference, with
    /// unrequired borrowed twins truncated.
    ReducedBennett,
}

impl Strategy {
    /// All strategies, in comparison order.
    pub const ALL: [Strategy; 3] = [
        Strategy::Bennett,
        Strategy::GreedyInput,
        Strategy::ReducedBennett,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Bennett => write!(f, "bennett"),
            Strategy::GreedyInput => write!(f, "greedy-input"),
            Strategy::ReducedBennett => write!(f, "reduced-bennett"),
        }
    }
}

/// Build the dependency graph of `trace` and run the given strategy on it.
///
/// Every strategy ends at the acyclicity gate: a residual cycle is a
/// [`CycleStillPresent`](crate::UncompError::CycleStillPresent) error, never
/// a silently cyclic result.
pub fn synthesize(trace: &Trace, strategy: Strategy) -> UncompResult<CircuitGraph> {
    let mut graph = CircuitGraph::from_trace(trace)?;
    info!(
        "synthesizing uncomputation for {} operations with {strategy}",
        trace.len()
    );

    match strategy {
        Strategy::Bennett => {
            full_reversal(&mut graph)?;
        }
        Strategy::GreedyInput => {
            uncompute_ancillas(&mut graph)?;
            break_cycles_greedy(&mut graph)?;
        }
        Strategy::ReducedBennett => {
            full_reversal(&mut graph)?;
            let ancillas = trace.ancilla_wires();
            let reference = suffix_reversal_reference(trace, &ancillas, trace.len());
            let reference_graph = reference.to_graph()?;
            prune_to_reference(&mut graph, &reference_graph)?;
            truncate_unrequired_inputs(&mut graph)?;
            drop_stale_antideps(&mut graph);
        }
    }

    require_acyclic(&graph, &strategy.to_string())?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::{TraceOp, WireRole};

    fn ancilla_trace() -> Trace {
        let mut trace = Trace::new();
        let q = trace.add_register("q", 2, WireRole::Input);
        let a = trace.add_register("a", 1, WireRole::Ancilla);
        trace.push(TraceOp::controlled("cx", q[0], a[0]));
        trace.push(TraceOp::controlled("cx", a[0], q[1]));
        trace
    }

    #[test]
    fn test_bennett_uncomputes_non_outputs() {
        let trace = ancilla_trace();
        let graph = synthesize(&trace, Strategy::Bennett).unwrap();
        assert_eq!(graph.num_uncomp(), 2);
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn test_greedy_leaves_untouched_borrowed_wires() {
        let trace = ancilla_trace();
        let graph = synthesize(&trace, Strategy::GreedyInput).unwrap();
        assert_eq!(graph.num_uncomp(), 1);
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Bennett.to_string(), "bennett");
        assert_eq!(Strategy::GreedyInput.to_string(), "greedy-input");
        assert_eq!(Strategy::ReducedBennett.to_string(), "reduced-bennett");
    }
}
