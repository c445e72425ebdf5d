//! Strategy comparison reports.

use std::fmt;

use alsvin_ir::Trace;
use alsvin_uncomp::{Strategy, linearize, synthesize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EvalResult;

/// Operation counts for one strategy on one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyReport {
    /// The strategy that produced the schedule.
    pub strategy: Strategy,
    /// Operations in the forward trace.
    pub base_ops: usize,
    /// Operations in the full schedule, inverses included.
    pub total_ops: usize,
    /// Inverse operations the strategy inserted.
    pub added_ops: usize,
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ops (+{} uncomputation)",
            self.strategy, self.total_ops, self.added_ops
        )
    }
}

/// Synthesize with one strategy and count the emitted schedule.
pub fn evaluate(trace: &Trace, strategy: Strategy) -> EvalResult<StrategyReport> {
    let graph = synthesize(trace, strategy)?;
    let schedule = linearize(&graph)?;
    Ok(StrategyReport {
        strategy,
        base_ops: trace.len(),
        total_ops: schedule.len(),
        added_ops: schedule.len() - trace.len(),
    })
}

/// One trace evaluated under several strategies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comparison {
    /// Successful per-strategy reports.
    pub reports: Vec<StrategyReport>,
    /// Strategies that refused the trace, with the reason.
    pub failures: Vec<(Strategy, String)>,
}

/// Evaluate a trace under each strategy, collecting failures instead of
/// aborting: a strategy refusing a trace is a data point, not an error.
pub fn compare_strategies(trace: &Trace, strategies: &[Strategy]) -> Comparison {
    let mut comparison = Comparison::default();
    for &strategy in strategies {
        match evaluate(trace, strategy) {
            Ok(report) => comparison.reports.push(report),
            Err(err) => {
                debug!("{strategy} refused the trace: {err}");
                comparison.failures.push((strategy, err.to_string()));
            }
        }
    }
    comparison
}

/// Aggregated results of one strategy over repeated traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    /// The strategy being summarized.
    pub strategy: Strategy,
    /// Traces the strategy scheduled successfully.
    pub runs: usize,
    /// Traces the strategy refused.
    pub failures: usize,
    /// Mean number of inserted inverse operations over successful runs.
    pub mean_added: f64,
}

impl fmt::Display for ExperimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1} added ops on average ({} runs, {} refused)",
            self.strategy, self.mean_added, self.runs, self.failures
        )
    }
}

/// Aggregate per-trace comparisons into per-strategy summaries.
pub fn summarize(comparisons: &[Comparison], strategies: &[Strategy]) -> Vec<ExperimentSummary> {
    strategies
        .iter()
        .map(|&strategy| {
            let added: Vec<usize> = comparisons
                .iter()
                .flat_map(|c| c.reports.iter())
                .filter(|r| r.strategy == strategy)
                .map(|r| r.added_ops)
                .collect();
            let failures = comparisons
                .iter()
                .flat_map(|c| c.failures.iter())
                .filter(|(s, _)| *s == strategy)
                .count();
            let mean_added = if added.is_empty() {
                0.0
            } else {
                added.iter().sum::<usize>() as f64 / added.len() as f64
            };
            ExperimentSummary {
                strategy,
                runs: added.len(),
                failures,
                mean_added,
            }
        })
        .collect()
}
