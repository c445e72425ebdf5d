//! Pass trait and pipeline for uncomputation rewriting.

use alsvin_ir::CircuitGraph;
use tracing::{debug, info, warn};

use crate::error::UncompResult;

/// Whether a pass left the graph acyclic.
///
/// Cycles are ordinary data inside a pipeline: a reversal pass may leave
/// them for a later cycle-breaking pass to resolve. They only become errors
/// at a finalization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// No dependency cycle remains.
    Acyclic,
    /// At least one dependency cycle remains.
    Cyclic,
}

impl CycleStatus {
    /// Check whether the status is acyclic.
    #[inline]
    pub fn is_acyclic(self) -> bool {
        self == CycleStatus::Acyclic
    }

    /// Status of a graph right now.
    pub fn of(graph: &CircuitGraph) -> Self {
        if graph.is_cyclic() {
            CycleStatus::Cyclic
        } else {
            CycleStatus::Acyclic
        }
    }
}

/// An uncomputation pass over a dependency graph.
///
/// Passes mutate the graph in place; callers that need the pre-pass state
/// clone the graph first. Every pass reports whether it left cycles behind,
/// and must never mask one.
pub trait UncompPass {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Run the pass on the given graph.
    fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus>;
}

/// Runs a sequence of uncomputation passes.
pub struct Pipeline {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn UncompPass>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the pipeline.
    pub fn add_pass(&mut self, pass: impl UncompPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given graph, returning the final cycle status.
    pub fn run(&self, graph: &mut CircuitGraph) -> UncompResult<CycleStatus> {
        info!(
            "Running pipeline with {} passes on graph with {} operations",
            self.passes.len(),
            graph.num_ops()
        );

        let mut status = CycleStatus::of(graph);
        for pass in &self.passes {
            debug!("Running pass: {}", pass.name());
            status = pass.run(graph)?;
            if status.is_acyclic() {
                debug!(
                    "Pass {} completed, ops: {}, uncomputed: {}",
                    pass.name(),
                    graph.num_ops(),
                    graph.num_uncomp()
                );
            } else {
                warn!("Pass {} left the graph cyclic", pass.name());
            }
        }

        info!(
            "Pipeline completed, ops: {}, uncomputed: {}, status: {:?}",
            graph.num_ops(),
            graph.num_uncomp(),
            status
        );
        Ok(status)
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the pipeline has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
