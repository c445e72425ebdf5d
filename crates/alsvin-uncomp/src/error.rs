//! Error types for the uncomputation crate.

use alsvin_ir::IrError;
use thiserror::Error;

/// Errors that can occur while synthesizing uncomputation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UncompError {
    /// The step primitive was handed a node that is not a forward operation.
    #[error("node {label} is not a computation node")]
    NotComp {
        /// Display label of the offending node.
        label: String,
    },

    /// The node already has an uncompute twin.
    #[error("node {label} is already uncomputed")]
    AlreadyUncomputed {
        /// Display label of the offending node.
        label: String,
    },

    /// Removal was requested for a node that has no uncompute twin.
    #[error("node {label} has no uncompute twin")]
    NotUncomputed {
        /// Display label of the offending node.
        label: String,
    },

    /// A pass that requires acyclicity found a residual cycle.
    #[error("graph still contains a cycle after {stage} ({len} nodes involved)")]
    CycleStillPresent {
        /// The pass or stage that detected the cycle.
        stage: String,
        /// Length of the reported cycle.
        len: usize,
    },

    /// A reference trace operation does not line up with the forward graph.
    #[error("reference operation {index} ('{found}') does not match forward operation '{expected}'")]
    ReferenceMismatch {
        /// Index of the offending operation in the reference trace.
        index: usize,
        /// Name expected from the forward graph.
        expected: String,
        /// Name found in the reference trace.
        found: String,
    },

    /// An underlying graph-model error.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for uncomputation operations.
pub type UncompResult<T> = Result<T, UncompError>;
