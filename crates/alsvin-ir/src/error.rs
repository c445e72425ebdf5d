//! Error types for the IR crate.

use crate::wire::WireId;
use thiserror::Error;

/// Errors that can occur in graph-model operations.
///
/// The `UnknownWire`, `SelfControl` and `MissingControlSource` variants form
/// the malformed-trace family: construction aborts without producing a graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An operation references a wire the trace never declared.
    #[error("operation {op_index} ('{name}') references unknown wire {wire}")]
    UnknownWire {
        /// Position of the offending operation in the trace.
        op_index: usize,
        /// Name of the offending operation.
        name: String,
        /// The undeclared wire.
        wire: WireId,
    },

    /// An operation lists its own target among its controls.
    #[error("operation {op_index} ('{name}') controls its own target wire {wire}")]
    SelfControl {
        /// Position of the offending operation in the trace.
        op_index: usize,
        /// Name of the offending operation.
        name: String,
        /// The wire used as both target and control.
        wire: WireId,
    },

    /// A controlling wire has no prior node to hang the dependency on.
    #[error("controlling wire {wire} has no prior node")]
    MissingControlSource {
        /// The controlling wire.
        wire: WireId,
    },

    /// A node id does not resolve in this graph.
    #[error("invalid node id")]
    InvalidNode,

    /// An operation that requires an acyclic graph found a cycle.
    #[error("graph contains a cycle")]
    CyclicGraph,

    /// A wire's target chain is no longer a simple chain.
    #[error("wire chain broken: {0}")]
    BrokenChain(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
