//! Alsvin Dependency-Graph Intermediate Representation
//!
//! This crate provides the data structures for representing reversible
//! operation traces as dependency graphs. It forms the foundation of the
//! Alsvin uncomputation stack.
//!
//! # Overview
//!
//! A program is an ordered [`Trace`] of operations, each writing one target
//! wire under zero or more controlling wires. [`CircuitGraph`] turns a trace
//! into a directed graph:
//!
//! - one `Init` node per wire and one `Comp` node per operation,
//! - `Target` edges chaining same-wire operations in program order,
//! - `Control` edges carrying cross-wire data dependencies,
//! - `Antidep` edges added later by uncomputation passes to order reads
//!   against the inverse operations that unwind the values they consume.
//!
//! The graph is the working representation for the uncomputation passes in
//! the companion `alsvin-uncomp` crate: they append and remove `Uncomp`
//! twins through [`CircuitGraph::append_to_chain`] and
//! [`CircuitGraph::remove_chain_node`], which keep each wire's chain intact.
//!
//! # Example
//!
//! ```rust
//! use alsvin_ir::{CircuitGraph, Trace, TraceOp, WireRole};
//!
//! let mut trace = Trace::new();
//! let q = trace.add_register("q", 2, WireRole::Input);
//! let a = trace.add_register("a", 1, WireRole::Ancilla);
//! trace.push(TraceOp::controlled("cx", q[0], a[0]));
//! trace.push(TraceOp::controlled("cx", a[0], q[1]));
//!
//! let graph = CircuitGraph::from_trace(&trace).unwrap();
//! assert_eq!(graph.num_ops(), 2);
//! assert!(graph.find_cycle().is_none());
//! graph.verify_chains().unwrap();
//! ```

pub mod error;
pub mod graph;
pub mod node;
pub mod op;
pub mod wire;

pub use error::{IrError, IrResult};
pub use graph::{CircuitGraph, DepKind, NodeId};
pub use node::{NodeKind, NodeSignature, OpNode};
pub use op::{Trace, TraceOp};
pub use wire::{Wire, WireId, WireRole};
