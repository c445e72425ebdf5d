//! Alsvin Uncomputation Synthesis
//!
//! This crate rewrites a dependency graph so that temporary values are
//! uncomputed: ancilla wires return to their initial state, borrowed input
//! wires are restored exactly as far as the cleanup requires, and output
//! wires are left untouched.
//!
//! # Architecture
//!
//! ```text
//! Trace
//!   │
//!   ▼
//! CircuitGraph ◄── built once, rewritten by passes
//!   │
//!   ├── FullReversal / AncillaReversal   (insert uncompute twins)
//!   ├── GreedyCycleBreak                 (uncompute borrowed wires)
//!   ├── PruneToReference                 (drop twins the reference lacks)
//!   └── TruncateInputs                   (trim borrowed twin chains)
//!   │
//!   ▼
//! linearize ──► Trace   (refuses cyclic graphs)
//! ```
//!
//! The unit of rewriting is the step primitive: [`add_uncompute_step`]
//! appends the inverse twin of one forward operation and wires up the
//! control and anti-dependency edges that keep the result schedulable;
//! [`remove_uncompute_step`] is its exact structural inverse. Passes are
//! compositions of these two calls, and [`Strategy`] bundles the useful
//! compositions.
//!
//! A pass may transiently leave cycles; they are reported as
//! [`CycleStatus`], resolved by [`break_cycles_greedy`], and rejected as
//! [`UncompError::CycleStillPresent`] at every finalization boundary.
//!
//! # Example
//!
//! ```rust
//! use alsvin_ir::{Trace, TraceOp, WireRole};
//! use alsvin_uncomp::{Strategy, linearize, synthesize};
//!
//! let mut trace = Trace::new();
//! let q = trace.add_register("q", 2, WireRole::Input);
//! let a = trace.add_register("a", 1, WireRole::Ancilla);
//! trace.push(TraceOp::controlled("cx", q[0], a[0]));
//! trace.push(TraceOp::controlled("cx", a[0], q[1]));
//!
//! let graph = synthesize(&trace, Strategy::GreedyInput).unwrap();
//! let schedule = linearize(&graph).unwrap();
//! assert!(schedule.len() > trace.len());
//! ```

pub mod error;
pub mod pass;
pub mod passes;
pub mod schedule;
pub mod step;
pub mod strategy;

pub use error::{UncompError, UncompResult};
pub use pass::{CycleStatus, Pipeline, UncompPass};
pub use passes::greedy::{antidep_pressure, break_cycles_greedy, uncompute_borrowed};
pub use passes::reduce::{SuffixReference, prune_to_reference, prune_with, suffix_reversal_reference};
pub use passes::reversal::{full_reversal, uncompute_ancillas, uncompute_wires};
pub use passes::truncate::truncate_unrequired_inputs;
pub use passes::{AncillaReversal, FullReversal, GreedyCycleBreak, PruneToReference, TruncateInputs};
pub use schedule::{linearize, require_acyclic};
pub use step::{add_uncompute_step, remove_uncompute_step};
pub use strategy::{Strategy, synthesize};
