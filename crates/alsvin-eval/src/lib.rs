//! Alsvin Experiment Tooling
//!
//! Random trace generation, strategy comparison and parameter sweeps for the
//! uncomputation passes. This crate answers one question: how many inverse
//! operations does each strategy insert on traces of a given shape?
//!
//! # Example
//!
//! ```rust
//! use alsvin_eval::{GeneratorConfig, compare_strategies, random_trace};
//! use alsvin_uncomp::Strategy;
//!
//! let config = GeneratorConfig {
//!     num_inputs: 4,
//!     num_ancillas: 3,
//!     num_ops: 12,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let trace = random_trace(&config).unwrap();
//! let comparison = compare_strategies(&trace, &Strategy::ALL);
//! assert_eq!(comparison.reports.len() + comparison.failures.len(), 3);
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod report;

pub use config::{SweepAxis, SweepConfig};
pub use error::{EvalError, EvalResult};
pub use generator::{GeneratorConfig, random_trace};
pub use report::{
    Comparison, ExperimentSummary, StrategyReport, compare_strategies, evaluate, summarize,
};
