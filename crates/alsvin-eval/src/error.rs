//! Error types for the evaluation crate.

use alsvin_ir::IrError;
use alsvin_uncomp::UncompError;
use thiserror::Error;

/// Errors that can occur while running experiments.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// Generator or sweep configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Gate-class fractions exceed 1.0.
    #[error("gate-class fractions sum to {total}, must not exceed 1.0")]
    InvalidFractions {
        /// Sum of the configured fractions.
        total: f64,
    },

    /// Reading a config or writing a report failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML config parsing failed.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON report serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A strategy failed while synthesizing.
    #[error(transparent)]
    Uncomp(#[from] UncompError),

    /// An underlying graph-model error.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
