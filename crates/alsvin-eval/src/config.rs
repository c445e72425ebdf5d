//! YAML-driven sweep configurations.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::generator::GeneratorConfig;

/// The parameter a sweep varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepAxis {
    /// Number of operations.
    Gates,
    /// Number of ancilla wires.
    Ancillas,
    /// Number of input wires.
    Inputs,
    /// Input-input gate percentage (0..=100); the other classes split the
    /// remainder evenly.
    Cc,
    /// Input-ancilla gate percentage.
    Ca,
    /// Ancilla-input gate percentage.
    Ac,
    /// Ancilla-ancilla gate percentage.
    Aa,
}

impl fmt::Display for SweepAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepAxis::Gates => write!(f, "gates"),
            SweepAxis::Ancillas => write!(f, "ancillas"),
            SweepAxis::Inputs => write!(f, "inputs"),
            SweepAxis::Cc => write!(f, "input-input fraction"),
            SweepAxis::Ca => write!(f, "input-ancilla fraction"),
            SweepAxis::Ac => write!(f, "ancilla-input fraction"),
            SweepAxis::Aa => write!(f, "ancilla-ancilla fraction"),
        }
    }
}

/// A parameter sweep: vary one axis over a range, repeat each point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// The axis to vary.
    pub axis: SweepAxis,
    /// First point of the sweep, inclusive.
    pub min: u32,
    /// Last point of the sweep, inclusive.
    pub max: u32,
    /// Distance between points.
    pub step: u32,
    /// Traces generated per point.
    pub repetitions: usize,
    /// Fixed generator parameters; the axis overrides its own field.
    #[serde(default)]
    pub base: GeneratorConfig,
}

impl SweepConfig {
    /// Load a sweep configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> EvalResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SweepConfig = serde_yaml_ng::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the range and the base parameters.
    pub fn validate(&self) -> EvalResult<()> {
        if self.step == 0 {
            return Err(EvalError::Config("sweep step must be positive".into()));
        }
        if self.min > self.max {
            return Err(EvalError::Config(format!(
                "sweep range is empty: {} > {}",
                self.min, self.max
            )));
        }
        if self.repetitions == 0 {
            return Err(EvalError::Config("repetitions must be positive".into()));
        }
        self.base.validate()
    }

    /// The sweep points, in order.
    pub fn points(&self) -> Vec<u32> {
        (self.min..=self.max).step_by(self.step as usize).collect()
    }

    /// The generator configuration at one sweep point.
    ///
    /// Percentage axes follow the evaluation convention: the swept class
    /// takes `point` percent and the other three split the remainder evenly.
    pub fn config_at(&self, point: u32) -> GeneratorConfig {
        let mut config = self.base.clone();
        match self.axis {
            SweepAxis::Gates => config.num_ops = point as usize,
            SweepAxis::Ancillas => config.num_ancillas = point,
            SweepAxis::Inputs => config.num_inputs = point,
            SweepAxis::Cc | SweepAxis::Ca | SweepAxis::Ac | SweepAxis::Aa => {
                let swept = f64::from(point.min(100)) / 100.0;
                let rest = (1.0 - swept) / 3.0;
                config.percent_cc = rest;
                config.percent_ca = rest;
                config.percent_ac = rest;
                config.percent_aa = rest;
                match self.axis {
                    SweepAxis::Cc => config.percent_cc = swept,
                    SweepAxis::Ca => config.percent_ca = swept,
                    SweepAxis::Ac => config.percent_ac = swept,
                    SweepAxis::Aa => config.percent_aa = swept,
                    _ => unreachable!(),
                }
            }
        }
        config
    }

    /// Per-repetition seed at a sweep point, when the base is seeded.
    pub fn seed_for(&self, point: u32, repetition: usize) -> Option<u64> {
        self.base
            .seed
            .map(|seed| seed ^ (u64::from(point) << 20) ^ repetition as u64)
    }
}
