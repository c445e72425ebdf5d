//! Seeded random trace generation.
//!
//! Traces are built from four gate classes, named by the roles of control
//! and target: input-input (`cc`), input-ancilla (`ca`), ancilla-input
//! (`ac`) and ancilla-ancilla (`aa`). Output wires count as computational
//! wires, so results land on wires the passes will never uncompute.

use alsvin_ir::{Trace, TraceOp, WireId, WireRole};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// Operation names drawn for generated gates.
const GATE_NAMES: [&str; 2] = ["cx", "cz"];

/// Parameters for random trace generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of borrowed input wires.
    pub num_inputs: u32,
    /// Number of output wires.
    pub num_outputs: u32,
    /// Number of ancilla wires.
    pub num_ancillas: u32,
    /// Number of operations to generate.
    pub num_ops: usize,
    /// Fraction of input-input gates. Leftover probability falls here too.
    pub percent_cc: f64,
    /// Fraction of input-control, ancilla-target gates.
    pub percent_ca: f64,
    /// Fraction of ancilla-control, input-target gates.
    pub percent_ac: f64,
    /// Fraction of ancilla-ancilla gates.
    pub percent_aa: f64,
    /// RNG seed; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_inputs: 12,
            num_outputs: 0,
            num_ancillas: 10,
            num_ops: 50,
            percent_cc: 0.8,
            percent_ca: 0.05,
            percent_ac: 0.05,
            percent_aa: 0.1,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Check that the parameters can produce a trace.
    pub fn validate(&self) -> EvalResult<()> {
        let total = self.percent_cc + self.percent_ca + self.percent_ac + self.percent_aa;
        if total > 1.0 + 1e-9 {
            return Err(EvalError::InvalidFractions { total });
        }
        for (name, p) in [
            ("percent_cc", self.percent_cc),
            ("percent_ca", self.percent_ca),
            ("percent_ac", self.percent_ac),
            ("percent_aa", self.percent_aa),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EvalError::Config(format!("{name} = {p} is not in [0, 1]")));
            }
        }
        if self.num_inputs + self.num_outputs < 2 {
            return Err(EvalError::Config(
                "need at least two computational wires".into(),
            ));
        }
        if self.num_ancillas == 0 && (self.percent_ca > 0.0 || self.percent_ac > 0.0 || self.percent_aa > 0.0) {
            return Err(EvalError::Config(
                "ancilla gate classes require at least one ancilla wire".into(),
            ));
        }
        if self.num_ancillas < 2 && self.percent_aa > 0.0 {
            return Err(EvalError::Config(
                "ancilla-ancilla gates require at least two ancilla wires".into(),
            ));
        }
        Ok(())
    }
}

/// Gate class by (control role, target role).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateClass {
    InputInput,
    InputAncilla,
    AncillaInput,
    AncillaAncilla,
}

fn draw_class(rng: &mut SmallRng, config: &GeneratorConfig) -> GateClass {
    let r: f64 = rng.r#gen();
    let mut bound = config.percent_cc;
    if r < bound {
        return GateClass::InputInput;
    }
    bound += config.percent_ca;
    if r < bound {
        return GateClass::InputAncilla;
    }
    bound += config.percent_ac;
    if r < bound {
        return GateClass::AncillaInput;
    }
    bound += config.percent_aa;
    if r < bound {
        return GateClass::AncillaAncilla;
    }
    GateClass::InputInput
}

fn pick(rng: &mut SmallRng, pool: &[WireId]) -> WireId {
    pool[rng.gen_range(0..pool.len())]
}

fn pick_distinct(rng: &mut SmallRng, pool: &[WireId], other: WireId) -> WireId {
    loop {
        let w = pick(rng, pool);
        if w != other {
            return w;
        }
    }
}

/// Generate a random trace according to the configuration.
pub fn random_trace(config: &GeneratorConfig) -> EvalResult<Trace> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let mut trace = Trace::new();
    let mut comp = trace.add_register("q", config.num_inputs, WireRole::Input);
    comp.extend(trace.add_register("out", config.num_outputs, WireRole::Output));
    let anc = trace.add_register("a", config.num_ancillas, WireRole::Ancilla);

    for _ in 0..config.num_ops {
        let class = draw_class(&mut rng, config);
        let name = GATE_NAMES[rng.gen_range(0..GATE_NAMES.len())];
        let (control, target) = match class {
            GateClass::InputInput => {
                let target = pick(&mut rng, &comp);
                (pick_distinct(&mut rng, &comp, target), target)
            }
            GateClass::InputAncilla => (pick(&mut rng, &comp), pick(&mut rng, &anc)),
            GateClass::AncillaInput => (pick(&mut rng, &anc), pick(&mut rng, &comp)),
            GateClass::AncillaAncilla => {
                let target = pick(&mut rng, &anc);
                (pick_distinct(&mut rng, &anc, target), target)
            }
        };
        trace.push(TraceOp::controlled(name, control, target));
    }
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_respects_counts() {
        let config = GeneratorConfig {
            seed: Some(7),
            ..Default::default()
        };
        let trace = random_trace(&config).unwrap();
        assert_eq!(trace.len(), 50);
        assert_eq!(trace.wires().len(), 22);
        assert_eq!(trace.ancilla_wires().len(), 10);
    }

    #[test]
    fn test_generator_is_deterministic_under_seed() {
        let config = GeneratorConfig {
            seed: Some(42),
            ..Default::default()
        };
        let a = random_trace(&config).unwrap();
        let b = random_trace(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pure_input_traces_touch_no_ancilla() {
        let config = GeneratorConfig {
            percent_cc: 1.0,
            percent_ca: 0.0,
            percent_ac: 0.0,
            percent_aa: 0.0,
            seed: Some(3),
            ..Default::default()
        };
        let trace = random_trace(&config).unwrap();
        for op in trace.ops() {
            for &wire in trace.ancilla_wires().iter() {
                assert!(!op.touches(wire));
            }
        }
    }

    #[test]
    fn test_fraction_validation() {
        let config = GeneratorConfig {
            percent_cc: 0.8,
            percent_aa: 0.4,
            ..Default::default()
        };
        assert!(matches!(
            random_trace(&config),
            Err(EvalError::InvalidFractions { .. })
        ));
    }

    #[test]
    fn test_aa_requires_two_ancillas() {
        let config = GeneratorConfig {
            num_ancillas: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_generated_traces_build() {
        let config = GeneratorConfig {
            num_outputs: 2,
            seed: Some(11),
            ..Default::default()
        };
        let trace = random_trace(&config).unwrap();
        let graph = alsvin_ir::CircuitGraph::from_trace(&trace).unwrap();
        graph.verify_chains().unwrap();
        assert!(graph.find_cycle().is_none());
    }
}
