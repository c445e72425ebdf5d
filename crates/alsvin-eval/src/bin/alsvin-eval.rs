//! Alsvin evaluation CLI
//!
//! Compares uncomputation strategies on randomly generated traces, either as
//! a one-off run or as a parameter sweep driven by a YAML config.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use alsvin_eval::{
    Comparison, ExperimentSummary, GeneratorConfig, SweepConfig, compare_strategies, random_trace,
    summarize,
};
use alsvin_uncomp::Strategy;

/// Alsvin - uncomputation strategy evaluation
#[derive(Parser)]
#[command(name = "alsvin-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare strategies on freshly generated traces
    Run {
        /// Number of input wires
        #[arg(long, default_value = "12")]
        inputs: u32,

        /// Number of output wires
        #[arg(long, default_value = "0")]
        outputs: u32,

        /// Number of ancilla wires
        #[arg(long, default_value = "10")]
        ancillas: u32,

        /// Number of operations per trace
        #[arg(long, default_value = "50")]
        ops: usize,

        /// Input-input gate fraction
        #[arg(long, default_value = "0.8")]
        cc: f64,

        /// Input-ancilla gate fraction
        #[arg(long, default_value = "0.05")]
        ca: f64,

        /// Ancilla-input gate fraction
        #[arg(long, default_value = "0.05")]
        ac: f64,

        /// Ancilla-ancilla gate fraction
        #[arg(long, default_value = "0.1")]
        aa: f64,

        /// Traces to generate
        #[arg(long, default_value = "10")]
        reps: usize,

        /// RNG seed for reproducible traces
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a parameter sweep from a YAML config
    Sweep {
        /// Sweep configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Write per-point summaries as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            inputs,
            outputs,
            ancillas,
            ops,
            cc,
            ca,
            ac,
            aa,
            reps,
            seed,
        } => {
            let config = GeneratorConfig {
                num_inputs: inputs,
                num_outputs: outputs,
                num_ancillas: ancillas,
                num_ops: ops,
                percent_cc: cc,
                percent_ca: ca,
                percent_ac: ac,
                percent_aa: aa,
                seed,
            };
            run_once(&config, reps)
        }
        Commands::Sweep { config, output } => run_sweep(&config, output.as_deref()),
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
            .expect("static progress template is valid"),
    );
    bar
}

fn run_once(config: &GeneratorConfig, reps: usize) -> anyhow::Result<()> {
    config.validate().context("generator configuration")?;
    println!(
        "{}",
        style(format!(
            "Comparing strategies: {} inputs, {} ancillas, {} ops, {} traces",
            config.num_inputs, config.num_ancillas, config.num_ops, reps
        ))
        .bold()
    );

    let bar = progress_bar(reps as u64);
    let mut comparisons: Vec<Comparison> = vec![];
    for rep in 0..reps {
        let mut per_run = config.clone();
        per_run.seed = config.seed.map(|s| s.wrapping_add(rep as u64));
        let trace = random_trace(&per_run)?;
        comparisons.push(compare_strategies(&trace, &Strategy::ALL));
        bar.inc(1);
    }
    bar.finish_and_clear();

    print_summaries(&summarize(&comparisons, &Strategy::ALL));
    Ok(())
}

fn run_sweep(path: &std::path::Path, output: Option<&std::path::Path>) -> anyhow::Result<()> {
    let sweep = SweepConfig::load(path)
        .with_context(|| format!("loading sweep config {}", path.display()))?;
    println!(
        "{}",
        style(format!(
            "Sweeping {} from {} to {} (step {}, {} traces per point)",
            sweep.axis, sweep.min, sweep.max, sweep.step, sweep.repetitions
        ))
        .bold()
    );

    let points = sweep.points();
    let bar = progress_bar((points.len() * sweep.repetitions) as u64);
    let mut results: Vec<(u32, Vec<ExperimentSummary>)> = vec![];

    for &point in &points {
        let mut comparisons: Vec<Comparison> = vec![];
        for rep in 0..sweep.repetitions {
            let mut config = sweep.config_at(point);
            config.seed = sweep.seed_for(point, rep);
            let trace = random_trace(&config)?;
            comparisons.push(compare_strategies(&trace, &Strategy::ALL));
            bar.inc(1);
        }
        results.push((point, summarize(&comparisons, &Strategy::ALL)));
    }
    bar.finish_and_clear();

    for (point, summaries) in &results {
        println!("{}", style(format!("{} = {point}", sweep.axis)).underlined());
        print_summaries(summaries);
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        println!("Report written to {}", style(path.display()).green());
    }
    Ok(())
}

fn print_summaries(summaries: &[ExperimentSummary]) {
    for summary in summaries {
        let line = summary.to_string();
        if summary.failures > 0 {
            println!("  {}", style(line).yellow());
        } else {
            println!("  {line}");
        }
    }
}
