#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use munify_core::config::resolve_config;
use munify_sim::campaign::{CampaignConfig, run_campaign};
use munify_sim::gateway::FaultConfig;
use munify_sim::{SimulationConfig, Simulator};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "munify-sim: deterministic simulation of the planning board",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Project root holding `.munify/config.toml`.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Rounds per seed.
    #[arg(long, global = true, default_value_t = 40)]
    rounds: u64,

    /// Run without injected backend faults.
    #[arg(long, global = true)]
    calm: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single seed.
    Run {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Include the full event trace in the output.
        #[arg(long)]
        trace: bool,
    },
    /// Run a range of seeds and report the first failure.
    Campaign {
        #[arg(long, default_value_t = 0)]
        from: u64,
        #[arg(long, default_value_t = 100)]
        to: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli.project)?;
    init_tracing(&config.resolved_log_format);

    let simulation = SimulationConfig {
        rounds: cli.rounds,
        fault: if cli.calm {
            FaultConfig::calm()
        } else {
            FaultConfig::default()
        },
        planning: config,
        ..SimulationConfig::default()
    };

    match cli.command {
        Commands::Run { seed, trace } => {
            let mut simulator = Simulator::new(SimulationConfig { seed, ..simulation })?;
            let mut result = simulator.run()?;
            if !trace {
                result.trace.clear();
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for event in &result.trace {
                    println!("[{:>3}] {:?}", event.round, event.kind);
                }
                println!(
                    "seed={} passed={} dispatched={} confirmed={} rolled_back={} interesting={}",
                    result.seed,
                    result.passed(),
                    result.stats.dispatched,
                    result.stats.confirmed,
                    result.stats.rolled_back,
                    result.interesting_state_reached
                );
                for violation in &result.oracle.violations {
                    println!("  {violation}");
                }
            }
            if !result.passed() {
                bail!("seed {seed} violated board invariants");
            }
        }
        Commands::Campaign { from, to } => {
            let report = run_campaign(&CampaignConfig {
                seed_range: from..to,
                simulation,
            })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "campaign complete: seeds={} passed={} interesting={} dispatched={} rolled_back={}",
                    report.seeds_run,
                    report.seeds_passed,
                    report.interesting_states_reached,
                    report.moves_dispatched,
                    report.moves_rolled_back
                );
                for failure in &report.failures {
                    println!("  seed {}: {}", failure.seed, failure.violations.join("; "));
                }
            }
            if let Some(seed) = report.first_failure {
                bail!("campaign failed; replay with `munify-sim run --seed {seed} --trace`");
            }
        }
    }

    Ok(())
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_env("MUNIFY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "munify=debug,info"
        } else {
            "munify=info,warn"
        })
    });

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
