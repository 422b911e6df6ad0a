//! Headless settlement runner.
//!
//! This binary runs the simulation without graphics, controlled via JSON on
//! stdin/stdout. Designed for scripted controllers, CI and balance testing.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p soviet_headless
//!
//! # Play one scenario to the end, streaming events as JSON lines
//! cargo run -p soviet_headless -- run --scenario founding_village --events
//!
//! # Run batch balance test
//! cargo run -p soviet_headless -- batch --scenario collapsed_town --count 1000 --output results/
//!
//! # Verify determinism
//! cargo run -p soviet_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use soviet_core::simulation::Simulation;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soviet_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{play, GameLabel, HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "soviet_headless")]
#[command(about = "Headless settlement runner for scripted play, batch analysis and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive one settlement from JSON commands on stdin
    Interactive {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "founding_village")]
        scenario: String,

        /// Seed override (scenario default otherwise)
        #[arg(long)]
        seed: Option<u64>,

        /// Start from a save blob instead of the scenario
        #[arg(long)]
        load: Option<PathBuf>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Play one scenario unattended and print its metrics
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "founding_village")]
        scenario: String,

        /// Tick budget (scenario default otherwise)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Seed override (scenario default otherwise)
        #[arg(long)]
        seed: Option<u64>,

        /// Stream every simulation event to stdout as a JSON line
        #[arg(long)]
        events: bool,
    },

    /// Run batch of games for balance testing
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "founding_village")]
        scenario: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick budget per game (0 = scenario default)
        #[arg(short, long, default_value = "0")]
        ticks: u64,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "founding_village")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "14400")]
        ticks: u64,

        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "founding_village")]
        scenario: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Interactive {
            scenario,
            seed,
            load,
            auto_state,
        }) => cmd_interactive(&scenario, seed, load, auto_state),
        Some(Commands::Run {
            scenario,
            ticks,
            seed,
            events,
        }) => cmd_run(&scenario, ticks, seed, events),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            ticks,
        }) => cmd_batch(scenario, count, parallel, output, seed, ticks),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(&scenario, seed, runs),
        Some(Commands::Benchmark { ticks, scenario }) => cmd_benchmark(&scenario, ticks),
        None => {
            // Default: interactive mode
            cmd_interactive("founding_village", None, None, false)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{}", message);
            eprintln!("FATAL: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Drive one settlement from stdin.
fn cmd_interactive(
    scenario: &str,
    seed: Option<u64>,
    load: Option<PathBuf>,
    auto_state: bool,
) -> Result<(), String> {
    let sim = match load {
        Some(path) => {
            tracing::info!("Resuming from save: {}", path.display());
            let bytes = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
            Simulation::deserialize(&bytes).map_err(|e| e.to_string())?
        }
        None => {
            let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
            tracing::info!("Starting interactive session: {}", scenario.name);
            scenario.build(seed).map_err(|e| e.to_string())?
        }
    };

    let config = HeadlessConfig {
        auto_state_output: auto_state,
    };
    let mut runner = HeadlessRunner::with_config(sim, config);
    runner
        .run(io::stdin().lock(), io::stdout().lock())
        .map_err(|e| format!("I/O error: {e}"))
}

/// Play one scenario unattended.
fn cmd_run(scenario: &str, ticks: Option<u64>, seed: Option<u64>, events: bool) -> Result<(), String> {
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    let sim = scenario.build(seed).map_err(|e| e.to_string())?;
    let max_ticks = ticks.unwrap_or(scenario.ticks);
    let label = GameLabel {
        game_id: "run".to_string(),
        scenario: scenario.name.clone(),
        seed: sim.rng_mode().seed(),
    };
    tracing::info!(
        scenario = %scenario.name,
        max_ticks,
        seed = ?label.seed,
        "Playing scenario"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let metrics = if events {
        play(sim, max_ticks, &label, Some(&mut out))
    } else {
        play(sim, max_ticks, &label, None)
    }
    .map_err(|e| format!("I/O error: {e}"))?;

    let summary = serde_json::to_string(&metrics).map_err(|e| e.to_string())?;
    writeln!(out, "{summary}").map_err(|e| format!("I/O error: {e}"))?;

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("{}", scenario.name.to_uppercase());
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks played: {} (final year {})", metrics.duration_ticks, metrics.final_year);
    match &metrics.end_reason {
        Some(reason) if metrics.victory => eprintln!("VICTORY: {reason}"),
        Some(reason) => eprintln!("DEFEAT: {reason}"),
        None => eprintln!("Still standing when the budget ran out"),
    }
    eprintln!(
        "Population: {} (peak {}), tier {}, era {}",
        metrics.final_population, metrics.peak_population, metrics.final_tier, metrics.final_era
    );
    eprintln!(
        "Losses: {} disease, {} starvation, {} gulag",
        metrics.disease_deaths, metrics.starvation_deaths, metrics.gulag_removals
    );
    eprintln!(
        "Politics: {} leaders, {} coups, {} purges, {} black marks",
        metrics.leaders, metrics.coups, metrics.purges, metrics.black_marks
    );
    Ok(())
}

/// Run batch of games for balance testing.
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    ticks: u64,
) -> Result<(), String> {
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    tracing::info!(
        scenario = %scenario,
        count,
        parallel,
        seed,
        ticks,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    std::fs::create_dir_all(&output)
        .map_err(|e| format!("Cannot create output directory '{}': {e}", output.display()))?;

    let config = BatchConfig {
        scenario,
        game_count: count,
        parallel_games: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_ticks: ticks,
    };
    let results = run_batch(config).map_err(|e| e.to_string())?;

    let results_path = output.join("batch_results.json");
    results
        .save(&results_path)
        .map_err(|e| format!("Failed to save results: {e}"))?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} games/sec",
        results.games.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!(
        "Survival: {:.1}% ({} victories)",
        summary.survival_rate * 100.0,
        summary.victories
    );
    eprintln!(
        "Averages: {:.0} ticks, {:.1} citizens, {:.1} leaders, {:.1} purges",
        summary.avg_duration_ticks, summary.avg_final_population, summary.avg_leaders, summary.avg_purges
    );

    eprintln!("\nEnd reasons:");
    for (reason, count) in &summary.end_reasons {
        eprintln!("  {reason}: {count}");
    }

    if !results.errors.is_empty() {
        eprintln!("\nGAME FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Game {} (seed {}): {}",
                error.game_index, error.seed, error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
    Ok(())
}

/// Verify determinism.
fn cmd_verify(scenario: &str, seed: u64, runs: u32) -> Result<(), String> {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario,
        seed,
        runs
    );

    if verify_determinism(scenario, seed, runs).map_err(|e| e.to_string())? {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(())
    } else {
        Err("Non-determinism detected!".to_string())
    }
}

/// Run N ticks for benchmarking.
fn cmd_benchmark(scenario: &str, ticks: u64) -> Result<(), String> {
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    let mut sim = scenario.build(None).map_err(|e| e.to_string())?;
    tracing::info!("Benchmarking {} ticks of '{}'", ticks, scenario.name);

    let start = Instant::now();
    let ran = sim.run(ticks);
    let elapsed = start.elapsed();
    let events = sim.drain_events().len();

    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    eprintln!("Ticks run: {ran} of {ticks}");
    eprintln!("Events emitted: {events}");
    eprintln!("Elapsed: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Throughput: {:.0} ticks/sec", ran as f64 / secs);
    eprintln!("Final hash: {:016x}", sim.state_hash());
    Ok(())
}
