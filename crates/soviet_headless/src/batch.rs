//! Batch game runner for balance testing.
//!
//! Runs one scenario under many seeds in parallel using rayon and collects
//! per-game metrics plus an aggregate summary.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::{play, GameLabel};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in scenario name or RON path.
    pub scenario: String,
    /// Number of games to run.
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Maximum ticks per game (0 = the scenario's own budget).
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "founding_village".to_string(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario.
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-game tick budget.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = ticks;
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual game metrics, in seed order.
    pub games: Vec<GameMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Progress tracking for batch runs.
#[derive(Debug)]
pub struct BatchProgress {
    /// Total games.
    pub total: u32,
    completed: AtomicU32,
    survived: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            survived: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed game.
    pub fn record_completion(&self, survived: bool) -> u32 {
        if survived {
            self.survived.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count.
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage.
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Share of completed games the settlement survived.
    pub fn survival_rate(&self) -> f64 {
        let completed = self.current();
        if completed == 0 {
            return 0.0;
        }
        self.survived.load(Ordering::Relaxed) as f64 / completed as f64
    }

    /// Get estimated time remaining.
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_game = elapsed.as_secs_f64() / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * remaining as f64)
    }

    /// Display progress to stderr.
    pub fn display(&self) {
        let eta = self.eta();
        eprintln!("╔════════════════════════════════════╗");
        eprintln!(
            "║ Batch Progress: {:>4}/{:<4} ({:>5.1}%) ║",
            self.current(),
            self.total,
            self.percentage()
        );
        eprintln!(
            "║ ETA: {:>28} ║",
            format!("{}m {}s", eta.as_secs() / 60, eta.as_secs() % 60)
        );
        eprintln!("║ Survival so far: {:>16.1}% ║", self.survival_rate() * 100.0);
        eprintln!("╚════════════════════════════════════╝");
    }
}

/// Run one game of the batch.
fn run_single_game(scenario: &Scenario, seed: u64, max_ticks: u64) -> Result<GameMetrics, String> {
    let sim = scenario.build(Some(seed)).map_err(|e| e.to_string())?;
    let label = GameLabel {
        game_id: format!("game_{seed}"),
        scenario: scenario.name.clone(),
        seed: Some(seed),
    };
    play(sim, max_ticks, &label, None).map_err(|e| e.to_string())
}

/// Run a batch of games.
///
/// # Errors
///
/// Fails only if the scenario cannot be resolved. Individual game failures
/// are collected in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let scenario = Scenario::resolve(&config.scenario)?;
    let max_ticks = if config.max_ticks == 0 {
        scenario.ticks
    } else {
        config.max_ticks
    };

    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);

    info!(
        "Starting batch run: {} games of '{}' ({} ticks each)",
        config.game_count, scenario.name, max_ticks
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_single_game(&scenario, seed, max_ticks) {
                Ok(metrics) => {
                    let completed = progress.record_completion(metrics.survived());
                    if completed % 10 == 0 {
                        debug!("Progress: {}/{}", completed, config.game_count);
                    }
                    if completed % 100 == 0 {
                        progress.display();
                    }
                    Ok(metrics)
                }
                Err(message) => {
                    warn!("Game {} failed: {}", i, message);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message,
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec), survival {:.1}%",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON),
        summary.survival_rate * 100.0
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Verify determinism by running the same seed several times.
///
/// Returns `true` when every run produced identical metrics, including the
/// final state hash.
pub fn verify_determinism(scenario: &str, seed: u64, runs: u32) -> Result<bool, ScenarioError> {
    let scenario = Scenario::resolve(scenario)?;
    let results: Vec<Result<GameMetrics, String>> = (0..runs.max(1))
        .into_par_iter()
        .map(|_| run_single_game(&scenario, seed, scenario.ticks))
        .collect();

    let mut finished = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(metrics) => finished.push(metrics),
            Err(message) => {
                warn!("Determinism run failed: {}", message);
                return Ok(false);
            }
        }
    }

    let first = &finished[0];
    Ok(finished.iter().all(|m| m == first))
}
