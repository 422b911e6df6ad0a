//! Headless settlement runner for scripted play and CI verification.
//!
//! This crate drives a [`soviet_core::simulation::Simulation`] without any
//! presentation layer. This enables:
//!
//! - **Scripted play**: A controller builds and ticks the settlement over JSON
//! - **Balance testing**: Batches of seeded games summarised in one report
//! - **CI verification**: Same seed, same state hash, on every machine
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, build, save, etc.)
//! - **stdout**: Responses and simulation events (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p soviet_headless
//!
//! # Play a scenario file to the end
//! cargo run -p soviet_headless -- run --scenario scenarios/village.ron
//!
//! # Verify determinism
//! cargo run -p soviet_headless -- verify --seed 7 --runs 4
//! ```

pub mod batch;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response, StateSnapshot};
pub use runner::{play, GameLabel, HeadlessConfig, HeadlessRunner};
pub use scenario::{BuildingPlacement, Scenario, ScenarioError, StartingResources};
