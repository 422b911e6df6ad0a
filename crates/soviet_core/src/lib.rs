//! # Soviet Core
//!
//! Deterministic settlement simulation core.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded generator is injected per simulation)
//!
//! This separation enables:
//! - Headless batch runs
//! - Save files that resume bit-for-bit
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Tick orchestrator and builder
//! - [`chronology`] - Calendar, seasons, weather
//! - [`economy`] - Power, production, consumption, growth, decay
//! - [`disease`] - Outbreaks and progression
//! - [`politburo`] - Ministers, factions, purges, succession
//! - [`era`] - Historical eras and modifier blending
//! - [`quota`] - Five-year plans
//! - [`personnel`] - The chairman's black marks
//! - [`events`] - Notifications for the host

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buildings;
pub mod chronology;
pub mod citizens;
pub mod config;
pub mod disease;
pub mod economy;
pub mod era;
pub mod error;
pub mod events;
pub mod modifiers;
pub mod personnel;
pub mod politburo;
pub mod quota;
pub mod resources;
pub mod rng;
pub mod settlement;
pub mod simulation;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buildings::{Building, BuildingId, BuildingKind, BuildingRegistry};
    pub use crate::chronology::{Chronology, DayPhase, Season, SimDate, TickBoundaries, Weather};
    pub use crate::citizens::{CitizenArena, CitizenId, HealthState};
    pub use crate::config::SimConfig;
    pub use crate::disease::{DiseaseReport, DiseaseSystem, DiseaseType};
    pub use crate::era::{EraId, EraSystem};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{EventQueue, Severity, SimEvent};
    pub use crate::modifiers::ModifierVector;
    pub use crate::personnel::PersonnelFile;
    pub use crate::politburo::{Ministry, Personality, Politburo, PolitburoEvent};
    pub use crate::quota::{QuotaOutcome, QuotaResource, QuotaState, QuotaSystem};
    pub use crate::resources::ResourceLedger;
    pub use crate::rng::{RngMode, SimRng};
    pub use crate::settlement::SettlementTier;
    pub use crate::simulation::{GameOutcome, SimStats, Simulation, SimulationBuilder, TickReport};
    pub use crate::world::SimulationWorld;
}
