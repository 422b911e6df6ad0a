//! JSON protocol for headless settlement control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses, simulation events and state snapshots
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Every `tick` answers with the events the simulation emitted
//! 4. When the game ends, outputs `{"type":"game_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"build","kind":"collective_farm"}
//! <- {"type":"built","id":6,"kind":"collective_farm"}
//! -> {"cmd":"tick","count":30}
//! <- {"type":"events","tick":30,"events":[...]}
//! -> {"cmd":"state"}
//! <- {"type":"state","tick":30,"date":{...},"ledger":{...},...}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```

use serde::{Deserialize, Serialize};
use soviet_core::chronology::SimDate;
use soviet_core::events::SimEvent;
use soviet_core::quota::QuotaState;
use soviet_core::resources::ResourceLedger;
use soviet_core::simulation::Simulation;

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Report the current settlement state without advancing time.
    State,

    /// Construct a building by its snake_case kind name.
    Build { kind: String },

    /// Demolish a building by registry id.
    Demolish { id: u32 },

    /// Write the save blob to a file.
    Save { path: String },

    /// Replace the running simulation with a save blob read from a file.
    Load { path: String },

    /// Report the state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Events emitted while ticking.
    Events { tick: u64, events: Vec<SimEvent> },

    /// Current settlement state.
    State(StateSnapshot),

    /// A building was constructed.
    Built { id: u32, kind: String },

    /// A building was demolished.
    Demolished { id: u32, kind: String },

    /// Save blob written.
    Saved { path: String, bytes: usize },

    /// Save blob loaded.
    Loaded { path: String, tick: u64 },

    /// Game has ended.
    GameOver {
        victory: bool,
        reason: String,
        tick: u64,
    },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Everything a controller needs to decide its next command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tick: u64,
    pub date: SimDate,
    pub ledger: ResourceLedger,
    pub buildings: u32,
    pub tier: String,
    pub era: String,
    pub leader: String,
    pub quota: QuotaState,
    pub quota_failures: u32,
    pub black_marks: u32,
    pub ended: bool,
    pub hash: u64,
}

impl StateSnapshot {
    /// Capture the current state of a simulation.
    #[must_use]
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            tick: sim.total_ticks(),
            date: sim.date(),
            ledger: *sim.ledger(),
            buildings: sim.world().buildings.len() as u32,
            tier: sim.world().tier.to_string(),
            era: sim.era().current_era().to_string(),
            leader: sim.politburo().leader().name.clone(),
            quota: *sim.quota().state(),
            quota_failures: sim.quota().consecutive_failures(),
            black_marks: sim.personnel().effective_marks(),
            ended: sim.is_ended(),
            hash: sim.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::State => "state",
            Self::Build { .. } => "build",
            Self::Demolish { .. } => "demolish",
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
