//! Error types for the settlement simulation.
//!
//! Two classes of failure exist: precondition violations detected while the
//! simulation is being assembled, and invalid input rejected at the API
//! boundary. Stochastic outcomes (infection, purge, coup) and game over are
//! ordinary simulation states and never show up here.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A shared store the simulation cannot run without was not supplied.
    #[error("Missing required simulation store: {0}")]
    MissingPrecondition(&'static str),

    /// A configuration constant is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown disease name.
    #[error("Unknown disease type: {0}")]
    UnknownDiseaseType(String),

    /// Unknown ministry name.
    #[error("Unknown ministry: {0}")]
    UnknownMinistry(String),

    /// Unknown personality name.
    #[error("Unknown personality: {0}")]
    UnknownPersonality(String),

    /// Unknown era identifier.
    #[error("Unknown era: {0}")]
    UnknownEra(String),

    /// Unknown building kind.
    #[error("Unknown building kind: {0}")]
    UnknownBuildingKind(String),

    /// Invalid building identifier.
    #[error("Building not found: {0}")]
    BuildingNotFound(u32),

    /// Building kind not available in the current era or settlement tier.
    #[error("Building '{kind}' is locked: {reason}")]
    BuildingLocked {
        /// Building kind that was requested.
        kind: String,
        /// Why it is unavailable.
        reason: String,
    },

    /// Not enough money in the treasury.
    #[error("Insufficient funds: need {required:.0} rubles, have {available:.0}")]
    InsufficientFunds {
        /// Amount required.
        required: f64,
        /// Amount available.
        available: f64,
    },

    /// Save data could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}
