//! Settlement tiers.
//!
//! A settlement is promoted one tier at a time once both its population and
//! its building count meet the next tier's thresholds, and demoted when its
//! population falls below half of its current tier's population threshold.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Administrative rank of the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SettlementTier {
    /// Village.
    Selo,
    /// Urban-type settlement.
    Posyolok,
    /// Town.
    Gorod,
    /// Regional capital.
    Metropolis,
}

impl SettlementTier {
    /// Population and building count required to hold this tier.
    #[must_use]
    pub const fn thresholds(self) -> (u32, usize) {
        match self {
            Self::Selo => (0, 0),
            Self::Posyolok => (50, 8),
            Self::Gorod => (200, 20),
            Self::Metropolis => (1000, 50),
        }
    }

    /// Next tier up, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Selo => Some(Self::Posyolok),
            Self::Posyolok => Some(Self::Gorod),
            Self::Gorod => Some(Self::Metropolis),
            Self::Metropolis => None,
        }
    }

    /// Next tier down, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Selo => None,
            Self::Posyolok => Some(Self::Selo),
            Self::Gorod => Some(Self::Posyolok),
            Self::Metropolis => Some(Self::Gorod),
        }
    }
}

impl fmt::Display for SettlementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Selo => "selo",
            Self::Posyolok => "posyolok",
            Self::Gorod => "gorod",
            Self::Metropolis => "metropolis",
        };
        f.write_str(name)
    }
}

/// Tier the settlement should hold given its current metrics.
///
/// Moves at most one step from `current`.
#[must_use]
pub fn evaluate_tier(current: SettlementTier, population: u32, buildings: usize) -> SettlementTier {
    if let Some(next) = current.next() {
        let (pop_needed, buildings_needed) = next.thresholds();
        if population >= pop_needed && buildings >= buildings_needed {
            return next;
        }
    }

    let (pop_held, _) = current.thresholds();
    if let Some(previous) = current.previous() {
        if population < pop_held / 2 {
            return previous;
        }
    }

    current
}
