//! Simulation constants.
//!
//! The calendar, plan cadence and loss thresholds are data, not code, so a
//! scenario can shorten months for testing or raise the quota failure cap.
//! Parsing is string-based; reading files is the host's job.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::modifiers::ModifierVector;

/// Tunable constants for one simulation run.
///
/// # Example RON
///
/// ```ron
/// SimConfig(
///     ticks_per_day: 4,
///     days_per_month: 30,
///     months_per_year: 12,
///     start_year: 1917,
///     plan_length_years: 5,
///     quota_failure_cap: 3,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks in one in-game day.
    pub ticks_per_day: u32,
    /// Days in one in-game month.
    pub days_per_month: u32,
    /// Months in one in-game year.
    pub months_per_year: u32,
    /// Calendar year of tick 0.
    pub start_year: u32,
    /// Years between quota deadlines after a met plan.
    pub plan_length_years: u32,
    /// Consecutive quota failures that end the game.
    pub quota_failure_cap: u32,
    /// Target of the very first plan.
    pub initial_quota_target: f64,
    /// Effective black marks at which the chairman is arrested.
    pub arrest_threshold: u32,
    /// Ticks that must elapse before an empty settlement counts as lost.
    /// `None` means one full year.
    pub population_loss_grace_ticks: Option<u64>,
    /// Reaching this year ends the game in victory.
    pub victory_year: Option<u32>,
    /// Difficulty multipliers applied beneath era and politburo modifiers.
    pub base_modifiers: ModifierVector,
    /// Storage available with no warehouses.
    pub base_storage: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_day: 4,
            days_per_month: 30,
            months_per_year: 12,
            start_year: 1917,
            plan_length_years: 5,
            quota_failure_cap: 3,
            initial_quota_target: 400.0,
            arrest_threshold: 7,
            population_loss_grace_ticks: None,
            victory_year: None,
            base_modifiers: ModifierVector::default(),
            base_storage: 200.0,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from RON text. Missing fields take defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject constants that would stall the calendar or the plan.
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_day == 0 {
            return Err(GameError::InvalidConfig("ticks_per_day must be positive".into()));
        }
        if self.days_per_month == 0 {
            return Err(GameError::InvalidConfig("days_per_month must be positive".into()));
        }
        if self.months_per_year == 0 {
            return Err(GameError::InvalidConfig("months_per_year must be positive".into()));
        }
        if self.plan_length_years == 0 {
            return Err(GameError::InvalidConfig("plan_length_years must be positive".into()));
        }
        if self.quota_failure_cap == 0 {
            return Err(GameError::InvalidConfig("quota_failure_cap must be positive".into()));
        }
        if !(self.initial_quota_target.is_finite() && self.initial_quota_target > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "initial_quota_target must be positive, got {}",
                self.initial_quota_target
            )));
        }
        if !(self.base_storage.is_finite() && self.base_storage >= 0.0) {
            return Err(GameError::InvalidConfig("base_storage must be non-negative".into()));
        }
        Ok(())
    }

    /// Ticks in one month.
    #[must_use]
    pub const fn ticks_per_month(&self) -> u32 {
        self.ticks_per_day * self.days_per_month
    }

    /// Ticks in one year.
    #[must_use]
    pub const fn ticks_per_year(&self) -> u64 {
        self.ticks_per_month() as u64 * self.months_per_year as u64
    }

    /// Grace period before the empty-settlement loss can fire.
    #[must_use]
    pub fn loss_grace_ticks(&self) -> u64 {
        self.population_loss_grace_ticks
            .unwrap_or_else(|| self.ticks_per_year())
    }
}
