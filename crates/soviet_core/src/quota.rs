//! The five-year plan.
//!
//! A quota names a resource, a target stock and a deadline year. It is
//! evaluated on year boundaries once the deadline has arrived:
//!
//! - **Met**: the failure streak resets, the resource swaps between food and
//!   vodka, the target grows by the doctrine's factor and a new plan starts.
//! - **Missed**: the streak grows and the deadline slips by one year, or the
//!   game ends once the streak reaches the cap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimConfig;
use crate::resources::ResourceLedger;

/// Overshoot above which a met plan earns a commendation.
pub const COMMENDATION_RATIO: f64 = 1.1;

/// Resource a quota is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaResource {
    /// Food stock.
    Food,
    /// Vodka stock.
    Vodka,
}

impl QuotaResource {
    /// The other resource.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::Food => Self::Vodka,
            Self::Vodka => Self::Food,
        }
    }

    /// Current stock of this resource.
    #[must_use]
    pub const fn ledger_value(self, ledger: &ResourceLedger) -> f64 {
        match self {
            Self::Food => ledger.food,
            Self::Vodka => ledger.vodka,
        }
    }
}

/// The active plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    /// Resource measured.
    #[serde(rename = "type")]
    pub resource: QuotaResource,
    /// Stock required at the deadline.
    pub target: f64,
    /// Stock right now.
    pub current: f64,
    /// Year the plan is judged.
    pub deadline_year: u32,
}

/// Result of a year-boundary evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuotaOutcome {
    /// Deadline not reached yet.
    Pending,
    /// Plan fulfilled.
    Met {
        /// Overshoot earned a commendation.
        commendation: bool,
        /// The plan that replaces it.
        next: QuotaState,
    },
    /// Plan missed, deadline extended.
    Missed {
        /// Consecutive failures including this one.
        failures: u32,
        /// Black marks earned.
        black_marks: u32,
        /// Extended deadline.
        deadline_year: u32,
    },
    /// Too many consecutive failures.
    GameOver {
        /// Consecutive failures.
        failures: u32,
    },
}

/// Black marks for missing a plan, by the fraction of the target achieved.
#[must_use]
pub fn severity_marks(achieved: f64) -> u32 {
    if achieved >= 0.75 {
        1
    } else if achieved >= 0.5 {
        2
    } else {
        3
    }
}

/// Tracks the plan and the consecutive-failure streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaSystem {
    state: QuotaState,
    consecutive_failures: u32,
    failure_cap: u32,
    plan_length_years: u32,
}

impl QuotaSystem {
    /// First plan: food, due one plan length after the start year.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            state: QuotaState {
                resource: QuotaResource::Food,
                target: config.initial_quota_target,
                current: 0.0,
                deadline_year: config.start_year + config.plan_length_years,
            },
            consecutive_failures: 0,
            failure_cap: config.quota_failure_cap,
            plan_length_years: config.plan_length_years,
        }
    }

    /// Start from an explicit plan.
    #[must_use]
    pub fn with_state(state: QuotaState, config: &SimConfig) -> Self {
        Self {
            state,
            ..Self::new(config)
        }
    }

    /// The active plan.
    #[must_use]
    pub const fn state(&self) -> &QuotaState {
        &self.state
    }

    /// Consecutive missed plans.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Follow the ledger value of the quota resource.
    pub fn track(&mut self, ledger: &ResourceLedger) {
        self.state.current = self.state.resource.ledger_value(ledger);
    }

    /// Judge the plan if `year` has reached the deadline.
    ///
    /// `growth` scales the next target when the plan is met.
    pub fn evaluate(&mut self, year: u32, growth: f64) -> QuotaOutcome {
        if year < self.state.deadline_year {
            return QuotaOutcome::Pending;
        }

        let QuotaState {
            resource,
            target,
            current,
            deadline_year,
        } = self.state;

        if current >= target {
            self.consecutive_failures = 0;
            self.state = QuotaState {
                resource: resource.swapped(),
                target: target * growth.max(0.0),
                current: 0.0,
                deadline_year: deadline_year.max(year) + self.plan_length_years,
            };
            debug!(?resource, target, current, "Plan fulfilled");
            return QuotaOutcome::Met {
                commendation: current > target * COMMENDATION_RATIO,
                next: self.state,
            };
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.failure_cap {
            return QuotaOutcome::GameOver {
                failures: self.consecutive_failures,
            };
        }

        let achieved = if target > 0.0 { current / target } else { 1.0 };
        self.state.deadline_year = year + 1;
        debug!(?resource, target, current, failures = self.consecutive_failures, "Plan missed");
        QuotaOutcome::Missed {
            failures: self.consecutive_failures,
            black_marks: severity_marks(achieved),
            deadline_year: self.state.deadline_year,
        }
    }
}
