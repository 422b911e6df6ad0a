//! Outbound notifications.
//!
//! The simulation pushes [`SimEvent`]s onto an [`EventQueue`] while it ticks;
//! the host drains the queue after each tick and decides how to present
//! them. The core never calls back into the host.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingId, BuildingKind};
use crate::chronology::{DayPhase, Season, SimDate, Weather};
use crate::politburo::PolitburoEvent;
use crate::settlement::SettlementTier;

/// How urgently a toast should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine.
    Info,
    /// Worth attention.
    Warning,
    /// Drop everything.
    Critical,
}

/// Everything the simulation reports to its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// A tick completed. Emitted every tick.
    StateChanged {
        /// Ticks since the start.
        tick: u64,
        /// Date after the tick.
        date: SimDate,
    },
    /// The season changed.
    SeasonChanged {
        /// New season.
        season: Season,
    },
    /// The weather changed.
    WeatherChanged {
        /// New weather.
        weather: Weather,
    },
    /// The time of day changed.
    DayPhaseChanged {
        /// New phase.
        phase: DayPhase,
    },
    /// Short popup message.
    Toast {
        /// Text.
        message: String,
        /// Urgency.
        severity: Severity,
    },
    /// Advice from the chairman's aide.
    Advisor {
        /// Text.
        message: String,
    },
    /// Headline for the news ticker.
    News {
        /// Text.
        headline: String,
    },
    /// A building wore out and fell down.
    BuildingCollapsed {
        /// Registry id.
        id: BuildingId,
        /// What it was.
        kind: BuildingKind,
    },
    /// The settlement was promoted or demoted.
    SettlementTierChanged {
        /// Previous tier.
        from: SettlementTier,
        /// New tier.
        to: SettlementTier,
    },
    /// The game ended. No further events follow.
    GameOver {
        /// Whether the player won.
        victory: bool,
        /// Why it ended.
        reason: String,
    },
}

impl SimEvent {
    /// Short toast.
    #[must_use]
    pub fn toast(message: impl Into<String>, severity: Severity) -> Self {
        Self::Toast {
            message: message.into(),
            severity,
        }
    }

    /// Ticker headline.
    #[must_use]
    pub fn news(headline: impl Into<String>) -> Self {
        Self::News {
            headline: headline.into(),
        }
    }

    /// Aide message.
    #[must_use]
    pub fn advisor(message: impl Into<String>) -> Self {
        Self::Advisor {
            message: message.into(),
        }
    }

    /// Snake-case name of the variant, as used for the `event` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::SeasonChanged { .. } => "season_changed",
            Self::WeatherChanged { .. } => "weather_changed",
            Self::DayPhaseChanged { .. } => "day_phase_changed",
            Self::Toast { .. } => "toast",
            Self::Advisor { .. } => "advisor",
            Self::News { .. } => "news",
            Self::BuildingCollapsed { .. } => "building_collapsed",
            Self::SettlementTierChanged { .. } => "settlement_tier_changed",
            Self::GameOver { .. } => "game_over",
        }
    }

    /// Whether this is the terminal event.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        matches!(self, Self::GameOver { .. })
    }
}

impl From<&PolitburoEvent> for SimEvent {
    fn from(event: &PolitburoEvent) -> Self {
        match event {
            PolitburoEvent::Embezzlement { ministry, amount } => Self::news(format!(
                "Audit finds {amount:.0} rubles missing from the {ministry} ministry"
            )),
            PolitburoEvent::Intrigue { ministry } => Self::advisor(format!(
                "Comrade, the {ministry} minister has been seen meeting at night. Take note."
            )),
            PolitburoEvent::Conflict(key) => Self::news(format!(
                "Open dispute between the {} and {} ministries",
                key.0, key.1
            )),
            PolitburoEvent::Cooperation(key) => Self::news(format!(
                "The {} and {} ministries announce a joint initiative",
                key.0, key.1
            )),
            PolitburoEvent::Purge {
                ministry,
                removed,
                replacement,
            } => Self::toast(
                format!("{removed} ({ministry}) has been removed. {replacement} takes the post."),
                Severity::Warning,
            ),
            PolitburoEvent::Coup { ministry, plotter } => Self::toast(
                format!("Coup! {plotter} of the {ministry} ministry seizes power"),
                Severity::Critical,
            ),
            PolitburoEvent::LeaderDied { name, cause } => {
                Self::news(format!("General Secretary {name} is dead ({cause})"))
            }
            PolitburoEvent::Succession {
                name, personality, ..
            } => Self::toast(
                format!("{name}, a {personality}, is the new General Secretary"),
                Severity::Warning,
            ),
        }
    }
}

/// FIFO of events awaiting the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQueue {
    events: VecDeque<SimEvent>,
}

impl EventQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    /// Pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::politburo::{CauseOfDeath, Ministry, TensionKey};

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(SimEvent::news("first"));
        queue.push(SimEvent::news("second"));
        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert_eq!(drained[0], SimEvent::news("first"));
        assert_eq!(drained[1], SimEvent::news("second"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_politburo_events_become_messages() {
        let coup = SimEvent::from(&PolitburoEvent::Coup {
            ministry: Ministry::Defense,
            plotter: "Boris Frolov".to_string(),
        });
        assert!(matches!(
            coup,
            SimEvent::Toast {
                severity: Severity::Critical,
                ..
            }
        ));

        let died = SimEvent::from(&PolitburoEvent::LeaderDied {
            name: "Yuri Orlov".to_string(),
            cause: CauseOfDeath::NaturalCauses,
        });
        let SimEvent::News { headline } = died else {
            panic!("expected a headline");
        };
        assert!(headline.contains("natural causes"));

        let conflict = SimEvent::from(&PolitburoEvent::Conflict(TensionKey::new(
            Ministry::Health,
            Ministry::Defense,
        )));
        assert!(matches!(conflict, SimEvent::News { .. }));
    }

    #[test]
    fn test_game_over_serializes() {
        let event = SimEvent::GameOver {
            victory: false,
            reason: "arrested".to_string(),
        };
        assert!(event.is_game_over());
        assert_eq!(event.kind(), "game_over");
        let text = ron::to_string(&event).unwrap();
        assert!(text.contains("arrested"));
    }
}
