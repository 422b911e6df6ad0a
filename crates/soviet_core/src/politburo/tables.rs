//! Static reference tables for the politburo.

use super::types::{Ministry, Personality};
use crate::modifiers::ModifierField;

/// How well two personalities get along, in `[-1, 1]`. Symmetric.
#[must_use]
pub const fn compatibility(a: Personality, b: Personality) -> f64 {
    const TABLE: [[f64; 6]; 6] = [
        // Zea   Ide   Ref   Tec   App   Mil
        [1.0, 0.3, -0.8, -0.2, 0.2, 0.6],   // Zealot
        [0.3, 1.0, 0.4, 0.0, -0.4, -0.3],   // Idealist
        [-0.8, 0.4, 1.0, 0.5, -0.6, -0.5],  // Reformer
        [-0.2, 0.0, 0.5, 1.0, 0.1, 0.0],    // Technocrat
        [0.2, -0.4, -0.6, 0.1, 1.0, 0.3],   // Apparatchik
        [0.6, -0.3, -0.5, 0.0, 0.3, 1.0],   // Militarist
    ];
    TABLE[a as usize][b as usize]
}

/// How a leader staffs the cabinet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppointmentStrategy {
    /// Personalities drawn for new appointees.
    pub preferred: &'static [Personality],
    /// Chance an incumbent survives succession.
    pub retention: f64,
    /// Ministries always cleaned out at succession.
    pub purges: &'static [Ministry],
}

/// Lower bound on keeping the state security incumbent.
pub const SECURITY_RETENTION: f64 = 0.9;

/// Appointment strategy for a leader of `personality`.
#[must_use]
pub const fn appointment_strategy(personality: Personality) -> AppointmentStrategy {
    use Ministry as M;
    use Personality as P;
    match personality {
        P::Zealot => AppointmentStrategy {
            preferred: &[P::Zealot, P::Militarist],
            retention: 0.3,
            purges: &[M::Culture, M::Education],
        },
        P::Idealist => AppointmentStrategy {
            preferred: &[P::Idealist, P::Reformer],
            retention: 0.6,
            purges: &[],
        },
        P::Reformer => AppointmentStrategy {
            preferred: &[P::Reformer, P::Technocrat],
            retention: 0.5,
            purges: &[M::StateSecurity],
        },
        P::Technocrat => AppointmentStrategy {
            preferred: &[P::Technocrat, P::Reformer],
            retention: 0.7,
            purges: &[],
        },
        P::Apparatchik => AppointmentStrategy {
            preferred: &[P::Apparatchik, P::Technocrat],
            retention: 0.8,
            purges: &[],
        },
        P::Militarist => AppointmentStrategy {
            preferred: &[P::Militarist, P::Zealot],
            retention: 0.4,
            purges: &[M::Culture],
        },
    }
}

/// A quarterly tension rule. `None` matches any personality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensionRule {
    /// First ministry.
    pub a: Ministry,
    /// Personality required in the first ministry.
    pub a_personality: Option<Personality>,
    /// Second ministry.
    pub b: Ministry,
    /// Personality required in the second ministry.
    pub b_personality: Option<Personality>,
    /// Quarterly change in tension. Negative values build cooperation.
    pub delta: f64,
}

const fn rule(
    a: Ministry,
    a_personality: Option<Personality>,
    b: Ministry,
    b_personality: Option<Personality>,
    delta: f64,
) -> TensionRule {
    TensionRule {
        a,
        a_personality,
        b,
        b_personality,
        delta,
    }
}

/// Structural rivalries and alliances between portfolios.
pub static TENSION_RULES: [TensionRule; 8] = {
    use Ministry as M;
    use Personality as P;
    [
        rule(M::Defense, Some(P::Militarist), M::Planning, None, 6.0),
        rule(M::StateSecurity, Some(P::Zealot), M::Culture, Some(P::Reformer), 10.0),
        rule(M::StateSecurity, None, M::Education, Some(P::Idealist), 5.0),
        rule(M::HeavyIndustry, None, M::LightIndustry, None, 4.0),
        rule(M::Health, None, M::Defense, None, 3.0),
        rule(M::Agriculture, None, M::Planning, Some(P::Technocrat), -4.0),
        rule(M::HeavyIndustry, Some(P::Technocrat), M::Transport, Some(P::Technocrat), -6.0),
        rule(M::Planning, Some(P::Apparatchik), M::HeavyIndustry, Some(P::Apparatchik), -5.0),
    ]
};

/// Weight of personality (in)compatibility in the quarterly tension change.
pub const COMPATIBILITY_TENSION_WEIGHT: f64 = 3.0;

/// Modifier adjustment contributed when `ministry` is held by `personality`,
/// before scaling by competence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierOverride {
    /// Portfolio.
    pub ministry: Ministry,
    /// Holder's temperament.
    pub personality: Personality,
    /// Affected component.
    pub field: ModifierField,
    /// Additive change to the component.
    pub delta: f64,
}

const fn ov(
    ministry: Ministry,
    personality: Personality,
    field: ModifierField,
    delta: f64,
) -> ModifierOverride {
    ModifierOverride {
        ministry,
        personality,
        field,
        delta,
    }
}

/// Every (ministry, personality) pairing that shifts the modifier vector.
pub static MODIFIER_OVERRIDES: [ModifierOverride; 18] = {
    use ModifierField as F;
    use Ministry as M;
    use Personality as P;
    [
        ov(M::Agriculture, P::Technocrat, F::Production, 0.1),
        ov(M::Agriculture, P::Zealot, F::Production, -0.1),
        ov(M::HeavyIndustry, P::Technocrat, F::Production, 0.15),
        ov(M::HeavyIndustry, P::Militarist, F::Decay, -0.1),
        ov(M::LightIndustry, P::Reformer, F::Consumption, -0.1),
        ov(M::LightIndustry, P::Apparatchik, F::Corruption, 0.1),
        ov(M::Defense, P::Militarist, F::EventFrequency, 0.1),
        ov(M::StateSecurity, P::Zealot, F::EventFrequency, -0.15),
        ov(M::StateSecurity, P::Apparatchik, F::Corruption, 0.15),
        ov(M::Health, P::Idealist, F::PopulationGrowth, 0.15),
        ov(M::Health, P::Technocrat, F::PopulationGrowth, 0.1),
        ov(M::Education, P::Reformer, F::Production, 0.05),
        ov(M::Culture, P::Idealist, F::EventFrequency, -0.05),
        ov(M::Planning, P::Technocrat, F::Production, 0.1),
        ov(M::Planning, P::Apparatchik, F::Production, -0.05),
        ov(M::Planning, P::Apparatchik, F::Corruption, 0.1),
        ov(M::Transport, P::Technocrat, F::Decay, -0.1),
        ov(M::Transport, P::Zealot, F::Decay, 0.05),
    ]
};

/// Leader names.
pub static LEADER_NAMES: &[&str] = &[
    "Pyotr Gromov",
    "Arkady Belov",
    "Grigory Zhdanov",
    "Leonid Sokolov",
    "Yuri Orlov",
    "Konstantin Rybakov",
    "Mikhail Volkov",
    "Nikolai Podgorny",
    "Vasily Kuznetsov",
    "Andrei Morozov",
];

/// Minister first names.
pub static FIRST_NAMES: &[&str] = &[
    "Alexei", "Boris", "Dmitri", "Fyodor", "Gennady", "Igor", "Lavrenty", "Maxim", "Oleg",
    "Semyon", "Timofei", "Viktor", "Yakov", "Zinovy", "Nadezhda", "Yekaterina",
];

/// Minister surnames.
pub static SURNAMES: &[&str] = &[
    "Antonov", "Bulganin", "Chernov", "Dobrynin", "Frolov", "Gusev", "Kalinin", "Lebedev",
    "Malenkov", "Novikov", "Pavlov", "Suslov", "Tikhonov", "Ustinov", "Zaitseva", "Yegorova",
];
