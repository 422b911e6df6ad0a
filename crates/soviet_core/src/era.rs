//! Historical eras.
//!
//! The current year maps to one of seven eras through an ordered year-range
//! lookup; the last era never ends. Each era unlocks buildings (availability
//! is cumulative), sets a doctrine, delivery rates and a construction method,
//! and contributes a [`ModifierVector`]. When the era changes the old vector
//! blends linearly into the new one over [`TRANSITION_TICKS`] ticks.
//!
//! The system never touches the resource ledger. It serializes through
//! [`EraSnapshot`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::buildings::BuildingKind;
use crate::economy::DeliveryRates;
use crate::error::GameError;
use crate::modifiers::ModifierVector;
use crate::settlement::SettlementTier;

/// Length of the modifier blend after an era change.
pub const TRANSITION_TICKS: u32 = 10;

/// Identifier of a historical era, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraId {
    /// 1917–1921.
    Revolution,
    /// 1922–1940.
    Industrialization,
    /// 1941–1945.
    GreatPatrioticWar,
    /// 1946–1955.
    Reconstruction,
    /// 1956–1964.
    Thaw,
    /// 1965–1984.
    Stagnation,
    /// 1985 onwards.
    Perestroika,
}

impl EraId {
    /// All eras in order.
    pub const ALL: [Self; 7] = [
        Self::Revolution,
        Self::Industrialization,
        Self::GreatPatrioticWar,
        Self::Reconstruction,
        Self::Thaw,
        Self::Stagnation,
        Self::Perestroika,
    ];

    /// Static definition.
    #[must_use]
    pub fn definition(self) -> &'static EraDefinition {
        &ERAS[self as usize]
    }

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolution => "revolution",
            Self::Industrialization => "industrialization",
            Self::GreatPatrioticWar => "great_patriotic_war",
            Self::Reconstruction => "reconstruction",
            Self::Thaw => "thaw",
            Self::Stagnation => "stagnation",
            Self::Perestroika => "perestroika",
        }
    }
}

impl fmt::Display for EraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EraId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|era| era.as_str() == s)
            .ok_or_else(|| GameError::UnknownEra(s.to_string()))
    }
}

/// Economic line of the era; drives how fast quotas grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Doctrine {
    /// Requisition everything.
    WarCommunism,
    /// Forced industrial growth.
    FiveYearPlans,
    /// Everything for the front.
    TotalMobilization,
    /// Rebuild what was lost.
    Rebuilding,
    /// Consumer goods and housing.
    Liberalization,
    /// Hold the line.
    Developed,
    /// Restructuring.
    Glasnost,
}

impl Doctrine {
    /// Factor applied to the quota target after a plan is met.
    #[must_use]
    pub const fn quota_growth(self) -> f64 {
        match self {
            Self::WarCommunism => 1.1,
            Self::FiveYearPlans => 1.3,
            Self::TotalMobilization => 1.2,
            Self::Rebuilding => 1.15,
            Self::Liberalization => 1.1,
            Self::Developed => 1.05,
            Self::Glasnost => 1.0,
        }
    }
}

/// How buildings are put up; scales construction cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstructionMethod {
    /// Shovels and volunteers.
    Manual,
    /// Tractors and cranes.
    Mechanized,
    /// Standard industrial components.
    Industrial,
    /// Factory-made panels.
    Prefabricated,
}

impl ConstructionMethod {
    /// Multiplier on building cost.
    #[must_use]
    pub const fn cost_factor(self) -> f64 {
        match self {
            Self::Manual => 1.0,
            Self::Mechanized => 0.9,
            Self::Industrial => 0.8,
            Self::Prefabricated => 0.7,
        }
    }
}

/// Static description of one era.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraDefinition {
    /// Identifier.
    pub id: EraId,
    /// Display name.
    pub name: &'static str,
    /// First year of the era.
    pub start_year: u32,
    /// Last year of the era; `None` for the final era.
    pub end_year: Option<u32>,
    /// Buildings first unlocked in this era.
    pub unlocks: &'static [BuildingKind],
    /// Gameplay multipliers.
    pub modifiers: ModifierVector,
    /// Economic doctrine.
    pub doctrine: Doctrine,
    /// Share of production taken by the state.
    pub delivery: DeliveryRates,
    /// Construction technique.
    pub construction: ConstructionMethod,
}

const fn modifiers(
    production: f64,
    consumption: f64,
    decay: f64,
    population_growth: f64,
    event_frequency: f64,
    corruption: f64,
) -> ModifierVector {
    ModifierVector {
        production,
        consumption,
        decay,
        population_growth,
        event_frequency,
        corruption,
    }
}

const fn delivery(food: f64, vodka: f64, money: f64) -> DeliveryRates {
    DeliveryRates { food, vodka, money }
}

static ERAS: [EraDefinition; 7] = {
    use BuildingKind as B;
    [
        EraDefinition {
            id: EraId::Revolution,
            name: "Revolution and Civil War",
            start_year: 1917,
            end_year: Some(1921),
            unlocks: &[B::CollectiveFarm, B::Barracks, B::Warehouse, B::Distillery],
            modifiers: modifiers(0.8, 1.0, 1.2, 1.0, 1.3, 1.2),
            doctrine: Doctrine::WarCommunism,
            delivery: delivery(0.35, 0.3, 0.2),
            construction: ConstructionMethod::Manual,
        },
        EraDefinition {
            id: EraId::Industrialization,
            name: "Industrialization",
            start_year: 1922,
            end_year: Some(1940),
            unlocks: &[B::PowerStation, B::Factory, B::Gulag],
            modifiers: modifiers(1.2, 1.1, 1.1, 0.9, 1.2, 1.0),
            doctrine: Doctrine::FiveYearPlans,
            delivery: delivery(0.3, 0.3, 0.3),
            construction: ConstructionMethod::Mechanized,
        },
        EraDefinition {
            id: EraId::GreatPatrioticWar,
            name: "Great Patriotic War",
            start_year: 1941,
            end_year: Some(1945),
            unlocks: &[B::Hospital],
            modifiers: modifiers(1.4, 1.3, 1.5, 0.5, 1.5, 0.8),
            doctrine: Doctrine::TotalMobilization,
            delivery: delivery(0.5, 0.4, 0.4),
            construction: ConstructionMethod::Mechanized,
        },
        EraDefinition {
            id: EraId::Reconstruction,
            name: "Reconstruction",
            start_year: 1946,
            end_year: Some(1955),
            unlocks: &[B::Apartment],
            modifiers: modifiers(1.0, 1.0, 1.0, 1.3, 1.0, 1.0),
            doctrine: Doctrine::Rebuilding,
            delivery: delivery(0.3, 0.25, 0.25),
            construction: ConstructionMethod::Industrial,
        },
        EraDefinition {
            id: EraId::Thaw,
            name: "The Thaw",
            start_year: 1956,
            end_year: Some(1964),
            unlocks: &[B::Khrushchyovka, B::Polyclinic],
            modifiers: modifiers(1.1, 0.9, 0.9, 1.2, 0.9, 1.1),
            doctrine: Doctrine::Liberalization,
            delivery: delivery(0.2, 0.2, 0.2),
            construction: ConstructionMethod::Prefabricated,
        },
        EraDefinition {
            id: EraId::Stagnation,
            name: "Era of Stagnation",
            start_year: 1965,
            end_year: Some(1984),
            unlocks: &[B::Panelka, B::NuclearPlant],
            modifiers: modifiers(0.9, 1.0, 1.3, 1.0, 0.8, 1.5),
            doctrine: Doctrine::Developed,
            delivery: delivery(0.25, 0.3, 0.25),
            construction: ConstructionMethod::Prefabricated,
        },
        EraDefinition {
            id: EraId::Perestroika,
            name: "Perestroika",
            start_year: 1985,
            end_year: None,
            unlocks: &[B::Cooperative],
            modifiers: modifiers(0.85, 1.1, 1.2, 0.9, 1.4, 1.8),
            doctrine: Doctrine::Glasnost,
            delivery: delivery(0.1, 0.15, 0.15),
            construction: ConstructionMethod::Industrial,
        },
    ]
};

/// Era covering `year`. Years before the first era map to the first era.
#[must_use]
pub fn era_for_year(year: u32) -> EraId {
    EraId::ALL
        .iter()
        .rev()
        .copied()
        .find(|era| era.definition().start_year <= year)
        .unwrap_or(EraId::Revolution)
}

/// An era change detected by [`EraSystem::check_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraTransition {
    /// Era being left.
    pub from: EraId,
    /// Era being entered.
    pub to: EraId,
}

/// Serialized form of [`EraSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraSnapshot {
    /// Last year passed to `check_transition`.
    pub current_year: u32,
    /// Era left by the most recent transition.
    pub previous_era_id: Option<EraId>,
    /// Ticks left in the modifier blend.
    pub transition_ticks_remaining: u32,
    /// Modifiers in force when the blend started. When absent, the
    /// previous era's own modifiers stand in.
    #[serde(default)]
    pub blend_from: Option<ModifierVector>,
}

/// Tracks the current era and blends modifiers across transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EraSnapshot", into = "EraSnapshot")]
pub struct EraSystem {
    current_year: u32,
    previous: Option<EraId>,
    transition_ticks_remaining: u32,
    blend_from: Option<ModifierVector>,
}

impl From<EraSnapshot> for EraSystem {
    fn from(snapshot: EraSnapshot) -> Self {
        let blend_from = snapshot
            .blend_from
            .or_else(|| snapshot.previous_era_id.map(|era| era.definition().modifiers));
        Self {
            current_year: snapshot.current_year,
            previous: snapshot.previous_era_id,
            transition_ticks_remaining: snapshot.transition_ticks_remaining.min(TRANSITION_TICKS),
            blend_from,
        }
    }
}

impl From<EraSystem> for EraSnapshot {
    fn from(system: EraSystem) -> Self {
        system.snapshot()
    }
}

impl EraSystem {
    /// Start in the era covering `year`, with no blend in progress.
    #[must_use]
    pub const fn new(year: u32) -> Self {
        Self {
            current_year: year,
            previous: None,
            transition_ticks_remaining: 0,
            blend_from: None,
        }
    }

    /// Current state in serialized form.
    #[must_use]
    pub const fn snapshot(&self) -> EraSnapshot {
        EraSnapshot {
            current_year: self.current_year,
            previous_era_id: self.previous,
            transition_ticks_remaining: self.transition_ticks_remaining,
            blend_from: self.blend_from,
        }
    }

    /// Era for the tracked year.
    #[must_use]
    pub fn current_era(&self) -> EraId {
        era_for_year(self.current_year)
    }

    /// Definition of the current era.
    #[must_use]
    pub fn definition(&self) -> &'static EraDefinition {
        self.current_era().definition()
    }

    /// Era left by the most recent transition.
    #[must_use]
    pub const fn previous_era(&self) -> Option<EraId> {
        self.previous
    }

    /// Whether a modifier blend is in progress.
    #[must_use]
    pub const fn in_transition(&self) -> bool {
        self.transition_ticks_remaining > 0 && self.blend_from.is_some()
    }

    /// Ticks left in the blend.
    #[must_use]
    pub const fn transition_ticks_remaining(&self) -> u32 {
        self.transition_ticks_remaining
    }

    /// Track `year` and start a blend if the era changed.
    ///
    /// The blend starts from whatever [`get_modifiers`](Self::get_modifiers)
    /// returned before the change, so a transition that lands mid-blend
    /// continues from the partially blended vector.
    pub fn check_transition(&mut self, year: u32) -> Option<EraTransition> {
        let before = self.current_era();
        let from = self.get_modifiers();
        self.current_year = year;
        let after = self.current_era();
        if before == after {
            return None;
        }

        self.previous = Some(before);
        self.blend_from = Some(from);
        self.transition_ticks_remaining = TRANSITION_TICKS;
        info!(from = %before, to = %after, year, "Era transition");
        Some(EraTransition {
            from: before,
            to: after,
        })
    }

    /// Advance the blend by one tick.
    pub fn tick_transition(&mut self) {
        self.transition_ticks_remaining = self.transition_ticks_remaining.saturating_sub(1);
    }

    /// Current era modifiers, blended if a transition is in progress.
    #[must_use]
    pub fn get_modifiers(&self) -> ModifierVector {
        let target = self.definition().modifiers;
        match self.blend_from {
            Some(from) if self.transition_ticks_remaining > 0 => {
                let elapsed = TRANSITION_TICKS - self.transition_ticks_remaining;
                let t = f64::from(elapsed) / f64::from(TRANSITION_TICKS);
                ModifierVector::lerp(&from, &target, t)
            }
            _ => target,
        }
    }

    /// Buildings unlocked by this era or any earlier one, optionally limited
    /// to those the settlement tier allows.
    #[must_use]
    pub fn available_buildings(&self, tier: Option<SettlementTier>) -> Vec<BuildingKind> {
        let current = self.current_era();
        EraId::ALL
            .iter()
            .filter(|era| **era <= current)
            .flat_map(|era| era.definition().unlocks.iter().copied())
            .filter(|kind| tier.map_or(true, |t| kind.definition().min_tier <= t))
            .collect()
    }

    /// Current doctrine.
    #[must_use]
    pub fn doctrine(&self) -> Doctrine {
        self.definition().doctrine
    }

    /// Current delivery rates.
    #[must_use]
    pub fn delivery_rates(&self) -> DeliveryRates {
        self.definition().delivery
    }

    /// Current construction method.
    #[must_use]
    pub fn construction_method(&self) -> ConstructionMethod {
        self.definition().construction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eras_are_ordered_and_contiguous() {
        for pair in EraId::ALL.windows(2) {
            let (a, b) = (pair[0].definition(), pair[1].definition());
            assert!(a.start_year < b.start_year);
            assert_eq!(a.end_year, Some(b.start_year - 1));
        }
        assert_eq!(EraId::Perestroika.definition().end_year, None);
        for era in EraId::ALL {
            assert_eq!(era.definition().id, era);
        }
    }

    #[test]
    fn test_era_for_year() {
        assert_eq!(era_for_year(1900), EraId::Revolution);
        assert_eq!(era_for_year(1921), EraId::Revolution);
        assert_eq!(era_for_year(1922), EraId::Industrialization);
        assert_eq!(era_for_year(1943), EraId::GreatPatrioticWar);
        assert_eq!(era_for_year(1984), EraId::Stagnation);
        assert_eq!(era_for_year(3000), EraId::Perestroika);
    }

    #[test]
    fn test_transition_blend_endpoints() {
        let mut era = EraSystem::new(1921);
        let old = EraId::Revolution.definition().modifiers;
        let new = EraId::Industrialization.definition().modifiers;

        let transition = era.check_transition(1922).unwrap();
        assert_eq!(transition.from, EraId::Revolution);
        assert_eq!(transition.to, EraId::Industrialization);
        assert!(era.get_modifiers().approx_eq(&old, 1e-12));

        for _ in 0..TRANSITION_TICKS / 2 {
            era.tick_transition();
        }
        let halfway = ModifierVector::lerp(&old, &new, 0.5);
        assert!(era.get_modifiers().approx_eq(&halfway, 1e-12));

        for _ in 0..TRANSITION_TICKS {
            era.tick_transition();
        }
        assert!(era.get_modifiers().approx_eq(&new, 1e-12));
        assert!(!era.in_transition());
    }

    #[test]
    fn test_transition_mid_blend_starts_from_blended_vector() {
        let mut era = EraSystem::new(1921);
        era.check_transition(1922);
        for _ in 0..TRANSITION_TICKS / 2 {
            era.tick_transition();
        }
        let partial = era.get_modifiers();
        let industrial = EraId::Industrialization.definition().modifiers;
        assert!(!partial.approx_eq(&industrial, 1e-12));

        let transition = era.check_transition(1941).unwrap();
        assert_eq!(transition.from, EraId::Industrialization);
        assert_eq!(transition.to, EraId::GreatPatrioticWar);
        assert!(era.get_modifiers().approx_eq(&partial, 1e-12));

        let restored: EraSystem = ron::from_str(&ron::to_string(&era).unwrap()).unwrap();
        assert!(restored.get_modifiers().approx_eq(&partial, 1e-12));
    }

    #[test]
    fn test_snapshot_without_blend_source_uses_previous_era() {
        let text = "(currentYear: 1922, previousEraId: Some(revolution), transitionTicksRemaining: 10)";
        let era: EraSystem = ron::from_str(text).unwrap();
        assert!(era.in_transition());
        let old = EraId::Revolution.definition().modifiers;
        assert!(era.get_modifiers().approx_eq(&old, 1e-12));
    }

    #[test]
    fn test_same_era_is_not_a_transition() {
        let mut era = EraSystem::new(1917);
        assert!(era.check_transition(1918).is_none());
        assert_eq!(era.previous_era(), None);
        assert_eq!(era.transition_ticks_remaining(), 0);
    }

    #[test]
    fn test_availability_is_cumulative() {
        let era = EraSystem::new(1950);
        let available = era.available_buildings(None);
        assert!(available.contains(&BuildingKind::CollectiveFarm));
        assert!(available.contains(&BuildingKind::Factory));
        assert!(available.contains(&BuildingKind::Hospital));
        assert!(available.contains(&BuildingKind::Apartment));
        assert!(!available.contains(&BuildingKind::Polyclinic));
    }

    #[test]
    fn test_tier_filter_restricts() {
        let era = EraSystem::new(1990);
        let selo = era.available_buildings(Some(SettlementTier::Selo));
        assert!(selo.contains(&BuildingKind::Barracks));
        assert!(!selo.contains(&BuildingKind::Factory));
        assert!(!selo.contains(&BuildingKind::NuclearPlant));
        let all = era.available_buildings(None);
        assert_eq!(all.len(), BuildingKind::ALL.len());
    }

    #[test]
    fn test_snapshot_uses_camel_case() {
        let mut era = EraSystem::new(1940);
        era.check_transition(1941);
        let text = ron::to_string(&era).unwrap();
        assert!(text.contains("currentYear"));
        assert!(text.contains("previousEraId"));
        assert!(text.contains("transitionTicksRemaining"));
        let restored: EraSystem = ron::from_str(&text).unwrap();
        assert_eq!(restored, era);
    }

    #[test]
    fn test_era_names_parse() {
        assert_eq!("thaw".parse::<EraId>().unwrap(), EraId::Thaw);
        assert!(matches!("nep".parse::<EraId>(), Err(GameError::UnknownEra(_))));
    }

    #[test]
    fn test_construction_cost_factors() {
        assert_eq!(ConstructionMethod::Manual.cost_factor(), 1.0);
        assert!(ConstructionMethod::Prefabricated.cost_factor() < ConstructionMethod::Industrial.cost_factor());
    }
}
