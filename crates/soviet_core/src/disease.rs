//! Epidemic model.
//!
//! Each citizen is either healthy or carries exactly one disease. Outbreak
//! rolls happen on month boundaries; every infected citizen progresses one
//! tick at a time until the infection resolves in death or recovery.
//!
//! The per-citizen monthly infection chance is
//! `base_rate * outbreak_modifier * contagion * clinic_factor`, clamped to
//! `[0, 1]`.

use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buildings::{BuildingKind, BuildingRegistry};
use crate::chronology::{Season, TickBoundaries};
use crate::citizens::{CitizenId, HealthState};
use crate::error::GameError;
use crate::world::SimulationWorld;

/// Outbreak multiplier in winter for non-nutritional diseases.
pub const WINTER_MULTIPLIER: f64 = 1.5;
/// Outbreak multiplier when population exceeds housing.
pub const OVERCROWDING_MULTIPLIER: f64 = 2.0;
/// Nutritional multiplier at or below [`FAMINE_FOOD_RATIO`].
pub const FAMINE_MULTIPLIER: f64 = 3.0;
/// Nutritional multiplier at or above [`WELL_FED_FOOD_RATIO`].
pub const WELL_FED_MULTIPLIER: f64 = 0.1;
/// Food ratio at which nutritional diseases peak.
pub const FAMINE_FOOD_RATIO: f64 = 0.1;
/// Food ratio at which nutritional diseases are nearly gone.
pub const WELL_FED_FOOD_RATIO: f64 = 0.8;
/// Factor contributed by each powered clinic.
pub const CLINIC_FACTOR: f64 = 0.4;
/// Clinics never eliminate a disease entirely.
pub const CLINIC_FACTOR_FLOOR: f64 = 0.1;
/// Extra spread per unit share of the population already carrying the disease.
pub const CONTAGION_WEIGHT: f64 = 2.0;

/// The diseases that can strike the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiseaseType {
    /// Louse-borne; thrives in crowded barracks.
    Typhus,
    /// Waterborne; high mortality.
    Cholera,
    /// Seasonal flu; winter only.
    Influenza,
    /// Vitamin deficiency; driven by food shortage.
    Scurvy,
}

/// Static reference data for one disease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseDefinition {
    /// Which disease.
    pub disease: DiseaseType,
    /// Chance an infection ends in death.
    pub mortality_rate: f64,
    /// Spreads between citizens.
    pub contagious: bool,
    /// Only breaks out in winter.
    pub winter_only: bool,
    /// Caused by poor diet rather than contact.
    pub nutritional: bool,
    /// Powered buildings that suppress outbreaks.
    pub prevented_by: &'static [BuildingKind],
    /// Monthly infection chance per healthy citizen under baseline conditions.
    pub base_rate: f64,
    /// Ticks from infection to outcome.
    pub duration_ticks: u32,
}

static DEFINITIONS: [DiseaseDefinition; 4] = [
    DiseaseDefinition {
        disease: DiseaseType::Typhus,
        mortality_rate: 0.15,
        contagious: true,
        winter_only: false,
        nutritional: false,
        prevented_by: &[BuildingKind::Hospital, BuildingKind::Polyclinic],
        base_rate: 0.002,
        duration_ticks: 40,
    },
    DiseaseDefinition {
        disease: DiseaseType::Cholera,
        mortality_rate: 0.25,
        contagious: true,
        winter_only: false,
        nutritional: false,
        prevented_by: &[BuildingKind::Hospital, BuildingKind::Polyclinic],
        base_rate: 0.001,
        duration_ticks: 20,
    },
    DiseaseDefinition {
        disease: DiseaseType::Influenza,
        mortality_rate: 0.05,
        contagious: true,
        winter_only: true,
        nutritional: false,
        prevented_by: &[BuildingKind::Polyclinic],
        base_rate: 0.004,
        duration_ticks: 15,
    },
    DiseaseDefinition {
        disease: DiseaseType::Scurvy,
        mortality_rate: 0.02,
        contagious: false,
        winter_only: false,
        nutritional: true,
        prevented_by: &[],
        base_rate: 0.002,
        duration_ticks: 60,
    },
];

impl DiseaseType {
    /// All diseases in outbreak-check order.
    pub const ALL: [Self; 4] = [Self::Typhus, Self::Cholera, Self::Influenza, Self::Scurvy];

    /// Static definition.
    #[must_use]
    pub fn definition(self) -> &'static DiseaseDefinition {
        &DEFINITIONS[self as usize]
    }

    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Typhus => "typhus",
            Self::Cholera => "cholera",
            Self::Influenza => "influenza",
            Self::Scurvy => "scurvy",
        }
    }
}

impl fmt::Display for DiseaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiseaseType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| GameError::UnknownDiseaseType(s.to_string()))
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Environmental multiplier on a disease's base outbreak rate.
///
/// Always non-negative. Exactly 1.0 for a non-nutritional disease outside
/// winter without overcrowding.
#[must_use]
pub fn calc_outbreak_modifier(
    disease: DiseaseType,
    season: Season,
    housing_capacity: u32,
    population: u32,
    food_ratio: f64,
) -> f64 {
    let def = disease.definition();
    if def.winter_only && !season.is_winter() {
        return 0.0;
    }

    let mut modifier = 1.0;
    if season.is_winter() && !def.nutritional {
        modifier *= WINTER_MULTIPLIER;
    }
    if population > housing_capacity {
        modifier *= OVERCROWDING_MULTIPLIER;
    }
    if def.nutritional {
        modifier *= nutritional_food_factor(food_ratio);
    }
    modifier
}

/// Food-shortage multiplier for nutritional diseases.
///
/// Linear between the famine and well-fed ratios.
#[must_use]
pub fn nutritional_food_factor(food_ratio: f64) -> f64 {
    if food_ratio.is_nan() || food_ratio <= FAMINE_FOOD_RATIO {
        FAMINE_MULTIPLIER
    } else if food_ratio >= WELL_FED_FOOD_RATIO {
        WELL_FED_MULTIPLIER
    } else {
        let t = (food_ratio - FAMINE_FOOD_RATIO) / (WELL_FED_FOOD_RATIO - FAMINE_FOOD_RATIO);
        FAMINE_MULTIPLIER + (WELL_FED_MULTIPLIER - FAMINE_MULTIPLIER) * t
    }
}

/// `0.4^count`, never below 0.1.
#[must_use]
pub fn prevention_factor_for_count(count: u32) -> f64 {
    let exponent = i32::try_from(count).unwrap_or(i32::MAX);
    CLINIC_FACTOR.powi(exponent).max(CLINIC_FACTOR_FLOOR)
}

/// Suppression from powered medical buildings relevant to `disease`.
#[must_use]
pub fn clinic_prevention_factor(disease: DiseaseType, buildings: &BuildingRegistry) -> f64 {
    let prevented_by = disease.definition().prevented_by;
    if prevented_by.is_empty() {
        return 1.0;
    }
    prevention_factor_for_count(buildings.operating_count(prevented_by))
}

/// Spread multiplier from citizens already carrying a contagious disease.
#[must_use]
pub fn contagion_factor(disease: DiseaseType, infected: u32, population: u32) -> f64 {
    if !disease.definition().contagious || population == 0 {
        return 1.0;
    }
    1.0 + CONTAGION_WEIGHT * f64::from(infected) / f64::from(population)
}

// ============================================================================
// System
// ============================================================================

/// Outcome counts for one tick (or a running total).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiseaseReport {
    /// New infections.
    pub infections: u32,
    /// Deaths from disease.
    pub deaths: u32,
    /// Recoveries.
    pub recoveries: u32,
}

impl AddAssign for DiseaseReport {
    fn add_assign(&mut self, rhs: Self) {
        self.infections += rhs.infections;
        self.deaths += rhs.deaths;
        self.recoveries += rhs.recoveries;
    }
}

/// Drives infections across the citizen arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiseaseSystem {
    totals: DiseaseReport,
}

impl DiseaseSystem {
    /// New system with zeroed totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts accumulated since the start of the game.
    #[must_use]
    pub const fn totals(&self) -> DiseaseReport {
        self.totals
    }

    /// Run one tick: progression always, outbreaks on month boundaries.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        world: &mut SimulationWorld,
        boundaries: &TickBoundaries,
        rng: &mut R,
    ) -> DiseaseReport {
        let mut report = Self::progress(world, rng);

        if boundaries.new_month && world.chronology.total_ticks() > 0 {
            report.infections = Self::outbreak_check(world, rng);
        }

        self.totals += report;
        report
    }

    /// Advance every infection by one tick and resolve those that run out.
    pub fn progress<R: Rng + ?Sized>(world: &mut SimulationWorld, rng: &mut R) -> DiseaseReport {
        let mut report = DiseaseReport::default();
        let mut dead: Vec<CitizenId> = Vec::new();

        for citizen in world.citizens.iter_mut() {
            let HealthState::Infected {
                disease,
                ticks_remaining,
            } = citizen.health
            else {
                continue;
            };

            let remaining = ticks_remaining.saturating_sub(1);
            if remaining > 0 {
                citizen.health = HealthState::Infected {
                    disease,
                    ticks_remaining: remaining,
                };
                continue;
            }

            if rng.gen::<f64>() < disease.definition().mortality_rate {
                dead.push(citizen.id);
                report.deaths += 1;
            } else {
                citizen.health = HealthState::Healthy;
                report.recoveries += 1;
            }
        }

        for id in dead {
            world.citizens.remove(id);
        }
        if report.deaths > 0 {
            world.sync_population();
        }
        report
    }

    /// Roll new infections for every healthy citizen. Returns the count.
    pub fn outbreak_check<R: Rng + ?Sized>(world: &mut SimulationWorld, rng: &mut R) -> u32 {
        let season = world.chronology.season();
        let housing = world.buildings.housing_capacity();
        let population = world.citizens.len();
        let food_ratio = world.food_ratio();
        let mut infections = 0;

        for disease in DiseaseType::ALL {
            let def = disease.definition();
            let modifier = calc_outbreak_modifier(disease, season, housing, population, food_ratio);
            if modifier <= 0.0 {
                continue;
            }
            let contagion =
                contagion_factor(disease, world.citizens.infected_with(disease), population);
            let clinic = clinic_prevention_factor(disease, &world.buildings);
            let chance = (def.base_rate * modifier * contagion * clinic).clamp(0.0, 1.0);

            let mut new_cases = 0;
            for citizen in world.citizens.iter_mut() {
                if citizen.health.is_infected() {
                    continue;
                }
                if rng.gen::<f64>() < chance {
                    citizen.health = HealthState::Infected {
                        disease,
                        ticks_remaining: def.duration_ticks,
                    };
                    new_cases += 1;
                }
            }

            if new_cases > 0 {
                debug!(%disease, new_cases, chance, "Outbreak");
            }
            infections += new_cases;
        }

        infections
    }
}
