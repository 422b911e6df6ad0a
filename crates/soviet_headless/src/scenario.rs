//! Scenario loading and configuration.
//!
//! Scenarios define the starting settlement for headless runs: calendar and
//! rule constants, starting stock, citizens and buildings, plus the seed and
//! tick budget a run uses when the command line does not override them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use soviet_core::buildings::BuildingKind;
use soviet_core::config::SimConfig;
use soviet_core::error::GameError;
use soviet_core::resources::ResourceLedger;
use soviet_core::simulation::{Simulation, SimulationBuilder};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario describes a settlement the core rejects.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// Starting stock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartingResources {
    /// Rubles.
    pub money: f64,
    /// Food units.
    pub food: f64,
    /// Vodka units.
    pub vodka: f64,
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            money: 500.0,
            food: 100.0,
            vodka: 20.0,
        }
    }
}

/// Some number of one building kind at scenario start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Building kind.
    pub kind: BuildingKind,
    /// How many to place.
    pub count: u32,
}

impl BuildingPlacement {
    /// Create a new building placement.
    #[must_use]
    pub const fn new(kind: BuildingKind, count: u32) -> Self {
        Self { kind, count }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Default seed. `None` runs in entropy mode unless a seed is given.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Default tick budget.
    pub ticks: u64,
    /// Rule constants.
    #[serde(default)]
    pub config: SimConfig,
    /// Starting stock.
    #[serde(default)]
    pub resources: StartingResources,
    /// Starting citizens.
    pub population: u32,
    /// Starting buildings.
    #[serde(default)]
    pub buildings: Vec<BuildingPlacement>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::founding_village()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Resolve a built-in name or load a file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "founding_village" | "village" => Ok(Self::founding_village()),
            "collapsed_town" | "collapse" => Ok(Self::collapsed_town()),
            path => Self::load(path),
        }
    }

    /// A fresh kolkhoz in 1917: enough food for a season, room to grow.
    #[must_use]
    pub fn founding_village() -> Self {
        Self {
            name: "Founding Village".to_string(),
            description: "Thirty settlers, two farms and a distillery at the dawn of the revolution"
                .to_string(),
            seed: Some(1917),
            ticks: SimConfig::default().ticks_per_year() * 10,
            config: SimConfig::default(),
            resources: StartingResources::default(),
            population: 30,
            buildings: vec![
                BuildingPlacement::new(BuildingKind::Barracks, 2),
                BuildingPlacement::new(BuildingKind::CollectiveFarm, 2),
                BuildingPlacement::new(BuildingKind::Distillery, 1),
                BuildingPlacement::new(BuildingKind::Warehouse, 1),
            ],
        }
    }

    /// An overcrowded town with empty stores. Tests famine and epidemics.
    #[must_use]
    pub fn collapsed_town() -> Self {
        Self {
            name: "Collapsed Town".to_string(),
            description: "Ninety residents, one barracks, no food and no farms".to_string(),
            seed: Some(1921),
            ticks: SimConfig::default().ticks_per_year() * 3,
            config: SimConfig::default(),
            resources: StartingResources {
                money: 100.0,
                food: 0.0,
                vodka: 0.0,
            },
            population: 90,
            buildings: vec![
                BuildingPlacement::new(BuildingKind::Barracks, 1),
                BuildingPlacement::new(BuildingKind::Warehouse, 1),
            ],
        }
    }

    /// Builder for this scenario, seeded with `seed` or the scenario default.
    #[must_use]
    pub fn builder(&self, seed: Option<u64>) -> SimulationBuilder {
        let ledger = ResourceLedger::new(
            self.resources.money,
            self.resources.food,
            self.resources.vodka,
            self.config.base_storage,
        );
        let mut builder = SimulationBuilder::new()
            .config(self.config.clone())
            .ledger(ledger)
            .population(self.population);
        for placement in &self.buildings {
            for _ in 0..placement.count {
                builder = builder.building(placement.kind);
            }
        }
        match seed.or(self.seed) {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
    }

    /// Build the simulation.
    pub fn build(&self, seed: Option<u64>) -> Result<Simulation, ScenarioError> {
        Ok(self.builder(seed).build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.name, "Founding Village");
        assert_eq!(scenario.population, 30);
        let sim = scenario.build(None).unwrap();
        assert_eq!(sim.world().buildings.len(), 6);
        assert_eq!(sim.world().citizens.len(), 30);
    }

    #[test]
    fn test_seed_override() {
        let scenario = Scenario::collapsed_town();
        let default = scenario.build(None).unwrap();
        let overridden = scenario.build(Some(5)).unwrap();
        assert_eq!(
            default.rng_mode(),
            soviet_core::rng::RngMode::Seeded(1921)
        );
        assert_eq!(overridden.rng_mode(), soviet_core::rng::RngMode::Seeded(5));
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                ticks: 100,
                population: 5,
                config: (ticks_per_day: 1, days_per_month: 10),
                buildings: [
                    BuildingPlacement(kind: Barracks, count: 1),
                ],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.config.ticks_per_month(), 10);
        assert_eq!(scenario.config.months_per_year, 12);
        assert_eq!(scenario.buildings[0].kind, BuildingKind::Barracks);
        assert_eq!(scenario.seed, None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ron = r#"Scenario(name: "Bad", ticks: 1, population: 0, config: (months_per_year: 0))"#;
        assert!(matches!(
            Scenario::from_ron_str(ron),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_resolve_builtin_and_missing_file() {
        assert_eq!(
            Scenario::resolve("collapsed_town").unwrap().name,
            "Collapsed Town"
        );
        assert!(matches!(
            Scenario::resolve("/nonexistent/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("village.ron");
        let text = ron::ser::to_string_pretty(&Scenario::founding_village(), Default::default())
            .unwrap();
        std::fs::write(&path, text).unwrap();
        assert_eq!(Scenario::load(&path).unwrap(), Scenario::founding_village());
    }
}
