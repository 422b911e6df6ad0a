//! Building definitions and the settlement's building registry.
//!
//! Every [`BuildingKind`] has one static [`BuildingDefinition`]. Placed
//! buildings live in a [`BuildingRegistry`] keyed by [`BuildingId`]; the
//! registry is a `BTreeMap` so every system visits buildings in the same
//! order on every run.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::settlement::SettlementTier;

/// Durability of a freshly built building.
pub const MAX_DURABILITY: f64 = 100.0;

/// Unique identifier for a placed building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every kind of building the settlement can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Kolkhoz; produces food.
    CollectiveFarm,
    /// Wooden barracks; basic housing.
    Barracks,
    /// Adds storage for food and vodka.
    Warehouse,
    /// Produces vodka.
    Distillery,
    /// Coal power station.
    PowerStation,
    /// Produces money.
    Factory,
    /// Brick apartment block.
    Apartment,
    /// Penal labour camp.
    Gulag,
    /// Hospital; suppresses disease.
    Hospital,
    /// Five-storey prefabricated housing.
    Khrushchyovka,
    /// Polyclinic; suppresses disease.
    Polyclinic,
    /// Nine-storey panel housing.
    Panelka,
    /// Nuclear power plant.
    NuclearPlant,
    /// Late-era cooperative enterprise.
    Cooperative,
}

/// Static properties of a building kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingDefinition {
    /// The kind this definition describes.
    pub kind: BuildingKind,
    /// Construction cost in rubles before the era's construction factor.
    pub cost: f64,
    /// Citizens housed.
    pub housing: u32,
    /// Worker slots.
    pub workers: u32,
    /// Power produced.
    pub power_output: f64,
    /// Power required to operate.
    pub power_draw: f64,
    /// Food produced per tick at full staffing.
    pub food_output: f64,
    /// Vodka produced per tick at full staffing.
    pub vodka_output: f64,
    /// Money produced per tick at full staffing.
    pub money_output: f64,
    /// Storage added.
    pub storage: f64,
    /// Durability lost per tick.
    pub decay_rate: f64,
    /// Lowest settlement tier allowed to build this.
    pub min_tier: SettlementTier,
}

const fn def(kind: BuildingKind, cost: f64, min_tier: SettlementTier) -> BuildingDefinition {
    BuildingDefinition {
        kind,
        cost,
        housing: 0,
        workers: 0,
        power_output: 0.0,
        power_draw: 0.0,
        food_output: 0.0,
        vodka_output: 0.0,
        money_output: 0.0,
        storage: 0.0,
        decay_rate: 0.004,
        min_tier,
    }
}

static DEFINITIONS: [BuildingDefinition; 14] = {
    use BuildingKind as K;
    use SettlementTier as T;
    [
        BuildingDefinition {
            workers: 10,
            food_output: 0.3,
            ..def(K::CollectiveFarm, 80.0, T::Selo)
        },
        BuildingDefinition {
            housing: 20,
            decay_rate: 0.005,
            ..def(K::Barracks, 50.0, T::Selo)
        },
        BuildingDefinition {
            workers: 2,
            storage: 300.0,
            decay_rate: 0.003,
            ..def(K::Warehouse, 60.0, T::Selo)
        },
        BuildingDefinition {
            workers: 8,
            vodka_output: 0.15,
            ..def(K::Distillery, 120.0, T::Selo)
        },
        BuildingDefinition {
            workers: 10,
            power_output: 20.0,
            decay_rate: 0.006,
            ..def(K::PowerStation, 200.0, T::Selo)
        },
        BuildingDefinition {
            workers: 20,
            power_draw: 5.0,
            money_output: 0.5,
            decay_rate: 0.005,
            ..def(K::Factory, 250.0, T::Posyolok)
        },
        BuildingDefinition {
            housing: 50,
            power_draw: 1.0,
            decay_rate: 0.003,
            ..def(K::Apartment, 150.0, T::Posyolok)
        },
        BuildingDefinition {
            workers: 5,
            power_draw: 3.0,
            money_output: 0.1,
            decay_rate: 0.002,
            ..def(K::Gulag, 180.0, T::Posyolok)
        },
        BuildingDefinition {
            workers: 10,
            power_draw: 4.0,
            decay_rate: 0.002,
            ..def(K::Hospital, 300.0, T::Posyolok)
        },
        BuildingDefinition {
            housing: 80,
            power_draw: 2.0,
            ..def(K::Khrushchyovka, 220.0, T::Posyolok)
        },
        BuildingDefinition {
            workers: 8,
            power_draw: 3.0,
            decay_rate: 0.002,
            ..def(K::Polyclinic, 260.0, T::Gorod)
        },
        BuildingDefinition {
            housing: 200,
            power_draw: 4.0,
            decay_rate: 0.003,
            ..def(K::Panelka, 400.0, T::Gorod)
        },
        BuildingDefinition {
            workers: 30,
            power_output: 150.0,
            decay_rate: 0.001,
            ..def(K::NuclearPlant, 1200.0, T::Metropolis)
        },
        BuildingDefinition {
            workers: 6,
            power_draw: 1.0,
            food_output: 0.05,
            vodka_output: 0.05,
            money_output: 0.3,
            ..def(K::Cooperative, 180.0, T::Posyolok)
        },
    ]
};

impl BuildingKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 14] = [
        Self::CollectiveFarm,
        Self::Barracks,
        Self::Warehouse,
        Self::Distillery,
        Self::PowerStation,
        Self::Factory,
        Self::Apartment,
        Self::Gulag,
        Self::Hospital,
        Self::Khrushchyovka,
        Self::Polyclinic,
        Self::Panelka,
        Self::NuclearPlant,
        Self::Cooperative,
    ];

    /// Static definition for this kind.
    #[must_use]
    pub fn definition(self) -> &'static BuildingDefinition {
        &DEFINITIONS[self as usize]
    }

    /// Snake-case identifier used in scenarios and the host protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollectiveFarm => "collective_farm",
            Self::Barracks => "barracks",
            Self::Warehouse => "warehouse",
            Self::Distillery => "distillery",
            Self::PowerStation => "power_station",
            Self::Factory => "factory",
            Self::Apartment => "apartment",
            Self::Gulag => "gulag",
            Self::Hospital => "hospital",
            Self::Khrushchyovka => "khrushchyovka",
            Self::Polyclinic => "polyclinic",
            Self::Panelka => "panelka",
            Self::NuclearPlant => "nuclear_plant",
            Self::Cooperative => "cooperative",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildingKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GameError::UnknownBuildingKind(s.to_string()))
    }
}

/// A placed building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Registry identifier.
    pub id: BuildingId,
    /// What was built.
    pub kind: BuildingKind,
    /// Whether the power grid supplied it this tick.
    pub powered: bool,
    /// Remaining durability; collapses at zero.
    pub durability: f64,
}

impl Building {
    /// Static definition of this building's kind.
    #[must_use]
    pub fn definition(&self) -> &'static BuildingDefinition {
        self.kind.definition()
    }

    /// Whether the building is operating (powered, or needs no power).
    #[must_use]
    pub fn is_operating(&self) -> bool {
        self.powered || self.definition().power_draw <= 0.0
    }
}

/// All buildings in the settlement, iterated in id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingRegistry {
    buildings: BTreeMap<BuildingId, Building>,
    next_id: u32,
}

impl BuildingRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buildings: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Place a new building at full durability. Starts unpowered.
    pub fn insert(&mut self, kind: BuildingKind) -> BuildingId {
        let id = BuildingId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.buildings.insert(
            id,
            Building {
                id,
                kind,
                powered: false,
                durability: MAX_DURABILITY,
            },
        );
        id
    }

    /// Remove a building.
    pub fn remove(&mut self, id: BuildingId) -> Option<Building> {
        self.buildings.remove(&id)
    }

    /// Look up a building.
    #[must_use]
    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Number of buildings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Whether no buildings exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Buildings in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Mutable buildings in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.buildings.values_mut()
    }

    /// Number of buildings of a kind.
    #[must_use]
    pub fn count_of(&self, kind: BuildingKind) -> usize {
        self.iter().filter(|b| b.kind == kind).count()
    }

    /// Operating buildings whose kind is in `kinds`.
    #[must_use]
    pub fn operating_count(&self, kinds: &[BuildingKind]) -> u32 {
        self.iter()
            .filter(|b| kinds.contains(&b.kind) && b.is_operating())
            .count() as u32
    }

    /// Total housing.
    #[must_use]
    pub fn housing_capacity(&self) -> u32 {
        self.iter().map(|b| b.definition().housing).sum()
    }

    /// Total worker slots.
    #[must_use]
    pub fn worker_slots(&self) -> u32 {
        self.iter().map(|b| b.definition().workers).sum()
    }

    /// Storage on top of `base`.
    #[must_use]
    pub fn storage_capacity(&self, base: f64) -> f64 {
        base + self.iter().map(|b| b.definition().storage).sum::<f64>()
    }
}
