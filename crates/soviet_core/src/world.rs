//! The shared simulation context.
//!
//! [`SimulationWorld`] bundles the state that more than one subsystem reads
//! or writes: the resource ledger, the clock, buildings, citizens and the
//! settlement tier. It is passed by reference into every subsystem; nothing
//! is global.

use serde::{Deserialize, Serialize};

use crate::buildings::BuildingRegistry;
use crate::chronology::Chronology;
use crate::citizens::CitizenArena;
use crate::economy;
use crate::resources::ResourceLedger;
use crate::settlement::SettlementTier;

/// Shared mutable state of one settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationWorld {
    /// Scalar resources.
    pub ledger: ResourceLedger,
    /// Calendar.
    pub chronology: Chronology,
    /// Placed buildings.
    pub buildings: BuildingRegistry,
    /// Living citizens.
    pub citizens: CitizenArena,
    /// Current administrative tier.
    pub tier: SettlementTier,
}

impl SimulationWorld {
    /// Assemble a world from its parts.
    #[must_use]
    pub fn new(ledger: ResourceLedger, chronology: Chronology) -> Self {
        Self {
            ledger,
            chronology,
            buildings: BuildingRegistry::new(),
            citizens: CitizenArena::new(),
            tier: SettlementTier::Selo,
        }
    }

    /// Copy the citizen count into the ledger.
    pub fn sync_population(&mut self) {
        self.ledger.set_population(self.citizens.len());
    }

    /// Recompute storage from warehouses.
    pub fn sync_storage(&mut self, base_storage: f64) {
        let capacity = self.buildings.storage_capacity(base_storage);
        self.ledger.set_storage_capacity(capacity);
    }

    /// Food stock relative to one month of demand.
    #[must_use]
    pub fn food_ratio(&self) -> f64 {
        economy::food_ratio(
            self.ledger.food,
            self.citizens.len(),
            self.chronology.ticks_per_month(),
        )
    }
}
