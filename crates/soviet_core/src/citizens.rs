//! Citizens and their health.
//!
//! Citizens live in a dense arena indexed by [`CitizenId`]. A removed
//! citizen leaves an empty slot; ids are never reused, so iteration in slot
//! order is iteration in id order.

use serde::{Deserialize, Serialize};

use crate::disease::DiseaseType;

/// Work contributed by a sick citizen relative to a healthy one.
pub const SICK_LABOR_MULTIPLIER: f64 = 0.5;

/// Unique identifier for a citizen; doubles as the arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CitizenId(pub u32);

/// Health of one citizen. A citizen carries at most one disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    /// Not infected.
    Healthy,
    /// Infected and counting down to recovery or death.
    Infected {
        /// Which disease.
        disease: DiseaseType,
        /// Ticks left before the outcome is drawn.
        ticks_remaining: u32,
    },
}

impl HealthState {
    /// Whether the citizen is sick.
    #[must_use]
    pub const fn is_infected(&self) -> bool {
        matches!(self, Self::Infected { .. })
    }
}

/// A citizen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citizen {
    /// Arena id.
    pub id: CitizenId,
    /// Current health.
    pub health: HealthState,
}

impl Citizen {
    /// Labour this citizen contributes.
    #[must_use]
    pub fn labor(&self) -> f64 {
        if self.health.is_infected() {
            SICK_LABOR_MULTIPLIER
        } else {
            1.0
        }
    }
}

/// Dense storage of all citizens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitizenArena {
    slots: Vec<Option<Citizen>>,
    live: u32,
}

impl CitizenArena {
    /// Empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one healthy citizen.
    pub fn spawn(&mut self) -> CitizenId {
        let id = CitizenId(self.slots.len() as u32);
        self.slots.push(Some(Citizen {
            id,
            health: HealthState::Healthy,
        }));
        self.live += 1;
        id
    }

    /// Add `count` healthy citizens.
    pub fn spawn_many(&mut self, count: u32) {
        for _ in 0..count {
            self.spawn();
        }
    }

    /// Remove a citizen, returning it if it was alive.
    pub fn remove(&mut self, id: CitizenId) -> Option<Citizen> {
        let removed = self.slots.get_mut(id.0 as usize)?.take();
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Look up a living citizen.
    #[must_use]
    pub fn get(&self, id: CitizenId) -> Option<&Citizen> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    /// Mutable lookup of a living citizen.
    pub fn get_mut(&mut self, id: CitizenId) -> Option<&mut Citizen> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Living citizens.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.live
    }

    /// Whether nobody is alive.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Living citizens in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Citizen> {
        self.slots.iter().flatten()
    }

    /// Mutable living citizens in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Citizen> {
        self.slots.iter_mut().flatten()
    }

    /// Ids of living citizens in id order.
    #[must_use]
    pub fn ids(&self) -> Vec<CitizenId> {
        self.iter().map(|c| c.id).collect()
    }

    /// The `n`th living citizen in id order.
    #[must_use]
    pub fn nth_id(&self, n: usize) -> Option<CitizenId> {
        self.iter().nth(n).map(|c| c.id)
    }

    /// Total labour, with sick citizens at reduced output.
    #[must_use]
    pub fn labor_units(&self) -> f64 {
        self.iter().map(Citizen::labor).sum()
    }

    /// Citizens currently carrying `disease`.
    #[must_use]
    pub fn infected_with(&self, disease: DiseaseType) -> u32 {
        self.iter()
            .filter(|c| matches!(c.health, HealthState::Infected { disease: d, .. } if d == disease))
            .count() as u32
    }

    /// Citizens currently carrying any disease.
    #[must_use]
    pub fn infected_total(&self) -> u32 {
        self.iter().filter(|c| c.health.is_infected()).count() as u32
    }
}
