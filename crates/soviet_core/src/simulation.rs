//! The tick orchestrator.
//!
//! [`Simulation`] owns the [`SimulationWorld`] and every subsystem, and
//! advances them one tick at a time in a fixed order. The order is the
//! correctness contract: later steps read values written by earlier ones in
//! the same tick.
//!
//! # Determinism
//!
//! - One seeded [`SimRng`] feeds every random draw, in tick order
//! - Buildings are visited in id order, citizens in arena order
//! - The generator state is part of the save, so a restored game continues
//!   the exact same stream
//!
//! # Example
//!
//! ```
//! use soviet_core::buildings::BuildingKind;
//! use soviet_core::resources::ResourceLedger;
//! use soviet_core::simulation::SimulationBuilder;
//!
//! let mut sim = SimulationBuilder::new()
//!     .config(Default::default())
//!     .ledger(ResourceLedger::new(500.0, 100.0, 20.0, 200.0))
//!     .population(12)
//!     .building(BuildingKind::Barracks)
//!     .building(BuildingKind::CollectiveFarm)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! sim.tick();
//! assert_eq!(sim.total_ticks(), 1);
//! let events = sim.drain_events();
//! assert!(!events.is_empty());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::buildings::{Building, BuildingId, BuildingKind};
use crate::chronology::{Chronology, SimDate, TickBoundaries};
use crate::config::SimConfig;
use crate::disease::{DiseaseReport, DiseaseSystem};
use crate::economy::{self, Goods};
use crate::era::{EraSystem, EraTransition};
use crate::error::{GameError, Result};
use crate::events::{EventQueue, Severity, SimEvent};
use crate::modifiers::{ModifierField, ModifierVector};
use crate::personnel::PersonnelFile;
use crate::politburo::{Politburo, PolitburoEvent};
use crate::quota::{QuotaOutcome, QuotaSystem};
use crate::resources::ResourceLedger;
use crate::rng::{RngMode, SimRng};
use crate::settlement::evaluate_tier;
use crate::world::SimulationWorld;

/// Chance per tick that a powered gulag takes one citizen.
pub const GULAG_REMOVAL_CHANCE: f64 = 0.1;

/// How the game ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Whether the player won.
    pub victory: bool,
    /// Why it ended.
    pub reason: String,
    /// Tick on which it ended.
    pub tick: u64,
}

/// Counts from one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Ticks since the start, after this tick.
    pub tick: u64,
    /// Gross production.
    pub produced: Goods,
    /// Production taken by the state.
    pub delivered: Goods,
    /// Consumers without power.
    pub unpowered: u32,
    /// Infections, disease deaths and recoveries.
    pub disease: DiseaseReport,
    /// Citizens lost to hunger.
    pub starvation_deaths: u32,
    /// Citizens taken by the gulag.
    pub gulag_removals: u32,
    /// Citizens born or arrived.
    pub arrivals: u32,
    /// Buildings that collapsed.
    pub collapsed: u32,
}

/// Running totals since the start of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimStats {
    /// Citizens lost to hunger.
    pub starvation_deaths: u32,
    /// Citizens taken by the gulag.
    pub gulag_removals: u32,
    /// Citizens born or arrived.
    pub arrivals: u32,
    /// Buildings that collapsed.
    pub collapsed: u32,
    /// Plans fulfilled.
    pub plans_met: u32,
    /// Plans missed.
    pub plans_missed: u32,
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`Simulation`].
///
/// The configuration and the resource ledger are required; omitting either
/// is a precondition violation. Omitting the seed selects the
/// non-reproducible [`RngMode::Entropy`].
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    config: Option<SimConfig>,
    ledger: Option<ResourceLedger>,
    population: u32,
    buildings: Vec<BuildingKind>,
    seed: Option<u64>,
}

impl SimulationBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar and rule constants.
    #[must_use]
    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Starting resources.
    #[must_use]
    pub fn ledger(mut self, ledger: ResourceLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Starting citizens, all healthy.
    #[must_use]
    pub const fn population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    /// Add one starting building.
    #[must_use]
    pub fn building(mut self, kind: BuildingKind) -> Self {
        self.buildings.push(kind);
        self
    }

    /// Add several starting buildings.
    #[must_use]
    pub fn buildings(mut self, kinds: impl IntoIterator<Item = BuildingKind>) -> Self {
        self.buildings.extend(kinds);
        self
    }

    /// Seed the generator for a reproducible run.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Assemble the simulation.
    ///
    /// # Errors
    ///
    /// [`GameError::MissingPrecondition`] if the configuration or ledger was
    /// not supplied; [`GameError::InvalidConfig`] if the configuration is
    /// out of range.
    pub fn build(self) -> Result<Simulation> {
        let config = self
            .config
            .ok_or(GameError::MissingPrecondition("calendar configuration"))?;
        let ledger = self
            .ledger
            .ok_or(GameError::MissingPrecondition("resource ledger"))?;
        config.validate()?;

        let mut rng = match self.seed {
            Some(seed) => SimRng::seeded(seed),
            None => SimRng::from_entropy(),
        };

        let mut world = SimulationWorld::new(ledger, Chronology::new(&config));
        world.citizens.spawn_many(self.population);
        for kind in self.buildings {
            world.buildings.insert(kind);
        }
        world.sync_storage(config.base_storage);
        world.sync_population();
        loop {
            let tier = evaluate_tier(world.tier, world.citizens.len(), world.buildings.len());
            if tier <= world.tier {
                break;
            }
            world.tier = tier;
        }

        let era = EraSystem::new(config.start_year);
        let mut politburo = Politburo::new(config.start_year, &mut rng);
        politburo.set_corruption_mult(era.get_modifiers().corruption);
        let mut quota = QuotaSystem::new(&config);
        quota.track(&world.ledger);

        info!(
            seed = ?self.seed,
            population = world.citizens.len(),
            buildings = world.buildings.len(),
            "Simulation created"
        );

        Ok(Simulation {
            config,
            world,
            rng,
            disease: DiseaseSystem::new(),
            politburo,
            era,
            quota,
            personnel: PersonnelFile::new(),
            stats: SimStats::default(),
            outcome: None,
            last_report: TickReport::default(),
            events: EventQueue::new(),
        })
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// A running settlement.
///
/// # Tick Order
///
/// 1. **Chronology** - advance the clock, note boundaries
/// 2. **Quota** - judge the plan on year boundaries
/// 3. **Economy** - power, production, delivery, consumption, growth, decay
/// 4. **Disease** - progression every tick, outbreaks monthly
/// 5. **Gulag** - powered camps take citizens
/// 6. **Politburo** - monthly, quarterly and annual sub-ticks
/// 7. **Era and tier** - era transition, blend, settlement tier
/// 8. **Population loss** check
/// 9. **Arrest** and victory checks
/// 10. **Notify** - `StateChanged`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    config: SimConfig,
    world: SimulationWorld,
    rng: SimRng,
    disease: DiseaseSystem,
    politburo: Politburo,
    era: EraSystem,
    quota: QuotaSystem,
    personnel: PersonnelFile,
    stats: SimStats,
    outcome: Option<GameOutcome>,
    last_report: TickReport,
    #[serde(skip)]
    events: EventQueue,
}

impl Simulation {
    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Rule constants.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Shared world state.
    #[must_use]
    pub const fn world(&self) -> &SimulationWorld {
        &self.world
    }

    /// Resource ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.world.ledger
    }

    /// Current date.
    #[must_use]
    pub const fn date(&self) -> SimDate {
        self.world.chronology.date()
    }

    /// Ticks since the start.
    #[must_use]
    pub const fn total_ticks(&self) -> u64 {
        self.world.chronology.total_ticks()
    }

    /// Epidemic state.
    #[must_use]
    pub const fn disease(&self) -> &DiseaseSystem {
        &self.disease
    }

    /// The politburo.
    #[must_use]
    pub const fn politburo(&self) -> &Politburo {
        &self.politburo
    }

    /// Era tracking.
    #[must_use]
    pub const fn era(&self) -> &EraSystem {
        &self.era
    }

    /// The plan.
    #[must_use]
    pub const fn quota(&self) -> &QuotaSystem {
        &self.quota
    }

    /// The chairman's file.
    #[must_use]
    pub const fn personnel(&self) -> &PersonnelFile {
        &self.personnel
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// How the generator was seeded.
    #[must_use]
    pub const fn rng_mode(&self) -> RngMode {
        self.rng.mode()
    }

    /// Counts from the most recent tick.
    #[must_use]
    pub const fn report(&self) -> &TickReport {
        &self.last_report
    }

    /// Set once the game is over.
    #[must_use]
    pub const fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Whether further ticks are no-ops.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    /// `base * era * politburo`.
    #[must_use]
    pub fn effective_modifiers(&self) -> ModifierVector {
        self.config
            .base_modifiers
            .compose(&self.era.get_modifiers())
            .compose(&self.politburo.active_modifiers())
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Events waiting to be drained.
    #[must_use]
    pub const fn pending_events(&self) -> &EventQueue {
        &self.events
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance one tick. Does nothing once the game has ended.
    pub fn tick(&mut self) -> TickReport {
        if self.is_ended() {
            return self.last_report;
        }

        let mut report = TickReport::default();
        let outcome = self.run_steps(&mut report);

        report.tick = self.total_ticks();
        self.last_report = report;
        self.events.push(SimEvent::StateChanged {
            tick: report.tick,
            date: self.date(),
        });
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            debug!(tick = report.tick, state_hash = hash, "Simulation state hash");
        }

        report
    }

    /// Tick until `ticks` have run or the game ends. Returns ticks run.
    pub fn run(&mut self, ticks: u64) -> u64 {
        let mut ran = 0;
        while ran < ticks && !self.is_ended() {
            self.tick();
            ran += 1;
        }
        ran
    }

    fn run_steps(&mut self, report: &mut TickReport) -> Option<GameOutcome> {
        // 1. Chronology
        let boundaries = self.world.chronology.advance(&mut self.rng);
        self.emit_calendar_changes(&boundaries);

        // 2. Quota
        if boundaries.new_year {
            if let Some(outcome) = self.year_end_review() {
                return Some(outcome);
            }
        }

        // 3. Economy
        self.run_economy(&boundaries, report);

        // 4. Disease
        report.disease = self.disease.tick(&mut self.world, &boundaries, &mut self.rng);

        // 5. Gulag
        report.gulag_removals = self.run_gulags();
        self.stats.gulag_removals += report.gulag_removals;
        self.world.sync_population();

        // 6. Politburo
        let political = self
            .politburo
            .tick(&mut self.world, &boundaries, &mut self.rng);
        self.handle_politburo_events(&political);

        // 7. Era and settlement tier
        // Advance any running blend first so a new era is read at 0/10.
        self.era.tick_transition();
        if let Some(transition) = self.era.check_transition(self.date().year) {
            self.announce_era(transition);
        }
        self.politburo
            .set_corruption_mult(self.era.get_modifiers().corruption);
        self.update_tier();

        self.quota.track(&self.world.ledger);

        // 8. Population loss
        let ticks = self.total_ticks();
        if self.world.citizens.is_empty()
            && ticks > self.config.loss_grace_ticks()
            && !self.world.buildings.is_empty()
        {
            return Some(GameOutcome {
                victory: false,
                reason: "The settlement is empty. The district committee has closed the file."
                    .to_string(),
                tick: ticks,
            });
        }

        // 9. Arrest and victory
        if self.personnel.is_arrested(self.config.arrest_threshold) {
            return Some(GameOutcome {
                victory: false,
                reason: format!(
                    "Arrested with {} black marks on file",
                    self.personnel.effective_marks()
                ),
                tick: ticks,
            });
        }
        if let Some(year) = self.config.victory_year {
            if self.date().year >= year {
                return Some(GameOutcome {
                    victory: true,
                    reason: format!("The settlement endured until {year}"),
                    tick: ticks,
                });
            }
        }

        None
    }

    fn emit_calendar_changes(&mut self, boundaries: &TickBoundaries) {
        let clock = &self.world.chronology;
        if boundaries.season_changed {
            self.events.push(SimEvent::SeasonChanged {
                season: clock.season(),
            });
        }
        if boundaries.weather_changed {
            self.events.push(SimEvent::WeatherChanged {
                weather: clock.weather(),
            });
        }
        if boundaries.day_phase_changed {
            self.events.push(SimEvent::DayPhaseChanged {
                phase: clock.day_phase(),
            });
        }
    }

    fn year_end_review(&mut self) -> Option<GameOutcome> {
        if self.personnel.close_year() {
            self.events
                .push(SimEvent::advisor("A quiet year. One mark has been cleared from your file."));
        }

        let year = self.date().year;
        let growth = self.era.doctrine().quota_growth();
        match self.quota.evaluate(year, growth) {
            QuotaOutcome::Pending => None,
            QuotaOutcome::Met { commendation, next } => {
                self.stats.plans_met += 1;
                if commendation {
                    self.personnel.add_commendation();
                    self.events.push(SimEvent::toast(
                        "Plan overfulfilled! A commendation has been entered in your file.",
                        Severity::Info,
                    ));
                }
                self.events.push(SimEvent::news(format!(
                    "Plan fulfilled. New plan: {:.0} {:?} by {}",
                    next.target, next.resource, next.deadline_year
                )));
                None
            }
            QuotaOutcome::Missed {
                failures,
                black_marks,
                deadline_year,
            } => {
                self.stats.plans_missed += 1;
                self.personnel.add_black_marks(black_marks);
                self.events.push(SimEvent::toast(
                    format!(
                        "Plan missed ({failures} in a row). {black_marks} black mark(s). New deadline {deadline_year}."
                    ),
                    Severity::Warning,
                ));
                None
            }
            QuotaOutcome::GameOver { failures } => {
                self.stats.plans_missed += 1;
                Some(GameOutcome {
                    victory: false,
                    reason: format!("{failures} consecutive plans failed"),
                    tick: self.total_ticks(),
                })
            }
        }
    }

    fn run_economy(&mut self, boundaries: &TickBoundaries, report: &mut TickReport) {
        let effective = self.effective_modifiers();
        let season = self.world.chronology.season();
        let weather = self.world.chronology.weather();
        let world = &mut self.world;

        let power = economy::power_system(&mut world.buildings, &mut world.ledger);
        report.unpowered = power.unpowered;

        let labor = economy::labor_ratio(world.citizens.labor_units(), world.buildings.worker_slots());
        let gross = economy::production_system(&world.buildings, labor, season, weather, &effective);
        let (kept, delivered) = economy::delivery_extraction(gross, &self.era.delivery_rates());
        economy::deposit(&kept, &mut world.ledger);
        report.produced = gross;
        report.delivered = delivered;

        let consumption =
            economy::consumption_system(&mut world.ledger, world.citizens.len(), &effective);
        if economy::starvation_check(&consumption, &mut self.rng) {
            if let Some(victim) = random_citizen(world, &mut self.rng) {
                world.citizens.remove(victim);
                report.starvation_deaths = 1;
                self.stats.starvation_deaths += 1;
            }
        }

        if boundaries.new_month {
            let arrivals = economy::population_growth(
                world.citizens.len(),
                world.buildings.housing_capacity(),
                world.food_ratio(),
                &effective,
            );
            world.citizens.spawn_many(arrivals);
            report.arrivals = arrivals;
            self.stats.arrivals += arrivals;
        }

        let collapsed = economy::decay_system(&mut world.buildings, season, &effective);
        report.collapsed = collapsed.len() as u32;
        self.stats.collapsed += report.collapsed;
        for building in collapsed {
            self.events.push(SimEvent::BuildingCollapsed {
                id: building.id,
                kind: building.kind,
            });
        }

        world.sync_storage(self.config.base_storage);
        world.sync_population();
    }

    fn run_gulags(&mut self) -> u32 {
        let camps = self
            .world
            .buildings
            .iter()
            .filter(|b| b.kind == BuildingKind::Gulag && b.powered)
            .count();

        let mut removed = 0;
        for _ in 0..camps {
            if self.world.citizens.is_empty() {
                break;
            }
            if self.rng.gen::<f64>() < GULAG_REMOVAL_CHANCE {
                if let Some(victim) = random_citizen(&self.world, &mut self.rng) {
                    self.world.citizens.remove(victim);
                    removed += 1;
                }
            }
        }
        removed
    }

    fn handle_politburo_events(&mut self, political: &[PolitburoEvent]) {
        for event in political {
            self.events.push(SimEvent::from(event));
            if let PolitburoEvent::Succession { .. } = event {
                if self.politburo.leader_is_paranoid() && self.personnel.inspect() {
                    self.events.push(SimEvent::advisor(
                        "The new General Secretary has read your file. Another black mark.",
                    ));
                }
            }
        }
    }

    fn announce_era(&mut self, transition: EraTransition) {
        let def = transition.to.definition();
        self.events.push(SimEvent::news(format!("A new era begins: {}", def.name)));
        let unlocked: Vec<&str> = def.unlocks.iter().map(|k| k.as_str()).collect();
        if !unlocked.is_empty() {
            self.events.push(SimEvent::advisor(format!(
                "New construction approved: {}",
                unlocked.join(", ")
            )));
        }
    }

    fn update_tier(&mut self) {
        let before = self.world.tier;
        let after = evaluate_tier(before, self.world.citizens.len(), self.world.buildings.len());
        if after != before {
            self.world.tier = after;
            debug!(from = %before, to = %after, "Settlement tier changed");
            self.events
                .push(SimEvent::SettlementTierChanged { from: before, to: after });
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        info!(
            victory = outcome.victory,
            reason = %outcome.reason,
            tick = outcome.tick,
            "Game over"
        );
        self.events.push(SimEvent::GameOver {
            victory: outcome.victory,
            reason: outcome.reason.clone(),
        });
        self.outcome = Some(outcome);
    }

    // ------------------------------------------------------------------------
    // Host commands
    // ------------------------------------------------------------------------

    /// Cost of `kind` under the current construction method.
    #[must_use]
    pub fn construction_cost(&self, kind: BuildingKind) -> f64 {
        kind.definition().cost * self.era.construction_method().cost_factor()
    }

    /// Construct a building, paying for it from the treasury.
    ///
    /// # Errors
    ///
    /// [`GameError::BuildingLocked`] if the era or tier does not allow it,
    /// [`GameError::InsufficientFunds`] if the treasury cannot pay.
    pub fn build(&mut self, kind: BuildingKind) -> Result<BuildingId> {
        if !self.era.available_buildings(None).contains(&kind) {
            return Err(GameError::BuildingLocked {
                kind: kind.to_string(),
                reason: format!("not yet available in the {} era", self.era.current_era()),
            });
        }
        let required_tier = kind.definition().min_tier;
        if required_tier > self.world.tier {
            return Err(GameError::BuildingLocked {
                kind: kind.to_string(),
                reason: format!("requires a {required_tier}"),
            });
        }

        let cost = self.construction_cost(kind);
        let available = self.world.ledger.money;
        if !self.world.ledger.try_spend_money(cost) {
            return Err(GameError::InsufficientFunds {
                required: cost,
                available,
            });
        }

        let id = self.world.buildings.insert(kind);
        self.world.sync_storage(self.config.base_storage);
        debug!(%id, %kind, cost, "Building constructed");
        Ok(id)
    }

    /// Tear down a building.
    ///
    /// # Errors
    ///
    /// [`GameError::BuildingNotFound`] if no such building exists.
    pub fn demolish(&mut self, id: BuildingId) -> Result<Building> {
        let building = self
            .world
            .buildings
            .remove(id)
            .ok_or(GameError::BuildingNotFound(id.0))?;
        self.world.sync_storage(self.config.base_storage);
        Ok(building)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Hash of the simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.total_ticks().hash(&mut hasher);
        self.date().hash(&mut hasher);
        self.world.tier.hash(&mut hasher);

        let ledger = &self.world.ledger;
        for value in [
            ledger.money,
            ledger.food,
            ledger.vodka,
            ledger.power,
            ledger.power_used,
            ledger.storage_capacity,
        ] {
            value.to_bits().hash(&mut hasher);
        }
        ledger.population.hash(&mut hasher);

        self.world.buildings.len().hash(&mut hasher);
        for building in self.world.buildings.iter() {
            building.id.hash(&mut hasher);
            building.kind.hash(&mut hasher);
            building.powered.hash(&mut hasher);
            building.durability.to_bits().hash(&mut hasher);
        }

        self.world.citizens.len().hash(&mut hasher);
        for citizen in self.world.citizens.iter() {
            citizen.hash(&mut hasher);
        }

        let leader = self.politburo.leader();
        leader.id.hash(&mut hasher);
        leader.health.to_bits().hash(&mut hasher);
        for minister in self.politburo.ministers() {
            minister.id.hash(&mut hasher);
            for stat in [
                minister.loyalty,
                minister.ambition,
                minister.corruption,
                minister.competence,
                minister.purge_risk,
            ] {
                stat.to_bits().hash(&mut hasher);
            }
        }
        self.politburo.purge_history().len().hash(&mut hasher);

        let era = self.era.snapshot();
        era.current_year.hash(&mut hasher);
        era.previous_era_id.hash(&mut hasher);
        era.transition_ticks_remaining.hash(&mut hasher);
        for field in ModifierField::ALL {
            era.blend_from.map(|m| m.get(field).to_bits()).hash(&mut hasher);
        }
        let quota = self.quota.state();
        quota.resource.hash(&mut hasher);
        quota.target.to_bits().hash(&mut hasher);
        quota.deadline_year.hash(&mut hasher);
        self.quota.consecutive_failures().hash(&mut hasher);
        self.personnel.hash(&mut hasher);
        self.disease.totals().hash(&mut hasher);
        self.outcome.hash(&mut hasher);

        hasher.finish()
    }

    /// Encode the simulation for saving. Pending events are not saved.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a simulation from [`serialize`](Self::serialize) output.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid save.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::Serialization(format!("Failed to deserialize simulation: {e}"))
        })
    }
}

fn random_citizen<R: Rng + ?Sized>(
    world: &SimulationWorld,
    rng: &mut R,
) -> Option<crate::citizens::CitizenId> {
    let population = world.citizens.len() as usize;
    if population == 0 {
        return None;
    }
    world.citizens.nth_id(rng.gen_range(0..population))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronology::Season;
    use crate::era::{EraId, TRANSITION_TICKS};
    use crate::settlement::SettlementTier;

    fn short_config() -> SimConfig {
        SimConfig {
            ticks_per_day: 1,
            days_per_month: 5,
            ..SimConfig::default()
        }
    }

    fn village(seed: u64) -> Simulation {
        SimulationBuilder::new()
            .config(short_config())
            .ledger(ResourceLedger::new(1000.0, 150.0, 20.0, 200.0))
            .population(15)
            .buildings([
                BuildingKind::Barracks,
                BuildingKind::CollectiveFarm,
                BuildingKind::CollectiveFarm,
                BuildingKind::Warehouse,
            ])
            .seed(seed)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_ledger_is_precondition_violation() {
        let err = SimulationBuilder::new()
            .config(SimConfig::default())
            .seed(1)
            .build()
            .unwrap_err();
        assert!(matches!(err, GameError::MissingPrecondition("resource ledger")));
    }

    #[test]
    fn test_missing_config_is_precondition_violation() {
        let err = SimulationBuilder::new()
            .ledger(ResourceLedger::default())
            .seed(1)
            .build()
            .unwrap_err();
        assert!(matches!(err, GameError::MissingPrecondition(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = SimulationBuilder::new()
            .config(SimConfig {
                months_per_year: 0,
                ..SimConfig::default()
            })
            .ledger(ResourceLedger::default())
            .seed(1)
            .build()
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_seed_selects_deterministic_mode() {
        let sim = village(3);
        assert_eq!(sim.rng_mode(), RngMode::Seeded(3));
        assert!(sim.rng_mode().is_deterministic());
    }

    #[test]
    fn test_tick_emits_state_changed() {
        let mut sim = village(1);
        sim.tick();
        let events = sim.drain_events();
        assert!(matches!(
            events.last(),
            Some(SimEvent::StateChanged { tick: 1, .. })
        ));
        assert_eq!(sim.total_ticks(), 1);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_ended_simulation_is_frozen() {
        let mut sim = village(2);
        sim.tick();
        sim.personnel.add_black_marks(sim.config.arrest_threshold);
        sim.tick();
        assert!(sim.is_ended());
        let events = sim.drain_events();
        assert!(events.last().unwrap().is_game_over());

        let hash = sim.state_hash();
        let ticks = sim.total_ticks();
        for _ in 0..50 {
            sim.tick();
        }
        assert_eq!(sim.state_hash(), hash);
        assert_eq!(sim.total_ticks(), ticks);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = village(77);
        let mut b = village(77);
        for _ in 0..600 {
            a.tick();
            b.tick();
            assert_eq!(a.state_hash(), b.state_hash());
        }
    }

    #[test]
    fn test_different_seed_diverges() {
        let mut a = village(1);
        let mut b = village(2);
        a.run(300);
        b.run(300);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_save_and_resume_continue_identically() {
        let mut original = village(5);
        original.run(200);
        let bytes = original.serialize().unwrap();
        let mut restored = Simulation::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), original.state_hash());

        original.run(200);
        restored.run(200);
        assert_eq!(restored.state_hash(), original.state_hash());
    }

    #[test]
    fn test_corrupt_save_rejected() {
        assert!(matches!(
            Simulation::deserialize(&[1, 2, 3]),
            Err(GameError::Serialization(_))
        ));
    }

    #[test]
    fn test_empty_settlement_grace_period() {
        let config = short_config();
        let grace = config.ticks_per_year();
        let mut sim = SimulationBuilder::new()
            .config(config)
            .ledger(ResourceLedger::new(0.0, 0.0, 0.0, 200.0))
            .building(BuildingKind::Warehouse)
            .seed(9)
            .build()
            .unwrap();

        sim.run(grace);
        assert!(!sim.is_ended());
        sim.tick();
        let outcome = sim.outcome().unwrap();
        assert!(!outcome.victory);
        assert_eq!(outcome.tick, grace + 1);
    }

    #[test]
    fn test_empty_settlement_without_buildings_survives() {
        let config = short_config();
        let grace = config.ticks_per_year();
        let mut sim = SimulationBuilder::new()
            .config(config)
            .ledger(ResourceLedger::new(0.0, 0.0, 0.0, 200.0))
            .seed(9)
            .build()
            .unwrap();
        sim.run(grace + 10);
        assert!(sim.outcome().map_or(true, |o| !o.reason.contains("empty")));
    }

    #[test]
    fn test_build_checks_era_and_funds() {
        let mut sim = village(4);
        assert!(matches!(
            sim.build(BuildingKind::Factory),
            Err(GameError::BuildingLocked { .. })
        ));

        let cost = sim.construction_cost(BuildingKind::Barracks);
        let before = sim.ledger().money;
        let id = sim.build(BuildingKind::Barracks).unwrap();
        assert!(sim.world().buildings.get(id).is_some());
        assert!((sim.ledger().money - (before - cost)).abs() < 1e-9);

        sim.world.ledger.money = 1.0;
        assert!(matches!(
            sim.build(BuildingKind::Barracks),
            Err(GameError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_era_blend_starts_at_old_modifiers() {
        let mut sim = SimulationBuilder::new()
            .config(SimConfig {
                start_year: 1921,
                ..short_config()
            })
            .ledger(ResourceLedger::new(1000.0, 150.0, 20.0, 200.0))
            .population(15)
            .buildings([BuildingKind::Barracks, BuildingKind::CollectiveFarm])
            .seed(8)
            .build()
            .unwrap();

        let mut ticks = 0;
        while sim.era().current_era() == EraId::Revolution {
            sim.tick();
            ticks += 1;
            assert!(ticks <= 200 && !sim.is_ended());
        }

        let old = EraId::Revolution.definition().modifiers;
        let new = EraId::Industrialization.definition().modifiers;
        assert_eq!(sim.era().transition_ticks_remaining(), TRANSITION_TICKS);
        assert!(sim.era().get_modifiers().approx_eq(&old, 1e-12));

        sim.run(u64::from(TRANSITION_TICKS) - 1);
        assert!(sim.era().in_transition());
        sim.tick();
        assert!(!sim.era().in_transition());
        assert!(sim.era().get_modifiers().approx_eq(&new, 1e-12));
    }

    #[test]
    fn test_build_checks_tier() {
        let mut sim = village(4);
        sim.era.check_transition(1930);
        assert_eq!(sim.era().current_era(), EraId::Industrialization);
        assert_eq!(sim.world().tier, SettlementTier::Selo);
        assert!(matches!(
            sim.build(BuildingKind::Factory),
            Err(GameError::BuildingLocked { .. })
        ));
        assert!(sim.build(BuildingKind::PowerStation).is_ok());
    }

    #[test]
    fn test_demolish_unknown_building() {
        let mut sim = village(4);
        assert!(matches!(
            sim.demolish(BuildingId(999)),
            Err(GameError::BuildingNotFound(999))
        ));
        let first = sim.world().buildings.iter().next().unwrap().id;
        assert_eq!(sim.demolish(first).unwrap().kind, BuildingKind::Barracks);
    }

    #[test]
    fn test_ledger_stays_valid() {
        let mut sim = village(11);
        for _ in 0..2000 {
            sim.tick();
            assert!(sim.ledger().is_valid());
            assert_eq!(sim.ledger().population, sim.world().citizens.len());
        }
    }

    #[test]
    fn test_quota_failures_end_the_game() {
        let mut sim = SimulationBuilder::new()
            .config(SimConfig {
                plan_length_years: 1,
                initial_quota_target: 1.0e9,
                arrest_threshold: 100,
                ..short_config()
            })
            .ledger(ResourceLedger::new(0.0, 0.0, 0.0, 200.0))
            .seed(12)
            .build()
            .unwrap();
        let year = sim.config().ticks_per_year();
        sim.run(year * 4);
        let outcome = sim.outcome().unwrap();
        assert!(!outcome.victory);
        assert!(outcome.reason.contains("consecutive"));
        assert_eq!(sim.quota().consecutive_failures(), 3);
    }

    #[test]
    fn test_victory_year() {
        let mut sim = SimulationBuilder::new()
            .config(SimConfig {
                victory_year: Some(1918),
                ..short_config()
            })
            .ledger(ResourceLedger::new(0.0, 0.0, 0.0, 200.0))
            .seed(13)
            .build()
            .unwrap();
        let year = sim.config().ticks_per_year();
        sim.run(year * 2);
        assert!(sim.outcome().unwrap().victory);
        assert_eq!(sim.outcome().unwrap().tick, year);
    }

    #[test]
    fn test_season_changes_are_reported() {
        let mut sim = village(14);
        let per_month = u64::from(sim.config().ticks_per_month());
        sim.run(per_month * 2);
        let events = sim.drain_events();
        assert!(events
            .iter()
            .any(|e| *e == SimEvent::SeasonChanged { season: Season::Spring }));
    }
}
