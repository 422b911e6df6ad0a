//! The governing body: a General Secretary and a ten-seat cabinet.
//!
//! The politburo runs on three cadences keyed off the calendar boundaries:
//!
//! - **Monthly**: stat drift, purge-risk accumulation, the corruption drain
//!   and opportunistic events (embezzlement, intrigue).
//! - **Quarterly**: tension between ministries and purge rolls.
//! - **Annual**: tenure, leader aging and death, coups, faction rebuild and
//!   modifier recalculation.
//!
//! Every random draw goes through the injected generator. The whole body
//! serializes through [`PolitburoSnapshot`]; factions are derived data and
//! are rebuilt on restore.

mod tables;
mod types;

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chronology::TickBoundaries;
use crate::error::GameError;
use crate::modifiers::{ModifierVector, MIN_MULTIPLIER};
use crate::resources::ResourceLedger;
use crate::world::SimulationWorld;

pub use tables::{
    appointment_strategy, compatibility, AppointmentStrategy, ModifierOverride, TensionRule,
    COMPATIBILITY_TENSION_WEIGHT, MODIFIER_OVERRIDES, SECURITY_RETENTION, TENSION_RULES,
};
pub use types::{
    clamp_stat, CauseOfDeath, Faction, GeneralSecretary, Minister, Ministry, Personality,
    PolitburoEvent, PurgeRecord, TensionKey, STAT_MAX,
};

/// Tension at which two ministries clash.
pub const CONFLICT_THRESHOLD: f64 = 50.0;
/// Tension at which two ministries cooperate.
pub const COOPERATION_THRESHOLD: f64 = -30.0;
/// Leaders at or above this paranoia inspect personnel files on taking office.
pub const PARANOID_LEADER: f64 = 70.0;
/// Loyalty bonus for a freshly appointed minister.
pub const APPOINTEE_LOYALTY_BONUS: f64 = 25.0;
/// Scale of the annual coup chance.
pub const COUP_BASE_CHANCE: f64 = 0.05;
/// Monthly purge-risk growth for a disloyal or overambitious minister.
pub const PURGE_RISK_GROWTH: f64 = 3.0;
/// Monthly purge-risk decay otherwise.
pub const PURGE_RISK_DECAY: f64 = 1.0;

const EMBEZZLEMENT_CHANCE: f64 = 0.05;
const EMBEZZLEMENT_SCALE: f64 = 0.5;
const INTRIGUE_CHANCE: f64 = 0.03;
const INTRIGUE_PENALTY: f64 = 5.0;
const CONFLICT_PENALTY: f64 = 5.0;
const COOPERATION_BONUS: f64 = 2.0;

// ============================================================================
// Formulas
// ============================================================================

/// Quarterly chance a minister is purged.
#[must_use]
pub fn purge_chance(purge_risk: f64, paranoia: f64) -> f64 {
    (purge_risk / 100.0 * (0.5 + paranoia / 100.0) / 4.0).clamp(0.0, 1.0)
}

/// Annual chance a minister overthrows the leader.
///
/// `faction_support` is the number of other ministers in the plotter's faction.
#[must_use]
pub fn coup_chance(minister: &Minister, leader: &GeneralSecretary, faction_support: usize) -> f64 {
    let ambition = minister.ambition / 100.0;
    let disloyalty = 1.0 - minister.loyalty / 100.0;
    let competence = 0.5 + minister.competence / 200.0;
    let support = 1.0 + 0.25 * faction_support as f64;
    let vigilance = 1.0 - leader.paranoia / 200.0;
    let frailty = 1.5 - leader.health / 200.0;
    (COUP_BASE_CHANCE * ambition * disloyalty * competence * support * vigilance * frailty)
        .clamp(0.0, 1.0)
}

/// Annual chance an aging leader dies suddenly.
#[must_use]
pub fn sudden_death_chance(age: u32) -> f64 {
    0.005 + f64::from(age.saturating_sub(60)) * 0.01
}

/// Outcome of a tension score crossing a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensionOutcome {
    /// Score reached [`CONFLICT_THRESHOLD`].
    Conflict,
    /// Score reached [`COOPERATION_THRESHOLD`].
    Cooperation,
}

/// Halve a score that crossed a threshold and report which one.
#[must_use]
pub fn settle_tension(score: f64) -> (f64, Option<TensionOutcome>) {
    if score >= CONFLICT_THRESHOLD {
        (score / 2.0, Some(TensionOutcome::Conflict))
    } else if score <= COOPERATION_THRESHOLD {
        (score / 2.0, Some(TensionOutcome::Cooperation))
    } else {
        (score, None)
    }
}

fn rule_matches(
    rule: &TensionRule,
    (a, pa): (Ministry, Personality),
    (b, pb): (Ministry, Personality),
) -> bool {
    let holds = |want: Option<Personality>, have: Personality| want.map_or(true, |w| w == have);
    (rule.a == a && rule.b == b && holds(rule.a_personality, pa) && holds(rule.b_personality, pb))
        || (rule.a == b
            && rule.b == a
            && holds(rule.a_personality, pb)
            && holds(rule.b_personality, pa))
}

// ============================================================================
// Snapshot
// ============================================================================

/// Serialized form of [`Politburo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolitburoSnapshot {
    /// Sitting leader.
    pub general_secretary: GeneralSecretary,
    /// Cabinet in ministry order.
    pub ministers: Vec<(Ministry, Minister)>,
    /// Factions at the time of saving. Ignored on restore.
    pub factions: Vec<Faction>,
    /// Tension scores.
    pub tensions: Vec<(TensionKey, f64)>,
    /// Aggregate gameplay modifiers.
    pub active_modifiers: ModifierVector,
    /// Former leaders, oldest first.
    pub leader_history: Vec<GeneralSecretary>,
    /// Purge log, oldest first.
    pub purge_history: Vec<PurgeRecord>,
    /// Era-supplied corruption multiplier.
    pub corruption_mult: f64,
}

// ============================================================================
// Politburo
// ============================================================================

/// The cabinet, its leader, and their history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolitburoSnapshot", into = "PolitburoSnapshot")]
pub struct Politburo {
    leader: GeneralSecretary,
    ministers: BTreeMap<Ministry, Minister>,
    factions: Vec<Faction>,
    tensions: BTreeMap<TensionKey, f64>,
    active_modifiers: ModifierVector,
    leader_history: Vec<GeneralSecretary>,
    purge_history: Vec<PurgeRecord>,
    corruption_mult: f64,
    next_minister_id: u32,
    next_leader_id: u32,
}

impl TryFrom<PolitburoSnapshot> for Politburo {
    type Error = GameError;

    fn try_from(snapshot: PolitburoSnapshot) -> Result<Self, Self::Error> {
        let ministers: BTreeMap<Ministry, Minister> = snapshot.ministers.into_iter().collect();
        if let Some(missing) = Ministry::ALL.iter().find(|m| !ministers.contains_key(*m)) {
            return Err(GameError::Serialization(format!(
                "politburo snapshot has no {missing} minister"
            )));
        }

        let next_minister_id = ministers.values().map(|m| m.id).max().unwrap_or(0) + 1;
        let next_leader_id = snapshot
            .leader_history
            .iter()
            .map(|l| l.id)
            .chain(std::iter::once(snapshot.general_secretary.id))
            .max()
            .unwrap_or(0)
            + 1;

        let mut politburo = Self {
            leader: snapshot.general_secretary,
            ministers,
            factions: Vec::new(),
            tensions: snapshot.tensions.into_iter().collect(),
            active_modifiers: snapshot.active_modifiers,
            leader_history: snapshot.leader_history,
            purge_history: snapshot.purge_history,
            corruption_mult: snapshot.corruption_mult.max(0.0),
            next_minister_id,
            next_leader_id,
        };
        politburo.rebuild_factions();
        Ok(politburo)
    }
}

impl From<Politburo> for PolitburoSnapshot {
    fn from(politburo: Politburo) -> Self {
        Self {
            general_secretary: politburo.leader,
            ministers: politburo.ministers.into_iter().collect(),
            factions: politburo.factions,
            tensions: politburo.tensions.into_iter().collect(),
            active_modifiers: politburo.active_modifiers,
            leader_history: politburo.leader_history,
            purge_history: politburo.purge_history,
            corruption_mult: politburo.corruption_mult,
        }
    }
}

impl Politburo {
    /// Found a politburo with a random leader and cabinet.
    pub fn new<R: Rng + ?Sized>(year: u32, rng: &mut R) -> Self {
        let personality = Personality::random(rng);
        let leader = GeneralSecretary::generate(1, personality, year, rng);
        let mut politburo = Self {
            leader,
            ministers: BTreeMap::new(),
            factions: Vec::new(),
            tensions: BTreeMap::new(),
            active_modifiers: ModifierVector::IDENTITY,
            leader_history: Vec::new(),
            purge_history: Vec::new(),
            corruption_mult: 1.0,
            next_minister_id: 1,
            next_leader_id: 2,
        };
        for ministry in Ministry::ALL {
            let id = politburo.take_minister_id();
            let minister = Minister::generate(id, ministry, Personality::random(rng), rng);
            politburo.ministers.insert(ministry, minister);
        }
        politburo.rebuild_factions();
        politburo.recalculate_modifiers();
        politburo
    }

    /// Current state in serialized form.
    #[must_use]
    pub fn snapshot(&self) -> PolitburoSnapshot {
        self.clone().into()
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Sitting leader.
    #[must_use]
    pub const fn leader(&self) -> &GeneralSecretary {
        &self.leader
    }

    /// Holder of a portfolio.
    #[must_use]
    pub fn minister(&self, ministry: Ministry) -> Option<&Minister> {
        self.ministers.get(&ministry)
    }

    /// Cabinet in ministry order.
    pub fn ministers(&self) -> impl Iterator<Item = &Minister> {
        self.ministers.values()
    }

    /// Current factions.
    #[must_use]
    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    /// Tension between two ministries.
    #[must_use]
    pub fn tension(&self, a: Ministry, b: Ministry) -> f64 {
        self.tensions
            .get(&TensionKey::new(a, b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Aggregate gameplay modifiers from the cabinet.
    #[must_use]
    pub const fn active_modifiers(&self) -> ModifierVector {
        self.active_modifiers
    }

    /// Former leaders, oldest first.
    #[must_use]
    pub fn leader_history(&self) -> &[GeneralSecretary] {
        &self.leader_history
    }

    /// Purge log, oldest first.
    #[must_use]
    pub fn purge_history(&self) -> &[PurgeRecord] {
        &self.purge_history
    }

    /// Era-supplied corruption multiplier.
    #[must_use]
    pub const fn corruption_mult(&self) -> f64 {
        self.corruption_mult
    }

    /// Set the corruption multiplier. Negative values are treated as zero.
    pub fn set_corruption_mult(&mut self, mult: f64) {
        self.corruption_mult = mult.max(0.0);
    }

    /// Whether the sitting leader inspects personnel files.
    #[must_use]
    pub fn leader_is_paranoid(&self) -> bool {
        self.leader.paranoia >= PARANOID_LEADER
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Run whichever cadences the boundaries call for.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        world: &mut SimulationWorld,
        boundaries: &TickBoundaries,
        rng: &mut R,
    ) -> Vec<PolitburoEvent> {
        let mut events = Vec::new();
        let date = world.chronology.date();

        if boundaries.new_month {
            self.monthly(&mut world.ledger, rng, &mut events);
        }
        if boundaries.new_quarter(date, world.chronology.months_per_year()) {
            self.quarterly(date.year, rng, &mut events);
        }
        if boundaries.new_year {
            self.annual(date.year, rng, &mut events);
        }

        events
    }

    fn monthly<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut ResourceLedger,
        rng: &mut R,
        events: &mut Vec<PolitburoEvent>,
    ) {
        self.drift(rng);
        self.apply_corruption_drain(ledger);
        self.opportunistic_events(ledger, rng, events);
    }

    fn quarterly<R: Rng + ?Sized>(
        &mut self,
        year: u32,
        rng: &mut R,
        events: &mut Vec<PolitburoEvent>,
    ) {
        self.update_tensions(events);
        self.purge_rolls(year, rng, events);
    }

    fn annual<R: Rng + ?Sized>(
        &mut self,
        year: u32,
        rng: &mut R,
        events: &mut Vec<PolitburoEvent>,
    ) {
        for minister in self.ministers.values_mut() {
            minister.tenure += 1;
        }

        self.leader.age += 1;
        let age_penalty = f64::from(self.leader.age.saturating_sub(60)) * 0.5;
        self.leader.health = clamp_stat(self.leader.health - rng.gen_range(1.0..5.0) - age_penalty);

        let death = if self.leader.health <= 0.0 {
            Some(CauseOfDeath::Illness)
        } else if rng.gen::<f64>() < sudden_death_chance(self.leader.age) {
            Some(CauseOfDeath::NaturalCauses)
        } else {
            None
        };

        if let Some(cause) = death {
            self.succession(cause, None, year, rng, events);
        } else if let Some(plotter) = self.coup_check(rng) {
            events.push(PolitburoEvent::Coup {
                ministry: plotter.ministry,
                plotter: plotter.name.clone(),
            });
            self.succession(CauseOfDeath::Coup, Some(plotter), year, rng, events);
        }

        self.rebuild_factions();
        self.recalculate_modifiers();
    }

    // ------------------------------------------------------------------------
    // Monthly
    // ------------------------------------------------------------------------

    fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let leader = self.leader.personality;
        for minister in self.ministers.values_mut() {
            let compat = compatibility(minister.personality, leader);
            let seniority = f64::from(minister.tenure.min(10)) / 10.0;
            minister.loyalty += rng.gen_range(-2.0..=2.0) + compat;
            minister.ambition += rng.gen_range(-1.5..=1.5) + seniority * 0.5;
            minister.corruption += rng.gen_range(-1.0..=1.0) + seniority * 0.5;
            minister.competence += rng.gen_range(-0.5..=0.5);

            if minister.loyalty < 40.0 || minister.ambition > 70.0 {
                minister.purge_risk += PURGE_RISK_GROWTH;
            } else {
                minister.purge_risk -= PURGE_RISK_DECAY;
            }
            minister.clamp_stats();
        }
    }

    /// Rubles the cabinet skims this month.
    #[must_use]
    pub fn corruption_drain(&self) -> f64 {
        let skim: f64 = self
            .ministers
            .values()
            .map(|m| (m.corruption / 10.0).floor())
            .sum();
        ((skim + self.active_modifiers.corruption * 5.0) * self.corruption_mult).max(0.0)
    }

    /// Take the monthly drain from the treasury. Returns what was taken.
    pub fn apply_corruption_drain(&self, ledger: &mut ResourceLedger) -> f64 {
        ledger.drain_money(self.corruption_drain())
    }

    fn opportunistic_events<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut ResourceLedger,
        rng: &mut R,
        events: &mut Vec<PolitburoEvent>,
    ) {
        let frequency = self.active_modifiers.event_frequency.max(0.0);
        for minister in self.ministers.values_mut() {
            if rng.gen::<f64>() < minister.corruption / 100.0 * EMBEZZLEMENT_CHANCE * frequency {
                let amount = ledger.drain_money(minister.corruption * EMBEZZLEMENT_SCALE);
                if amount > 0.0 {
                    events.push(PolitburoEvent::Embezzlement {
                        ministry: minister.ministry,
                        amount,
                    });
                }
            }
            if rng.gen::<f64>() < minister.ambition / 100.0 * INTRIGUE_CHANCE * frequency {
                minister.loyalty -= INTRIGUE_PENALTY;
                minister.purge_risk += INTRIGUE_PENALTY;
                minister.clamp_stats();
                events.push(PolitburoEvent::Intrigue {
                    ministry: minister.ministry,
                });
            }
        }
    }

    // ------------------------------------------------------------------------
    // Quarterly
    // ------------------------------------------------------------------------

    fn update_tensions(&mut self, events: &mut Vec<PolitburoEvent>) {
        let seats: Vec<(Ministry, Personality)> = self
            .ministers
            .values()
            .map(|m| (m.ministry, m.personality))
            .collect();
        let mut conflicts = Vec::new();
        let mut cooperations = Vec::new();

        for (i, &a) in seats.iter().enumerate() {
            for &b in &seats[i + 1..] {
                let mut delta = -compatibility(a.1, b.1) * COMPATIBILITY_TENSION_WEIGHT;
                delta += TENSION_RULES
                    .iter()
                    .filter(|rule| rule_matches(rule, a, b))
                    .map(|rule| rule.delta)
                    .sum::<f64>();

                let key = TensionKey::new(a.0, b.0);
                let score = self.tensions.entry(key).or_insert(0.0);
                let (settled, outcome) = settle_tension(*score + delta);
                *score = settled;
                match outcome {
                    Some(TensionOutcome::Conflict) => conflicts.push(key),
                    Some(TensionOutcome::Cooperation) => cooperations.push(key),
                    None => {}
                }
            }
        }

        for key in conflicts {
            for ministry in [key.0, key.1] {
                if let Some(m) = self.ministers.get_mut(&ministry) {
                    m.loyalty -= CONFLICT_PENALTY;
                    m.purge_risk += CONFLICT_PENALTY;
                    m.clamp_stats();
                }
            }
            events.push(PolitburoEvent::Conflict(key));
        }
        for key in cooperations {
            for ministry in [key.0, key.1] {
                if let Some(m) = self.ministers.get_mut(&ministry) {
                    m.competence += COOPERATION_BONUS;
                    m.clamp_stats();
                }
            }
            events.push(PolitburoEvent::Cooperation(key));
        }
    }

    fn purge_rolls<R: Rng + ?Sized>(
        &mut self,
        year: u32,
        rng: &mut R,
        events: &mut Vec<PolitburoEvent>,
    ) {
        let paranoia = self.leader.paranoia;
        let doomed: Vec<Ministry> = self
            .ministers
            .values()
            .filter(|m| rng.gen::<f64>() < purge_chance(m.purge_risk, paranoia))
            .map(|m| m.ministry)
            .collect();

        if doomed.is_empty() {
            return;
        }
        for ministry in doomed {
            if let Some(record) = self.purge(ministry, year, rng) {
                events.push(PolitburoEvent::Purge {
                    ministry,
                    removed: record.minister_name.clone(),
                    replacement: record.replacement_name.clone(),
                });
                self.purge_history.push(record);
            }
        }
        self.recalculate_modifiers();
    }

    fn purge<R: Rng + ?Sized>(
        &mut self,
        ministry: Ministry,
        year: u32,
        rng: &mut R,
    ) -> Option<PurgeRecord> {
        let replacement = self.appoint(ministry, rng);
        let removed = self.ministers.insert(ministry, replacement.clone())?;
        debug!(%ministry, removed = %removed.name, replacement = %replacement.name, "Purge");
        Some(PurgeRecord {
            year,
            ministry,
            minister_name: removed.name,
            personality: removed.personality,
            replacement_name: replacement.name,
        })
    }

    // ------------------------------------------------------------------------
    // Annual
    // ------------------------------------------------------------------------

    /// First minister, in cabinet order, whose coup roll succeeds.
    fn coup_check<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Minister> {
        self.ministers
            .values()
            .find(|m| {
                let support = self.faction_support(m.ministry);
                rng.gen::<f64>() < coup_chance(m, &self.leader, support)
            })
            .cloned()
    }

    fn faction_support(&self, ministry: Ministry) -> usize {
        self.factions
            .iter()
            .find(|f| f.members.contains(&ministry))
            .map_or(0, |f| f.members.len() - 1)
    }

    fn succession<R: Rng + ?Sized>(
        &mut self,
        cause: CauseOfDeath,
        plotter: Option<Minister>,
        year: u32,
        rng: &mut R,
        events: &mut Vec<PolitburoEvent>,
    ) {
        let mut outgoing = self.leader.clone();
        outgoing.alive = false;
        outgoing.cause_of_death = Some(cause);
        info!(leader = %outgoing.name, %cause, year, "General Secretary leaves office");
        events.push(PolitburoEvent::LeaderDied {
            name: outgoing.name.clone(),
            cause,
        });
        self.leader_history.push(outgoing);

        let personality = plotter
            .as_ref()
            .map_or_else(|| Personality::random(rng), |p| p.personality);
        let id = self.next_leader_id;
        self.next_leader_id += 1;
        let mut leader = GeneralSecretary::generate(id, personality, year, rng);
        if let Some(plotter) = &plotter {
            leader.name = plotter.name.clone();
        }
        self.leader = leader;

        let retained = self.restaff(plotter.map(|p| p.ministry), rng);
        info!(
            leader = %self.leader.name,
            personality = %self.leader.personality,
            retained,
            "New General Secretary"
        );
        events.push(PolitburoEvent::Succession {
            name: self.leader.name.clone(),
            personality: self.leader.personality,
            paranoia: self.leader.paranoia,
            retained,
        });

        self.rebuild_factions();
        self.recalculate_modifiers();
    }

    /// Re-staff the cabinet for the sitting leader. Returns how many
    /// incumbents kept their seats.
    fn restaff<R: Rng + ?Sized>(&mut self, vacated: Option<Ministry>, rng: &mut R) -> usize {
        let strategy = appointment_strategy(self.leader.personality);
        let mut retained = 0;

        for ministry in Ministry::ALL {
            let keep = if Some(ministry) == vacated || strategy.purges.contains(&ministry) {
                false
            } else {
                let chance = if ministry == Ministry::StateSecurity {
                    strategy.retention.max(SECURITY_RETENTION)
                } else {
                    strategy.retention
                };
                rng.gen::<f64>() < chance
            };

            if keep {
                retained += 1;
            } else {
                let appointee = self.appoint(ministry, rng);
                self.ministers.insert(ministry, appointee);
            }
        }

        retained
    }

    fn take_minister_id(&mut self) -> u32 {
        let id = self.next_minister_id;
        self.next_minister_id += 1;
        id
    }

    /// A loyal new minister picked by the leader's appointment strategy.
    fn appoint<R: Rng + ?Sized>(&mut self, ministry: Ministry, rng: &mut R) -> Minister {
        let strategy = appointment_strategy(self.leader.personality);
        let personality = strategy
            .preferred
            .choose(rng)
            .copied()
            .unwrap_or(self.leader.personality);
        let id = self.take_minister_id();
        let mut minister = Minister::generate(id, ministry, personality, rng);
        minister.loyalty += APPOINTEE_LOYALTY_BONUS;
        minister.clamp_stats();
        minister
    }

    /// Group ministers sharing a personality into factions of two or more.
    pub fn rebuild_factions(&mut self) {
        let mut factions = Vec::new();
        for personality in Personality::ALL {
            let members: Vec<Ministry> = self
                .ministers
                .values()
                .filter(|m| m.personality == personality)
                .map(|m| m.ministry)
                .collect();
            if members.len() >= 2 {
                factions.push(Faction {
                    id: factions.len() as u32 + 1,
                    personality,
                    members,
                });
            }
        }

        for minister in self.ministers.values_mut() {
            minister.faction_id = factions
                .iter()
                .find(|f: &&Faction| f.members.contains(&minister.ministry))
                .map(|f| f.id);
        }
        self.factions = factions;
    }

    /// Recompute the aggregate modifiers from the sitting cabinet.
    pub fn recalculate_modifiers(&mut self) {
        let mut modifiers = ModifierVector::IDENTITY;
        for minister in self.ministers.values() {
            let scale = 0.5 + minister.competence / 200.0;
            for entry in MODIFIER_OVERRIDES
                .iter()
                .filter(|o| o.ministry == minister.ministry && o.personality == minister.personality)
            {
                *modifiers.get_mut(entry.field) += entry.delta * scale;
            }
        }
        self.active_modifiers = modifiers.floored(MIN_MULTIPLIER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronology::Chronology;
    use crate::config::SimConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use soviet_test_utils::fixtures::FixedRng;

    fn politburo(seed: u64) -> Politburo {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Politburo::new(1917, &mut rng)
    }

    fn world() -> SimulationWorld {
        let config = SimConfig::default();
        SimulationWorld::new(
            ResourceLedger::new(1000.0, 100.0, 0.0, 200.0),
            Chronology::new(&config),
        )
    }

    fn set_all(p: &mut Politburo, f: impl Fn(&mut Minister)) {
        for m in p.ministers.values_mut() {
            f(m);
        }
    }

    #[test]
    fn test_new_cabinet_fills_every_seat() {
        let p = politburo(1);
        assert_eq!(p.ministers().count(), Ministry::ALL.len());
        for ministry in Ministry::ALL {
            assert_eq!(p.minister(ministry).unwrap().ministry, ministry);
        }
        assert!(p.leader().alive);
        assert!(p.leader_history().is_empty());
    }

    #[test]
    fn test_corruption_drain_formula() {
        let mut p = politburo(2);
        set_all(&mut p, |m| m.corruption = 25.0);
        p.active_modifiers = ModifierVector::IDENTITY;
        p.set_corruption_mult(2.0);
        // (10 * floor(2.5) + 1.0 * 5) * 2
        assert!((p.corruption_drain() - 50.0).abs() < 1e-12);

        let mut ledger = ResourceLedger::new(30.0, 0.0, 0.0, 100.0);
        assert_eq!(p.apply_corruption_drain(&mut ledger), 30.0);
        assert_eq!(ledger.money, 0.0);
    }

    #[test]
    fn test_purge_chance_formula() {
        assert!((purge_chance(100.0, 50.0) - 0.25).abs() < 1e-12);
        assert!((purge_chance(40.0, 0.0) - 0.05).abs() < 1e-12);
        assert_eq!(purge_chance(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_settle_tension_halves_on_threshold() {
        assert_eq!(settle_tension(55.0), (27.5, Some(TensionOutcome::Conflict)));
        assert_eq!(settle_tension(-36.0), (-18.0, Some(TensionOutcome::Cooperation)));
        assert_eq!(settle_tension(10.0), (10.0, None));
    }

    #[test]
    fn test_tension_rules_match_either_order() {
        let rule = &TENSION_RULES[0];
        assert!(rule_matches(
            rule,
            (Ministry::Planning, Personality::Idealist),
            (Ministry::Defense, Personality::Militarist)
        ));
        assert!(!rule_matches(
            rule,
            (Ministry::Defense, Personality::Zealot),
            (Ministry::Planning, Personality::Idealist)
        ));
    }

    #[test]
    fn test_tension_crossing_emits_conflict() {
        let mut p = politburo(3);
        set_all(&mut p, |m| m.personality = Personality::Technocrat);
        p.ministers
            .get_mut(&Ministry::StateSecurity)
            .unwrap()
            .personality = Personality::Zealot;
        p.ministers.get_mut(&Ministry::Culture).unwrap().personality = Personality::Reformer;
        p.tensions.insert(
            TensionKey::new(Ministry::StateSecurity, Ministry::Culture),
            45.0,
        );

        let mut events = Vec::new();
        p.update_tensions(&mut events);
        let key = TensionKey::new(Ministry::StateSecurity, Ministry::Culture);
        assert!(events.contains(&PolitburoEvent::Conflict(key)));
        // 45 + 10 (rule) + 2.4 (incompatibility), then halved.
        assert!((p.tension(Ministry::Culture, Ministry::StateSecurity) - 28.7).abs() < 1e-9);
    }

    #[test]
    fn test_modifier_recalculation_scales_by_competence() {
        let mut p = politburo(4);
        set_all(&mut p, |m| m.personality = Personality::Idealist);
        {
            let agri = p.ministers.get_mut(&Ministry::Agriculture).unwrap();
            agri.personality = Personality::Technocrat;
            agri.competence = 100.0;
        }
        p.recalculate_modifiers();
        assert!((p.active_modifiers().production - 1.1).abs() < 1e-12);

        p.ministers.get_mut(&Ministry::Agriculture).unwrap().competence = 0.0;
        p.recalculate_modifiers();
        assert!((p.active_modifiers().production - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_modifiers_never_below_floor() {
        let mut p = politburo(5);
        set_all(&mut p, |m| {
            m.personality = Personality::Zealot;
            m.competence = 100.0;
        });
        for _ in 0..20 {
            p.recalculate_modifiers();
        }
        for field in crate::modifiers::ModifierField::ALL {
            assert!(p.active_modifiers().get(field) >= MIN_MULTIPLIER);
        }
    }

    #[test]
    fn test_factions_need_two_members() {
        let mut p = politburo(6);
        set_all(&mut p, |m| m.personality = Personality::Apparatchik);
        p.ministers.get_mut(&Ministry::Health).unwrap().personality = Personality::Idealist;
        p.rebuild_factions();
        assert_eq!(p.factions().len(), 1);
        assert_eq!(p.factions()[0].members.len(), 9);
        assert_eq!(p.minister(Ministry::Health).unwrap().faction_id, None);
        assert_eq!(p.minister(Ministry::Transport).unwrap().faction_id, Some(1));
    }

    #[test]
    fn test_first_successful_coup_wins() {
        let mut p = politburo(7);
        set_all(&mut p, |m| {
            m.ambition = 90.0;
            m.loyalty = 10.0;
        });
        let mut rng = FixedRng::new(0.0);
        let plotter = p.coup_check(&mut rng).unwrap();
        assert_eq!(plotter.ministry, Ministry::Agriculture);
    }

    #[test]
    fn test_loyal_cabinet_never_plots() {
        let mut p = politburo(8);
        set_all(&mut p, |m| m.loyalty = 100.0);
        let mut rng = FixedRng::new(0.0);
        assert!(p.coup_check(&mut rng).is_none());
    }

    #[test]
    fn test_succession_archives_leader() {
        let mut p = politburo(9);
        let old = p.leader().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut events = Vec::new();
        p.succession(CauseOfDeath::Illness, None, 1925, &mut rng, &mut events);

        assert_eq!(p.leader_history().len(), 1);
        let archived = &p.leader_history()[0];
        assert_eq!(archived.id, old.id);
        assert!(!archived.alive);
        assert_eq!(archived.cause_of_death, Some(CauseOfDeath::Illness));
        assert_ne!(p.leader().id, old.id);
        assert_eq!(p.ministers().count(), Ministry::ALL.len());
        assert!(matches!(events[0], PolitburoEvent::LeaderDied { .. }));
        assert!(matches!(events[1], PolitburoEvent::Succession { .. }));
    }

    #[test]
    fn test_coup_leader_takes_plotter_personality() {
        let mut p = politburo(10);
        let plotter = p.minister(Ministry::Defense).unwrap().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut events = Vec::new();
        p.succession(
            CauseOfDeath::Coup,
            Some(plotter.clone()),
            1930,
            &mut rng,
            &mut events,
        );
        assert_eq!(p.leader().personality, plotter.personality);
        assert_eq!(p.leader().name, plotter.name);
        assert_ne!(p.minister(Ministry::Defense).unwrap().id, plotter.id);
    }

    #[test]
    fn test_reformer_purges_state_security() {
        let mut p = politburo(11);
        p.leader.personality = Personality::Reformer;
        let before = p.minister(Ministry::StateSecurity).unwrap().id;
        let mut rng = FixedRng::new(0.0);
        p.restaff(None, &mut rng);
        assert_ne!(p.minister(Ministry::StateSecurity).unwrap().id, before);
    }

    #[test]
    fn test_security_retained_when_others_go() {
        let mut p = politburo(12);
        p.leader.personality = Personality::Zealot;
        let before: Vec<u32> = p.ministers().map(|m| m.id).collect();
        // Roll of 0.5 beats Zealot retention (0.3) but not the security floor.
        let mut rng = FixedRng::new(0.5);
        let retained = p.restaff(None, &mut rng);
        assert_eq!(retained, 1);
        let security = p.minister(Ministry::StateSecurity).unwrap();
        assert!(before.contains(&security.id));
    }

    #[test]
    fn test_appointees_follow_strategy() {
        let mut p = politburo(13);
        p.leader.personality = Personality::Militarist;
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for _ in 0..20 {
            let m = p.appoint(Ministry::Health, &mut rng);
            assert!(matches!(
                m.personality,
                Personality::Militarist | Personality::Zealot
            ));
            assert!(m.loyalty >= APPOINTEE_LOYALTY_BONUS);
        }
    }

    #[test]
    fn test_monthly_tick_drains_treasury() {
        let mut p = politburo(14);
        let mut world = world();
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let boundaries = TickBoundaries {
            new_month: true,
            ..TickBoundaries::default()
        };
        p.tick(&mut world, &boundaries, &mut rng);
        assert!(world.ledger.money < 1000.0);
        assert!(world.ledger.is_valid());
    }

    #[test]
    fn test_embezzlement_and_intrigue_on_low_roll() {
        let mut p = politburo(16);
        p.active_modifiers.event_frequency = 1.0;
        set_all(&mut p, |m| {
            m.corruption = 40.0;
            m.ambition = 60.0;
            m.loyalty = 50.0;
            m.purge_risk = 10.0;
        });
        let mut ledger = ResourceLedger::new(1000.0, 0.0, 0.0, 200.0);
        let mut events = Vec::new();
        p.opportunistic_events(&mut ledger, &mut FixedRng::new(0.0), &mut events);

        let seats = Ministry::ALL.len();
        let skim = 40.0 * EMBEZZLEMENT_SCALE;
        assert!((ledger.money - (1000.0 - skim * seats as f64)).abs() < 1e-9);

        let embezzled: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                PolitburoEvent::Embezzlement { amount, .. } => Some(*amount),
                _ => None,
            })
            .collect();
        assert_eq!(embezzled.len(), seats);
        assert!(embezzled.iter().all(|&a| (a - skim).abs() < 1e-9));

        let intrigues = events
            .iter()
            .filter(|e| matches!(e, PolitburoEvent::Intrigue { .. }))
            .count();
        assert_eq!(intrigues, seats);
        for m in p.ministers() {
            assert!((m.loyalty - (50.0 - INTRIGUE_PENALTY)).abs() < 1e-9);
            assert!((m.purge_risk - (10.0 + INTRIGUE_PENALTY)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_opportunistic_events_at_zero_frequency() {
        let mut p = politburo(17);
        p.active_modifiers.event_frequency = 0.0;
        set_all(&mut p, |m| {
            m.corruption = STAT_MAX;
            m.ambition = STAT_MAX;
        });
        let mut ledger = ResourceLedger::new(1000.0, 0.0, 0.0, 200.0);
        let mut events = Vec::new();
        p.opportunistic_events(&mut ledger, &mut FixedRng::new(0.0), &mut events);
        assert!(events.is_empty());
        assert!((ledger.money - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_monthly_tick_raises_embezzlement_and_intrigue() {
        let mut p = politburo(18);
        set_all(&mut p, |m| {
            m.corruption = 80.0;
            m.ambition = 80.0;
        });
        let mut world = world();
        let boundaries = TickBoundaries {
            new_month: true,
            ..TickBoundaries::default()
        };
        let events = p.tick(&mut world, &boundaries, &mut FixedRng::new(0.0));
        assert!(events
            .iter()
            .any(|e| matches!(e, PolitburoEvent::Embezzlement { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, PolitburoEvent::Intrigue { .. })));
        assert!(world.ledger.is_valid());
    }

    #[test]
    fn test_stats_stay_bounded_over_decades() {
        let mut p = politburo(15);
        let mut world = world();
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let mut clock = Chronology::new(&SimConfig {
            ticks_per_day: 1,
            days_per_month: 1,
            ..SimConfig::default()
        });
        for _ in 0..12 * 40 {
            let boundaries = clock.advance(&mut rng);
            world.chronology = clock.clone();
            p.tick(&mut world, &boundaries, &mut rng);
            for m in p.ministers() {
                for stat in [m.loyalty, m.ambition, m.corruption, m.competence, m.purge_risk] {
                    assert!((0.0..=STAT_MAX).contains(&stat));
                }
            }
            assert_eq!(p.ministers().count(), Ministry::ALL.len());
        }
        assert!(p.leader_history().iter().all(|l| !l.alive));
    }

    #[test]
    fn test_snapshot_round_trip_rebuilds_factions() {
        let p = politburo(16);
        let mut snapshot = p.snapshot();
        snapshot.factions.clear();
        let restored = Politburo::try_from(snapshot).unwrap();
        assert_eq!(restored.factions(), p.factions());
        assert_eq!(restored.leader(), p.leader());
        assert_eq!(restored.next_minister_id, p.next_minister_id);

        let text = ron::to_string(&p).unwrap();
        assert!(text.contains("generalSecretary"));
        assert!(text.contains("corruptionMult"));
        let parsed: Politburo = ron::from_str(&text).unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn test_snapshot_missing_ministry_rejected() {
        let mut snapshot = politburo(17).snapshot();
        snapshot.ministers.retain(|(m, _)| *m != Ministry::Transport);
        assert!(matches!(
            Politburo::try_from(snapshot),
            Err(GameError::Serialization(_))
        ));
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = |seed| {
            let mut p = politburo(seed);
            let mut world = world();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let year = TickBoundaries {
                new_month: true,
                new_year: true,
                ..TickBoundaries::default()
            };
            for _ in 0..30 {
                p.tick(&mut world, &year, &mut rng);
            }
            p
        };
        assert_eq!(run(21), run(21));
    }
}
