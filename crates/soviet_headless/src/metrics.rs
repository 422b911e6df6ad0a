//! Game metrics collection for batch analysis.
//!
//! A [`MetricsCollector`] watches one game tick by tick; [`BatchSummary`]
//! aggregates many finished games.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use soviet_core::events::SimEvent;
use soviet_core::politburo::CauseOfDeath;
use soviet_core::simulation::{Simulation, TickReport};

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Seed used, if the run was reproducible.
    pub seed: Option<u64>,
    /// Ticks played.
    pub duration_ticks: u64,
    /// Final in-game year.
    pub final_year: u32,
    /// Whether the game ended at all within the budget.
    pub ended: bool,
    /// Whether it ended in victory.
    pub victory: bool,
    /// Why it ended.
    pub end_reason: Option<String>,

    // === Population ===
    /// Citizens at the end.
    pub final_population: u32,
    /// Most citizens at once.
    pub peak_population: u32,
    /// Settlement tier at the end.
    pub final_tier: String,
    /// Era at the end.
    pub final_era: String,

    // === Losses ===
    /// Deaths from disease.
    pub disease_deaths: u32,
    /// Infections.
    pub infections: u32,
    /// Deaths from hunger.
    pub starvation_deaths: u32,
    /// Citizens sent to the gulag.
    pub gulag_removals: u32,
    /// Buildings that collapsed.
    pub buildings_collapsed: u32,

    // === Politics ===
    /// General secretaries who held office, including the incumbent.
    pub leaders: u32,
    /// Leaders removed by coup.
    pub coups: u32,
    /// Ministers purged.
    pub purges: u32,
    /// Plans fulfilled.
    pub plans_met: u32,
    /// Plans missed.
    pub plans_missed: u32,
    /// Effective black marks at the end.
    pub black_marks: u32,

    /// Event counts by kind.
    pub events: BTreeMap<String, u32>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: Option<u64>) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Whether the settlement was still standing, or won, at the end.
    #[must_use]
    pub fn survived(&self) -> bool {
        !self.ended || self.victory
    }
}

/// Metrics collector that tracks a game while it runs.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: GameMetrics,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(game_id: &str, scenario: &str, seed: Option<u64>) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, scenario, seed),
        }
    }

    /// Record one tick's report and drained events.
    pub fn observe(&mut self, sim: &Simulation, report: &TickReport, events: &[SimEvent]) {
        self.metrics.peak_population = self
            .metrics
            .peak_population
            .max(sim.world().citizens.len());
        self.metrics.starvation_deaths += report.starvation_deaths;
        self.metrics.gulag_removals += report.gulag_removals;
        for event in events {
            *self.metrics.events.entry(event.kind().to_string()).or_default() += 1;
        }
    }

    /// Finalize the metrics from the simulation's end state.
    #[must_use]
    pub fn finalize(mut self, sim: &Simulation) -> GameMetrics {
        let m = &mut self.metrics;
        m.duration_ticks = sim.total_ticks();
        m.final_year = sim.date().year;
        if let Some(outcome) = sim.outcome() {
            m.ended = true;
            m.victory = outcome.victory;
            m.end_reason = Some(outcome.reason.clone());
        }

        m.final_population = sim.world().citizens.len();
        m.peak_population = m.peak_population.max(m.final_population);
        m.final_tier = sim.world().tier.to_string();
        m.final_era = sim.era().current_era().to_string();

        let disease = sim.disease().totals();
        m.disease_deaths = disease.deaths;
        m.infections = disease.infections;
        m.buildings_collapsed = sim.stats().collapsed;
        m.plans_met = sim.stats().plans_met;
        m.plans_missed = sim.stats().plans_missed;
        m.black_marks = sim.personnel().effective_marks();

        let politburo = sim.politburo();
        m.leaders = politburo.leader_history().len() as u32 + 1;
        m.coups = politburo
            .leader_history()
            .iter()
            .filter(|l| l.cause_of_death == Some(CauseOfDeath::Coup))
            .count() as u32;
        m.purges = politburo.purge_history().len() as u32;

        m.final_state_hash = sim.state_hash();
        self.metrics
    }

    /// Metrics gathered so far.
    #[must_use]
    pub fn current(&self) -> &GameMetrics {
        &self.metrics
    }
}

/// Summary statistics across multiple games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games the settlement survived or won.
    pub survived: u32,
    /// Games won outright.
    pub victories: u32,
    /// `survived / total_games`.
    pub survival_rate: f64,
    /// Average game duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
    /// Average final population.
    pub avg_final_population: f64,
    /// Average number of leaders per game.
    pub avg_leaders: f64,
    /// Average purges per game.
    pub avg_purges: f64,
    /// Average coups per game.
    pub avg_coups: f64,
    /// Average disease deaths per game.
    pub avg_disease_deaths: f64,
    /// Average starvation deaths per game.
    pub avg_starvation_deaths: f64,
    /// How games ended, by reason.
    pub end_reasons: BTreeMap<String, u32>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let n = games.len() as f64;
        let mean = |f: fn(&GameMetrics) -> f64| games.iter().map(f).sum::<f64>() / n;

        let mut summary = Self {
            total_games: games.len() as u32,
            survived: games.iter().filter(|g| g.survived()).count() as u32,
            victories: games.iter().filter(|g| g.victory).count() as u32,
            avg_duration_ticks: mean(|g| g.duration_ticks as f64),
            min_duration_ticks: games.iter().map(|g| g.duration_ticks).min().unwrap_or(0),
            max_duration_ticks: games.iter().map(|g| g.duration_ticks).max().unwrap_or(0),
            avg_final_population: mean(|g| f64::from(g.final_population)),
            avg_leaders: mean(|g| f64::from(g.leaders)),
            avg_purges: mean(|g| f64::from(g.purges)),
            avg_coups: mean(|g| f64::from(g.coups)),
            avg_disease_deaths: mean(|g| f64::from(g.disease_deaths)),
            avg_starvation_deaths: mean(|g| f64::from(g.starvation_deaths)),
            ..Default::default()
        };
        summary.survival_rate = f64::from(summary.survived) / n;

        for game in games {
            let reason = game
                .end_reason
                .clone()
                .unwrap_or_else(|| "still standing".to_string());
            *summary.end_reasons.entry(reason).or_default() += 1;
        }

        summary
    }
}
