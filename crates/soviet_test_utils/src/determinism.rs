//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seeded settlement must replay bit-for-bit, and a restored save must
//! continue exactly where the original left off. Sources of
//! non-determinism include:
//!
//! - **Unseeded randomness**: Every draw must come from the one generator
//!   owned by the simulation. [`RngMode::Entropy`] runs are excluded from
//!   these checks.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Buildings, ministers and tensions live in ordered maps; citizens in an
//!   arena iterated by id.
//!
//! - **Float accumulation order**: Summing the same values in a different
//!   order changes the last bits. Systems always visit in id order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (disease, politburo)
//! 2. **Property tests**: Random seeds and settlements must replay exactly
//! 3. **Integration tests**: Full games are reproducible across save/load
//! 4. **Parallel tests**: Running N simulations on threads all match
//!
//! [`RngMode::Entropy`]: soviet_core::rng::RngMode::Entropy

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use soviet_core::simulation::Simulation;
use tracing::warn;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use soviet_test_utils::determinism::verify_determinism;
/// use soviet_test_utils::fixtures::village;
///
/// let result = verify_determinism(
///     3,   // Run 3 times
///     120, // 120 ticks each
///     || village(7),
///     |sim| { sim.tick(); },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run the simulation twice from identical setups and compare final hashes.
///
/// Returns `true` if both runs produced identical state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        |sim| sim.state_hash(),
    );
    result.is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    sim.run(num_ticks);
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(hash) => hash,
                Err(_) => panic!("simulation thread panicked"),
            })
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Returns `None` if the runs match throughout, `Some(tick)` for the first
/// tick after which their hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        warn!("Simulations differ before the first tick");
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a save taken after `num_ticks` restores to the same hash and
/// continues identically for `resume_ticks` more.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64, resume_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    sim.run(num_ticks);

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };

    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for _ in 0..resume_ticks {
        sim.tick();
        restored.tick();
        if restored.state_hash() != sim.state_hash() {
            return false;
        }
    }
    true
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for settlement inputs.
pub mod strategies {
    use proptest::prelude::*;
    use soviet_core::buildings::BuildingKind;
    use soviet_core::chronology::Season;
    use soviet_core::disease::DiseaseType;
    use soviet_core::era::EraId;
    use soviet_core::resources::ResourceLedger;
    use soviet_core::simulation::{Simulation, SimulationBuilder};

    use crate::fixtures::test_config;

    /// Any seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Any season.
    pub fn arb_season() -> impl Strategy<Value = Season> {
        prop_oneof![
            Just(Season::Winter),
            Just(Season::Spring),
            Just(Season::Summer),
            Just(Season::Autumn),
        ]
    }

    /// Any disease.
    pub fn arb_disease() -> impl Strategy<Value = DiseaseType> {
        proptest::sample::select(DiseaseType::ALL.to_vec())
    }

    /// Any era.
    pub fn arb_era() -> impl Strategy<Value = EraId> {
        proptest::sample::select(EraId::ALL.to_vec())
    }

    /// Buildings available from the first era.
    pub fn arb_starter_building() -> impl Strategy<Value = BuildingKind> {
        prop_oneof![
            Just(BuildingKind::CollectiveFarm),
            Just(BuildingKind::Barracks),
            Just(BuildingKind::Warehouse),
            Just(BuildingKind::Distillery),
        ]
    }

    /// Food stock relative to monthly demand, from famine to surplus.
    pub fn arb_food_ratio() -> impl Strategy<Value = f64> {
        0.0f64..3.0
    }

    /// Starting ledger with non-negative stocks.
    pub fn arb_ledger() -> impl Strategy<Value = ResourceLedger> {
        (0.0f64..2000.0, 0.0f64..500.0, 0.0f64..100.0)
            .prop_map(|(money, food, vodka)| ResourceLedger::new(money, food, vodka, 200.0))
    }

    /// Parameters for a small random settlement.
    #[derive(Debug, Clone)]
    pub struct SettlementParams {
        /// Generator seed.
        pub seed: u64,
        /// Starting citizens.
        pub population: u32,
        /// Starting buildings.
        pub buildings: Vec<BuildingKind>,
        /// Starting resources.
        pub ledger: ResourceLedger,
    }

    impl SettlementParams {
        /// Build the settlement on the short test calendar.
        ///
        /// # Panics
        ///
        /// Panics if the settlement fails to build.
        #[must_use]
        pub fn build(&self) -> Simulation {
            let built = SimulationBuilder::new()
                .config(test_config())
                .ledger(self.ledger)
                .population(self.population)
                .buildings(self.buildings.iter().copied())
                .seed(self.seed)
                .build();
            match built {
                Ok(sim) => sim,
                Err(e) => panic!("generated settlement failed to build: {e}"),
            }
        }
    }

    /// Generate a small random settlement.
    pub fn arb_settlement() -> impl Strategy<Value = SettlementParams> {
        (
            arb_seed(),
            0u32..80,
            proptest::collection::vec(arb_starter_building(), 0..10),
            arb_ledger(),
        )
            .prop_map(|(seed, population, buildings, ledger)| SettlementParams {
                seed,
                population,
                buildings,
                ledger,
            })
    }
}
