//! Property tests for the disease, quota and era models.

use proptest::prelude::*;
use soviet_core::buildings::{BuildingKind, BuildingRegistry};
use soviet_core::chronology::Season;
use soviet_core::config::SimConfig;
use soviet_core::disease::{
    calc_outbreak_modifier, clinic_prevention_factor, prevention_factor_for_count, DiseaseType,
};
use soviet_core::era::{EraSystem, TRANSITION_TICKS};
use soviet_core::quota::{QuotaOutcome, QuotaResource, QuotaState, QuotaSystem};
use soviet_core::resources::ResourceLedger;
use soviet_test_utils::determinism::strategies::{arb_disease, arb_food_ratio, arb_season};

// =============================================================================
// Outbreak modifier
// =============================================================================

proptest! {
    #[test]
    fn prop_outbreak_modifier_is_non_negative(
        disease in arb_disease(),
        season in arb_season(),
        housing in 0u32..500,
        population in 0u32..500,
        food_ratio in arb_food_ratio(),
    ) {
        let modifier = calc_outbreak_modifier(disease, season, housing, population, food_ratio);
        prop_assert!(modifier >= 0.0);
        prop_assert!(modifier.is_finite());
    }

    #[test]
    fn prop_winter_only_disease_is_zero_outside_winter(
        season in arb_season().prop_filter("not winter", |s| !s.is_winter()),
        housing in 0u32..500,
        population in 0u32..500,
        food_ratio in arb_food_ratio(),
    ) {
        let modifier =
            calc_outbreak_modifier(DiseaseType::Influenza, season, housing, population, food_ratio);
        prop_assert_eq!(modifier, 0.0);
    }

    #[test]
    fn prop_baseline_modifier_is_one(
        disease in arb_disease().prop_filter("baseline", |d| {
            let def = d.definition();
            !def.winter_only && !def.nutritional
        }),
        season in arb_season().prop_filter("not winter", |s| !s.is_winter()),
        housing in 0u32..500,
        spare in 0u32..500,
        food_ratio in arb_food_ratio(),
    ) {
        let population = housing.saturating_sub(spare);
        let modifier = calc_outbreak_modifier(disease, season, housing, population, food_ratio);
        prop_assert!((modifier - 1.0).abs() < 1e-12);
    }

    // =========================================================================
    // Clinic prevention
    // =========================================================================

    #[test]
    fn prop_clinic_factor_monotone_and_floored(count in 0u32..64) {
        let here = prevention_factor_for_count(count);
        let next = prevention_factor_for_count(count + 1);
        prop_assert!(next <= here);
        prop_assert!(here >= 0.1);
        prop_assert!(here <= 1.0);
    }

    #[test]
    fn prop_scurvy_ignores_clinics(hospitals in 0usize..8, polyclinics in 0usize..8) {
        let mut registry = BuildingRegistry::new();
        for _ in 0..hospitals {
            registry.insert(BuildingKind::Hospital);
        }
        for _ in 0..polyclinics {
            registry.insert(BuildingKind::Polyclinic);
        }
        for building in registry.iter_mut() {
            building.powered = true;
        }
        prop_assert_eq!(clinic_prevention_factor(DiseaseType::Scurvy, &registry), 1.0);
    }

    // =========================================================================
    // Quota transitions
    // =========================================================================

    #[test]
    fn prop_missed_quota_increments_failures(
        target in 1.0f64..10_000.0,
        share in 0.0f64..0.999,
        growth in 1.0f64..1.5,
    ) {
        let mut quota = plan(target, target * share);
        let outcome = quota.evaluate(1922, growth);
        prop_assert!(
            matches!(outcome, QuotaOutcome::Missed { failures: 1, .. }),
            "unexpected {:?}",
            outcome
        );
        prop_assert_eq!(quota.consecutive_failures(), 1);
        prop_assert_eq!(quota.state().resource, QuotaResource::Food);
    }

    #[test]
    fn prop_met_quota_resets_and_swaps(
        target in 1.0f64..10_000.0,
        over in 1.0f64..3.0,
        growth in 1.0f64..1.5,
    ) {
        let mut quota = plan(target, 0.0);
        quota.evaluate(1922, growth);
        quota.evaluate(1923, growth);
        prop_assert_eq!(quota.consecutive_failures(), 2);

        quota.track(&ResourceLedger::new(0.0, target * over, 0.0, 1.0e6));
        let outcome = quota.evaluate(1924, growth);
        prop_assert!(matches!(outcome, QuotaOutcome::Met { .. }), "unexpected {:?}", outcome);
        prop_assert_eq!(quota.consecutive_failures(), 0);
        prop_assert_eq!(quota.state().resource, QuotaResource::Vodka);
    }

    // =========================================================================
    // Era blending
    // =========================================================================

    #[test]
    fn prop_era_blend_endpoints(from_year in 1917u32..1990, jump in 1u32..40) {
        let mut era = EraSystem::new(from_year);
        let before = era.get_modifiers();
        let to_year = from_year + jump;

        if era.check_transition(to_year).is_some() {
            prop_assert!(era.get_modifiers().approx_eq(&before, 1e-9));
            for _ in 0..TRANSITION_TICKS {
                era.tick_transition();
            }
            let target = era.definition().modifiers;
            prop_assert!(era.get_modifiers().approx_eq(&target, 1e-9));
            prop_assert!(!era.in_transition());
        } else {
            prop_assert!(era.get_modifiers().approx_eq(&before, 1e-12));
        }
    }
}

fn plan(target: f64, current: f64) -> QuotaSystem {
    QuotaSystem::with_state(
        QuotaState {
            resource: QuotaResource::Food,
            target,
            current,
            deadline_year: 1922,
        },
        &SimConfig::default(),
    )
}

#[test]
fn test_three_failures_and_only_three_end_the_game() {
    let mut quota = plan(100.0, 0.0);
    assert!(matches!(quota.evaluate(1922, 1.0), QuotaOutcome::Missed { .. }));
    assert!(matches!(quota.evaluate(1923, 1.0), QuotaOutcome::Missed { .. }));
    assert_eq!(quota.evaluate(1924, 1.0), QuotaOutcome::GameOver { failures: 3 });
}

#[test]
fn test_two_failures_then_success_survives() {
    let mut quota = plan(100.0, 0.0);
    quota.evaluate(1922, 1.0);
    quota.evaluate(1923, 1.0);

    quota.track(&ResourceLedger::new(0.0, 150.0, 0.0, 500.0));
    assert!(matches!(quota.evaluate(1924, 1.0), QuotaOutcome::Met { .. }));
    assert_eq!(quota.consecutive_failures(), 0);
    assert_eq!(quota.evaluate(1925, 1.0), QuotaOutcome::Pending);
}

#[test]
fn test_winter_is_not_baseline() {
    let modifier = calc_outbreak_modifier(DiseaseType::Typhus, Season::Winter, 100, 10, 1.0);
    assert!((modifier - 1.5).abs() < 1e-12);
}
