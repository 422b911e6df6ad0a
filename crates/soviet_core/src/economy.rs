//! Resource calculators run in step 3 of every tick.
//!
//! Each function reads buildings, citizens or the ledger and writes back
//! through the ledger's clamping methods. Modifier vectors passed in are
//! already composed (`base * era * politburo`).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingKind, BuildingRegistry};
use crate::chronology::{Season, Weather};
use crate::modifiers::ModifierVector;
use crate::resources::ResourceLedger;

/// Food eaten by one citizen per tick.
pub const FOOD_PER_CITIZEN: f64 = 0.01;
/// Vodka drunk by one citizen per tick.
pub const VODKA_PER_CITIZEN: f64 = 0.002;
/// Monthly births per citizen.
pub const BASE_GROWTH_RATE: f64 = 0.02;
/// Monthly arrivals while housing is free.
pub const IMMIGRATION_PER_MONTH: f64 = 2.0;
/// Below this food ratio nobody moves in and nobody is born.
pub const MIN_GROWTH_FOOD_RATIO: f64 = 0.3;
/// Chance of a starvation death on a tick with no food at all.
pub const STARVATION_CHANCE: f64 = 0.05;

/// Quantities of the three produced goods.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Goods {
    /// Food.
    pub food: f64,
    /// Vodka.
    pub vodka: f64,
    /// Money.
    pub money: f64,
}

/// Share of production the state takes before it reaches the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRates {
    /// Fraction of food delivered.
    pub food: f64,
    /// Fraction of vodka delivered.
    pub vodka: f64,
    /// Fraction of money delivered.
    pub money: f64,
}

/// Result of the power pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerReport {
    /// Total generation.
    pub generated: f64,
    /// Total consumption.
    pub used: f64,
    /// Consumers left dark.
    pub unpowered: u32,
}

/// Distribute generated power to consumers in id order.
///
/// Power stations feed the grid regardless of staffing. A consumer is only
/// powered if its whole draw fits in the remaining supply.
pub fn power_system(buildings: &mut BuildingRegistry, ledger: &mut ResourceLedger) -> PowerReport {
    let generated: f64 = buildings.iter().map(|b| b.definition().power_output).sum();
    let mut remaining = generated;
    let mut report = PowerReport {
        generated,
        ..PowerReport::default()
    };

    for building in buildings.iter_mut() {
        let draw = building.definition().power_draw;
        if draw <= 0.0 {
            building.powered = true;
        } else if draw <= remaining {
            remaining -= draw;
            report.used += draw;
            building.powered = true;
        } else {
            building.powered = false;
            report.unpowered += 1;
        }
    }

    ledger.set_power(report.generated, report.used);
    report
}

/// Fraction of worker slots filled, capped at 1.
#[must_use]
pub fn labor_ratio(labor_units: f64, worker_slots: u32) -> f64 {
    if worker_slots == 0 {
        return 1.0;
    }
    (labor_units / worker_slots as f64).clamp(0.0, 1.0)
}

/// Gross output of all operating buildings this tick.
#[must_use]
pub fn production_system(
    buildings: &BuildingRegistry,
    labor_ratio: f64,
    season: Season,
    weather: Weather,
    modifiers: &ModifierVector,
) -> Goods {
    let mut output = Goods::default();
    let scale = labor_ratio * modifiers.production;

    for building in buildings.iter().filter(|b| b.is_operating()) {
        let def = building.definition();
        let outdoor = if building.kind == BuildingKind::CollectiveFarm {
            season.farm_factor() * weather.production_factor()
        } else {
            1.0
        };
        output.food += def.food_output * scale * outdoor;
        output.vodka += def.vodka_output * scale;
        output.money += def.money_output * scale;
    }

    output
}

/// Split gross output into what the settlement keeps and what the state takes.
///
/// Returns `(kept, delivered)`.
#[must_use]
pub fn delivery_extraction(output: Goods, rates: &DeliveryRates) -> (Goods, Goods) {
    let delivered = Goods {
        food: output.food * rates.food.clamp(0.0, 1.0),
        vodka: output.vodka * rates.vodka.clamp(0.0, 1.0),
        money: output.money * rates.money.clamp(0.0, 1.0),
    };
    let kept = Goods {
        food: output.food - delivered.food,
        vodka: output.vodka - delivered.vodka,
        money: output.money - delivered.money,
    };
    (kept, delivered)
}

/// Put kept goods into the ledger.
pub fn deposit(goods: &Goods, ledger: &mut ResourceLedger) {
    ledger.add_food(goods.food);
    ledger.add_vodka(goods.vodka);
    ledger.add_money(goods.money);
}

/// Result of the consumption pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConsumptionReport {
    /// Food the population needed.
    pub food_demand: f64,
    /// Food that was not available.
    pub food_shortfall: f64,
    /// Vodka that was not available.
    pub vodka_shortfall: f64,
}

/// Feed the population.
pub fn consumption_system(
    ledger: &mut ResourceLedger,
    population: u32,
    modifiers: &ModifierVector,
) -> ConsumptionReport {
    let food_demand = population as f64 * FOOD_PER_CITIZEN * modifiers.consumption;
    let vodka_demand = population as f64 * VODKA_PER_CITIZEN * modifiers.consumption;
    ConsumptionReport {
        food_demand,
        food_shortfall: ledger.consume_food(food_demand),
        vodka_shortfall: ledger.consume_vodka(vodka_demand),
    }
}

/// Roll whether hunger kills someone this tick.
///
/// The chance scales with the unmet share of demand.
pub fn starvation_check<R: Rng + ?Sized>(report: &ConsumptionReport, rng: &mut R) -> bool {
    if report.food_shortfall <= 0.0 || report.food_demand <= 0.0 {
        return false;
    }
    let unmet = (report.food_shortfall / report.food_demand).clamp(0.0, 1.0);
    rng.gen::<f64>() < STARVATION_CHANCE * unmet
}

/// Monthly births and arrivals, limited by free housing.
#[must_use]
pub fn population_growth(
    population: u32,
    housing_capacity: u32,
    food_ratio: f64,
    modifiers: &ModifierVector,
) -> u32 {
    let free = housing_capacity.saturating_sub(population);
    if free == 0 || food_ratio < MIN_GROWTH_FOOD_RATIO {
        return 0;
    }
    let growth = (population as f64 * BASE_GROWTH_RATE + IMMIGRATION_PER_MONTH)
        * modifiers.population_growth.max(0.0);
    (growth.floor() as u32).min(free)
}

/// Wear buildings down and remove the ones that collapse.
///
/// Returns the collapsed buildings in id order.
pub fn decay_system(
    buildings: &mut BuildingRegistry,
    season: Season,
    modifiers: &ModifierVector,
) -> Vec<Building> {
    let factor = modifiers.decay.max(0.0) * season.decay_factor();
    let mut collapsed_ids = Vec::new();

    for building in buildings.iter_mut() {
        building.durability -= building.definition().decay_rate * factor;
        if building.durability <= 0.0 {
            building.durability = 0.0;
            collapsed_ids.push(building.id);
        }
    }

    collapsed_ids
        .into_iter()
        .filter_map(|id| buildings.remove(id))
        .collect()
}

/// Food stock relative to one month of demand. 1.0 for an empty settlement.
#[must_use]
pub fn food_ratio(food: f64, population: u32, ticks_per_month: u32) -> f64 {
    if population == 0 {
        return 1.0;
    }
    let monthly_demand = population as f64 * FOOD_PER_CITIZEN * ticks_per_month as f64;
    if monthly_demand <= 0.0 {
        return 1.0;
    }
    (food / monthly_demand).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::MAX_DURABILITY;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_power_assigned_in_id_order() {
        let mut buildings = BuildingRegistry::new();
        buildings.insert(BuildingKind::PowerStation); // +20
        let factory = buildings.insert(BuildingKind::Factory); // 5
        let hospital = buildings.insert(BuildingKind::Hospital); // 4
        let factory2 = buildings.insert(BuildingKind::Factory); // 5
        let factory3 = buildings.insert(BuildingKind::Factory); // 5
        let mut ledger = ResourceLedger::default();

        let report = power_system(&mut buildings, &mut ledger);
        assert_eq!(report.generated, 20.0);
        assert_eq!(report.used, 19.0);
        assert_eq!(report.unpowered, 0);
        assert!(buildings.get(factory).unwrap().powered);
        assert!(buildings.get(hospital).unwrap().powered);
        assert!(buildings.get(factory2).unwrap().powered);
        assert!(buildings.get(factory3).unwrap().powered);

        let factory4 = buildings.insert(BuildingKind::Factory);
        let report = power_system(&mut buildings, &mut ledger);
        assert_eq!(report.unpowered, 1);
        assert!(!buildings.get(factory4).unwrap().powered);
        assert_eq!(ledger.power, 20.0);
        assert_eq!(ledger.power_used, 19.0);
    }

    #[test]
    fn test_labor_ratio_bounds() {
        assert_eq!(labor_ratio(5.0, 0), 1.0);
        assert_eq!(labor_ratio(5.0, 10), 0.5);
        assert_eq!(labor_ratio(50.0, 10), 1.0);
    }

    #[test]
    fn test_farm_output_follows_season() {
        let mut buildings = BuildingRegistry::new();
        buildings.insert(BuildingKind::CollectiveFarm);
        let m = ModifierVector::IDENTITY;
        let summer = production_system(&buildings, 1.0, Season::Summer, Weather::Clear, &m);
        let winter = production_system(&buildings, 1.0, Season::Winter, Weather::Clear, &m);
        assert!(summer.food > winter.food);
        assert!((summer.food - 0.3 * 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_unpowered_buildings_produce_nothing() {
        let mut buildings = BuildingRegistry::new();
        buildings.insert(BuildingKind::Factory);
        let out = production_system(
            &buildings,
            1.0,
            Season::Summer,
            Weather::Clear,
            &ModifierVector::IDENTITY,
        );
        assert_eq!(out.money, 0.0);
    }

    #[test]
    fn test_delivery_splits_output() {
        let output = Goods {
            food: 10.0,
            vodka: 4.0,
            money: 2.0,
        };
        let rates = DeliveryRates {
            food: 0.3,
            vodka: 0.5,
            money: 0.0,
        };
        let (kept, delivered) = delivery_extraction(output, &rates);
        assert!((kept.food - 7.0).abs() < 1e-12);
        assert!((delivered.food - 3.0).abs() < 1e-12);
        assert!((kept.vodka - 2.0).abs() < 1e-12);
        assert_eq!(delivered.money, 0.0);
        assert_eq!(kept.money, 2.0);
    }

    #[test]
    fn test_consumption_and_starvation() {
        let mut ledger = ResourceLedger::new(0.0, 0.5, 0.0, 100.0);
        let report = consumption_system(&mut ledger, 100, &ModifierVector::IDENTITY);
        assert!((report.food_demand - 1.0).abs() < 1e-12);
        assert!((report.food_shortfall - 0.5).abs() < 1e-12);
        assert_eq!(ledger.food, 0.0);

        let fed = ConsumptionReport {
            food_demand: 1.0,
            ..ConsumptionReport::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(!starvation_check(&fed, &mut rng));
    }

    #[test]
    fn test_growth_limited_by_housing_and_food() {
        let m = ModifierVector::IDENTITY;
        assert_eq!(population_growth(0, 20, 1.0, &m), 2);
        assert_eq!(population_growth(100, 200, 1.0, &m), 4);
        assert_eq!(population_growth(100, 101, 1.0, &m), 1);
        assert_eq!(population_growth(100, 100, 1.0, &m), 0);
        assert_eq!(population_growth(100, 200, 0.1, &m), 0);
    }

    #[test]
    fn test_decay_collapses_worn_buildings() {
        let mut buildings = BuildingRegistry::new();
        let barracks = buildings.insert(BuildingKind::Barracks);
        let farm = buildings.insert(BuildingKind::CollectiveFarm);
        for building in buildings.iter_mut() {
            if building.id == barracks {
                building.durability = 0.001;
            }
        }
        let collapsed = decay_system(&mut buildings, Season::Winter, &ModifierVector::IDENTITY);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].id, barracks);
        assert!(buildings.get(barracks).is_none());
        assert!(buildings.get(farm).unwrap().durability < MAX_DURABILITY);
    }

    #[test]
    fn test_food_ratio() {
        assert_eq!(food_ratio(0.0, 0, 120), 1.0);
        assert!((food_ratio(12.0, 10, 120) - 1.0).abs() < 1e-12);
        assert!((food_ratio(6.0, 10, 120) - 0.5).abs() < 1e-12);
    }
}
