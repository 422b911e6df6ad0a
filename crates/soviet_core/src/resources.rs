//! The shared resource ledger.
//!
//! Every subsystem that touches money, food or vodka goes through the
//! clamping methods here, so no quantity can go negative and stockpiles
//! never exceed storage.

use serde::{Deserialize, Serialize};

/// Scalar settlement resources. All values are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    /// Treasury in rubles.
    pub money: f64,
    /// Food stock.
    pub food: f64,
    /// Vodka stock.
    pub vodka: f64,
    /// Power generated this tick.
    pub power: f64,
    /// Power consumed this tick.
    pub power_used: f64,
    /// Living citizens.
    pub population: u32,
    /// Maximum food and vodka each.
    pub storage_capacity: f64,
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

impl ResourceLedger {
    /// Ledger with the given starting stock.
    #[must_use]
    pub fn new(money: f64, food: f64, vodka: f64, storage_capacity: f64) -> Self {
        let storage_capacity = non_negative(storage_capacity);
        Self {
            money: non_negative(money),
            food: non_negative(food).min(storage_capacity),
            vodka: non_negative(vodka).min(storage_capacity),
            power: 0.0,
            power_used: 0.0,
            population: 0,
            storage_capacity,
        }
    }

    /// Add money.
    pub fn add_money(&mut self, amount: f64) {
        self.money = non_negative(self.money + non_negative(amount));
    }

    /// Deduct up to `amount`; returns what was actually removed.
    pub fn drain_money(&mut self, amount: f64) -> f64 {
        let taken = non_negative(amount).min(self.money);
        self.money = non_negative(self.money - taken);
        taken
    }

    /// Spend exactly `amount` if the treasury covers it.
    pub fn try_spend_money(&mut self, amount: f64) -> bool {
        let amount = non_negative(amount);
        if self.money >= amount {
            self.money -= amount;
            true
        } else {
            false
        }
    }

    /// Store food up to capacity; returns what was stored.
    pub fn add_food(&mut self, amount: f64) -> f64 {
        let stored = non_negative(amount).min(non_negative(self.storage_capacity - self.food));
        self.food += stored;
        stored
    }

    /// Eat up to `amount`; returns the shortfall.
    pub fn consume_food(&mut self, amount: f64) -> f64 {
        let amount = non_negative(amount);
        let eaten = amount.min(self.food);
        self.food = non_negative(self.food - eaten);
        amount - eaten
    }

    /// Store vodka up to capacity; returns what was stored.
    pub fn add_vodka(&mut self, amount: f64) -> f64 {
        let stored = non_negative(amount).min(non_negative(self.storage_capacity - self.vodka));
        self.vodka += stored;
        stored
    }

    /// Drink up to `amount`; returns the shortfall.
    pub fn consume_vodka(&mut self, amount: f64) -> f64 {
        let amount = non_negative(amount);
        let drunk = amount.min(self.vodka);
        self.vodka = non_negative(self.vodka - drunk);
        amount - drunk
    }

    /// Set storage capacity, spoiling any excess stock.
    pub fn set_storage_capacity(&mut self, capacity: f64) {
        self.storage_capacity = non_negative(capacity);
        self.food = self.food.min(self.storage_capacity);
        self.vodka = self.vodka.min(self.storage_capacity);
    }

    /// Record generated and consumed power.
    pub fn set_power(&mut self, generated: f64, used: f64) {
        self.power = non_negative(generated);
        self.power_used = non_negative(used).min(self.power);
    }

    /// Mirror the citizen count.
    pub fn set_population(&mut self, population: u32) {
        self.population = population;
    }

    /// Whether every quantity satisfies the ledger invariants.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let fields = [
            self.money,
            self.food,
            self.vodka,
            self.power,
            self.power_used,
            self.storage_capacity,
        ];
        fields.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.food <= self.storage_capacity + 1e-9
            && self.vodka <= self.storage_capacity + 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_inputs() {
        let ledger = ResourceLedger::new(-5.0, 500.0, f64::NAN, 100.0);
        assert_eq!(ledger.money, 0.0);
        assert_eq!(ledger.food, 100.0);
        assert_eq!(ledger.vodka, 0.0);
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_drain_never_goes_negative() {
        let mut ledger = ResourceLedger::new(10.0, 0.0, 0.0, 100.0);
        assert_eq!(ledger.drain_money(25.0), 10.0);
        assert_eq!(ledger.money, 0.0);
        assert_eq!(ledger.drain_money(-3.0), 0.0);
    }

    #[test]
    fn test_try_spend() {
        let mut ledger = ResourceLedger::new(100.0, 0.0, 0.0, 100.0);
        assert!(ledger.try_spend_money(60.0));
        assert!(!ledger.try_spend_money(60.0));
        assert_eq!(ledger.money, 40.0);
    }

    #[test]
    fn test_storage_caps_food_and_vodka() {
        let mut ledger = ResourceLedger::new(0.0, 90.0, 0.0, 100.0);
        assert_eq!(ledger.add_food(50.0), 10.0);
        assert_eq!(ledger.food, 100.0);
        assert_eq!(ledger.add_vodka(150.0), 100.0);
        ledger.set_storage_capacity(40.0);
        assert_eq!(ledger.food, 40.0);
        assert_eq!(ledger.vodka, 40.0);
    }

    #[test]
    fn test_consume_reports_shortfall() {
        let mut ledger = ResourceLedger::new(0.0, 3.0, 1.0, 100.0);
        assert_eq!(ledger.consume_food(5.0), 2.0);
        assert_eq!(ledger.food, 0.0);
        assert_eq!(ledger.consume_vodka(0.5), 0.0);
        assert_eq!(ledger.vodka, 0.5);
    }

    #[test]
    fn test_power_used_bounded_by_generation() {
        let mut ledger = ResourceLedger::default();
        ledger.set_power(10.0, 15.0);
        assert_eq!(ledger.power_used, 10.0);
    }
}
