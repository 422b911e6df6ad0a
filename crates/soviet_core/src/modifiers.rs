//! Multiplicative gameplay modifiers.
//!
//! The era and the politburo each contribute a [`ModifierVector`]. The
//! orchestrator composes them with the configured base vector:
//! `effective = base * era * politburo`, component-wise.

use serde::{Deserialize, Serialize};

/// Lowest value any politburo-adjusted multiplier may reach.
pub const MIN_MULTIPLIER: f64 = 0.1;

/// Names one component of a [`ModifierVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierField {
    /// Output of farms, distilleries and factories.
    Production,
    /// Food and vodka eaten per citizen.
    Consumption,
    /// Building durability loss.
    Decay,
    /// Births and immigration.
    PopulationGrowth,
    /// Frequency of opportunistic political events.
    EventFrequency,
    /// Weight of corruption losses.
    Corruption,
}

impl ModifierField {
    /// All fields in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Production,
        Self::Consumption,
        Self::Decay,
        Self::PopulationGrowth,
        Self::EventFrequency,
        Self::Corruption,
    ];
}

/// A named set of multiplicative scalars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierVector {
    /// Production multiplier.
    pub production: f64,
    /// Consumption multiplier.
    pub consumption: f64,
    /// Decay multiplier.
    pub decay: f64,
    /// Population growth multiplier.
    pub population_growth: f64,
    /// Event frequency multiplier.
    pub event_frequency: f64,
    /// Corruption multiplier.
    pub corruption: f64,
}

impl Default for ModifierVector {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ModifierVector {
    /// The neutral vector (every component 1.0).
    pub const IDENTITY: Self = Self {
        production: 1.0,
        consumption: 1.0,
        decay: 1.0,
        population_growth: 1.0,
        event_frequency: 1.0,
        corruption: 1.0,
    };

    /// Read one component.
    #[must_use]
    pub const fn get(&self, field: ModifierField) -> f64 {
        match field {
            ModifierField::Production => self.production,
            ModifierField::Consumption => self.consumption,
            ModifierField::Decay => self.decay,
            ModifierField::PopulationGrowth => self.population_growth,
            ModifierField::EventFrequency => self.event_frequency,
            ModifierField::Corruption => self.corruption,
        }
    }

    /// Mutable access to one component.
    pub fn get_mut(&mut self, field: ModifierField) -> &mut f64 {
        match field {
            ModifierField::Production => &mut self.production,
            ModifierField::Consumption => &mut self.consumption,
            ModifierField::Decay => &mut self.decay,
            ModifierField::PopulationGrowth => &mut self.population_growth,
            ModifierField::EventFrequency => &mut self.event_frequency,
            ModifierField::Corruption => &mut self.corruption,
        }
    }

    /// Component-wise product.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a * b)
    }

    /// Component-wise linear interpolation; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        from.zip_with(to, |a, b| a + (b - a) * t)
    }

    /// Raise every component to at least `floor`.
    #[must_use]
    pub fn floored(&self, floor: f64) -> Self {
        self.zip_with(self, |a, _| a.max(floor))
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut out = Self::IDENTITY;
        for field in ModifierField::ALL {
            *out.get_mut(field) = f(self.get(field), other.get(field));
        }
        out
    }

    /// True when every component is within `epsilon` of `other`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        ModifierField::ALL
            .iter()
            .all(|&field| (self.get(field) - other.get(field)).abs() <= epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModifierVector {
        ModifierVector {
            production: 0.8,
            consumption: 1.2,
            decay: 1.5,
            population_growth: 0.5,
            event_frequency: 2.0,
            corruption: 1.1,
        }
    }

    #[test]
    fn test_identity_is_neutral_for_compose() {
        let v = sample();
        assert_eq!(v.compose(&ModifierVector::IDENTITY), v);
        assert_eq!(ModifierVector::IDENTITY.compose(&v), v);
    }

    #[test]
    fn test_compose_multiplies_components() {
        let v = sample().compose(&sample());
        assert!((v.production - 0.64).abs() < 1e-12);
        assert!((v.event_frequency - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = ModifierVector::IDENTITY;
        let b = sample();
        assert!(ModifierVector::lerp(&a, &b, 0.0).approx_eq(&a, 1e-12));
        assert!(ModifierVector::lerp(&a, &b, 1.0).approx_eq(&b, 1e-12));
        let mid = ModifierVector::lerp(&a, &b, 0.5);
        assert!((mid.decay - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_clamps_parameter() {
        let a = ModifierVector::IDENTITY;
        let b = sample();
        assert!(ModifierVector::lerp(&a, &b, 3.0).approx_eq(&b, 1e-12));
        assert!(ModifierVector::lerp(&a, &b, -1.0).approx_eq(&a, 1e-12));
    }

    #[test]
    fn test_floored() {
        let v = ModifierVector {
            production: -0.5,
            ..ModifierVector::IDENTITY
        }
        .floored(MIN_MULTIPLIER);
        assert!((v.production - MIN_MULTIPLIER).abs() < 1e-12);
        assert!((v.decay - 1.0).abs() < 1e-12);
    }
}
