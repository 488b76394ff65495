//! Fire behavior results and the assembled point-query environment

use crate::core_types::fuel::{FuelCondition, FuelModel};
use crate::core_types::units::{f64_or_nan, Degrees, Meters, MetersPerSecond};
use serde::{Deserialize, Serialize};

/// Surface fire behavior at one cell and hour (SI units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FireBehavior {
    /// Fireline intensity (kW/m)
    #[serde(deserialize_with = "f64_or_nan")]
    pub fireline_intensity: f64,
    /// Flame length
    pub flame_length: Meters,
    /// Rate of spread
    pub rate_of_spread: MetersPerSecond,
    /// Direction of maximum spread, clockwise from north
    pub direction_of_spread: Degrees,
    /// Heat release per unit area (kJ/m²)
    #[serde(deserialize_with = "f64_or_nan")]
    pub heat_release: f64,
}

impl FireBehavior {
    /// Stored wherever the provider had no answer or the fuel cannot burn
    pub const INVALID: FireBehavior = FireBehavior {
        fireline_intensity: f64::NAN,
        flame_length: Meters::new(f64::NAN),
        rate_of_spread: MetersPerSecond::new(f64::NAN),
        direction_of_spread: Degrees::new(f64::NAN),
        heat_release: f64::NAN,
    };

    /// Create a behavior tuple from raw SI values
    #[must_use]
    pub const fn new(
        fireline_intensity: f64,
        flame_length: f64,
        rate_of_spread: f64,
        direction_of_spread: f64,
        heat_release: f64,
    ) -> Self {
        Self {
            fireline_intensity,
            flame_length: Meters::new(flame_length),
            rate_of_spread: MetersPerSecond::new(rate_of_spread),
            direction_of_spread: Degrees::new(direction_of_spread),
            heat_release,
        }
    }

    /// False for the `INVALID` sentinel
    pub fn is_valid(&self) -> bool {
        self.fireline_intensity.is_finite()
            && self.flame_length.is_finite()
            && self.rate_of_spread.is_finite()
            && self.direction_of_spread.is_finite()
            && self.heat_release.is_finite()
    }
}

/// Behavior with the hour's wind (max) and under calm conditions (min)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FireBehaviorPair {
    /// Behavior driven by the 20-ft wind
    pub with_wind: FireBehavior,
    /// Behavior with no wind
    pub no_wind: FireBehavior,
}

impl FireBehaviorPair {
    /// Both halves `INVALID`
    pub const INVALID: FireBehaviorPair = FireBehaviorPair {
        with_wind: FireBehavior::INVALID,
        no_wind: FireBehavior::INVALID,
    };
}

/// Everything known about one location at one hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FireEnvironment {
    /// Fuel model at the location
    pub fuel_model: FuelModel,
    /// Behavior with wind
    pub behavior_max: FireBehavior,
    /// Behavior without wind
    pub behavior_min: FireBehavior,
    /// Fuel temperature and moisture
    pub condition: FuelCondition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel_survives_json() {
        let json = serde_json::to_string(&FireBehavior::INVALID).unwrap();
        let back: FireBehavior = serde_json::from_str(&json).unwrap();
        assert!(!back.is_valid());
        assert!(back.heat_release.is_nan());
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(!FireBehavior::INVALID.is_valid());
        assert!(FireBehavior::new(10.0, 1.0, 0.1, 180.0, 100.0).is_valid());
        assert!(FireBehavior::default().is_valid());
    }
}
