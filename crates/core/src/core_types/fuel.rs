//! Fuel models, fuel moisture sets and fuel conditions
//!
//! The fuel type field stores bare fuel model codes; everything that needs
//! fuel properties resolves the code through the standard catalogue here.
//!
//! # Scientific References
//!
//! - Anderson, H.E. (1982). "Aids to Determining Fuel Models for Estimating
//!   Fire Behavior". USDA Forest Service GTR INT-122
//! - Scott, J.H. & Burgan, R.E. (2005). "Standard Fire Behavior Fuel Models".
//!   USDA Forest Service GTR RMRS-153 (moisture scenarios, table 7)

use crate::core_types::units::{Celsius, Feet, Meters, Percent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A surface fuel model from the standard catalogue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelModel {
    /// Fuel model number (-1 for `INVALID`)
    pub code: i32,
    /// Short descriptive name
    pub name: &'static str,
    /// Fuel bed depth
    pub fuel_bed_depth: Feet,
}

impl FuelModel {
    /// Reserved code for cells without a fuel classification
    pub const INVALID_CODE: i32 = -1;

    /// Non-burnable placeholder model
    pub const INVALID: FuelModel = FuelModel {
        code: Self::INVALID_CODE,
        name: "Invalid Fuel Model",
        fuel_bed_depth: Feet::new(0.0),
    };

    /// Look up a standard fuel model by code
    ///
    /// Returns `None` for codes outside the catalogue (including
    /// `INVALID_CODE`).
    pub fn from_code(code: i32) -> Option<FuelModel> {
        STANDARD_13.iter().find(|m| m.code == code).copied()
    }

    /// Resolve a code, substituting `INVALID` for unknown codes
    pub fn from_code_or_invalid(code: i32) -> FuelModel {
        Self::from_code(code).unwrap_or(Self::INVALID)
    }

    /// True for catalogue models that carry fuel
    pub fn is_burnable(&self) -> bool {
        self.code != Self::INVALID_CODE && self.fuel_bed_depth.value() > 0.0
    }

    /// The full standard catalogue
    pub fn catalogue() -> &'static [FuelModel] {
        &STANDARD_13
    }
}

impl fmt::Display for FuelModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.code, self.name)
    }
}

const fn model(code: i32, name: &'static str, depth_ft: f64) -> FuelModel {
    FuelModel {
        code,
        name,
        fuel_bed_depth: Feet::new(depth_ft),
    }
}

/// Anderson's original 13 fire behavior fuel models
static STANDARD_13: [FuelModel; 13] = [
    model(1, "Short grass", 1.0),
    model(2, "Timber (grass and understory)", 1.0),
    model(3, "Tall grass", 2.5),
    model(4, "Chaparral", 6.0),
    model(5, "Brush", 2.0),
    model(6, "Dormant brush, hardwood slash", 2.5),
    model(7, "Southern rough", 2.5),
    model(8, "Short needle litter", 0.2),
    model(9, "Long needle or hardwood litter", 0.2),
    model(10, "Timber (litter and understory)", 1.0),
    model(11, "Light logging slash", 1.0),
    model(12, "Medium logging slash", 2.3),
    model(13, "Heavy logging slash", 3.0),
];

/// Moisture content of the five fuel size/life classes (percent of dry weight)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FuelMoisture {
    /// 1-hour timelag dead fuel
    pub dead_1h: Percent,
    /// 10-hour timelag dead fuel
    pub dead_10h: Percent,
    /// 100-hour timelag dead fuel
    pub dead_100h: Percent,
    /// Live herbaceous fuel
    pub live_herb: Percent,
    /// Live woody fuel
    pub live_woody: Percent,
}

impl FuelMoisture {
    /// Create a moisture set from raw percentages
    #[must_use]
    pub const fn from_percents(
        dead_1h: f64,
        dead_10h: f64,
        dead_100h: f64,
        live_herb: f64,
        live_woody: f64,
    ) -> Self {
        Self {
            dead_1h: Percent::new(dead_1h),
            dead_10h: Percent::new(dead_10h),
            dead_100h: Percent::new(dead_100h),
            live_herb: Percent::new(live_herb),
            live_woody: Percent::new(live_woody),
        }
    }
}

/// Standard fuel moisture scenarios (Scott & Burgan 2005, table 7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FuelMoistureScenario {
    /// D1L1: very low dead, fully cured herbaceous
    #[default]
    VeryLowDeadFullyCuredHerb,
    /// D2L2: low dead, two-thirds cured herbaceous
    LowDeadTwoThirdsCuredHerb,
    /// D3L3: moderate dead, one-third cured herbaceous
    ModerateDeadOneThirdCuredHerb,
    /// D4L4: high dead, fully green herbaceous
    HighDeadFullyGreenHerb,
}

impl FuelMoistureScenario {
    /// The initial moisture values of this scenario
    pub fn fuel_moisture(self) -> FuelMoisture {
        match self {
            FuelMoistureScenario::VeryLowDeadFullyCuredHerb => {
                FuelMoisture::from_percents(3.0, 4.0, 5.0, 30.0, 60.0)
            }
            FuelMoistureScenario::LowDeadTwoThirdsCuredHerb => {
                FuelMoisture::from_percents(6.0, 7.0, 8.0, 60.0, 90.0)
            }
            FuelMoistureScenario::ModerateDeadOneThirdCuredHerb => {
                FuelMoisture::from_percents(9.0, 10.0, 11.0, 90.0, 120.0)
            }
            FuelMoistureScenario::HighDeadFullyGreenHerb => {
                FuelMoisture::from_percents(12.0, 13.0, 14.0, 120.0, 150.0)
            }
        }
    }
}

/// Fuel heating at one cell and hour
///
/// All zero for cells without a burnable fuel model or valid terrain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FuelTemperature {
    /// Temperature adjacent to the fuel
    pub fuel_temperature: Celsius,
    /// Relative humidity adjacent to the fuel
    pub relative_humidity: Percent,
    /// Cell elevation
    pub elevation: Meters,
}

/// Fuel state handed to the fire behavior provider
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FuelCondition {
    /// General air temperature at the hour
    pub air_temperature: Celsius,
    /// Temperature adjacent to the fuel
    pub fuel_temperature: Celsius,
    /// Moisture content of each fuel class
    pub fuel_moisture: FuelMoisture,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_lookup() {
        let grass = FuelModel::from_code(1).unwrap();
        assert_eq!(grass.name, "Short grass");
        assert_eq!(*grass.fuel_bed_depth, 1.0);
        assert!(grass.is_burnable());
        assert_eq!(FuelModel::catalogue().len(), 13);
    }

    #[test]
    fn test_unknown_codes_resolve_to_invalid() {
        assert!(FuelModel::from_code(99).is_none());
        assert!(FuelModel::from_code(FuelModel::INVALID_CODE).is_none());
        let invalid = FuelModel::from_code_or_invalid(99);
        assert_eq!(invalid.code, FuelModel::INVALID_CODE);
        assert!(!invalid.is_burnable());
    }

    #[test]
    fn test_default_scenario_values() {
        let m = FuelMoistureScenario::default().fuel_moisture();
        assert_eq!(m, FuelMoisture::from_percents(3.0, 4.0, 5.0, 30.0, 60.0));
    }
}
