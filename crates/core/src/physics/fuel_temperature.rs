//! Fuel heating by solar radiation (Rothermel et al. 1986)
//!
//! Fine dead fuels in sunlight run hotter and drier than the surrounding
//! air. The chain is: optical air mass → attenuated irradiance →
//! irradiance on the slope → fuel temperature, with wind at fuel level
//! carrying heat away. Humidity next to the fuel follows the temperature
//! rise.
//!
//! The equations work in US units (°F, mph, feet, cal/cm²·min).
//!
//! # Scientific References
//! - Rothermel, R.C. et al. (1986). USDA Forest Service RP INT-359,
//!   equations 1, 2, 9-11, 16 and 36

use crate::core_types::fuel::{FuelModel, FuelTemperature};
use crate::core_types::terrain::Terrain;
use crate::core_types::units::{Fahrenheit, Percent};
use crate::core_types::weather::Weather;
use crate::providers::SunPosition;

/// Atmospheric transparency coefficient
pub const ATMOSPHERIC_TRANSPARENCY: f64 = 0.7;

/// Solar constant (cal/cm²·min)
const SOLAR_CONSTANT: f64 = 1.98;

/// Optical air mass, equation 16
///
/// `M = exp(-0.0000448 E) / sin A` for the sun above the horizon, else 0.
///
/// # Arguments
/// * `altitude` - Solar altitude (radians)
/// * `elevation_ft` - Elevation (feet)
pub fn optical_air_mass(altitude: f64, elevation_ft: f64) -> f64 {
    if altitude > 0.0 {
        (-0.0000448 * elevation_ft).exp() / altitude.sin()
    } else {
        0.0
    }
}

/// Irradiance reaching the fuel perpendicular to the sun's rays
///
/// `I_a = I_0 · p^M · (1 - S_c / 100)`; tree shade is not modelled.
pub fn attenuated_irradiance(air_mass: f64, cloud_cover: f64, transparency: f64) -> f64 {
    if air_mass <= 0.0 {
        return 0.0;
    }
    let cloud_transmittance = 1.0 - cloud_cover / 100.0;
    SOLAR_CONSTANT * transparency.powf(air_mass) * cloud_transmittance
}

/// Irradiance on a sloping surface, equations 9-11
///
/// `tan ψ = tan α · sin(Z - β)`, `I = I_a · sin(A - ψ) · cos α / cos ψ`,
/// floored at zero.
///
/// # Arguments
/// * `slope`, `aspect` - Terrain slope α and aspect β (radians)
/// * `altitude`, `azimuth` - Sun angles A and Z (radians)
/// * `irradiance` - Attenuated irradiance `I_a`
pub fn irradiance_on_slope(
    slope: f64,
    aspect: f64,
    altitude: f64,
    azimuth: f64,
    irradiance: f64,
) -> f64 {
    if altitude <= 0.0 {
        return 0.0;
    }
    let psi = (slope.tan() * (azimuth - aspect).sin()).atan();
    let sin_zeta = (altitude - psi).sin() * slope.cos() / psi.cos();
    (irradiance * sin_zeta).max(0.0)
}

/// Wind speed at the top of the fuel bed, equation 36
///
/// `U_h = U_20 / ln((20 + 0.36 h) / (0.13 h))`, with a 0.1 ft floor on the
/// vegetation height.
pub fn wind_speed_at_fuel_level(wind_20ft_mph: f64, fuel_height_ft: f64) -> f64 {
    let h = if fuel_height_ft == 0.0 {
        0.1
    } else {
        fuel_height_ft
    };
    wind_20ft_mph / ((20.0 + 0.36 * h) / (0.13 * h)).ln()
}

/// Fuel temperature (°F), equation 1: `T_f = I / (0.015 U_h + 0.026) + T_a`
pub fn fuel_temperature(irradiance: f64, air_temperature_f: f64, fuel_level_wind_mph: f64) -> f64 {
    irradiance / (0.015 * fuel_level_wind_mph + 0.026) + air_temperature_f
}

/// Relative humidity next to the fuel, equation 2:
/// `H_f = H_a · exp(-0.033 (T_f - T_a))`
pub fn relative_humidity_near_fuel(humidity: f64, fuel_temp_f: f64, air_temp_f: f64) -> f64 {
    humidity * (-0.033 * (fuel_temp_f - air_temp_f)).exp()
}

/// Fuel temperature, humidity and elevation for one cell
///
/// Returns the zeroed tuple for non-burnable fuel or invalid terrain.
pub fn fuel_heating(
    sun: &SunPosition,
    terrain: &Terrain,
    fuel: &FuelModel,
    weather: &Weather,
) -> FuelTemperature {
    if !fuel.is_burnable() || !terrain.is_valid() {
        return FuelTemperature::default();
    }
    let altitude = sun.altitude.to_radians();
    let azimuth = sun.azimuth.to_radians();

    let air_mass = optical_air_mass(altitude, *terrain.elevation.to_feet());
    let i_a = attenuated_irradiance(air_mass, *weather.cloud_cover, ATMOSPHERIC_TRANSPARENCY);
    let i = irradiance_on_slope(
        terrain.slope.to_radians(),
        terrain.aspect.to_radians(),
        altitude,
        azimuth,
        i_a,
    );
    let u_h = wind_speed_at_fuel_level(*weather.wind_speed.to_mph(), *fuel.fuel_bed_depth);
    let t_a = *weather.air_temperature.to_fahrenheit();
    let t_f = fuel_temperature(i, t_a, u_h);
    let h_f = relative_humidity_near_fuel(*weather.relative_humidity, t_f, t_a);

    FuelTemperature {
        fuel_temperature: Fahrenheit::new(t_f).to_celsius(),
        relative_humidity: Percent::new(h_f),
        elevation: terrain.elevation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Celsius, Degrees, Meters, MetersPerSecond};
    use approx::assert_relative_eq;

    fn weather() -> Weather {
        Weather {
            air_temperature: Celsius::new(25.0),
            relative_humidity: Percent::new(30.0),
            wind_speed: MetersPerSecond::new(4.0),
            wind_direction: Degrees::new(180.0),
            cloud_cover: Percent::new(0.0),
        }
    }

    fn sun(altitude: f64, azimuth: f64) -> SunPosition {
        SunPosition {
            altitude: Degrees::new(altitude),
            azimuth: Degrees::new(azimuth),
            ..SunPosition::default()
        }
    }

    #[test]
    fn test_no_irradiance_below_horizon() {
        assert_eq!(optical_air_mass(-0.1, 0.0), 0.0);
        assert_eq!(attenuated_irradiance(0.0, 0.0, ATMOSPHERIC_TRANSPARENCY), 0.0);
        assert_eq!(irradiance_on_slope(0.2, 1.0, -0.1, 2.0, 1.5), 0.0);
    }

    #[test]
    fn test_overhead_sun_at_sea_level() {
        let m = optical_air_mass(std::f64::consts::FRAC_PI_2, 0.0);
        assert_relative_eq!(m, 1.0, epsilon = 1e-12);
        assert_relative_eq!(attenuated_irradiance(m, 0.0, 0.7), 1.98 * 0.7, epsilon = 1e-12);
        assert_relative_eq!(attenuated_irradiance(m, 50.0, 0.7), 0.99 * 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_ground_irradiance_is_sin_altitude() {
        let a = 0.6_f64;
        assert_relative_eq!(irradiance_on_slope(0.0, 0.0, a, 1.0, 1.2), 1.2 * a.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_wind_at_fuel_level() {
        let expected = 10.0 / (20.36_f64 / 0.13).ln();
        assert_relative_eq!(wind_speed_at_fuel_level(10.0, 1.0), expected, epsilon = 1e-12);
        let floor = 10.0 / (20.036_f64 / 0.013).ln();
        assert_relative_eq!(wind_speed_at_fuel_level(10.0, 0.0), floor, epsilon = 1e-12);
    }

    #[test]
    fn test_fuel_matches_air_at_night() {
        let fuel = FuelModel::from_code(1).unwrap();
        let terrain = Terrain::flat(Meters::new(500.0));
        let out = fuel_heating(&sun(-10.0, 0.0), &terrain, &fuel, &weather());
        assert_relative_eq!(*out.fuel_temperature, 25.0, epsilon = 1e-9);
        assert_relative_eq!(*out.relative_humidity, 30.0, epsilon = 1e-9);
        assert_eq!(out.elevation, Meters::new(500.0));
    }

    #[test]
    fn test_sunlit_fuel_is_hotter_and_drier() {
        let fuel = FuelModel::from_code(1).unwrap();
        let terrain = Terrain::flat(Meters::new(0.0));
        let out = fuel_heating(&sun(60.0, 180.0), &terrain, &fuel, &weather());
        assert!(*out.fuel_temperature > 25.0);
        assert!(*out.relative_humidity < 30.0);
    }

    #[test]
    fn test_invalid_inputs_give_zeroed_output() {
        let terrain = Terrain::flat(Meters::new(0.0));
        let out = fuel_heating(&sun(60.0, 180.0), &terrain, &FuelModel::INVALID, &weather());
        assert_eq!(out, FuelTemperature::default());
        let fuel = FuelModel::from_code(2).unwrap();
        let out = fuel_heating(&sun(60.0, 180.0), &Terrain::INVALID, &fuel, &weather());
        assert_eq!(out, FuelTemperature::default());
    }
}
