//! Solar geometry for fuel heating (Rothermel et al. 1986)
//!
//! Computes the julian date, solar declination, local hour angle and the
//! sun's altitude and azimuth at a latitude and local clock time.
//!
//! # Scientific References
//! - Rothermel, R.C., Wilson, R.A., Morris, G.A. & Sackett, S.S. (1986).
//!   "Modeling moisture content of fine dead wildland fuels: input to the
//!   BEHAVE fire prediction system". USDA Forest Service RP INT-359,
//!   equations 4-8

use crate::core_types::units::Degrees;
use crate::providers::{SolarProvider, SunPosition};
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Day of year per Rothermel's equation 8 approximation
///
/// `NJ = round(31(Mo - 1) + Dy - 0.4 Mo - 1.8 + ε)` where ε corrects for
/// February and leap years.
pub fn julian_date(date: NaiveDate) -> i64 {
    let mo = i64::from(date.month());
    let dy = f64::from(date.day());
    let epsilon = match mo {
        1 => 2.0,
        2 => 3.0,
        _ if date.year() % 4 == 0 => 1.0,
        _ => 0.0,
    };
    (31.0 * (mo - 1) as f64 + dy - 0.4 * mo as f64 - 1.8 + epsilon).round() as i64
}

/// Solar declination (radians) for day of year `nj`
pub fn declination(nj: i64) -> f64 {
    // 0.9863 = 360 degrees / 365 days
    (23.5 * (0.9863_f64.to_radians() * (284 + nj) as f64).sin()).to_radians()
}

/// Local hour angle (radians), zero at 06:00 and 15 degrees per hour
pub fn local_hour_angle(clock_hours: f64) -> f64 {
    let t = if clock_hours >= 6.0 {
        clock_hours
    } else {
        clock_hours + 24.0
    };
    (15.0 * (t - 6.0)).to_radians()
}

/// Solar altitude angle (radians), equation 4
///
/// `sin A = sin h cos δ cos φ + sin δ sin φ`
pub fn altitude_angle(h: f64, phi: f64, delta: f64) -> f64 {
    (h.sin() * delta.cos() * phi.cos() + delta.sin() * phi.sin()).asin()
}

/// Solar azimuth angle (radians), equations 5 and 6
///
/// The quadrant is chosen by comparing the signs of `tan Z` and `cos Z`;
/// `tan Z` is negated in the southern hemisphere.
pub fn azimuth_angle(h: f64, phi: f64, delta: f64, a: f64) -> f64 {
    let mut tan_z = (h.sin() * delta.cos() * phi.sin() - delta.sin() * phi.cos())
        / (h.cos() * delta.cos());
    let cos_z = h.cos() * (delta.cos() / a.cos());
    if phi < 0.0 {
        tan_z = -tan_z;
    }
    if tan_z >= 0.0 && cos_z >= 0.0 {
        tan_z.atan()
    } else if tan_z < 0.0 && cos_z < 0.0 {
        cos_z.acos()
    } else if tan_z >= 0.0 && cos_z < 0.0 {
        tan_z.atan() + PI
    } else {
        2.0 * PI - cos_z.acos()
    }
}

/// Default [`SolarProvider`] built on the equations above
#[derive(Debug, Clone, Copy, Default)]
pub struct RothermelSolar;

impl SolarProvider for RothermelSolar {
    fn sun_position(&self, latitude: f64, date: NaiveDate, clock_hours: f64) -> SunPosition {
        let phi = latitude.to_radians();
        let delta = declination(julian_date(date));
        let h = local_hour_angle(clock_hours);
        let a = altitude_angle(h, phi, delta);
        let z = azimuth_angle(h, phi, delta, a);
        SunPosition {
            hour_angle: Degrees::from_radians(h),
            altitude: Degrees::from_radians(a),
            azimuth: Degrees::from_radians(z),
            declination: Degrees::from_radians(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_julian_date() {
        assert_eq!(julian_date(date(2009, 1, 1)), 1);
        assert_eq!(julian_date(date(2009, 3, 1)), 60);
        assert_eq!(julian_date(date(2008, 3, 1)), 61);
        assert_eq!(julian_date(date(2009, 12, 31)), 365);
    }

    #[test]
    fn test_declination_near_equinox_and_solstice() {
        assert!(declination(81).to_degrees().abs() < 0.01);
        assert_relative_eq!(declination(172).to_degrees(), 23.45, epsilon = 0.1);
    }

    #[test]
    fn test_hour_angle_wraps_before_dawn() {
        assert_relative_eq!(local_hour_angle(6.0), 0.0);
        assert_relative_eq!(local_hour_angle(12.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(local_hour_angle(3.0), (15.0_f64 * 21.0).to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_noon_altitude() {
        let sun = RothermelSolar.sun_position(34.0, date(2024, 7, 4), 12.0);
        let expected = 90.0 - (34.0 - *sun.declination).abs();
        assert_relative_eq!(*sun.altitude, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_sun_below_horizon_at_midnight() {
        let sun = RothermelSolar.sun_position(34.0, date(2024, 7, 4), 0.0);
        assert!(*sun.altitude < 0.0);
    }

    #[test]
    fn test_azimuth_is_within_circle() {
        for hour in 0..24 {
            let sun = RothermelSolar.sun_position(-33.9, date(2024, 1, 10), f64::from(hour));
            assert!((0.0..=360.0).contains(&*sun.azimuth), "hour {hour}: {}", sun.azimuth);
        }
    }
}
