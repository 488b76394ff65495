//! Canadian fine fuel moisture equations and the hourly dead 1-hr recursion
//!
//! The daily (noon-anchored) equation works in US units and predicts the
//! 1400 moisture from noon weather. The hourly equation works in metric
//! units and steps the previous hour's moisture forward one hour.
//!
//! # Scientific References
//! - Van Wagner, C.E. (1977). "A method of computing fine fuel moisture
//!   content throughout the diurnal cycle". Canadian Forestry Service
//!   Information Report PS-X-69
//! - Rothermel, R.C. et al. (1986). USDA Forest Service RP INT-359,
//!   pages 43-48 (standard daily and hourly FFMC in US units)
//! - Anderson, K. (2009). "A comparison of hourly fire fuel moisture code
//!   calculations within Canada". Canadian Forest Service (wetting
//!   correction to the daily equation)

use crate::core_types::units::{
    Celsius, Fahrenheit, KilometersPerHour, MetersPerSecond, MilesPerHour, Percent,
};
use serde::{Deserialize, Serialize};

/// Relative tolerance for treating two moistures as equal
const NEARLY_EQUAL_TOLERANCE: f64 = 1e-7;

fn nearly_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < NEARLY_EQUAL_TOLERANCE * a.abs().max(b.abs())
}

/// Canadian standard daily fine fuel moisture (percent)
///
/// # Arguments
/// * `m_0` - Initial fine fuel moisture (%)
/// * `t_f` - Temperature adjacent to the fuel
/// * `h_f` - Relative humidity adjacent to the fuel
/// * `wind` - 20-ft wind speed
/// * `rain_inches` - Rainfall in the previous 24 h (inches)
pub fn canadian_daily_fine_fuel_moisture(
    m_0: f64,
    t_f: Fahrenheit,
    h_f: Percent,
    wind: MilesPerHour,
    rain_inches: f64,
) -> f64 {
    let h = *h_f;
    let f_0 = 101.0 - m_0;

    // Rain adjustment of the initial code
    let f_r = if rain_inches > 0.02 {
        let r_a = rain_inches.min(1.5);
        let f = if r_a <= 0.055 {
            -56.0 - 55.6 * (r_a + 0.04).ln()
        } else if r_a <= 0.225 {
            -1.0 - 18.2 * (r_a - 0.04).ln()
        } else {
            14.0 - 8.25 * (r_a - 0.075).ln()
        };
        (f * f_0 / 100.0 + 1.0 - 8.73 * (-0.1117 * f_0).exp()).max(0.0)
    } else {
        f_0
    };
    let m_r = 101.0 - f_r;

    // Equilibrium drying and wetting curves
    let e_d = 0.942 * h.powf(0.679) + 11.0 * (h / 10.0 - 10.0).exp();
    let e_w = 0.597 * h.powf(0.768) + 14.0 * (h / 8.0 - 12.5).exp();

    let m = if nearly_equal(m_r, e_d) {
        m_r
    } else if m_r < e_d {
        e_w + (e_w - m_r) / 1.9953
    } else {
        let w = wind.value().clamp(1.0, 14.0);
        let x = 0.424 * (1.0 - (h / 100.0).powf(1.7)) + 0.088 * w.sqrt() * (1.0 - (h / 100.0).powi(8));
        e_d + (m_r - e_d) / 10f64.powf(x)
    };

    let delta = if f_0 < 99.0 {
        ((*t_f - 70.0) * (0.63 - 0.0065 * f_r)).max(-16.0)
    } else {
        0.0
    };
    let f = (101.0 - m + delta).clamp(0.0, 99.0);
    101.0 - f
}

/// Canadian hourly fine fuel moisture (percent)
///
/// # Arguments
/// * `m_0` - Previous hour's fine fuel moisture (%)
/// * `h` - Relative humidity
/// * `t_c` - Temperature
/// * `wind` - 20-ft wind speed, capped at 22.5 km/h
pub fn canadian_hourly_fine_fuel_moisture(
    m_0: f64,
    h: Percent,
    t_c: Celsius,
    wind: KilometersPerHour,
) -> f64 {
    let h = *h;
    let t = *t_c;
    let w = wind.value().clamp(0.0, 22.5);

    let temperature_term = 0.18 * (21.1 - t) * (1.0 - (-0.115 * h).exp());
    let e_d = 0.942 * h.powf(0.679) + 11.0 * ((h - 100.0) / 10.0).exp() + temperature_term;
    let e_w = 0.618 * h.powf(0.753) + 10.0 * ((h - 100.0) / 10.0).exp() + temperature_term;

    if m_0 > e_d {
        let k_a = 0.424 * (1.0 - (h / 100.0).powf(1.7)) + 0.0694 * w.sqrt() * (1.0 - (h / 100.0).powi(8));
        let k_d = k_a * 0.0579 * (0.0365 * t).exp();
        e_d + (m_0 - e_d) * (-2.303 * k_d).exp()
    } else if m_0 < e_w {
        let dry = (100.0 - h) / 100.0;
        let k_b = 0.424 * (1.0 - dry.powf(1.7)) + 0.0694 * w.sqrt() * (1.0 - dry.powi(8));
        let k_w = k_b * 0.0579 * (0.0365 * t).exp();
        e_w - (e_w - m_0) * (-2.303 * k_w).exp()
    } else {
        m_0
    }
}

/// Weather next to the fuel for one cell and hour
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FineFuelWeather {
    /// Temperature adjacent to the fuel
    pub fuel_temperature: Celsius,
    /// Relative humidity adjacent to the fuel
    pub fuel_humidity: Percent,
    /// 20-ft wind speed
    pub wind_speed: MetersPerSecond,
}

/// Per-cell state of the dead 1-hr recursion
///
/// Noon weather predicts the 1400 moisture; 1300 interpolates between the
/// previous hour and that prediction, 1400 takes it directly and every
/// other hour steps the hourly equation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeadFineFuelMoisture {
    prev_m: f64,
    m_1400: f64,
}

impl DeadFineFuelMoisture {
    /// Moisture predicted for 1400 at the last noon (0 before the first noon)
    pub fn m_1400(&self) -> f64 {
        self.m_1400
    }

    /// Advance one hour and return the moisture for hour `t`
    ///
    /// # Arguments
    /// * `t` - Hour index in the time grid
    /// * `clock_hours` - Local clock time of hour `t`
    /// * `initial` - Initial 1-hr moisture (%)
    /// * `wx` - Weather next to the fuel at hour `t`
    pub fn step(&mut self, t: usize, clock_hours: f64, initial: f64, wx: &FineFuelWeather) -> f64 {
        let m_0 = if t > 0 { self.prev_m } else { initial };
        let m_14 = if self.m_1400 > 0.0 { self.m_1400 } else { initial };

        if (11.5..12.5).contains(&clock_hours) {
            self.m_1400 = canadian_daily_fine_fuel_moisture(
                m_0,
                wx.fuel_temperature.to_fahrenheit(),
                wx.fuel_humidity,
                wx.wind_speed.to_mph(),
                0.0,
            );
        }

        let m = if (12.5..13.5).contains(&clock_hours) {
            (m_0 + m_14) / 2.0
        } else if (13.5..14.5).contains(&clock_hours) {
            m_14
        } else {
            canadian_hourly_fine_fuel_moisture(
                m_0,
                wx.fuel_humidity,
                wx.fuel_temperature,
                wx.wind_speed.to_kph(),
            )
        };
        self.prev_m = m;
        m
    }
}
