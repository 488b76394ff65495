//! Semantic unit types for type-safe physical quantity handling
//!
//! The fuel moisture and fuel temperature equations mix US customary units
//! (°F, mph, feet) with metric units (°C, km/h, metres). These newtype
//! wrappers keep the two systems apart and make every conversion explicit.
//!
//! # Design Philosophy
//! - All quantities are f64: the moisture recursions are compared against
//!   reference values at 1e-6
//! - Private inner fields, `value()` and `Deref` for arithmetic
//! - Serde support (transparent) for persisted fields; JSON `null` reads
//!   back as NaN so invalid-cell sentinels survive a save/load cycle
//!
//! # Usage
//! ```
//! use fireground_core::core_types::units::{Celsius, Fahrenheit, KilometersPerHour};
//!
//! let temp = Celsius::new(20.0);
//! let f: Fahrenheit = temp.into();
//! assert!((*f - 68.0).abs() < 1e-9);
//!
//! let wind = KilometersPerHour::new(16.09344);
//! assert!((*wind.to_mph() - 10.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::{Add, Deref, Div, Mul, Sub};

/// Generates the shared boilerplate for a scalar unit newtype.
macro_rules! unit_type {
    ($(#[$meta:meta])* $name:ident, $suffix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(f64);

        impl $name {
            /// Wrap a raw value
            #[inline]
            #[must_use]
            pub const fn new(value: f64) -> Self {
                $name(value)
            }

            /// Get the raw value
            #[inline]
            #[must_use]
            pub const fn value(self) -> f64 {
                self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                f64_or_nan(deserializer).map($name)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = $name;
            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }

        impl Div<f64> for $name {
            type Output = $name;
            fn div(self, rhs: f64) -> $name {
                $name(self.0 / rhs)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.2}{}", self.0, $suffix)
            }
        }
    };
}

/// Deserialize an `f64`, reading `null` (how JSON writes NaN) as NaN
///
/// # Errors
///
/// Fails for anything other than a number or `null`.
pub fn f64_or_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

// ============================================================================
// TEMPERATURE
// ============================================================================

unit_type!(
    /// Temperature in degrees Celsius
    Celsius,
    "°C"
);

unit_type!(
    /// Temperature in degrees Fahrenheit (daily fine fuel moisture inputs)
    Fahrenheit,
    "°F"
);

impl Celsius {
    /// Convert to Fahrenheit
    #[inline]
    #[must_use]
    pub fn to_fahrenheit(self) -> Fahrenheit {
        Fahrenheit(self.0 * 9.0 / 5.0 + 32.0)
    }
}

impl Fahrenheit {
    /// Convert to Celsius
    #[inline]
    #[must_use]
    pub fn to_celsius(self) -> Celsius {
        Celsius((self.0 - 32.0) * 5.0 / 9.0)
    }
}

impl From<Celsius> for Fahrenheit {
    fn from(c: Celsius) -> Fahrenheit {
        c.to_fahrenheit()
    }
}

impl From<Fahrenheit> for Celsius {
    fn from(f: Fahrenheit) -> Celsius {
        f.to_celsius()
    }
}

// ============================================================================
// RATIOS AND ANGLES
// ============================================================================

unit_type!(
    /// Percentage (relative humidity, cloud cover, fuel moisture content)
    Percent,
    "%"
);

unit_type!(
    /// Angle in degrees (slope, aspect, wind and spread directions)
    Degrees,
    "°"
);

impl Degrees {
    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Create from radians
    #[inline]
    #[must_use]
    pub fn from_radians(radians: f64) -> Self {
        Degrees(radians.to_degrees())
    }
}

// ============================================================================
// LENGTH
// ============================================================================

/// Metres per foot (international foot)
const METERS_PER_FOOT: f64 = 0.3048;

unit_type!(
    /// Length in metres
    Meters,
    "m"
);

unit_type!(
    /// Length in feet (fuel bed depth, elevation in the irradiance equations)
    Feet,
    "ft"
);

impl Meters {
    /// Convert to feet
    #[inline]
    #[must_use]
    pub fn to_feet(self) -> Feet {
        Feet(self.0 / METERS_PER_FOOT)
    }
}

impl Feet {
    /// Convert to metres
    #[inline]
    #[must_use]
    pub fn to_meters(self) -> Meters {
        Meters(self.0 * METERS_PER_FOOT)
    }
}

// ============================================================================
// SPEED
// ============================================================================

/// Metres per statute mile
const METERS_PER_MILE: f64 = 1609.344;

unit_type!(
    /// Speed in metres per second (SI wind and spread rates)
    MetersPerSecond,
    "m/s"
);

unit_type!(
    /// Speed in kilometres per hour (hourly fine fuel moisture wind input)
    KilometersPerHour,
    "km/h"
);

unit_type!(
    /// Speed in miles per hour (daily fine fuel moisture and fuel-level wind)
    MilesPerHour,
    "mph"
);

impl MetersPerSecond {
    /// Convert to km/h
    #[inline]
    #[must_use]
    pub fn to_kph(self) -> KilometersPerHour {
        KilometersPerHour(self.0 * 3.6)
    }

    /// Convert to mph
    #[inline]
    #[must_use]
    pub fn to_mph(self) -> MilesPerHour {
        MilesPerHour(self.0 * 3600.0 / METERS_PER_MILE)
    }
}

impl KilometersPerHour {
    /// Convert to m/s
    #[inline]
    #[must_use]
    pub fn to_mps(self) -> MetersPerSecond {
        MetersPerSecond(self.0 / 3.6)
    }

    /// Convert to mph
    #[inline]
    #[must_use]
    pub fn to_mph(self) -> MilesPerHour {
        MilesPerHour(self.0 * 1000.0 / METERS_PER_MILE)
    }
}

impl MilesPerHour {
    /// Convert to km/h
    #[inline]
    #[must_use]
    pub fn to_kph(self) -> KilometersPerHour {
        KilometersPerHour(self.0 * METERS_PER_MILE / 1000.0)
    }
}
