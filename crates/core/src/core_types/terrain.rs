//! Per-cell terrain tuple (slope, aspect, elevation)

use crate::core_types::units::{Degrees, Meters};
use serde::{Deserialize, Serialize};

/// Terrain at one grid cell
///
/// Slope is measured from horizontal, aspect clockwise from north (the
/// direction the slope faces).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    /// Slope angle from horizontal (degrees)
    pub slope: Degrees,
    /// Aspect, clockwise from north (degrees)
    pub aspect: Degrees,
    /// Elevation above sea level (metres)
    pub elevation: Meters,
}

impl Terrain {
    /// Sentinel stored for cells where the terrain lookup failed
    pub const INVALID: Terrain = Terrain {
        slope: Degrees::new(f64::NAN),
        aspect: Degrees::new(f64::NAN),
        elevation: Meters::new(f64::NAN),
    };

    /// Create a terrain tuple
    #[must_use]
    pub const fn new(slope: Degrees, aspect: Degrees, elevation: Meters) -> Self {
        Self {
            slope,
            aspect,
            elevation,
        }
    }

    /// Flat ground at the given elevation
    #[must_use]
    pub const fn flat(elevation: Meters) -> Self {
        Self::new(Degrees::new(0.0), Degrees::new(0.0), elevation)
    }

    /// False for the `INVALID` sentinel (or any non-finite component)
    pub fn is_valid(&self) -> bool {
        self.slope.is_finite() && self.aspect.is_finite() && self.elevation.is_finite()
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Terrain::flat(Meters::new(0.0))
    }
}
