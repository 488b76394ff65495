//! Geographic coordinates and sector bounding boxes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude (degrees, positive north)
    pub latitude: f64,
    /// Longitude (degrees, positive east)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point from decimal degrees
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// An immutable geographic bounding box defining one fireground area
///
/// Sectors key every per-sector map in the fireground, so equality and
/// hashing compare the bit patterns of the four bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sector {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl Sector {
    /// Create a sector from its four bounds (degrees)
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Southern bound (minimum latitude)
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Western bound (minimum longitude)
    pub fn west(&self) -> f64 {
        self.west
    }

    /// Northern bound (maximum latitude)
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Eastern bound (maximum longitude)
    pub fn east(&self) -> f64 {
        self.east
    }

    /// Latitude extent in degrees
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Southwest corner
    pub fn southwest(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.west)
    }

    /// Northeast corner
    pub fn northeast(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.east)
    }

    /// Centre of the box
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// True if any bound is NaN or infinite
    pub fn is_missing(&self) -> bool {
        ![self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
    }

    /// True if the box has no positive extent in either direction
    pub fn is_degenerate(&self) -> bool {
        self.north <= self.south || self.east <= self.west
    }

    /// Inclusive containment test on all four edges
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.south
            && point.latitude <= self.north
            && point.longitude >= self.west
            && point.longitude <= self.east
    }

    fn bits(&self) -> [u64; 4] {
        [
            self.south.to_bits(),
            self.west.to_bits(),
            self.north.to_bits(),
            self.east.to_bits(),
        ]
    }
}

impl PartialEq for Sector {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Sector {}

impl Hash for Sector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[S {:.5}, W {:.5}, N {:.5}, E {:.5}]",
            self.south, self.west, self.north, self.east
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_contains_is_inclusive() {
        let sector = Sector::new(34.0, -120.0, 35.0, -119.0);
        assert!(sector.contains(GeoPoint::new(34.0, -120.0)));
        assert!(sector.contains(GeoPoint::new(35.0, -119.0)));
        assert!(sector.contains(sector.center()));
        assert!(!sector.contains(GeoPoint::new(35.0001, -119.5)));
        assert!(!sector.contains(GeoPoint::new(34.5, -118.9)));
    }

    #[test]
    fn test_missing_and_degenerate() {
        assert!(Sector::new(f64::NAN, 0.0, 1.0, 1.0).is_missing());
        assert!(!Sector::new(0.0, 0.0, 1.0, 1.0).is_missing());
        assert!(Sector::new(1.0, 0.0, 1.0, 1.0).is_degenerate());
        assert!(Sector::new(0.0, 2.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_sector_hash_key() {
        let mut set = FxHashSet::default();
        set.insert(Sector::new(0.0, 0.0, 1.0, 1.0));
        set.insert(Sector::new(0.0, 0.0, 1.0, 1.0));
        set.insert(Sector::new(0.0, 0.0, 2.0, 1.0));
        assert_eq!(set.len(), 2);
    }
}
