//! The discretised lat/lon x hourly time grid underlying one sector
//!
//! A domain is immutable once built. Every spatial grid allocated over it
//! has `nrows * ncols` cells and every temporal grid one spatial grid per
//! timestamp, all addressed with the same column-major index.

use crate::core_types::geo::{GeoPoint, Sector};
use crate::core_types::time::{self, DAILY_CYCLE_START_HOUR};
use crate::error::{FiregroundError, Result};
use crate::grid::field::{SpatialGrid, TemporalGrid};
use crate::grid::geometry::GridGeometry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Default cell size in degrees (roughly 30 m)
pub const DEFAULT_RESOLUTION: f64 = 0.00027;

/// Hourly timestamps for `num_cycles` daily cycles
///
/// The first timestamp is `start`'s date at `start_hour`:00:00.
///
/// # Errors
///
/// Returns `InvalidArgument` for zero cycles or an hour outside `0..24`.
pub fn time_grid(
    start: NaiveDateTime,
    num_cycles: usize,
    start_hour: u32,
) -> Result<Vec<NaiveDateTime>> {
    if num_cycles == 0 {
        return Err(FiregroundError::InvalidArgument {
            name: "num_cycles",
            value: "0".into(),
            reason: "at least one daily cycle is required".into(),
        });
    }
    let first = time::normalize_to_hour(start, start_hour).ok_or_else(|| {
        FiregroundError::InvalidArgument {
            name: "start_hour",
            value: start_hour.to_string(),
            reason: "must be within 0..24".into(),
        }
    })?;
    Ok(time::hourly_steps(first, num_cycles * 24))
}

/// Spatial layout plus hourly time grid for one sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainData")]
pub struct Domain {
    geometry: GridGeometry,
    times: Vec<NaiveDateTime>,
    resolution: f64,
}

#[derive(Deserialize)]
struct DomainData {
    geometry: GridGeometry,
    times: Vec<NaiveDateTime>,
    resolution: f64,
}

impl TryFrom<DomainData> for Domain {
    type Error = FiregroundError;

    fn try_from(data: DomainData) -> Result<Self> {
        check_resolution(data.resolution)?;
        check_times(&data.times)?;
        Ok(Self {
            geometry: data.geometry,
            times: data.times,
            resolution: data.resolution,
        })
    }
}

fn check_resolution(resolution: f64) -> Result<()> {
    if resolution.is_finite() && resolution > 0.0 {
        return Ok(());
    }
    Err(FiregroundError::InvalidArgument {
        name: "resolution",
        value: resolution.to_string(),
        reason: "must be a positive number of degrees".into(),
    })
}

fn check_times(times: &[NaiveDateTime]) -> Result<()> {
    if times.is_empty() || times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(FiregroundError::InvalidArgument {
            name: "times",
            value: format!("{} samples", times.len()),
            reason: "time grid must be non-empty and strictly increasing".into(),
        });
    }
    Ok(())
}

impl Domain {
    /// Domain at the default resolution, time grid anchored at 14:00
    ///
    /// # Errors
    ///
    /// See [`Domain::with_times`] and [`time_grid`].
    pub fn new(sector: Sector, start: NaiveDateTime, num_cycles: usize) -> Result<Self> {
        Self::with_resolution(sector, start, num_cycles, DEFAULT_RESOLUTION)
    }

    /// Domain at an explicit resolution, time grid anchored at 14:00
    ///
    /// # Errors
    ///
    /// See [`Domain::with_times`] and [`time_grid`].
    pub fn with_resolution(
        sector: Sector,
        start: NaiveDateTime,
        num_cycles: usize,
        resolution: f64,
    ) -> Result<Self> {
        let times = time_grid(start, num_cycles, DAILY_CYCLE_START_HOUR)?;
        Self::with_times(sector, times, resolution)
    }

    /// Domain over an existing time grid
    ///
    /// # Errors
    ///
    /// - `InvalidSector` for missing or degenerate bounds, or a sector
    ///   smaller than one resolution step in either direction
    /// - `InvalidArgument` for a non-positive resolution or an empty or
    ///   unordered time grid
    pub fn with_times(sector: Sector, times: Vec<NaiveDateTime>, resolution: f64) -> Result<Self> {
        if sector.is_missing() {
            return Err(FiregroundError::invalid_sector(sector, "missing bounds"));
        }
        if sector.is_degenerate() {
            return Err(FiregroundError::invalid_sector(sector, "degenerate bounds"));
        }
        check_resolution(resolution)?;
        check_times(&times)?;
        let nrows = (sector.height() / resolution).floor() as usize;
        let ncols = (sector.width() / resolution).floor() as usize;
        if nrows == 0 || ncols == 0 {
            return Err(FiregroundError::invalid_sector(
                sector,
                format!("smaller than one {resolution} degree grid step"),
            ));
        }
        Ok(Self {
            geometry: GridGeometry::new(sector, nrows, ncols)?,
            times,
            resolution,
        })
    }

    /// Spatial layout
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Sector the domain covers
    pub fn sector(&self) -> Sector {
        self.geometry.sector()
    }

    /// Cell size in degrees
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.geometry.nrows()
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.geometry.ncols()
    }

    /// Number of cells (`nrows * ncols`)
    pub fn spatial_length(&self) -> usize {
        self.geometry.spatial_length()
    }

    /// Number of hourly timestamps
    pub fn temporal_length(&self) -> usize {
        self.times.len()
    }

    /// All timestamps in order
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// First timestamp
    pub fn start_date(&self) -> NaiveDateTime {
        self.times[0]
    }

    /// Timestamp of hour `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` unless `index < temporal_length()`.
    pub fn timestamp_at(&self, index: usize) -> Result<NaiveDateTime> {
        self.times
            .get(index)
            .copied()
            .ok_or_else(|| FiregroundError::out_of_range("time", index, self.times.len()))
    }

    /// Location of cell `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` unless `index < spatial_length()`.
    pub fn geo_point_at(&self, index: usize) -> Result<GeoPoint> {
        self.geometry.geo_point_at(index)
    }

    /// Location of cell `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a row or column outside the grid.
    pub fn geo_point_at_cell(&self, row: usize, col: usize) -> Result<GeoPoint> {
        self.geometry.geo_point_at_cell(row, col)
    }

    /// Flat index of `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a row or column outside the grid.
    pub fn index_of(&self, row: usize, col: usize) -> Result<usize> {
        self.geometry.index_of(row, col)
    }

    /// `(row, col)` of a flat index
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` unless `index < spatial_length()`.
    pub fn cell_of(&self, index: usize) -> Result<(usize, usize)> {
        self.geometry.cell_of(index)
    }

    /// Nearest cell to `point`, `None` outside the sector
    pub fn nearest_index(&self, point: GeoPoint) -> Option<usize> {
        self.geometry.nearest_index(point)
    }

    /// Nearest hour to `time`
    pub fn nearest_time_index(&self, time: NaiveDateTime) -> Option<usize> {
        time::nearest_time_index(&self.times, time)
    }

    /// Zero-filled spatial grid over this domain
    pub fn new_spatial_grid<T: Default + Clone>(&self) -> SpatialGrid<T> {
        SpatialGrid::filled(self.geometry, T::default())
    }

    /// Zero-filled spatial grid for every timestamp
    pub fn new_temporal_grid<T: Default + Clone>(&self) -> TemporalGrid<T> {
        let grids = self.times.iter().map(|_| self.new_spatial_grid()).collect();
        TemporalGrid::from_parts(self.times.clone(), grids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Timelike};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 4)
            .unwrap()
            .and_hms_opt(8, 37, 12)
            .unwrap()
    }

    #[test]
    fn test_grid_sizing_at_default_resolution() {
        let sector = Sector::new(34.0, -119.0, 34.05, -118.9);
        let domain = Domain::new(sector, start(), 1).unwrap();
        assert_eq!(domain.nrows(), (0.05_f64 / DEFAULT_RESOLUTION).floor() as usize);
        assert_eq!(domain.ncols(), (sector.width() / DEFAULT_RESOLUTION).floor() as usize);
        assert_eq!(domain.spatial_length(), domain.nrows() * domain.ncols());
    }

    #[test]
    fn test_time_grid_starts_at_cycle_hour() {
        let domain = Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start(), 2, 0.25).unwrap();
        assert_eq!(domain.temporal_length(), 48);
        let first = domain.start_date();
        assert_eq!(first.date(), start().date());
        assert_eq!((first.hour(), first.minute(), first.second()), (14, 0, 0));
        for w in domain.timestamps().windows(2) {
            assert_eq!(w[1] - w[0], Duration::hours(1));
        }
    }

    #[test]
    fn test_invalid_sectors_fail_fast() {
        let bad = [
            Sector::new(f64::NAN, 0.0, 1.0, 1.0),
            Sector::new(1.0, 0.0, 0.0, 1.0),
            Sector::new(0.0, 0.0, 0.0001, 1.0),
        ];
        for sector in bad {
            assert!(matches!(
                Domain::new(sector, start(), 2),
                Err(FiregroundError::InvalidSector { .. })
            ));
        }
        assert!(Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start(), 2, 0.0).is_err());
        assert!(Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start(), 0, 0.5).is_err());
    }

    #[test]
    fn test_index_bounds() {
        let domain = Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start(), 1, 0.25).unwrap();
        assert!(domain.timestamp_at(23).is_ok());
        assert!(matches!(
            domain.timestamp_at(24),
            Err(FiregroundError::IndexOutOfRange { axis: "time", .. })
        ));
        assert!(domain.geo_point_at(domain.spatial_length()).is_err());
    }

    #[test]
    fn test_allocated_grids_match_domain_shape() {
        let domain = Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 2.0), start(), 1, 0.5).unwrap();
        let spatial = domain.new_spatial_grid::<f64>();
        assert_eq!(spatial.len(), domain.spatial_length());
        assert!(spatial.values().iter().all(|v| *v == 0.0));
        let temporal = domain.new_temporal_grid::<f64>();
        assert_eq!(temporal.temporal_length(), domain.temporal_length());
        assert_eq!(temporal.geometry(), domain.geometry());
    }

    #[test]
    fn test_deserialized_domain_needs_hours() {
        let domain = Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start(), 1, 0.25).unwrap();
        let mut json = serde_json::to_value(&domain).unwrap();
        assert_eq!(serde_json::from_value::<Domain>(json.clone()).unwrap(), domain);
        json["times"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Domain>(json).is_err());
    }
}
