//! Spatial grids and hour-indexed sequences of spatial grids

use crate::core_types::geo::GeoPoint;
use crate::core_types::time::nearest_time_index;
use crate::error::{FiregroundError, Result};
use crate::grid::geometry::GridGeometry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One value per cell of a [`GridGeometry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "SpatialGridData<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct SpatialGrid<T> {
    geometry: GridGeometry,
    values: Vec<T>,
}

#[derive(Deserialize)]
struct SpatialGridData<T> {
    geometry: GridGeometry,
    values: Vec<T>,
}

impl<T> TryFrom<SpatialGridData<T>> for SpatialGrid<T> {
    type Error = FiregroundError;

    fn try_from(data: SpatialGridData<T>) -> Result<Self> {
        Self::from_values(data.geometry, data.values)
    }
}

impl<T> SpatialGrid<T> {
    /// Wrap values laid out in flat index order
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless there is exactly one value per cell.
    pub fn from_values(geometry: GridGeometry, values: Vec<T>) -> Result<Self> {
        if values.len() != geometry.spatial_length() {
            return Err(FiregroundError::InvalidArgument {
                name: "values",
                value: values.len().to_string(),
                reason: format!("grid has {} cells", geometry.spatial_length()),
            });
        }
        Ok(Self { geometry, values })
    }

    /// Layout of the grid
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a grid without cells (never produced by a domain)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in flat index order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Value at a flat index
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an index outside the grid.
    pub fn get(&self, index: usize) -> Result<&T> {
        self.values
            .get(index)
            .ok_or_else(|| FiregroundError::out_of_range("cell", index, self.values.len()))
    }

    /// Value of the sample nearest to `point`, `None` outside the sector
    pub fn value_at(&self, point: GeoPoint) -> Option<&T> {
        self.geometry
            .nearest_index(point)
            .and_then(|i| self.values.get(i))
    }

    /// Apply `f` to every cell, keeping the layout
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> SpatialGrid<U> {
        SpatialGrid {
            geometry: self.geometry,
            values: self.values.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> SpatialGrid<T> {
    /// Grid with every cell set to `value`
    pub fn filled(geometry: GridGeometry, value: T) -> Self {
        Self {
            values: vec![value; geometry.spatial_length()],
            geometry,
        }
    }
}

/// Spatial grids indexed by hour of simulation
///
/// Always holds at least one hour, and every hour shares one layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "TemporalGridData<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct TemporalGrid<T> {
    times: Vec<NaiveDateTime>,
    grids: Vec<SpatialGrid<T>>,
}

#[derive(Deserialize)]
struct TemporalGridData<T> {
    times: Vec<NaiveDateTime>,
    grids: Vec<SpatialGrid<T>>,
}

impl<T> TryFrom<TemporalGridData<T>> for TemporalGrid<T> {
    type Error = FiregroundError;

    fn try_from(data: TemporalGridData<T>) -> Result<Self> {
        Self::from_grids(data.times, data.grids)
    }
}

impl<T> TemporalGrid<T> {
    /// Pair each timestamp with its spatial grid
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the counts differ, there are no
    /// samples, or the grids do not share one layout.
    pub fn from_grids(times: Vec<NaiveDateTime>, grids: Vec<SpatialGrid<T>>) -> Result<Self> {
        if times.len() != grids.len() || grids.is_empty() {
            return Err(FiregroundError::InvalidArgument {
                name: "grids",
                value: grids.len().to_string(),
                reason: format!("expected one grid per timestamp ({})", times.len()),
            });
        }
        let geometry = grids[0].geometry;
        if grids.iter().any(|g| g.geometry != geometry) {
            return Err(FiregroundError::InvalidArgument {
                name: "grids",
                value: grids.len().to_string(),
                reason: "all hours must share one grid layout".into(),
            });
        }
        Ok(Self { times, grids })
    }

    /// Pair grids with timestamps already known to match
    pub(crate) fn from_parts(times: Vec<NaiveDateTime>, grids: Vec<SpatialGrid<T>>) -> Self {
        debug_assert!(!grids.is_empty() && times.len() == grids.len());
        Self { times, grids }
    }

    /// Timestamps of the hourly samples
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Number of hourly samples
    pub fn temporal_length(&self) -> usize {
        self.grids.len()
    }

    /// Shared layout of every hour
    pub fn geometry(&self) -> &GridGeometry {
        &self.grids[0].geometry
    }

    /// Fails unless the field has `times.len()` hours over `geometry`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming `what` on a mismatch.
    pub fn ensure_covers(
        &self,
        what: &'static str,
        geometry: &GridGeometry,
        times: &[NaiveDateTime],
    ) -> Result<()> {
        if self.temporal_length() != times.len() {
            return Err(FiregroundError::InvalidArgument {
                name: what,
                value: format!("{} hours", self.temporal_length()),
                reason: format!("domain has {} hours", times.len()),
            });
        }
        self.geometry().ensure_matches(what, geometry)
    }

    /// All hourly grids in time order
    pub fn grids(&self) -> &[SpatialGrid<T>] {
        &self.grids
    }

    /// Spatial grid of hour `time_index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an hour outside the sequence.
    pub fn grid(&self, time_index: usize) -> Result<&SpatialGrid<T>> {
        self.grids
            .get(time_index)
            .ok_or_else(|| FiregroundError::out_of_range("time", time_index, self.grids.len()))
    }

    /// Value at `(time_index, cell_index)`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if either index is out of range.
    pub fn sample(&self, time_index: usize, cell_index: usize) -> Result<&T> {
        self.grid(time_index)?.get(cell_index)
    }

    /// Nearest hour, then nearest cell; `None` outside the sector
    pub fn value_at(&self, time: NaiveDateTime, point: GeoPoint) -> Option<&T> {
        let t = nearest_time_index(&self.times, time)?;
        self.grids[t].value_at(point)
    }

    /// Apply `f` to every sample of every hour
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> TemporalGrid<U> {
        TemporalGrid {
            times: self.times.clone(),
            grids: self.grids.iter().map(|g| g.map(&mut f)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::geo::Sector;
    use crate::core_types::time::hourly_steps;
    use chrono::NaiveDate;

    fn geometry() -> GridGeometry {
        GridGeometry::new(Sector::new(0.0, 0.0, 1.0, 1.0), 3, 2).unwrap()
    }

    fn times(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        hourly_steps(start, n)
    }

    #[test]
    fn test_spatial_grid_shape_is_checked() {
        assert!(SpatialGrid::from_values(geometry(), vec![0.0; 5]).is_err());
        let grid = SpatialGrid::from_values(geometry(), (0..6).collect()).unwrap();
        assert_eq!(*grid.get(4).unwrap(), 4);
        assert!(grid.get(6).is_err());
        assert_eq!(grid.value_at(GeoPoint::new(1.0, 1.0)), Some(&5));
        assert_eq!(grid.value_at(GeoPoint::new(2.0, 1.0)), None);
    }

    #[test]
    fn test_temporal_grid_lookup() {
        let t = times(3);
        let grids = (0..3)
            .map(|h| SpatialGrid::filled(geometry(), h * 10))
            .collect();
        let field = TemporalGrid::from_grids(t.clone(), grids).unwrap();
        assert_eq!(field.temporal_length(), 3);
        assert_eq!(*field.sample(2, 5).unwrap(), 20);
        assert!(field.sample(3, 0).is_err());
        assert_eq!(field.value_at(t[1], GeoPoint::new(0.5, 0.5)), Some(&10));
    }

    #[test]
    fn test_temporal_grid_rejects_mixed_layouts() {
        let other = GridGeometry::new(Sector::new(0.0, 0.0, 1.0, 1.0), 2, 2).unwrap();
        let grids = vec![SpatialGrid::filled(geometry(), 0), SpatialGrid::filled(other, 0)];
        assert!(TemporalGrid::from_grids(times(2), grids).is_err());
    }

    #[test]
    fn test_deserialized_fields_keep_their_shape() {
        let field = TemporalGrid::from_grids(times(2), vec![SpatialGrid::filled(geometry(), 1); 2])
            .unwrap();
        let mut json = serde_json::to_value(&field).unwrap();
        assert_eq!(serde_json::from_value::<TemporalGrid<i32>>(json.clone()).unwrap(), field);

        json["grids"][1]["values"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<TemporalGrid<i32>>(json.clone()).is_err());

        json["times"] = serde_json::json!([]);
        json["grids"] = serde_json::json!([]);
        assert!(serde_json::from_value::<TemporalGrid<i32>>(json).is_err());
    }

    #[test]
    fn test_coverage_of_a_domain_layout() {
        let t = times(3);
        let field = TemporalGrid::from_grids(t.clone(), vec![SpatialGrid::filled(geometry(), 0); 3])
            .unwrap();
        assert!(field.ensure_covers("field", &geometry(), &t).is_ok());
        assert!(field.ensure_covers("field", &geometry(), &t[..2]).is_err());
        let other = GridGeometry::new(Sector::new(0.0, 0.0, 1.0, 1.0), 2, 2).unwrap();
        assert!(field.ensure_covers("field", &other, &t).is_err());
    }
}
