//! Row/column layout of a sector and the flat cell index scheme
//!
//! Cells are stored column-major: `index = col * nrows + row`. Row 0 is the
//! southern edge, column 0 the western edge, and the last row/column sit
//! exactly on the northern/eastern bounds.

use crate::core_types::geo::{GeoPoint, Sector};
use crate::error::{FiregroundError, Result};
use serde::{Deserialize, Serialize};

/// Sample layout of a rectangular grid over a sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridGeometryData")]
pub struct GridGeometry {
    sector: Sector,
    nrows: usize,
    ncols: usize,
}

/// Serialized form of [`GridGeometry`], validated on the way in
#[derive(Deserialize)]
struct GridGeometryData {
    sector: Sector,
    nrows: usize,
    ncols: usize,
}

impl TryFrom<GridGeometryData> for GridGeometry {
    type Error = FiregroundError;

    fn try_from(data: GridGeometryData) -> Result<Self> {
        Self::new(data.sector, data.nrows, data.ncols)
    }
}

impl GridGeometry {
    /// Create a layout with `nrows` x `ncols` samples
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either dimension is zero.
    pub fn new(sector: Sector, nrows: usize, ncols: usize) -> Result<Self> {
        if nrows == 0 || ncols == 0 {
            return Err(FiregroundError::InvalidArgument {
                name: "shape",
                value: format!("{nrows}x{ncols}"),
                reason: "a grid needs at least one row and one column".into(),
            });
        }
        Ok(Self {
            sector,
            nrows,
            ncols,
        })
    }

    /// A single sample standing in for the whole sector
    pub fn single(sector: Sector) -> Self {
        Self {
            sector,
            nrows: 1,
            ncols: 1,
        }
    }

    /// Sector the grid spans
    pub fn sector(&self) -> Sector {
        self.sector
    }

    /// Number of rows (latitude samples)
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns (longitude samples)
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Total number of cells
    pub fn spatial_length(&self) -> usize {
        self.nrows * self.ncols
    }

    /// Latitude spacing between rows (0 for a single row)
    pub fn lat_step(&self) -> f64 {
        if self.nrows > 1 {
            self.sector.height() / (self.nrows - 1) as f64
        } else {
            0.0
        }
    }

    /// Longitude spacing between columns (0 for a single column)
    pub fn lon_step(&self) -> f64 {
        if self.ncols > 1 {
            self.sector.width() / (self.ncols - 1) as f64
        } else {
            0.0
        }
    }

    /// Flat index of `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a row or column outside the grid.
    pub fn index_of(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.nrows {
            return Err(FiregroundError::out_of_range("row", row, self.nrows));
        }
        if col >= self.ncols {
            return Err(FiregroundError::out_of_range("column", col, self.ncols));
        }
        Ok(col * self.nrows + row)
    }

    /// `(row, col)` of a flat index
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` unless `index < spatial_length()`.
    pub fn cell_of(&self, index: usize) -> Result<(usize, usize)> {
        self.check_index(index)?;
        Ok((index % self.nrows, index / self.nrows))
    }

    /// Location of the sample at a flat index
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` unless `index < spatial_length()`.
    pub fn geo_point_at(&self, index: usize) -> Result<GeoPoint> {
        let (row, col) = self.cell_of(index)?;
        Ok(self.point_unchecked(row, col))
    }

    /// Location of the sample at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a row or column outside the grid.
    pub fn geo_point_at_cell(&self, row: usize, col: usize) -> Result<GeoPoint> {
        self.index_of(row, col)?;
        Ok(self.point_unchecked(row, col))
    }

    /// Flat index of the sample nearest to `point`
    ///
    /// Returns `None` when the point lies outside the sector.
    pub fn nearest_index(&self, point: GeoPoint) -> Option<usize> {
        if !self.sector.contains(point) {
            return None;
        }
        let row = nearest_step(point.latitude - self.sector.south(), self.lat_step(), self.nrows);
        let col = nearest_step(point.longitude - self.sector.west(), self.lon_step(), self.ncols);
        Some(col * self.nrows + row)
    }

    /// Every sample location in flat index order
    pub fn geo_points(&self) -> Vec<GeoPoint> {
        let mut points = Vec::with_capacity(self.spatial_length());
        for col in 0..self.ncols {
            for row in 0..self.nrows {
                points.push(self.point_unchecked(row, col));
            }
        }
        points
    }

    /// Fails unless `self` is the `expected` layout
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming `what` on a layout mismatch.
    pub fn ensure_matches(&self, what: &'static str, expected: &GridGeometry) -> Result<()> {
        if self == expected {
            return Ok(());
        }
        Err(FiregroundError::InvalidArgument {
            name: what,
            value: format!("{}x{}", self.nrows, self.ncols),
            reason: format!(
                "grid does not match the {}x{} layout over {}",
                expected.nrows, expected.ncols, expected.sector
            ),
        })
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.spatial_length() {
            Ok(())
        } else {
            Err(FiregroundError::out_of_range("cell", index, self.spatial_length()))
        }
    }

    fn point_unchecked(&self, row: usize, col: usize) -> GeoPoint {
        GeoPoint::new(
            self.sector.south() + row as f64 * self.lat_step(),
            self.sector.west() + col as f64 * self.lon_step(),
        )
    }
}

fn nearest_step(offset: f64, step: f64, count: usize) -> usize {
    if step <= 0.0 {
        return 0;
    }
    let i = (offset / step).round();
    if i <= 0.0 {
        0
    } else {
        (i as usize).min(count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn geometry() -> GridGeometry {
        GridGeometry::new(Sector::new(10.0, 20.0, 11.0, 22.0), 5, 3).unwrap()
    }

    #[test]
    fn test_column_major_index() {
        let g = geometry();
        assert_eq!(g.index_of(0, 0).unwrap(), 0);
        assert_eq!(g.index_of(4, 0).unwrap(), 4);
        assert_eq!(g.index_of(0, 1).unwrap(), 5);
        assert_eq!(g.index_of(2, 2).unwrap(), 12);
        assert_eq!(g.cell_of(12).unwrap(), (2, 2));
        assert!(g.index_of(5, 0).is_err());
        assert!(g.cell_of(15).is_err());
    }

    #[test]
    fn test_sample_positions_span_bounds() {
        let g = geometry();
        let sw = g.geo_point_at(0).unwrap();
        let ne = g.geo_point_at(g.spatial_length() - 1).unwrap();
        assert_relative_eq!(sw.latitude, 10.0);
        assert_relative_eq!(sw.longitude, 20.0);
        assert_relative_eq!(ne.latitude, 11.0);
        assert_relative_eq!(ne.longitude, 22.0);
        let p = g.geo_point_at_cell(1, 1).unwrap();
        assert_relative_eq!(p.latitude, 10.25);
        assert_relative_eq!(p.longitude, 21.0);
    }

    #[test]
    fn test_nearest_index() {
        let g = geometry();
        assert_eq!(g.nearest_index(GeoPoint::new(10.26, 20.9)), Some(g.index_of(1, 1).unwrap()));
        assert_eq!(g.nearest_index(GeoPoint::new(11.0, 22.0)), Some(14));
        assert_eq!(g.nearest_index(GeoPoint::new(9.0, 21.0)), None);
    }

    #[test]
    fn test_single_sample_grid() {
        let g = GridGeometry::single(Sector::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(g.lat_step(), 0.0);
        assert_eq!(g.nearest_index(GeoPoint::new(0.9, 0.9)), Some(0));
        assert_eq!(g.geo_points().len(), 1);
    }

    #[test]
    fn test_layout_mismatch_is_named() {
        let g = geometry();
        assert!(g.ensure_matches("terrain", &geometry()).is_ok());
        let other = GridGeometry::new(g.sector(), 2, 2).unwrap();
        match other.ensure_matches("terrain", &g) {
            Err(FiregroundError::InvalidArgument { name, value, .. }) => {
                assert_eq!(name, "terrain");
                assert_eq!(value, "2x2");
            }
            result => panic!("expected a layout error, got {result:?}"),
        }
    }

    #[test]
    fn test_deserialized_layout_needs_cells() {
        let json = serde_json::to_string(&geometry()).unwrap();
        assert_eq!(serde_json::from_str::<GridGeometry>(&json).unwrap(), geometry());
        let empty = json.replace("\"nrows\":5", "\"nrows\":0");
        assert!(serde_json::from_str::<GridGeometry>(&empty).is_err());
    }
}
