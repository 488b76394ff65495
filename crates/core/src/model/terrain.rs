//! Per-cell terrain from the terrain provider

use crate::core_types::geo::GeoPoint;
use crate::core_types::terrain::Terrain;
use crate::error::Result;
use crate::grid::{Domain, SpatialGrid};
use crate::model::memo::FieldModel;
use crate::providers::TerrainProvider;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Inputs of a derived terrain field
pub struct TerrainInputs {
    domain: Arc<Domain>,
    provider: Arc<dyn TerrainProvider>,
}

/// Slope, aspect and elevation for every cell of a domain
pub struct TerrainModel {
    field: FieldModel<TerrainInputs, SpatialGrid<Terrain>>,
}

impl TerrainModel {
    /// Terrain derived from `provider` over `domain`
    pub fn new(domain: Arc<Domain>, provider: Arc<dyn TerrainProvider>) -> Self {
        Self {
            field: FieldModel::derived("terrain", TerrainInputs { domain, provider }),
        }
    }

    /// Terrain from a pre-computed grid
    pub fn loaded(grid: SpatialGrid<Terrain>) -> Self {
        Self {
            field: FieldModel::loaded(grid),
        }
    }

    /// Domain of a derived model
    pub fn domain(&self) -> Option<&Arc<Domain>> {
        self.field.inputs().map(|i| &i.domain)
    }

    /// The terrain grid, computed on first use
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a previous computation panicked.
    pub fn data(&self) -> Result<Arc<SpatialGrid<Terrain>>> {
        self.field.data_with(compute)
    }

    /// Terrain of cell `index`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for a cell outside the grid.
    pub fn sample_at(&self, index: usize) -> Result<Terrain> {
        self.data()?.get(index).copied()
    }

    /// Terrain nearest to `point`, `None` outside the sector
    ///
    /// # Errors
    ///
    /// As [`TerrainModel::data`].
    pub fn value_at(&self, point: GeoPoint) -> Result<Option<Terrain>> {
        Ok(self.data()?.value_at(point).copied())
    }
}

fn compute(inputs: &TerrainInputs) -> Result<SpatialGrid<Terrain>> {
    let started = Instant::now();
    let geometry = *inputs.domain.geometry();
    let values: Vec<Terrain> = geometry
        .geo_points()
        .into_par_iter()
        .map(|point| match inputs.provider.terrain_at(point) {
            Ok(terrain) => terrain,
            Err(e) => {
                warn!("No terrain at {}: {}; storing invalid terrain", point, e);
                Terrain::INVALID
            }
        })
        .collect();
    info!(
        "Terrain computed for {} cells in {:.2?}",
        values.len(),
        started.elapsed()
    );
    SpatialGrid::from_values(geometry, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::geo::Sector;
    use crate::core_types::units::{Degrees, Meters};
    use crate::providers::ProviderError;
    use chrono::NaiveDate;

    /// Valid terrain in the western half only
    struct HalfCoverage;

    impl TerrainProvider for HalfCoverage {
        fn terrain_at(&self, point: GeoPoint) -> std::result::Result<Terrain, ProviderError> {
            if point.longitude <= 0.5 {
                Ok(Terrain::new(Degrees::new(10.0), Degrees::new(90.0), Meters::new(250.0)))
            } else {
                Err(ProviderError::NoData)
            }
        }
    }

    fn domain() -> Arc<Domain> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Arc::new(Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start, 1, 0.25).unwrap())
    }

    #[test]
    fn test_failed_lookups_store_invalid_terrain() {
        let domain = domain();
        let model = TerrainModel::new(Arc::clone(&domain), Arc::new(HalfCoverage));
        let grid = model.data().unwrap();
        assert_eq!(grid.len(), domain.spatial_length());
        let west = model.value_at(GeoPoint::new(0.5, 0.0)).unwrap().unwrap();
        assert_eq!(*west.elevation, 250.0);
        let east = model.value_at(GeoPoint::new(0.5, 1.0)).unwrap().unwrap();
        assert!(!east.is_valid());
        assert!(model.value_at(GeoPoint::new(2.0, 0.0)).unwrap().is_none());
    }

    #[test]
    fn test_loaded_terrain_has_no_domain() {
        let grid = domain().new_spatial_grid::<Terrain>();
        let model = TerrainModel::loaded(grid);
        assert!(model.domain().is_none());
        assert_eq!(model.sample_at(0).unwrap(), Terrain::default());
    }
}
