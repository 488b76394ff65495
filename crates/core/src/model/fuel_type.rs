//! Per-cell fuel model codes from the fuel classification provider

use crate::core_types::fuel::FuelModel;
use crate::core_types::geo::GeoPoint;
use crate::error::Result;
use crate::grid::{Domain, SpatialGrid};
use crate::model::memo::FieldModel;
use crate::providers::FuelModelProvider;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Inputs of a derived fuel type field
pub struct FuelTypeInputs {
    domain: Arc<Domain>,
    provider: Arc<dyn FuelModelProvider>,
}

/// Fuel model code for every cell of a domain
///
/// Cells without a classification hold [`FuelModel::INVALID_CODE`].
pub struct FuelTypeModel {
    field: FieldModel<FuelTypeInputs, SpatialGrid<i32>>,
}

impl FuelTypeModel {
    /// Fuel codes derived from `provider` over `domain`
    pub fn new(domain: Arc<Domain>, provider: Arc<dyn FuelModelProvider>) -> Self {
        Self {
            field: FieldModel::derived("fuel type", FuelTypeInputs { domain, provider }),
        }
    }

    /// Fuel codes from a pre-computed grid
    pub fn loaded(grid: SpatialGrid<i32>) -> Self {
        Self {
            field: FieldModel::loaded(grid),
        }
    }

    /// Domain of a derived model
    pub fn domain(&self) -> Option<&Arc<Domain>> {
        self.field.inputs().map(|i| &i.domain)
    }

    /// The fuel code grid, computed on first use
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a previous computation panicked.
    pub fn data(&self) -> Result<Arc<SpatialGrid<i32>>> {
        self.field.data_with(compute)
    }

    /// Fuel code of cell `index`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for a cell outside the grid.
    pub fn sample_at(&self, index: usize) -> Result<i32> {
        self.data()?.get(index).copied()
    }

    /// Catalogue fuel model of cell `index` (`INVALID` for unknown codes)
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for a cell outside the grid.
    pub fn fuel_model_at(&self, index: usize) -> Result<FuelModel> {
        self.sample_at(index).map(FuelModel::from_code_or_invalid)
    }

    /// Fuel model nearest to `point`, `None` outside the sector
    ///
    /// # Errors
    ///
    /// As [`FuelTypeModel::data`].
    pub fn value_at(&self, point: GeoPoint) -> Result<Option<FuelModel>> {
        Ok(self
            .data()?
            .value_at(point)
            .map(|code| FuelModel::from_code_or_invalid(*code)))
    }
}

fn compute(inputs: &FuelTypeInputs) -> Result<SpatialGrid<i32>> {
    let started = Instant::now();
    let geometry = *inputs.domain.geometry();
    let values: Vec<i32> = geometry
        .geo_points()
        .into_par_iter()
        .map(|point| match inputs.provider.fuel_model_at(point) {
            Ok(code) => code,
            Err(e) => {
                warn!("No fuel model at {}: {}; using the invalid fuel model", point, e);
                FuelModel::INVALID_CODE
            }
        })
        .collect();
    info!(
        "Fuel types computed for {} cells in {:.2?}",
        values.len(),
        started.elapsed()
    );
    SpatialGrid::from_values(geometry, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::geo::Sector;
    use crate::providers::ProviderError;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Short grass north of 0.5°, nothing south of it; counts calls
    #[derive(Default)]
    struct CountingFuels {
        calls: AtomicUsize,
    }

    impl FuelModelProvider for CountingFuels {
        fn fuel_model_at(&self, point: GeoPoint) -> std::result::Result<i32, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if point.latitude >= 0.5 {
                Ok(1)
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
    fn test_missing_fuel_becomes_invalid_code() {
        let model = FuelTypeModel::new(domain(), Arc::new(CountingFuels::default()));
        let north = model.value_at(GeoPoint::new(1.0, 0.5)).unwrap().unwrap();
        assert_eq!(north.code, 1);
        assert_eq!(model.sample_at(0).unwrap(), FuelModel::INVALID_CODE);
        assert!(!model.fuel_model_at(0).unwrap().is_burnable());
    }

    #[test]
    fn test_data_is_memoized() {
        let provider = Arc::new(CountingFuels::default());
        let domain = domain();
        let model = FuelTypeModel::new(Arc::clone(&domain), Arc::clone(&provider) as Arc<dyn FuelModelProvider>);
        let first = model.data().unwrap();
        let second = model.data().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.load(Ordering::SeqCst), domain.spatial_length());
    }
}
