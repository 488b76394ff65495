//! Hourly fuel temperature and humidity next to the fuel
//!
//! Sun angles are computed once per hour from the domain's first sample
//! latitude and start date; every cell then combines them with its own
//! terrain and fuel bed depth.

use crate::core_types::fuel::{FuelModel, FuelTemperature};
use crate::core_types::geo::GeoPoint;
use crate::core_types::time::clock_hours;
use crate::error::Result;
use crate::grid::{Domain, SpatialGrid, TemporalGrid};
use crate::model::fuel_type::FuelTypeModel;
use crate::model::memo::FieldModel;
use crate::model::terrain::TerrainModel;
use crate::model::weather::WeatherModel;
use crate::physics::fuel_temperature::fuel_heating;
use crate::providers::SolarProvider;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Inputs of a derived fuel temperature field
pub struct FuelTemperatureInputs {
    domain: Arc<Domain>,
    terrain: Arc<TerrainModel>,
    fuels: Arc<FuelTypeModel>,
    weather: Arc<WeatherModel>,
    solar: Arc<dyn SolarProvider>,
}

/// Fuel temperature, near-fuel humidity and elevation per cell and hour
pub struct FuelTemperatureModel {
    field: FieldModel<FuelTemperatureInputs, TemporalGrid<FuelTemperature>>,
}

impl FuelTemperatureModel {
    /// Fuel temperatures derived from terrain, fuels and hourly weather
    pub fn new(
        domain: Arc<Domain>,
        terrain: Arc<TerrainModel>,
        fuels: Arc<FuelTypeModel>,
        weather: Arc<WeatherModel>,
        solar: Arc<dyn SolarProvider>,
    ) -> Self {
        Self {
            field: FieldModel::derived(
                "fuel temperature",
                FuelTemperatureInputs {
                    domain,
                    terrain,
                    fuels,
                    weather,
                    solar,
                },
            ),
        }
    }

    /// Fuel temperatures from a pre-computed field
    pub fn loaded(field: TemporalGrid<FuelTemperature>) -> Self {
        Self {
            field: FieldModel::loaded(field),
        }
    }

    /// Domain of a derived model
    pub fn domain(&self) -> Option<&Arc<Domain>> {
        self.field.inputs().map(|i| &i.domain)
    }

    /// The hourly field, computed on first use
    ///
    /// # Errors
    ///
    /// Propagates failures of the upstream terrain, fuel type and weather
    /// models.
    pub fn data(&self) -> Result<Arc<TemporalGrid<FuelTemperature>>> {
        self.field.data_with(compute)
    }

    /// Sample at `(time_index, cell_index)`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if either index is out of range.
    pub fn sample_at(&self, time_index: usize, cell_index: usize) -> Result<FuelTemperature> {
        self.data()?.sample(time_index, cell_index).copied()
    }

    /// Nearest hour and cell, `None` outside the sector
    ///
    /// # Errors
    ///
    /// As [`FuelTemperatureModel::data`].
    pub fn value_at(&self, time: NaiveDateTime, point: GeoPoint) -> Result<Option<FuelTemperature>> {
        Ok(self.data()?.value_at(time, point).copied())
    }
}

fn compute(inputs: &FuelTemperatureInputs) -> Result<TemporalGrid<FuelTemperature>> {
    let started = Instant::now();
    let domain = &inputs.domain;
    let geometry = *domain.geometry();
    let terrain = inputs.terrain.data()?;
    terrain.geometry().ensure_matches("terrain", &geometry)?;
    let fuels = inputs.fuels.data()?;
    fuels.geometry().ensure_matches("fuel types", &geometry)?;
    let fuel_models: Vec<FuelModel> = fuels
        .values()
        .iter()
        .map(|code| FuelModel::from_code_or_invalid(*code))
        .collect();

    let latitude = domain.geo_point_at(0)?.latitude;
    let date = domain.start_date().date();

    let mut grids = Vec::with_capacity(domain.temporal_length());
    for (t, time) in domain.timestamps().iter().enumerate() {
        let wx = inputs.weather.weather_at(t)?;
        let sun = inputs.solar.sun_position(latitude, date, clock_hours(*time));
        debug!(
            "Fuel temperatures for {}: sun altitude {}, azimuth {}",
            time, sun.altitude, sun.azimuth
        );
        let values: Vec<FuelTemperature> = terrain
            .values()
            .par_iter()
            .zip(fuel_models.par_iter())
            .map(|(cell_terrain, fuel)| fuel_heating(&sun, cell_terrain, fuel, &wx))
            .collect();
        grids.push(SpatialGrid::from_values(geometry, values)?);
    }
    info!(
        "Fuel temperatures computed for {} hours x {} cells in {:.2?}",
        grids.len(),
        geometry.spatial_length(),
        started.elapsed()
    );
    TemporalGrid::from_grids(domain.timestamps().to_vec(), grids)
}
