//! Hourly fire behavior from the fire behavior provider
//!
//! Each cell's fuel model, fuel temperature, fuel moisture and terrain are
//! combined with the hour's weather and handed to the provider. Cells the
//! provider cannot answer for hold [`FireBehaviorPair::INVALID`], as do
//! cells without burnable fuel or valid terrain, which never reach it.

use crate::core_types::behavior::FireBehaviorPair;
use crate::core_types::fuel::{FuelCondition, FuelModel};
use crate::core_types::geo::GeoPoint;
use crate::error::Result;
use crate::grid::{Domain, SpatialGrid, TemporalGrid};
use crate::model::fuel_moisture::FuelMoistureModel;
use crate::model::fuel_temperature::FuelTemperatureModel;
use crate::model::fuel_type::FuelTypeModel;
use crate::model::memo::FieldModel;
use crate::model::terrain::TerrainModel;
use crate::model::weather::WeatherModel;
use crate::providers::FireBehaviorProvider;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Upstream models feeding the fire behavior computation
#[derive(Clone)]
pub struct FireBehaviorUpstream {
    /// Per-cell terrain
    pub terrain: Arc<TerrainModel>,
    /// Per-cell fuel codes
    pub fuels: Arc<FuelTypeModel>,
    /// Hourly fuel temperatures
    pub fuel_temperatures: Arc<FuelTemperatureModel>,
    /// Hourly fuel moisture
    pub fuel_moistures: Arc<FuelMoistureModel>,
    /// Hourly weather
    pub weather: Arc<WeatherModel>,
}

/// Inputs of a derived fire behavior field
pub struct FireBehaviorInputs {
    domain: Arc<Domain>,
    upstream: FireBehaviorUpstream,
    provider: Arc<dyn FireBehaviorProvider>,
}

/// Fire behavior with and without wind per cell and hour
pub struct FireBehaviorModel {
    field: FieldModel<FireBehaviorInputs, TemporalGrid<FireBehaviorPair>>,
}

impl FireBehaviorModel {
    /// Fire behavior derived through `provider`
    pub fn new(
        domain: Arc<Domain>,
        upstream: FireBehaviorUpstream,
        provider: Arc<dyn FireBehaviorProvider>,
    ) -> Self {
        Self {
            field: FieldModel::derived(
                "fire behavior",
                FireBehaviorInputs {
                    domain,
                    upstream,
                    provider,
                },
            ),
        }
    }

    /// Fire behavior from a pre-computed field
    pub fn loaded(field: TemporalGrid<FireBehaviorPair>) -> Self {
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
    /// Propagates failures of the upstream models.
    pub fn data(&self) -> Result<Arc<TemporalGrid<FireBehaviorPair>>> {
        self.field.data_with(compute)
    }

    /// Sample at `(time_index, cell_index)`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if either index is out of range.
    pub fn sample_at(&self, time_index: usize, cell_index: usize) -> Result<FireBehaviorPair> {
        self.data()?.sample(time_index, cell_index).copied()
    }

    /// Nearest hour and cell, `None` outside the sector
    ///
    /// # Errors
    ///
    /// As [`FireBehaviorModel::data`].
    pub fn value_at(&self, time: NaiveDateTime, point: GeoPoint) -> Result<Option<FireBehaviorPair>> {
        Ok(self.data()?.value_at(time, point).copied())
    }
}

fn compute(inputs: &FireBehaviorInputs) -> Result<TemporalGrid<FireBehaviorPair>> {
    let started = Instant::now();
    let domain = &inputs.domain;
    let geometry = *domain.geometry();
    let up = &inputs.upstream;
    let terrain = up.terrain.data()?;
    terrain.geometry().ensure_matches("terrain", &geometry)?;
    let fuels = up.fuels.data()?;
    fuels.geometry().ensure_matches("fuel types", &geometry)?;
    let fuels = fuels.map(|code| FuelModel::from_code_or_invalid(*code));
    let temps = up.fuel_temperatures.data()?;
    temps.ensure_covers("fuel temperatures", &geometry, domain.timestamps())?;
    let moistures = up.fuel_moistures.data()?;
    moistures
        .dead_1h
        .ensure_covers("fuel moistures", &geometry, domain.timestamps())?;

    let mut grids = Vec::with_capacity(domain.temporal_length());
    for (t, time) in domain.timestamps().iter().enumerate() {
        let wx = up.weather.weather_at(t)?;
        let hour_temps = temps.grid(t)?;
        let values = (0..geometry.spatial_length())
            .into_par_iter()
            .map(|cell| -> Result<FireBehaviorPair> {
                let fuel = fuels.get(cell)?;
                let cell_terrain = terrain.get(cell)?;
                if !fuel.is_burnable() || !cell_terrain.is_valid() {
                    return Ok(FireBehaviorPair::INVALID);
                }
                let condition = FuelCondition {
                    air_temperature: wx.air_temperature,
                    fuel_temperature: hour_temps.get(cell)?.fuel_temperature,
                    fuel_moisture: moistures.sample(t, cell)?,
                };
                Ok(
                    match inputs
                        .provider
                        .compute_fire_behavior(fuel, &condition, &wx, cell_terrain)
                    {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(
                                "No fire behavior for cell {} at {}: {}; storing invalid behavior",
                                cell, time, e
                            );
                            FireBehaviorPair::INVALID
                        }
                    },
                )
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Fire behavior computed for {}", time);
        grids.push(SpatialGrid::from_values(geometry, values)?);
    }
    info!(
        "Fire behavior computed for {} hours x {} cells in {:.2?}",
        grids.len(),
        geometry.spatial_length(),
        started.elapsed()
    );
    TemporalGrid::from_grids(domain.timestamps().to_vec(), grids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::behavior::FireBehavior;
    use crate::core_types::fuel::{FuelMoistureScenario, FuelTemperature};
    use crate::core_types::geo::Sector;
    use crate::core_types::terrain::Terrain;
    use crate::core_types::units::{Celsius, Degrees, Meters, Percent};
    use crate::core_types::weather::{TimeSeries, Weather};
    use crate::error::FiregroundError;
    use crate::providers::ProviderError;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports the hour's air temperature as intensity; fails on steep slopes
    #[derive(Default)]
    struct EchoBehavior {
        calls: AtomicUsize,
    }

    impl FireBehaviorProvider for EchoBehavior {
        fn compute_fire_behavior(
            &self,
            _fuel_model: &FuelModel,
            condition: &FuelCondition,
            _weather: &Weather,
            terrain: &Terrain,
        ) -> std::result::Result<FireBehaviorPair, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *terrain.slope > 45.0 {
                return Err(ProviderError::Failed("too steep".into()));
            }
            let behavior = FireBehavior::new(*condition.air_temperature, 1.0, 0.1, 90.0, 50.0);
            Ok(FireBehaviorPair {
                with_wind: behavior,
                no_wind: behavior,
            })
        }
    }

    fn domain(resolution: f64) -> Arc<Domain> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Arc::new(Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start, 1, resolution).unwrap())
    }

    /// 2x2 cells: flat, invalid terrain, flat, steep
    fn upstream(domain: &Arc<Domain>, fuels: SpatialGrid<i32>) -> FireBehaviorUpstream {
        let flat = Terrain::flat(Meters::new(100.0));
        let steep = Terrain::new(Degrees::new(60.0), Degrees::new(180.0), Meters::new(100.0));
        let terrain =
            SpatialGrid::from_values(*domain.geometry(), vec![flat, Terrain::INVALID, flat, steep])
                .unwrap();
        let hours = domain
            .timestamps()
            .iter()
            .enumerate()
            .map(|(t, _)| Weather {
                air_temperature: Celsius::new(10.0 + t as f64),
                ..Weather::default()
            })
            .collect();
        let weather = Arc::new(WeatherModel::loaded(
            TimeSeries::new(domain.timestamps().to_vec(), hours).unwrap(),
        ));
        let warm = FuelTemperature {
            fuel_temperature: Celsius::new(30.0),
            relative_humidity: Percent::new(25.0),
            elevation: Meters::new(100.0),
        };
        let fuel_temperatures = Arc::new(FuelTemperatureModel::loaded(
            domain.new_temporal_grid::<FuelTemperature>().map(|_| warm),
        ));
        let fuel_moistures = Arc::new(FuelMoistureModel::new(
            Arc::clone(domain),
            Arc::clone(&fuel_temperatures),
            Arc::clone(&weather),
            FuelMoistureScenario::default(),
        ));
        FireBehaviorUpstream {
            terrain: Arc::new(TerrainModel::loaded(terrain)),
            fuels: Arc::new(FuelTypeModel::loaded(fuels)),
            fuel_temperatures,
            fuel_moistures,
            weather,
        }
    }

    fn fuels(domain: &Domain, codes: Vec<i32>) -> SpatialGrid<i32> {
        SpatialGrid::from_values(*domain.geometry(), codes).unwrap()
    }

    fn domain_fuels_at(resolution: f64) -> SpatialGrid<i32> {
        domain(resolution).new_spatial_grid::<i32>().map(|_| 1)
    }

    #[test]
    fn test_only_burnable_cells_on_valid_terrain_reach_the_provider() {
        let domain = domain(0.5);
        let provider = Arc::new(EchoBehavior::default());
        let up = upstream(&domain, fuels(&domain, vec![1, 1, 99, 1]));
        let model = FireBehaviorModel::new(Arc::clone(&domain), up, provider.clone());
        let data = model.data().unwrap();
        assert_eq!(data.temporal_length(), 24);

        // Cells 0 and 3 each hour; 1 has invalid terrain, 2 cannot burn
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2 * 24);
        for t in 0..24 {
            let pair = data.sample(t, 0).unwrap();
            assert_eq!(pair.with_wind.fireline_intensity, 10.0 + t as f64);
            assert_eq!(pair.no_wind, pair.with_wind);
            for cell in 1..4 {
                let pair = data.sample(t, cell).unwrap();
                assert!(!pair.with_wind.is_valid());
                assert!(!pair.no_wind.is_valid());
            }
        }
    }

    #[test]
    fn test_fuel_types_on_another_grid_are_rejected() {
        let domain = domain(0.5);
        let coarse = domain_fuels_at(1.0);
        let up = upstream(&domain, coarse);
        let provider = Arc::new(EchoBehavior::default());
        let model = FireBehaviorModel::new(Arc::clone(&domain), up, provider.clone());
        assert!(matches!(
            model.data(),
            Err(FiregroundError::InvalidArgument {
                name: "fuel types",
                ..
            })
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_loaded_behavior_has_no_domain() {
        let domain = domain(0.5);
        let field = domain
            .new_temporal_grid::<FireBehaviorPair>()
            .map(|_| FireBehaviorPair::INVALID);
        let model = FireBehaviorModel::loaded(field);
        assert!(model.domain().is_none());
        assert!(!model.sample_at(3, 2).unwrap().with_wind.is_valid());
        assert!(model.sample_at(24, 0).is_err());
        assert!(model
            .value_at(domain.start_date(), GeoPoint::new(5.0, 5.0))
            .unwrap()
            .is_none());
    }
}
