//! Hourly moisture of the five fuel classes
//!
//! Dead 1-hr moisture follows the recursive hourly algorithm per cell.
//! The 10-hr, 100-hr and live components hold the scenario values on a
//! single sample spanning the sector, repeated for every hour.

use crate::core_types::fuel::{FuelMoisture, FuelMoistureScenario};
use crate::core_types::geo::GeoPoint;
use crate::core_types::time::clock_hours;
use crate::core_types::units::Percent;
use crate::error::Result;
use crate::grid::{Domain, GridGeometry, SpatialGrid, TemporalGrid};
use crate::model::fuel_temperature::FuelTemperatureModel;
use crate::model::memo::FieldModel;
use crate::model::weather::WeatherModel;
use crate::physics::fuel_moisture::{DeadFineFuelMoisture, FineFuelWeather};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// One of the five fuel size/life classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoistureClass {
    /// Dead 1-hr timelag
    Dead1h,
    /// Dead 10-hr timelag
    Dead10h,
    /// Dead 100-hr timelag
    Dead100h,
    /// Live herbaceous
    LiveHerb,
    /// Live woody
    LiveWoody,
}

/// The five hourly moisture fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelMoistureField {
    /// Dead 1-hr moisture per cell
    pub dead_1h: TemporalGrid<Percent>,
    /// Dead 10-hr moisture (single sample)
    pub dead_10h: TemporalGrid<Percent>,
    /// Dead 100-hr moisture (single sample)
    pub dead_100h: TemporalGrid<Percent>,
    /// Live herbaceous moisture (single sample)
    pub live_herb: TemporalGrid<Percent>,
    /// Live woody moisture (single sample)
    pub live_woody: TemporalGrid<Percent>,
}

impl FuelMoistureField {
    /// The hourly grid of one moisture class
    pub fn component(&self, class: MoistureClass) -> &TemporalGrid<Percent> {
        match class {
            MoistureClass::Dead1h => &self.dead_1h,
            MoistureClass::Dead10h => &self.dead_10h,
            MoistureClass::Dead100h => &self.dead_100h,
            MoistureClass::LiveHerb => &self.live_herb,
            MoistureClass::LiveWoody => &self.live_woody,
        }
    }

    /// All five components at `(time_index, cell_index)`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if either index is out of range.
    pub fn sample(&self, time_index: usize, cell_index: usize) -> Result<FuelMoisture> {
        Ok(FuelMoisture {
            dead_1h: *self.dead_1h.sample(time_index, cell_index)?,
            dead_10h: *self.dead_10h.sample(time_index, 0)?,
            dead_100h: *self.dead_100h.sample(time_index, 0)?,
            live_herb: *self.live_herb.sample(time_index, 0)?,
            live_woody: *self.live_woody.sample(time_index, 0)?,
        })
    }

    /// Nearest hour and cell, `None` outside the sector
    pub fn value_at(&self, time: NaiveDateTime, point: GeoPoint) -> Option<FuelMoisture> {
        Some(FuelMoisture {
            dead_1h: *self.dead_1h.value_at(time, point)?,
            dead_10h: *self.dead_10h.value_at(time, point)?,
            dead_100h: *self.dead_100h.value_at(time, point)?,
            live_herb: *self.live_herb.value_at(time, point)?,
            live_woody: *self.live_woody.value_at(time, point)?,
        })
    }
}

/// Inputs of a derived fuel moisture field
pub struct FuelMoistureInputs {
    domain: Arc<Domain>,
    fuel_temperatures: Arc<FuelTemperatureModel>,
    weather: Arc<WeatherModel>,
    scenario: FuelMoistureScenario,
}

/// Fuel moisture per class, cell and hour
pub struct FuelMoistureModel {
    field: FieldModel<FuelMoistureInputs, FuelMoistureField>,
}

impl FuelMoistureModel {
    /// Moisture derived from fuel temperatures, starting from `scenario`
    pub fn new(
        domain: Arc<Domain>,
        fuel_temperatures: Arc<FuelTemperatureModel>,
        weather: Arc<WeatherModel>,
        scenario: FuelMoistureScenario,
    ) -> Self {
        Self {
            field: FieldModel::derived(
                "fuel moisture",
                FuelMoistureInputs {
                    domain,
                    fuel_temperatures,
                    weather,
                    scenario,
                },
            ),
        }
    }

    /// Moisture from pre-computed fields
    pub fn loaded(field: FuelMoistureField) -> Self {
        Self {
            field: FieldModel::loaded(field),
        }
    }

    /// Domain of a derived model
    pub fn domain(&self) -> Option<&Arc<Domain>> {
        self.field.inputs().map(|i| &i.domain)
    }

    /// The five fields, computed on first use
    ///
    /// # Errors
    ///
    /// Propagates failures of the fuel temperature and weather models.
    pub fn data(&self) -> Result<Arc<FuelMoistureField>> {
        self.field.data_with(compute)
    }

    /// All five components at `(time_index, cell_index)`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if either index is out of range.
    pub fn sample_at(&self, time_index: usize, cell_index: usize) -> Result<FuelMoisture> {
        self.data()?.sample(time_index, cell_index)
    }

    /// Nearest hour and cell, `None` outside the sector
    ///
    /// # Errors
    ///
    /// As [`FuelMoistureModel::data`].
    pub fn value_at(&self, time: NaiveDateTime, point: GeoPoint) -> Result<Option<FuelMoisture>> {
        Ok(self.data()?.value_at(time, point))
    }
}

fn compute(inputs: &FuelMoistureInputs) -> Result<FuelMoistureField> {
    let started = Instant::now();
    let domain = &inputs.domain;
    let initial = inputs.scenario.fuel_moisture();
    let times = domain.timestamps().to_vec();

    let dead_1h = dead_fine_fuel_moisture(inputs, *initial.dead_1h)?;
    let uniform = |value: Percent| {
        let single = GridGeometry::single(domain.sector());
        let grids = times
            .iter()
            .map(|_| SpatialGrid::filled(single, value))
            .collect();
        TemporalGrid::from_grids(times.clone(), grids)
    };
    let field = FuelMoistureField {
        dead_1h,
        dead_10h: uniform(initial.dead_10h)?,
        dead_100h: uniform(initial.dead_100h)?,
        live_herb: uniform(initial.live_herb)?,
        live_woody: uniform(initial.live_woody)?,
    };
    info!(
        "Fuel moisture computed for {} hours x {} cells in {:.2?}",
        times.len(),
        domain.spatial_length(),
        started.elapsed()
    );
    Ok(field)
}

/// Runs the dead 1-hr recursion: cells in parallel, hours in sequence
fn dead_fine_fuel_moisture(inputs: &FuelMoistureInputs, initial: f64) -> Result<TemporalGrid<Percent>> {
    let domain = &inputs.domain;
    let temps = inputs.fuel_temperatures.data()?;
    temps.ensure_covers("fuel temperatures", domain.geometry(), domain.timestamps())?;
    let clocks: Vec<f64> = domain.timestamps().iter().map(|t| clock_hours(*t)).collect();
    let winds = (0..domain.temporal_length())
        .map(|t| inputs.weather.weather_at(t).map(|w| w.wind_speed))
        .collect::<Result<Vec<_>>>()?;

    let num_cells = domain.spatial_length();
    let per_cell = (0..num_cells)
        .into_par_iter()
        .map(|cell| {
            let mut state = DeadFineFuelMoisture::default();
            temps
                .grids()
                .iter()
                .enumerate()
                .map(|(t, grid)| {
                    let fuel = grid.get(cell)?;
                    let wx = FineFuelWeather {
                        fuel_temperature: fuel.fuel_temperature,
                        fuel_humidity: fuel.relative_humidity,
                        wind_speed: winds[t],
                    };
                    Ok(state.step(t, clocks[t], initial, &wx))
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let geometry = *domain.geometry();
    let grids = (0..domain.temporal_length())
        .map(|t| {
            let values = per_cell.iter().map(|hours| Percent::new(hours[t])).collect();
            SpatialGrid::from_values(geometry, values)
        })
        .collect::<Result<Vec<_>>>()?;
    TemporalGrid::from_grids(domain.timestamps().to_vec(), grids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::fuel::FuelTemperature;
    use crate::core_types::geo::Sector;
    use crate::core_types::units::{Celsius, Degrees, Meters, MetersPerSecond};
    use crate::core_types::weather::{TimeSeries, Weather};
    use crate::error::FiregroundError;
    use chrono::NaiveDate;

    fn domain(resolution: f64) -> Arc<Domain> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Arc::new(Domain::with_resolution(Sector::new(0.0, 0.0, 1.0, 1.0), start, 2, resolution).unwrap())
    }

    fn uniform_temperatures(domain: &Domain) -> FuelTemperatureModel {
        let sample = FuelTemperature {
            fuel_temperature: Celsius::new(30.0),
            relative_humidity: Percent::new(25.0),
            elevation: Meters::new(0.0),
        };
        FuelTemperatureModel::loaded(domain.new_temporal_grid::<FuelTemperature>().map(|_| sample))
    }

    fn breezy(domain: &Domain) -> WeatherModel {
        let wx = Weather {
            wind_speed: MetersPerSecond::new(4.0),
            wind_direction: Degrees::new(270.0),
            ..Weather::default()
        };
        WeatherModel::loaded(TimeSeries::constant(domain.timestamps().to_vec(), wx).unwrap())
    }

    fn setup() -> (Arc<Domain>, FuelMoistureModel) {
        let domain = domain(0.5);
        let model = FuelMoistureModel::new(
            Arc::clone(&domain),
            Arc::new(uniform_temperatures(&domain)),
            Arc::new(breezy(&domain)),
            FuelMoistureScenario::default(),
        );
        (domain, model)
    }

    #[test]
    fn test_field_shapes() {
        let (domain, model) = setup();
        let data = model.data().unwrap();
        assert_eq!(data.dead_1h.temporal_length(), 48);
        assert_eq!(data.dead_1h.geometry().spatial_length(), domain.spatial_length());
        assert_eq!(data.dead_10h.geometry().spatial_length(), 1);
    }

    #[test]
    fn test_first_sample_is_initial_and_scenario_components_constant() {
        let (_, model) = setup();
        let first = model.sample_at(0, 3).unwrap();
        assert_eq!(*first.dead_1h, 3.0);
        let later = model.sample_at(30, 2).unwrap();
        assert_eq!(*later.dead_10h, 4.0);
        assert_eq!(*later.dead_100h, 5.0);
        assert_eq!(*later.live_herb, 30.0);
        assert_eq!(*later.live_woody, 60.0);
    }

    #[test]
    fn test_value_at_outside_sector() {
        let (domain, model) = setup();
        assert!(model
            .value_at(domain.start_date(), GeoPoint::new(5.0, 5.0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_fuel_temperatures_on_another_grid_are_rejected() {
        let fine = domain(0.25);
        let coarse = domain(0.5);
        assert!(fine.spatial_length() > coarse.spatial_length());
        let model = FuelMoistureModel::new(
            Arc::clone(&fine),
            Arc::new(uniform_temperatures(&coarse)),
            Arc::new(breezy(&fine)),
            FuelMoistureScenario::default(),
        );
        for _ in 0..2 {
            assert!(matches!(
                model.data(),
                Err(FiregroundError::InvalidArgument {
                    name: "fuel temperatures",
                    ..
                })
            ));
        }
    }
}
