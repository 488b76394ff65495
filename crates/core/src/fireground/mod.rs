//! The fireground: sectors, shared weather and the staged analysis
//!
//! A [`Fireground`] owns the sectors under analysis, the general weather
//! and the shared time grid, and for every sector the chain of field models
//! built by the analysis stages. Mutations and queries may come from any
//! thread; the analysis worker only holds the state lock while it snapshots
//! stage inputs and publishes results.
//!
//! # Example
//! ```no_run
//! use fireground_core::{AnalysisConfig, Collaborators, Fireground};
//!
//! let fireground = Fireground::new(AnalysisConfig::default(), Collaborators::default())?;
//! let events = fireground.subscribe();
//! # let _ = events;
//! # Ok::<(), fireground_core::FiregroundError>(())
//! ```

mod analysis;
pub mod events;

pub use analysis::AnalysisHandle;
pub use events::{AnalysisOutcome, FiregroundEvent, Stage};

use crate::config::AnalysisConfig;
use crate::core_types::behavior::{FireBehavior, FireEnvironment};
use crate::core_types::fuel::FuelCondition;
use crate::core_types::geo::{GeoPoint, Sector};
use crate::core_types::units::{Celsius, Percent};
use crate::core_types::weather::{GeneralWeather, TimeSeries, Weather, Wind};
use crate::error::{FiregroundError, Result};
use crate::grid::{time_grid, Domain, GridGeometry, TemporalGrid};
use crate::model::{
    FireBehaviorModel, FuelMoistureModel, FuelTemperatureModel, FuelTypeModel, MoistureClass,
    TerrainModel, WeatherModel,
};
use crate::providers::{Bounded, Collaborators, FuelModelProvider};
use chrono::NaiveDateTime;
use events::EventBus;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Everything known about one sector
///
/// Models are `None` until their stage has run (or a loaded model was
/// installed). Cloning is cheap: every model is shared.
#[derive(Clone, Default)]
pub struct SectorModels {
    /// Spatial and temporal layout
    pub domain: Option<Arc<Domain>>,
    /// Fuel model lookups for this sector
    pub fuel_provider: Option<Arc<dyn FuelModelProvider>>,
    /// Per-cell terrain
    pub terrain: Option<Arc<TerrainModel>>,
    /// Hourly weather
    pub weather: Option<Arc<WeatherModel>>,
    /// Per-cell fuel model codes
    pub fuel_types: Option<Arc<FuelTypeModel>>,
    /// Hourly fuel temperatures
    pub fuel_temperatures: Option<Arc<FuelTemperatureModel>>,
    /// Hourly fuel moisture
    pub fuel_moistures: Option<Arc<FuelMoistureModel>>,
    /// Hourly fire behavior
    pub fire_behavior: Option<Arc<FireBehaviorModel>>,
}

impl SectorModels {
    /// Drop the models computed after `stage`
    fn clear_downstream(&mut self, stage: Stage) {
        if stage < Stage::FuelTemperature {
            self.fuel_temperatures = None;
        }
        if stage < Stage::FuelMoisture {
            self.fuel_moistures = None;
        }
        if stage < Stage::FireBehavior {
            self.fire_behavior = None;
        }
    }

    /// Install a new domain, dropping every model built on the old one
    fn replace_domain(&mut self, domain: Arc<Domain>) {
        self.domain = Some(domain);
        self.clear_models();
    }

    fn clear_models(&mut self) {
        self.terrain = None;
        self.weather = None;
        self.fuel_types = None;
        self.clear_downstream(Stage::Domains);
    }
}

/// Mutable fireground state behind the shared lock
#[derive(Default)]
pub(crate) struct FiregroundState {
    sectors: Vec<Sector>,
    models: FxHashMap<Sector, SectorModels>,
    general_weather: Arc<GeneralWeather>,
    time_grid: Option<Vec<NaiveDateTime>>,
}

/// State shared between the fireground handle and its analysis worker
pub(crate) struct Shared {
    state: RwLock<FiregroundState>,
    events: EventBus,
    running: AtomicBool,
    config: AnalysisConfig,
    collaborators: Collaborators,
}

impl Shared {
    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, FiregroundState>> {
        self.state
            .read()
            .map_err(|_| FiregroundError::LockPoisoned("fireground state"))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, FiregroundState>> {
        self.state
            .write()
            .map_err(|_| FiregroundError::LockPoisoned("fireground state"))
    }

    pub(crate) fn emit(&self, event: FiregroundEvent) {
        self.events.emit(&event);
    }

    /// Sectors with their domains, in insertion order
    ///
    /// Fails if any sector has no domain yet.
    pub(crate) fn domains(&self) -> Result<Vec<(Sector, Arc<Domain>)>> {
        let state = self.read()?;
        state
            .sectors
            .iter()
            .map(|sector| {
                state
                    .models
                    .get(sector)
                    .and_then(|m| m.domain.clone())
                    .map(|domain| (*sector, domain))
                    .ok_or_else(|| {
                        FiregroundError::MissingInput(format!("domain for sector {sector}"))
                    })
            })
            .collect()
    }

    /// Snapshot of one sector's models
    pub(crate) fn snapshot(&self, sector: Sector) -> Result<SectorModels> {
        self.read()?
            .models
            .get(&sector)
            .cloned()
            .ok_or_else(|| FiregroundError::invalid_sector(sector, "not part of the fireground"))
    }

    /// Apply `update` if `sector` is still present on `domain`
    ///
    /// Returns false when the sector was removed or re-gridded while the
    /// result was being computed.
    pub(crate) fn publish(
        &self,
        sector: Sector,
        domain: &Arc<Domain>,
        update: impl FnOnce(&mut SectorModels),
    ) -> Result<bool> {
        let mut state = self.write()?;
        match state.models.get_mut(&sector) {
            Some(models) if models.domain.as_ref().is_some_and(|d| Arc::ptr_eq(d, domain)) => {
                update(models);
                Ok(true)
            }
            _ => {
                debug!("Discarding result for stale sector {}", sector);
                Ok(false)
            }
        }
    }

    /// Rebuild every sector's weather model from the general weather
    ///
    /// Models downstream of weather are dropped. Sectors without a domain
    /// are skipped.
    pub(crate) fn rebuild_weather(&self) -> Result<()> {
        let (general, targets) = {
            let state = self.read()?;
            let targets: Vec<(Sector, Arc<Domain>)> = state
                .sectors
                .iter()
                .filter_map(|s| {
                    let domain = state.models.get(s)?.domain.clone()?;
                    Some((*s, domain))
                })
                .collect();
            (Arc::clone(&state.general_weather), targets)
        };
        if !general.is_complete() {
            return Err(FiregroundError::MissingInput(
                "general weather needs air temperature, relative humidity and wind".into(),
            ));
        }
        for (sector, domain) in targets {
            let model = Arc::new(WeatherModel::new(Arc::clone(&domain), Arc::clone(&general)));
            model.data()?;
            let published = self.publish(sector, &domain, |m| {
                m.weather = Some(model);
                m.clear_downstream(Stage::Weather);
            })?;
            if published {
                self.emit(FiregroundEvent::FireWeatherAdded(sector));
            }
        }
        Ok(())
    }

    fn claim_running(&self) -> Result<()> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| FiregroundError::AnalysisRunning)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.running.load(Ordering::Acquire) {
            return Err(FiregroundError::AnalysisRunning);
        }
        Ok(())
    }
}

/// Sole releaser of a claimed running flag, however the analysis ends
pub(crate) struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sectors, general weather and the models of a wildfire analysis
///
/// Cloning a `Fireground` yields another handle to the same state.
#[derive(Clone)]
pub struct Fireground {
    shared: Arc<Shared>,
}

impl Fireground {
    /// Create an empty fireground
    ///
    /// When `collaborator_timeout_ms` is set, the terrain and fire behavior
    /// providers (and every fuel provider passed to `add_sector`) are
    /// wrapped in a bounded wait.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the configuration is invalid; `ThreadSpawn` if
    /// a bounded provider cannot start its workers.
    pub fn new(config: AnalysisConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        let collaborators = match config.collaborator_timeout() {
            Some(timeout) => collaborators.bounded(timeout)?,
            None => collaborators,
        };
        info!(
            "Fireground created: {} cycles from {:02}:00, resolution {}°",
            config.num_cycles, config.daily_cycle_start_hour, config.resolution_degrees
        );
        Ok(Self {
            shared: Arc::new(Shared {
                state: RwLock::new(FiregroundState::default()),
                events: EventBus::default(),
                running: AtomicBool::new(false),
                config,
                collaborators,
            }),
        })
    }

    /// The analysis configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.shared.config
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> mpsc::Receiver<FiregroundEvent> {
        self.shared.events.subscribe()
    }

    /// True while an analysis is in flight
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Time grid
    // ------------------------------------------------------------------

    /// Anchor the shared time grid at `start`
    ///
    /// The grid starts at the configured daily cycle hour on `start`'s date
    /// and runs `num_cycles` days. Every sector is re-gridded, which drops
    /// all computed models.
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis; domain errors if a sector
    /// cannot be gridded.
    pub fn set_start_time(&self, start: NaiveDateTime) -> Result<()> {
        self.shared.ensure_idle()?;
        let config = &self.shared.config;
        let times = time_grid(start, config.num_cycles, config.daily_cycle_start_hour)?;
        let mut state = self.shared.write()?;
        let mut domains = Vec::with_capacity(state.sectors.len());
        for sector in &state.sectors {
            domains.push((
                *sector,
                Domain::with_times(*sector, times.clone(), config.resolution_degrees)?,
            ));
        }
        for (sector, domain) in domains {
            if let Some(models) = state.models.get_mut(&sector) {
                models.replace_domain(Arc::new(domain));
            }
        }
        info!(
            "Time grid set: {} hours from {}",
            times.len(),
            times.first().map_or_else(String::new, ToString::to_string)
        );
        state.time_grid = Some(times);
        Ok(())
    }

    /// The shared time grid, if a start time was set
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn time_grid(&self) -> Result<Option<Vec<NaiveDateTime>>> {
        Ok(self.shared.read()?.time_grid.clone())
    }

    // ------------------------------------------------------------------
    // Sectors
    // ------------------------------------------------------------------

    /// Replace every sector with `sector`
    ///
    /// All existing sectors and models are cleared. The new sector's domain
    /// is built immediately when a time grid is set; otherwise the domains
    /// stage builds it later. Emits `SectorRemoved` for each old sector,
    /// then `SectorAdded`.
    ///
    /// # Errors
    ///
    /// `InvalidSector` for missing or degenerate bounds, or a sector smaller
    /// than one grid step; `AnalysisRunning` during an analysis;
    /// `ThreadSpawn` if the bounded fuel provider cannot start its workers.
    pub fn add_sector(&self, sector: Sector, fuel_provider: Arc<dyn FuelModelProvider>) -> Result<()> {
        self.shared.ensure_idle()?;
        if sector.is_missing() {
            return Err(FiregroundError::invalid_sector(sector, "bounds are missing"));
        }
        if sector.is_degenerate() {
            return Err(FiregroundError::invalid_sector(sector, "bounds have no extent"));
        }
        let fuel_provider = match self.shared.config.collaborator_timeout() {
            Some(timeout) => Arc::new(Bounded::new(fuel_provider, timeout)?) as Arc<dyn FuelModelProvider>,
            None => fuel_provider,
        };

        let removed = {
            let mut state = self.shared.write()?;
            let domain = match &state.time_grid {
                Some(times) => Some(Arc::new(Domain::with_times(
                    sector,
                    times.clone(),
                    self.shared.config.resolution_degrees,
                )?)),
                None => {
                    warn!("No time grid yet; the domain of {} is built by the next analysis", sector);
                    None
                }
            };
            let removed = std::mem::take(&mut state.sectors);
            state.models.clear();
            state.sectors.push(sector);
            state.models.insert(
                sector,
                SectorModels {
                    domain,
                    fuel_provider: Some(fuel_provider),
                    ..SectorModels::default()
                },
            );
            removed
        };

        for old in removed {
            self.shared.emit(FiregroundEvent::SectorRemoved(old));
        }
        info!("Sector added: {}", sector);
        self.shared.emit(FiregroundEvent::SectorAdded(sector));
        Ok(())
    }

    /// Remove `sector` and its models
    ///
    /// Returns false if the sector was not part of the fireground.
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn remove_sector(&self, sector: Sector) -> Result<bool> {
        self.shared.ensure_idle()?;
        let removed = {
            let mut state = self.shared.write()?;
            state.sectors.retain(|s| *s != sector);
            state.models.remove(&sector).is_some()
        };
        if removed {
            info!("Sector removed: {}", sector);
            self.shared.emit(FiregroundEvent::SectorRemoved(sector));
        }
        Ok(removed)
    }

    /// Sectors in insertion order
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn sectors(&self) -> Result<Vec<Sector>> {
        Ok(self.shared.read()?.sectors.clone())
    }

    /// First sector whose bounds contain `point`
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn find_sector_containing(&self, point: GeoPoint) -> Result<Option<Sector>> {
        Ok(self
            .shared
            .read()?
            .sectors
            .iter()
            .find(|s| s.contains(point))
            .copied())
    }

    /// Snapshot of a sector's models, `None` for unknown sectors
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn sector_models(&self, sector: Sector) -> Result<Option<SectorModels>> {
        Ok(self.shared.read()?.models.get(&sector).cloned())
    }

    /// Drop every computed model, keeping sectors, domains and fuel providers
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn reset_models(&self) -> Result<()> {
        self.shared.ensure_idle()?;
        let mut state = self.shared.write()?;
        for models in state.models.values_mut() {
            models.clear_models();
        }
        debug!("Models reset for {} sectors", state.sectors.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // General weather
    // ------------------------------------------------------------------

    /// The general weather series
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn general_weather(&self) -> Result<Arc<GeneralWeather>> {
        Ok(Arc::clone(&self.shared.read()?.general_weather))
    }

    /// Set the general air temperature series
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn set_air_temperatures(&self, series: TimeSeries<Celsius>) -> Result<()> {
        self.update_weather(FiregroundEvent::AirTemperaturesAdded, |w| {
            w.air_temperatures = Some(series);
        })
    }

    /// Set the general relative humidity series
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn set_relative_humidities(&self, series: TimeSeries<Percent>) -> Result<()> {
        self.update_weather(FiregroundEvent::RelativeHumiditiesAdded, |w| {
            w.relative_humidities = Some(series);
        })
    }

    /// Set the general wind series
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn set_winds(&self, series: TimeSeries<Wind>) -> Result<()> {
        self.update_weather(FiregroundEvent::GeneralWindsAdded, |w| {
            w.winds = Some(series);
        })
    }

    /// Set the general cloud cover series
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn set_cloud_cover(&self, series: TimeSeries<Percent>) -> Result<()> {
        self.update_weather(FiregroundEvent::CloudCoverAdded, |w| {
            w.cloud_cover = Some(series);
        })
    }

    /// Set every series present in `weather`
    ///
    /// Emits one event per series supplied, then rebuilds the sector weather
    /// models once.
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` during an analysis.
    pub fn add_weather(&self, weather: GeneralWeather) -> Result<()> {
        self.shared.ensure_idle()?;
        let mut emitted = Vec::new();
        {
            let mut state = self.shared.write()?;
            let general = Arc::make_mut(&mut state.general_weather);
            if let Some(series) = weather.air_temperatures {
                general.air_temperatures = Some(series);
                emitted.push(FiregroundEvent::AirTemperaturesAdded);
            }
            if let Some(series) = weather.relative_humidities {
                general.relative_humidities = Some(series);
                emitted.push(FiregroundEvent::RelativeHumiditiesAdded);
            }
            if let Some(series) = weather.winds {
                general.winds = Some(series);
                emitted.push(FiregroundEvent::GeneralWindsAdded);
            }
            if let Some(series) = weather.cloud_cover {
                general.cloud_cover = Some(series);
                emitted.push(FiregroundEvent::CloudCoverAdded);
            }
        }
        for event in emitted {
            self.shared.emit(event);
        }
        self.rebuild_weather_if_complete()
    }

    fn update_weather(
        &self,
        event: FiregroundEvent,
        update: impl FnOnce(&mut GeneralWeather),
    ) -> Result<()> {
        self.shared.ensure_idle()?;
        {
            let mut state = self.shared.write()?;
            update(Arc::make_mut(&mut state.general_weather));
        }
        self.shared.emit(event);
        self.rebuild_weather_if_complete()
    }

    fn rebuild_weather_if_complete(&self) -> Result<()> {
        if self.shared.read()?.general_weather.is_complete() {
            self.shared.rebuild_weather()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Loaded models
    // ------------------------------------------------------------------

    /// Install a terrain model for `sector`
    ///
    /// # Errors
    ///
    /// `InvalidSector` for unknown sectors, `InvalidArgument` if a loaded
    /// grid does not match the sector's domain.
    pub fn add_terrain(&self, sector: Sector, model: TerrainModel) -> Result<()> {
        let geometry = model_geometry(model.domain(), || Ok(*model.data()?.geometry()))?;
        self.install(sector, geometry, |m| m.terrain = Some(Arc::new(model)))
    }

    /// Install a fuel type model for `sector`
    ///
    /// # Errors
    ///
    /// As [`Fireground::add_terrain`].
    pub fn add_fuel_types(&self, sector: Sector, model: FuelTypeModel) -> Result<()> {
        let geometry = model_geometry(model.domain(), || Ok(*model.data()?.geometry()))?;
        self.install(sector, geometry, |m| m.fuel_types = Some(Arc::new(model)))
    }

    /// Install a fuel temperature model for `sector`
    ///
    /// # Errors
    ///
    /// As [`Fireground::add_terrain`].
    pub fn add_fuel_temperatures(&self, sector: Sector, model: FuelTemperatureModel) -> Result<()> {
        let geometry = model_geometry(model.domain(), || Ok(*model.data()?.geometry()))?;
        self.install(sector, geometry, |m| m.fuel_temperatures = Some(Arc::new(model)))
    }

    /// Install a fuel moisture model for `sector`
    ///
    /// # Errors
    ///
    /// As [`Fireground::add_terrain`].
    pub fn add_fuel_moistures(&self, sector: Sector, model: FuelMoistureModel) -> Result<()> {
        let geometry = model_geometry(model.domain(), || Ok(*model.data()?.dead_1h.geometry()))?;
        self.install(sector, geometry, |m| m.fuel_moistures = Some(Arc::new(model)))
    }

    /// Install a fire behavior model for `sector`, emitting `FireBehaviorAdded`
    ///
    /// # Errors
    ///
    /// As [`Fireground::add_terrain`].
    pub fn add_fire_behavior(&self, sector: Sector, model: FireBehaviorModel) -> Result<()> {
        let geometry = model_geometry(model.domain(), || Ok(*model.data()?.geometry()))?;
        self.install(sector, geometry, |m| m.fire_behavior = Some(Arc::new(model)))?;
        self.shared.emit(FiregroundEvent::FireBehaviorAdded(sector));
        Ok(())
    }

    fn install(
        &self,
        sector: Sector,
        geometry: GridGeometry,
        update: impl FnOnce(&mut SectorModels),
    ) -> Result<()> {
        self.shared.ensure_idle()?;
        let mut state = self.shared.write()?;
        let models = state
            .models
            .get_mut(&sector)
            .ok_or_else(|| FiregroundError::invalid_sector(sector, "not part of the fireground"))?;
        if let Some(domain) = &models.domain {
            if geometry != *domain.geometry() {
                return Err(FiregroundError::InvalidArgument {
                    name: "model",
                    value: format!("{}x{}", geometry.nrows(), geometry.ncols()),
                    reason: format!(
                        "grid does not match the {}x{} domain of {}",
                        domain.nrows(),
                        domain.ncols(),
                        sector
                    ),
                });
            }
        }
        update(models);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Fuel, fire behavior and fuel condition at `point`, nearest to `time`
    ///
    /// `None` if no sector contains the point or the sector is missing any
    /// of its weather, fuel type, fuel temperature, fuel moisture or fire
    /// behavior models.
    ///
    /// # Errors
    ///
    /// Propagates failures of models computed on demand.
    pub fn fire_environment(
        &self,
        time: NaiveDateTime,
        point: GeoPoint,
    ) -> Result<Option<FireEnvironment>> {
        let Some(sector) = self.find_sector_containing(point)? else {
            return Ok(None);
        };
        let models = self.shared.snapshot(sector)?;
        let (Some(weather), Some(fuels), Some(temps), Some(moistures), Some(behavior)) = (
            models.weather,
            models.fuel_types,
            models.fuel_temperatures,
            models.fuel_moistures,
            models.fire_behavior,
        ) else {
            return Ok(None);
        };
        let (Some(fuel_model), Some(pair), Some(temp), Some(moisture), Some(wx)) = (
            fuels.value_at(point)?,
            behavior.value_at(time, point)?,
            temps.value_at(time, point)?,
            moistures.value_at(time, point)?,
            weather.value_at(time)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(FireEnvironment {
            fuel_model,
            behavior_max: pair.with_wind,
            behavior_min: pair.no_wind,
            condition: FuelCondition {
                air_temperature: wx.air_temperature,
                fuel_temperature: temp.fuel_temperature,
                fuel_moisture: moisture,
            },
        }))
    }

    /// [`Fireground::fire_environment`] for each of `times`
    ///
    /// # Errors
    ///
    /// As [`Fireground::fire_environment`].
    pub fn fire_environment_series(
        &self,
        times: &[NaiveDateTime],
        point: GeoPoint,
    ) -> Result<BTreeMap<NaiveDateTime, Option<FireEnvironment>>> {
        times
            .iter()
            .map(|t| Ok((*t, self.fire_environment(*t, point)?)))
            .collect()
    }

    /// General weather nearest to `time`
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn fire_weather(&self, time: NaiveDateTime) -> Result<Option<Weather>> {
        Ok(self.shared.read()?.general_weather.weather_at(time))
    }

    /// Terrain models of every sector that has one
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn terrains(&self) -> Result<Vec<(Sector, Arc<TerrainModel>)>> {
        self.collect_models(|m| m.terrain.clone())
    }

    /// Weather models of every sector that has one
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn fire_weathers(&self) -> Result<Vec<(Sector, Arc<WeatherModel>)>> {
        self.collect_models(|m| m.weather.clone())
    }

    /// Fuel type models of every sector that has one
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn fuel_types(&self) -> Result<Vec<(Sector, Arc<FuelTypeModel>)>> {
        self.collect_models(|m| m.fuel_types.clone())
    }

    /// Fuel temperature models of every sector that has one
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn fuel_temperatures(&self) -> Result<Vec<(Sector, Arc<FuelTemperatureModel>)>> {
        self.collect_models(|m| m.fuel_temperatures.clone())
    }

    /// Fuel moisture models of every sector that has one
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn fuel_moistures(&self) -> Result<Vec<(Sector, Arc<FuelMoistureModel>)>> {
        self.collect_models(|m| m.fuel_moistures.clone())
    }

    /// One moisture class across every sector with fuel moisture
    ///
    /// # Errors
    ///
    /// Propagates failures of models computed on demand.
    pub fn fuel_moisture_component(
        &self,
        class: MoistureClass,
    ) -> Result<Vec<(Sector, TemporalGrid<Percent>)>> {
        self.fuel_moistures()?
            .into_iter()
            .map(|(sector, model)| Ok((sector, model.data()?.component(class).clone())))
            .collect()
    }

    /// Fire behavior models of every sector that has one
    ///
    /// # Errors
    ///
    /// `LockPoisoned` if a writer panicked.
    pub fn fire_behaviors(&self) -> Result<Vec<(Sector, Arc<FireBehaviorModel>)>> {
        self.collect_models(|m| m.fire_behavior.clone())
    }

    /// Fire behavior with wind across every sector
    ///
    /// # Errors
    ///
    /// Propagates failures of models computed on demand.
    pub fn fire_behavior_max(&self) -> Result<Vec<(Sector, TemporalGrid<FireBehavior>)>> {
        self.fire_behaviors()?
            .into_iter()
            .map(|(sector, model)| Ok((sector, model.data()?.map(|p| p.with_wind))))
            .collect()
    }

    /// Fire behavior without wind across every sector
    ///
    /// # Errors
    ///
    /// Propagates failures of models computed on demand.
    pub fn fire_behavior_min(&self) -> Result<Vec<(Sector, TemporalGrid<FireBehavior>)>> {
        self.fire_behaviors()?
            .into_iter()
            .map(|(sector, model)| Ok((sector, model.data()?.map(|p| p.no_wind))))
            .collect()
    }

    fn collect_models<M>(
        &self,
        pick: impl Fn(&SectorModels) -> Option<Arc<M>>,
    ) -> Result<Vec<(Sector, Arc<M>)>> {
        let state = self.shared.read()?;
        Ok(state
            .sectors
            .iter()
            .filter_map(|s| Some((*s, pick(state.models.get(s)?)?)))
            .collect())
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    /// Run every stage on a background thread
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` if an analysis is already in flight;
    /// `ThreadSpawn` if the worker could not be started.
    pub fn start_analysis(&self) -> Result<AnalysisHandle> {
        self.shared.claim_running()?;
        AnalysisHandle::spawn(Arc::clone(&self.shared)).map_err(|e| {
            self.shared.running.store(false, Ordering::Release);
            e
        })
    }

    /// Run every stage on the calling thread
    ///
    /// `cancel` is polled before each stage.
    ///
    /// # Errors
    ///
    /// `AnalysisRunning` if an analysis is already in flight. Stage failures
    /// are reported in the returned outcome.
    pub fn run_analysis(&self, cancel: &AtomicBool) -> Result<AnalysisOutcome> {
        self.shared.claim_running()?;
        Ok(analysis::run_claimed(&self.shared, cancel, None))
    }
}

/// Grid layout of a model: its domain's, or the loaded field's
fn model_geometry(
    domain: Option<&Arc<Domain>>,
    loaded: impl FnOnce() -> Result<GridGeometry>,
) -> Result<GridGeometry> {
    match domain {
        Some(domain) => Ok(*domain.geometry()),
        None => loaded(),
    }
}
