//! The staged analysis: domains, terrain, weather, fuel types, fuel
//! temperatures, fuel moistures, fire behavior
//!
//! Each stage snapshots its inputs under a read lock, forces the new models'
//! computation with no lock held, then publishes them under a write lock.

use super::events::{AnalysisOutcome, FiregroundEvent, Stage};
use super::{RunningGuard, Shared};
use crate::core_types::geo::Sector;
use crate::error::{FiregroundError, Result};
use crate::grid::Domain;
use crate::model::{
    FireBehaviorModel, FireBehaviorUpstream, FuelMoistureModel, FuelTemperatureModel,
    FuelTypeModel, TerrainModel,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info, warn};

/// Control over an analysis running on the "fireground-analysis" thread
pub struct AnalysisHandle {
    cancel: Arc<AtomicBool>,
    progress: Arc<AtomicUsize>,
    thread: JoinHandle<AnalysisOutcome>,
}

impl AnalysisHandle {
    pub(crate) fn spawn(shared: Arc<Shared>) -> Result<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(AtomicUsize::new(0));
        let thread = {
            let cancel = Arc::clone(&cancel);
            let progress = Arc::clone(&progress);
            thread::Builder::new()
                .name("fireground-analysis".into())
                .spawn(move || run_claimed(&shared, &cancel, Some(&progress)))
                .map_err(|e| FiregroundError::ThreadSpawn(e.to_string()))?
        };
        Ok(Self {
            cancel,
            progress,
            thread,
        })
    }

    /// Ask the analysis to stop before its next stage
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// True once the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Number of stages completed so far
    pub fn stages_completed(&self) -> usize {
        self.progress.load(Ordering::Acquire)
    }

    /// Wait for the analysis to end
    pub fn join(self) -> AnalysisOutcome {
        self.thread.join().unwrap_or(AnalysisOutcome::Panicked)
    }
}

/// Run an analysis whose running flag the caller has claimed
///
/// The flag is released before `AnalysisFinished` goes out, so a
/// subscriber may start the next analysis from that event.
pub(crate) fn run_claimed(
    shared: &Shared,
    cancel: &AtomicBool,
    progress: Option<&AtomicUsize>,
) -> AnalysisOutcome {
    let outcome = {
        let _running = RunningGuard(&shared.running);
        run_stages(shared, cancel, progress)
    };
    shared.emit(FiregroundEvent::AnalysisFinished(outcome.clone()));
    outcome
}

/// Run every stage in order, polling `cancel` before each
fn run_stages(
    shared: &Shared,
    cancel: &AtomicBool,
    progress: Option<&AtomicUsize>,
) -> AnalysisOutcome {
    let started = Instant::now();
    let outcome = run_all(shared, cancel, progress);
    match &outcome {
        AnalysisOutcome::Completed => {
            info!("Analysis completed in {:.2?}", started.elapsed());
        }
        AnalysisOutcome::Cancelled { next } => {
            warn!("Analysis cancelled before the {} stage", next);
        }
        AnalysisOutcome::Failed { stage, error } => {
            error!("Analysis aborted in the {} stage: {}", stage, error);
        }
        AnalysisOutcome::Panicked => {
            error!("Analysis worker panicked");
        }
    }
    outcome
}

fn run_all(shared: &Shared, cancel: &AtomicBool, progress: Option<&AtomicUsize>) -> AnalysisOutcome {
    for stage in Stage::ALL {
        if cancel.load(Ordering::Acquire) {
            return AnalysisOutcome::Cancelled { next: stage };
        }
        shared.emit(FiregroundEvent::StageStarted(stage));
        let started = Instant::now();
        if let Err(error) = run_stage(shared, stage) {
            return AnalysisOutcome::Failed { stage, error };
        }
        info!("Stage {} finished in {:.2?}", stage, started.elapsed());
        if let Some(progress) = progress {
            progress.fetch_add(1, Ordering::AcqRel);
        }
        shared.emit(FiregroundEvent::StageCompleted(stage));
    }
    AnalysisOutcome::Completed
}

fn run_stage(shared: &Shared, stage: Stage) -> Result<()> {
    match stage {
        Stage::Domains => build_domains(shared),
        Stage::Terrain => build_terrain(shared),
        Stage::Weather => shared.rebuild_weather(),
        Stage::FuelType => build_fuel_types(shared),
        Stage::FuelTemperature => build_fuel_temperatures(shared),
        Stage::FuelMoisture => build_fuel_moistures(shared),
        Stage::FireBehavior => build_fire_behavior(shared),
    }
}

/// (Re)build each sector's domain over the shared time grid
///
/// Sectors whose domain is unchanged keep their models.
fn build_domains(shared: &Shared) -> Result<()> {
    let (sectors, times) = {
        let state = shared.read()?;
        (state.sectors.clone(), state.time_grid.clone())
    };
    let times = times.ok_or_else(|| {
        FiregroundError::MissingInput("time grid (set a start time first)".into())
    })?;
    for sector in sectors {
        let domain = Domain::with_times(sector, times.clone(), shared.config.resolution_degrees)?;
        let mut state = shared.write()?;
        if let Some(models) = state.models.get_mut(&sector) {
            if models.domain.as_deref() != Some(&domain) {
                info!(
                    "Domain for {}: {} x {} cells, {} hours",
                    sector,
                    domain.nrows(),
                    domain.ncols(),
                    domain.temporal_length()
                );
                models.replace_domain(Arc::new(domain));
            }
        }
    }
    Ok(())
}

fn build_terrain(shared: &Shared) -> Result<()> {
    let provider = shared
        .collaborators
        .terrain
        .clone()
        .ok_or(FiregroundError::MissingCollaborator("terrain provider"))?;
    for (sector, domain) in shared.domains()? {
        let model = Arc::new(TerrainModel::new(Arc::clone(&domain), Arc::clone(&provider)));
        model.data()?;
        shared.publish(sector, &domain, |m| {
            m.terrain = Some(model);
            m.clear_downstream(Stage::Terrain);
        })?;
    }
    Ok(())
}

fn build_fuel_types(shared: &Shared) -> Result<()> {
    for (sector, domain) in shared.domains()? {
        let provider = shared
            .snapshot(sector)?
            .fuel_provider
            .ok_or(FiregroundError::MissingCollaborator("fuel model provider"))?;
        let model = Arc::new(FuelTypeModel::new(Arc::clone(&domain), provider));
        model.data()?;
        shared.publish(sector, &domain, |m| {
            m.fuel_types = Some(model);
            m.clear_downstream(Stage::FuelType);
        })?;
    }
    Ok(())
}

fn build_fuel_temperatures(shared: &Shared) -> Result<()> {
    for (sector, domain) in shared.domains()? {
        let models = shared.snapshot(sector)?;
        let model = Arc::new(FuelTemperatureModel::new(
            Arc::clone(&domain),
            required(models.terrain, "terrain", sector)?,
            required(models.fuel_types, "fuel types", sector)?,
            required(models.weather, "weather", sector)?,
            Arc::clone(&shared.collaborators.solar),
        ));
        model.data()?;
        shared.publish(sector, &domain, |m| {
            m.fuel_temperatures = Some(model);
            m.clear_downstream(Stage::FuelTemperature);
        })?;
    }
    Ok(())
}

fn build_fuel_moistures(shared: &Shared) -> Result<()> {
    for (sector, domain) in shared.domains()? {
        let models = shared.snapshot(sector)?;
        let model = Arc::new(FuelMoistureModel::new(
            Arc::clone(&domain),
            required(models.fuel_temperatures, "fuel temperatures", sector)?,
            required(models.weather, "weather", sector)?,
            shared.config.moisture_scenario,
        ));
        model.data()?;
        shared.publish(sector, &domain, |m| {
            m.fuel_moistures = Some(model);
            m.clear_downstream(Stage::FuelMoisture);
        })?;
    }
    Ok(())
}

fn build_fire_behavior(shared: &Shared) -> Result<()> {
    let provider = shared
        .collaborators
        .fire_behavior
        .clone()
        .ok_or(FiregroundError::MissingCollaborator("fire behavior provider"))?;
    for (sector, domain) in shared.domains()? {
        let models = shared.snapshot(sector)?;
        let upstream = FireBehaviorUpstream {
            terrain: required(models.terrain, "terrain", sector)?,
            fuels: required(models.fuel_types, "fuel types", sector)?,
            fuel_temperatures: required(models.fuel_temperatures, "fuel temperatures", sector)?,
            fuel_moistures: required(models.fuel_moistures, "fuel moistures", sector)?,
            weather: required(models.weather, "weather", sector)?,
        };
        let model = Arc::new(FireBehaviorModel::new(
            Arc::clone(&domain),
            upstream,
            Arc::clone(&provider),
        ));
        model.data()?;
        let published = shared.publish(sector, &domain, |m| m.fire_behavior = Some(model))?;
        if published {
            shared.emit(FiregroundEvent::FireBehaviorAdded(sector));
        }
    }
    Ok(())
}

fn required<T>(model: Option<Arc<T>>, what: &str, sector: Sector) -> Result<Arc<T>> {
    model.ok_or_else(|| FiregroundError::MissingInput(format!("{what} for sector {sector}")))
}
