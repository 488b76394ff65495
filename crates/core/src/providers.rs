//! Collaborator services consumed by the field models
//!
//! Terrain, fuel classification, fire behavior physics and solar geometry
//! are injected as trait objects. Implementations live outside this crate
//! (apart from the default [`RothermelSolar`](crate::physics::solar::RothermelSolar)).

use crate::core_types::behavior::FireBehaviorPair;
use crate::core_types::fuel::{FuelCondition, FuelModel};
use crate::core_types::geo::GeoPoint;
use crate::core_types::terrain::Terrain;
use crate::core_types::units::Degrees;
use crate::core_types::weather::Weather;
use crate::physics::solar::RothermelSolar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::FiregroundError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tracing::error;

/// Failure of a single collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider has no data for the request
    NoData,
    /// The provider failed
    Failed(String),
    /// The call did not return within the bounded wait
    Timeout(Duration),
    /// Calls are suspended after repeated timeouts
    Unresponsive,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::NoData => write!(f, "no data"),
            ProviderError::Failed(msg) => write!(f, "provider failed: {msg}"),
            ProviderError::Timeout(d) => write!(f, "no answer within {} ms", d.as_millis()),
            ProviderError::Unresponsive => write!(f, "provider stopped answering"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Slope, aspect and elevation lookup (usually backed by a DEM)
pub trait TerrainProvider: Send + Sync {
    /// Terrain at `point`
    ///
    /// # Errors
    ///
    /// `NoData` outside the provider's coverage, `Failed` on a read error.
    fn terrain_at(&self, point: GeoPoint) -> Result<Terrain, ProviderError>;
}

/// Fuel model classification lookup
pub trait FuelModelProvider: Send + Sync {
    /// Fuel model code at `point`
    ///
    /// # Errors
    ///
    /// `NoData` where the location has no classification.
    fn fuel_model_at(&self, point: GeoPoint) -> Result<i32, ProviderError>;
}

/// Surface fire behavior physics
pub trait FireBehaviorProvider: Send + Sync {
    /// Behavior with the given wind and under calm conditions
    ///
    /// # Errors
    ///
    /// Any failure of the physics engine for these inputs.
    fn compute_fire_behavior(
        &self,
        fuel_model: &FuelModel,
        condition: &FuelCondition,
        weather: &Weather,
        terrain: &Terrain,
    ) -> Result<FireBehaviorPair, ProviderError>;
}

/// Sun angles at one local clock time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SunPosition {
    /// Local hour angle, zero at 06:00
    pub hour_angle: Degrees,
    /// Solar altitude above the horizon
    pub altitude: Degrees,
    /// Solar azimuth
    pub azimuth: Degrees,
    /// Solar declination for the date
    pub declination: Degrees,
}

/// Solar position service
pub trait SolarProvider: Send + Sync {
    /// Sun angles at `latitude` on `date` at `clock_hours` local time
    fn sun_position(&self, latitude: f64, date: NaiveDate, clock_hours: f64) -> SunPosition;
}

/// Services shared by every sector of a fireground
///
/// The fuel model provider is per sector and is passed to `add_sector`.
#[derive(Clone)]
pub struct Collaborators {
    /// Terrain lookups (required from the terrain stage on)
    pub terrain: Option<Arc<dyn TerrainProvider>>,
    /// Fire behavior physics (required by the fire behavior stage)
    pub fire_behavior: Option<Arc<dyn FireBehaviorProvider>>,
    /// Solar geometry
    pub solar: Arc<dyn SolarProvider>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            terrain: None,
            fire_behavior: None,
            solar: Arc::new(RothermelSolar),
        }
    }
}

impl Collaborators {
    /// Set the terrain provider
    pub fn with_terrain(mut self, provider: Arc<dyn TerrainProvider>) -> Self {
        self.terrain = Some(provider);
        self
    }

    /// Set the fire behavior provider
    pub fn with_fire_behavior(mut self, provider: Arc<dyn FireBehaviorProvider>) -> Self {
        self.fire_behavior = Some(provider);
        self
    }

    /// Replace the solar provider
    pub fn with_solar(mut self, provider: Arc<dyn SolarProvider>) -> Self {
        self.solar = provider;
        self
    }

    /// Wrap the terrain and fire behavior providers in a bounded wait
    ///
    /// # Errors
    ///
    /// `ThreadSpawn` if a worker pool cannot be started.
    pub fn bounded(self, timeout: Duration) -> Result<Self, FiregroundError> {
        let terrain = match self.terrain {
            Some(p) => Some(Arc::new(Bounded::new(p, timeout)?) as Arc<dyn TerrainProvider>),
            None => None,
        };
        let fire_behavior = match self.fire_behavior {
            Some(p) => Some(Arc::new(Bounded::new(p, timeout)?) as Arc<dyn FireBehaviorProvider>),
            None => None,
        };
        Ok(Self {
            terrain,
            fire_behavior,
            solar: self.solar,
        })
    }
}

/// Consecutive timeouts after which a [`Bounded`] provider stops being called
pub const MAX_CONSECUTIVE_TIMEOUTS: usize = 8;

/// Runs calls of the wrapped provider on a fixed pool of helper threads and
/// gives up on each after `timeout`
///
/// A call still running when its caller gives up keeps its worker until it
/// returns; queued calls whose caller gave up are skipped. After
/// [`MAX_CONSECUTIVE_TIMEOUTS`] timeouts in a row every call fails with
/// `Unresponsive` until one of the stuck calls returns.
pub struct Bounded<P: ?Sized> {
    inner: Arc<P>,
    timeout: Duration,
    pool: rayon::ThreadPool,
    timeouts: Arc<AtomicUsize>,
}

impl<P: ?Sized + Send + Sync + 'static> Bounded<P> {
    /// Wrap `inner` with a per-call deadline, one worker per CPU
    ///
    /// # Errors
    ///
    /// `ThreadSpawn` if the worker pool cannot be started.
    pub fn new(inner: Arc<P>, timeout: Duration) -> Result<Self, FiregroundError> {
        Self::with_workers(inner, timeout, 0)
    }

    /// Wrap `inner` with a per-call deadline on `workers` threads (0 for one
    /// per CPU)
    ///
    /// # Errors
    ///
    /// `ThreadSpawn` if the worker pool cannot be started.
    pub fn with_workers(
        inner: Arc<P>,
        timeout: Duration,
        workers: usize,
    ) -> Result<Self, FiregroundError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("provider-call-{i}"))
            .panic_handler(|_| error!("Provider call panicked"))
            .build()
            .map_err(|e| FiregroundError::ThreadSpawn(e.to_string()))?;
        Ok(Self {
            inner,
            timeout,
            pool,
            timeouts: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn call<R, F>(&self, f: F) -> Result<R, ProviderError>
    where
        R: Send + 'static,
        F: FnOnce(&P) -> Result<R, ProviderError> + Send + 'static,
    {
        if self.timeouts.load(Ordering::Acquire) >= MAX_CONSECUTIVE_TIMEOUTS {
            return Err(ProviderError::Unresponsive);
        }
        let provider = Arc::clone(&self.inner);
        let timeouts = Arc::clone(&self.timeouts);
        let abandoned = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        {
            let abandoned = Arc::clone(&abandoned);
            self.pool.spawn(move || {
                if abandoned.load(Ordering::Acquire) {
                    return;
                }
                let result = f(provider.as_ref());
                timeouts.store(0, Ordering::Release);
                // The receiver is gone once the caller timed out
                let _ = tx.send(result);
            });
        }
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                abandoned.store(true, Ordering::Release);
                let count = self.timeouts.fetch_add(1, Ordering::AcqRel) + 1;
                if count == MAX_CONSECUTIVE_TIMEOUTS {
                    error!(
                        "Provider missed {} deadlines of {:?} in a row; suspending calls",
                        count, self.timeout
                    );
                }
                Err(ProviderError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ProviderError::Failed("provider call panicked".into()))
            }
        }
    }
}

impl<P: TerrainProvider + ?Sized + 'static> TerrainProvider for Bounded<P> {
    fn terrain_at(&self, point: GeoPoint) -> Result<Terrain, ProviderError> {
        self.call(move |p| p.terrain_at(point))
    }
}

impl<P: FuelModelProvider + ?Sized + 'static> FuelModelProvider for Bounded<P> {
    fn fuel_model_at(&self, point: GeoPoint) -> Result<i32, ProviderError> {
        self.call(move |p| p.fuel_model_at(point))
    }
}

impl<P: FireBehaviorProvider + ?Sized + 'static> FireBehaviorProvider for Bounded<P> {
    fn compute_fire_behavior(
        &self,
        fuel_model: &FuelModel,
        condition: &FuelCondition,
        weather: &Weather,
        terrain: &Terrain,
    ) -> Result<FireBehaviorPair, ProviderError> {
        let (fuel_model, condition, weather, terrain) = (*fuel_model, *condition, *weather, *terrain);
        self.call(move |p| p.compute_fire_behavior(&fuel_model, &condition, &weather, &terrain))
    }
}
