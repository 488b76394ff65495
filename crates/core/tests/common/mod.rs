//! Stub collaborators and fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use fireground_core::core_types::units::{Celsius, Degrees, Meters, MetersPerSecond, Percent};
use fireground_core::{
    FireBehavior, FireBehaviorPair, FireBehaviorProvider, FuelCondition, FuelModel,
    FuelModelProvider, GeneralWeather, GeoPoint, ProviderError, Terrain, TerrainProvider,
    TimeSeries, Weather, Wind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Route crate logs to the test harness; `RUST_LOG` controls the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 2024-07-15 08:30 local time
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 15)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap()
}

/// The behavior every cell reports in the constant scenario
pub const STUB_BEHAVIOR: FireBehavior = FireBehavior::new(10.0, 1.0, 0.1, 180.0, 100.0);

pub struct ConstantTerrain(pub Terrain);

impl TerrainProvider for ConstantTerrain {
    fn terrain_at(&self, _point: GeoPoint) -> Result<Terrain, ProviderError> {
        Ok(self.0)
    }
}

pub fn flat_terrain() -> ConstantTerrain {
    ConstantTerrain(Terrain::new(
        Degrees::new(0.0),
        Degrees::new(0.0),
        Meters::new(300.0),
    ))
}

/// One fuel code everywhere, counting lookups
pub struct ConstantFuel {
    pub code: i32,
    pub calls: AtomicUsize,
}

impl ConstantFuel {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FuelModelProvider for ConstantFuel {
    fn fuel_model_at(&self, _point: GeoPoint) -> Result<i32, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.code)
    }
}

/// Reports `STUB_BEHAVIOR` for both halves, counting calls
#[derive(Default)]
pub struct ConstantBehavior {
    pub calls: AtomicUsize,
}

impl ConstantBehavior {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FireBehaviorProvider for ConstantBehavior {
    fn compute_fire_behavior(
        &self,
        _fuel_model: &FuelModel,
        _condition: &FuelCondition,
        _weather: &Weather,
        _terrain: &Terrain,
    ) -> Result<FireBehaviorPair, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FireBehaviorPair {
            with_wind: STUB_BEHAVIOR,
            no_wind: STUB_BEHAVIOR,
        })
    }
}

/// Fails for every cell
pub struct BrokenBehavior;

impl FireBehaviorProvider for BrokenBehavior {
    fn compute_fire_behavior(
        &self,
        _fuel_model: &FuelModel,
        _condition: &FuelCondition,
        _weather: &Weather,
        _terrain: &Terrain,
    ) -> Result<FireBehaviorPair, ProviderError> {
        Err(ProviderError::Failed("engine offline".into()))
    }
}

/// 25 °C, 30 % RH, 5 m/s westerly at every timestamp
pub fn constant_weather(times: &[NaiveDateTime]) -> GeneralWeather {
    GeneralWeather {
        air_temperatures: Some(TimeSeries::constant(times.to_vec(), Celsius::new(25.0)).unwrap()),
        relative_humidities: Some(TimeSeries::constant(times.to_vec(), Percent::new(30.0)).unwrap()),
        winds: Some(
            TimeSeries::constant(
                times.to_vec(),
                Wind::new(MetersPerSecond::new(5.0), Degrees::new(270.0)),
            )
            .unwrap(),
        ),
        cloud_cover: None,
    }
}
