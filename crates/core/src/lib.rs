//! Fireground Core Library
//!
//! Spatio-temporal wildfire environment analysis over rectangular sectors.
//! For every cell of a sector and every hour of a multi-day time grid the
//! pipeline derives terrain, hourly weather, fuel model, fuel temperature,
//! fuel moisture and fire behavior, each as a lazily computed field model.
//!
//! ## Pipeline
//!
//! - [`grid::Domain`]: sector bounds, cell layout and the hourly time grid
//! - [`model`]: terrain, weather, fuel type, fuel temperature, fuel moisture
//!   and fire behavior models, derived on demand or loaded from saved fields
//! - [`physics`]: solar geometry, fuel heating and the Canadian fine fuel
//!   moisture recursions
//! - [`Fireground`]: sectors, general weather and the cancellable staged
//!   analysis, plus point/time queries of the fire environment
//!
//! Terrain, fuel model and fire behavior data come from injected
//! [`providers`].

// Core types and units
pub mod core_types;

// Domains and gridded fields
pub mod grid;

// Physical equations
pub mod physics;

// Field models and the orchestrator
pub mod fireground;
pub mod model;

// Collaborators, configuration, errors and persistence
pub mod config;
pub mod error;
pub mod persistence;
pub mod providers;

// Re-export core types
pub use core_types::{
    FireBehavior, FireBehaviorPair, FireEnvironment, FuelCondition, FuelModel, FuelMoisture,
    FuelMoistureScenario, FuelTemperature, GeneralWeather, GeoPoint, Sector, Terrain, TimeSeries,
    Weather, Wind,
};

// Re-export the pipeline
pub use config::AnalysisConfig;
pub use error::{FiregroundError, Result};
pub use fireground::{
    AnalysisHandle, AnalysisOutcome, Fireground, FiregroundEvent, SectorModels, Stage,
};
pub use grid::{Domain, SpatialGrid, TemporalGrid};
pub use providers::{
    Collaborators, FireBehaviorProvider, FuelModelProvider, ProviderError, SolarProvider,
    SunPosition, TerrainProvider,
};
