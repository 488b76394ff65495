//! Lazily computed field models, one per stage of the pipeline
//!
//! Every model is either derived (computed at most once from its domain,
//! upstream models and collaborators) or loaded from a pre-computed field.

pub mod fire_behavior;
pub mod fuel_moisture;
pub mod fuel_temperature;
pub mod fuel_type;
pub mod memo;
pub mod terrain;
pub mod weather;

pub use fire_behavior::{FireBehaviorModel, FireBehaviorUpstream};
pub use fuel_moisture::{FuelMoistureField, FuelMoistureModel, MoistureClass};
pub use fuel_temperature::FuelTemperatureModel;
pub use fuel_type::FuelTypeModel;
pub use memo::{FieldModel, Memo};
pub use terrain::TerrainModel;
pub use weather::WeatherModel;
