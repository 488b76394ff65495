//! Physical equations behind the derived field models

pub mod fuel_moisture;
pub mod fuel_temperature;
pub mod solar;

pub use fuel_moisture::{
    canadian_daily_fine_fuel_moisture, canadian_hourly_fine_fuel_moisture, DeadFineFuelMoisture,
    FineFuelWeather,
};
pub use fuel_temperature::fuel_heating;
pub use solar::RothermelSolar;
