//! Core value types shared by the domain, the field models and the fireground

pub mod behavior;
pub mod fuel;
pub mod geo;
pub mod terrain;
pub mod time;
pub mod units;
pub mod weather;

pub use behavior::*;
pub use fuel::*;
pub use geo::*;
pub use terrain::Terrain;
pub use units::*;
pub use weather::*;
