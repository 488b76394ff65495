//! Domain construction, grid layout and gridded fields

pub mod domain;
pub mod field;
pub mod geometry;

pub use domain::{time_grid, Domain, DEFAULT_RESOLUTION};
pub use field::{SpatialGrid, TemporalGrid};
pub use geometry::GridGeometry;
