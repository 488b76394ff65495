//! Analysis configuration, read from and written to JSON
//!
//! Missing keys take their defaults, so a config file only needs the
//! values it changes.

use crate::core_types::fuel::FuelMoistureScenario;
use crate::core_types::time::DAILY_CYCLE_START_HOUR;
use crate::error::{FiregroundError, Result};
use crate::grid::DEFAULT_RESOLUTION;
use crate::persistence::PersistenceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings shared by every sector of a fireground
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of daily cycles in the time grid (24 hours each)
    pub num_cycles: usize,
    /// Local hour of the first timestamp
    pub daily_cycle_start_hour: u32,
    /// Grid cell size in degrees
    pub resolution_degrees: f64,
    /// Initial fuel moisture
    pub moisture_scenario: FuelMoistureScenario,
    /// Per-call deadline for terrain, fuel and fire behavior lookups;
    /// `None` waits indefinitely
    pub collaborator_timeout_ms: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            num_cycles: 2,
            daily_cycle_start_hour: DAILY_CYCLE_START_HOUR,
            resolution_degrees: DEFAULT_RESOLUTION,
            moisture_scenario: FuelMoistureScenario::default(),
            collaborator_timeout_ms: None,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or holds
    /// invalid values
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents =
            fs::read_to_string(path).map_err(|e| PersistenceError::LoadFailed(e.to_string()))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| PersistenceError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| PersistenceError::SerializeFailed(e.to_string()))?;
        fs::write(path, contents).map_err(|e| PersistenceError::SaveFailed(e.to_string()))?;
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `InvalidArgument` for zero cycles, an hour outside `0..24`
    /// or a non-positive resolution
    pub fn validate(&self) -> Result<()> {
        if self.num_cycles == 0 {
            return Err(invalid("num_cycles", self.num_cycles, "must be at least 1"));
        }
        if self.daily_cycle_start_hour >= 24 {
            return Err(invalid(
                "daily_cycle_start_hour",
                self.daily_cycle_start_hour,
                "must be within 0..24",
            ));
        }
        if !(self.resolution_degrees.is_finite() && self.resolution_degrees > 0.0) {
            return Err(invalid(
                "resolution_degrees",
                self.resolution_degrees,
                "must be a positive number of degrees",
            ));
        }
        Ok(())
    }

    /// Collaborator deadline as a duration
    pub fn collaborator_timeout(&self) -> Option<Duration> {
        self.collaborator_timeout_ms.map(Duration::from_millis)
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> FiregroundError {
    FiregroundError::InvalidArgument {
        name,
        value: value.to_string(),
        reason: reason.into(),
    }
}
