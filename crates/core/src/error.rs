//! Error types for the fireground pipeline
//!
//! Per-cell collaborator failures never surface here: they are logged and
//! replaced with sentinel values inside the models. These errors cover
//! invalid arguments, missing configuration and stage prerequisites.

use crate::core_types::geo::Sector;
use std::fmt;

/// Errors raised by domains, field models and the fireground orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum FiregroundError {
    /// Sector bounds are missing, degenerate or smaller than one grid step
    InvalidSector {
        /// The offending sector
        sector: Sector,
        /// Why it was rejected
        reason: String,
    },
    /// An index into a domain or grid was out of range
    IndexOutOfRange {
        /// What was being indexed ("time", "cell", "row", "column")
        axis: &'static str,
        /// The requested index
        index: usize,
        /// The exclusive upper bound
        len: usize,
    },
    /// A scalar argument was rejected
    InvalidArgument {
        /// Parameter name
        name: &'static str,
        /// Rejected value, formatted
        value: String,
        /// Why it was rejected
        reason: String,
    },
    /// A required collaborator service was not supplied
    MissingCollaborator(&'static str),
    /// A stage prerequisite (time grid, weather, upstream model) is absent
    MissingInput(String),
    /// `start_analysis` was called while an analysis is in flight
    AnalysisRunning,
    /// A lock was poisoned by a panic in another thread
    LockPoisoned(&'static str),
    /// The analysis worker thread could not be started
    ThreadSpawn(String),
    /// Reading or writing a persisted field or configuration failed
    Persistence(String),
}

impl FiregroundError {
    /// Shorthand for an out-of-range index error.
    pub(crate) fn out_of_range(axis: &'static str, index: usize, len: usize) -> Self {
        FiregroundError::IndexOutOfRange { axis, index, len }
    }

    /// Shorthand for a rejected sector.
    pub(crate) fn invalid_sector(sector: Sector, reason: impl Into<String>) -> Self {
        FiregroundError::InvalidSector {
            sector,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FiregroundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiregroundError::InvalidSector { sector, reason } => {
                write!(f, "Invalid sector {sector}: {reason}")
            }
            FiregroundError::IndexOutOfRange { axis, index, len } => {
                write!(f, "Invalid {axis} index {index} (valid range 0..{len})")
            }
            FiregroundError::InvalidArgument {
                name,
                value,
                reason,
            } => write!(f, "Invalid argument {name} = {value}: {reason}"),
            FiregroundError::MissingCollaborator(service) => {
                write!(f, "A {service} wasn't supplied to the fireground")
            }
            FiregroundError::MissingInput(msg) => write!(f, "Missing input: {msg}"),
            FiregroundError::AnalysisRunning => write!(f, "An analysis is already running"),
            FiregroundError::LockPoisoned(name) => {
                write!(f, "Lock '{name}' was poisoned by a panic in another thread")
            }
            FiregroundError::ThreadSpawn(msg) => {
                write!(f, "Failed to start the analysis thread: {msg}")
            }
            FiregroundError::Persistence(msg) => write!(f, "Persistence failed: {msg}"),
        }
    }
}

impl std::error::Error for FiregroundError {}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FiregroundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_message_names_axis_and_bounds() {
        let err = FiregroundError::out_of_range("time", 48, 48);
        assert_eq!(err.to_string(), "Invalid time index 48 (valid range 0..48)");
    }

    #[test]
    fn test_missing_collaborator_message() {
        let err = FiregroundError::MissingCollaborator("fire behavior provider");
        assert!(err.to_string().contains("fire behavior provider"));
    }
}
