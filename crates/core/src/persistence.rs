//! JSON persistence for computed fields
//!
//! A saved field is wrapped with the time it was written and a short label
//! naming what it holds. Loading one feeds the `loaded` constructor of the
//! matching model, which then skips computation.

use crate::error::FiregroundError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A field as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedField<T> {
    /// What the field holds, e.g. "terrain" or "fire behavior"
    pub kind: String,
    /// When the field was written
    pub saved_at: DateTime<Utc>,
    /// The field itself
    pub field: T,
}

/// Save a field as pretty-printed JSON
///
/// # Errors
/// Returns error if the field cannot be serialized or the file written
pub fn save_field<T: Serialize, P: AsRef<Path>>(
    path: P,
    kind: &str,
    field: &T,
) -> Result<(), PersistenceError> {
    let saved = SavedField {
        kind: kind.to_string(),
        saved_at: Utc::now(),
        field,
    };
    let contents = serde_json::to_string_pretty(&saved)
        .map_err(|e| PersistenceError::SerializeFailed(e.to_string()))?;
    fs::write(path, contents).map_err(|e| PersistenceError::SaveFailed(e.to_string()))
}

/// Load a field saved with [`save_field`]
///
/// # Errors
/// Returns error if the file cannot be read or does not hold a `T`
pub fn load_field<T: DeserializeOwned, P: AsRef<Path>>(
    path: P,
) -> Result<SavedField<T>, PersistenceError> {
    let contents =
        fs::read_to_string(path).map_err(|e| PersistenceError::LoadFailed(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| PersistenceError::ParseFailed(e.to_string()))
}

/// Errors that can occur during persistence operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Failed to load file
    LoadFailed(String),
    /// Failed to parse file contents
    ParseFailed(String),
    /// Failed to serialize a field
    SerializeFailed(String),
    /// Failed to save file
    SaveFailed(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            PersistenceError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            PersistenceError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            PersistenceError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<PersistenceError> for FiregroundError {
    fn from(e: PersistenceError) -> Self {
        FiregroundError::Persistence(e.to_string())
    }
}
