//! Setting keys and typed accessors
//!
//! Every backend stores JSON values under string keys. This module names the
//! keys the player uses and converts between them and domain types.

use crate::error::{Result, StorageError};
use resonance_core::TrackId;
use serde_json::Value;

// Setting key constants
/// Most recently loaded track ID (string)
pub const LAST_TRACK_ID: &str = "lastTrackId";

/// Raw key/value access shared by all backends
pub trait SettingsStore: Send + Sync {
    /// Get a value, `Ok(None)` if the key was never set
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Set or overwrite a value
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a value
    ///
    /// Returns `true` if the key existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// Read the last track ID from any settings backend
///
/// An empty string is treated as "nothing stored".
pub fn last_track_id(store: &dyn SettingsStore) -> Result<Option<TrackId>> {
    match store.get(LAST_TRACK_ID)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if id.is_empty() => Ok(None),
        Some(Value::String(id)) => Ok(Some(TrackId::new(id))),
        Some(other) => Err(StorageError::invalid_value(
            LAST_TRACK_ID,
            format!("expected a string, found {other}"),
        )),
    }
}

/// Write the last track ID to any settings backend
pub fn set_last_track_id(store: &dyn SettingsStore, id: &TrackId) -> Result<()> {
    store.set(LAST_TRACK_ID, Value::String(id.as_str().to_owned()))
}
