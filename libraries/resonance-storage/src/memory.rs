use crate::error::Result;
use crate::settings::{self, SettingsStore};
use resonance_core::{PersistenceStore, TrackId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory settings store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.values.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.values.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.write().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.write().remove(key).is_some())
    }
}

impl PersistenceStore for MemoryStore {
    fn save_last_track_id(&self, id: &TrackId) -> resonance_core::Result<()> {
        Ok(settings::set_last_track_id(self, id)?)
    }

    fn load_last_track_id(&self) -> resonance_core::Result<Option<TrackId>> {
        Ok(settings::last_track_id(self)?)
    }
}
