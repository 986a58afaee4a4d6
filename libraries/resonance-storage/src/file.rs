use crate::error::Result;
use crate::settings::{self, SettingsStore};
use resonance_core::{PersistenceStore, TrackId};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Settings persisted as one JSON object in a file
///
/// The whole object is kept in memory and rewritten on every change. Writes go
/// to a sibling temp file first and are renamed into place, so a crash never
/// leaves a half-written file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`
    ///
    /// A missing file is an empty store; parent directories are created on the
    /// first write. A file that is not a JSON object is logged and ignored,
    /// and will be replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(path = %path.display(), "State file is not a JSON object, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file yet");
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    // Changes are staged on a copy and only kept once the file is written

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        let mut staged = values.clone();
        staged.insert(key.to_owned(), value);
        self.flush(&staged)?;
        *values = staged;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        if !values.contains_key(key) {
            return Ok(false);
        }
        let mut staged = values.clone();
        staged.remove(key);
        self.flush(&staged)?;
        *values = staged;
        Ok(true)
    }
}

impl PersistenceStore for JsonFileStore {
    fn save_last_track_id(&self, id: &TrackId) -> resonance_core::Result<()> {
        Ok(settings::set_last_track_id(self, id)?)
    }

    fn load_last_track_id(&self) -> resonance_core::Result<Option<TrackId>> {
        Ok(settings::last_track_id(self)?)
    }
}
