//! Resonance Storage
//!
//! Small key/value stores backing session continuity for the player.
//!
//! Values are JSON, keyed by string. Two backends are provided:
//! - [`MemoryStore`]: process-local, for tests and ephemeral sessions
//! - [`JsonFileStore`]: a single JSON object on disk
//!
//! Both implement [`resonance_core::PersistenceStore`] on top of the
//! [`settings::LAST_TRACK_ID`] key.
//!
//! # Example
//!
//! ```rust,no_run
//! use resonance_core::{PersistenceStore, TrackId};
//! use resonance_storage::JsonFileStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = JsonFileStore::open("state/player.json")?;
//! store.save_last_track_id(&TrackId::new("t42"))?;
//!
//! assert_eq!(store.load_last_track_id()?, Some(TrackId::new("t42")));
//! # Ok(())
//! # }
//! ```

mod error;
mod file;
mod memory;
pub mod settings;

pub use error::{Result, StorageError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use settings::SettingsStore;
