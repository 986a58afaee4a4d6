/// Player configuration
use crate::error::{PlayerError, Result};
use resonance_playback::{PlaybackConfig, ShuffleStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, read from the working directory if present
pub const DEFAULT_CONFIG_FILE: &str = "resonance.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_output")]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_url")]
    pub url: String,

    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default)]
    pub shuffle_strategy: ShuffleStrategy,

    /// Seconds of play after which a track always counts as listened
    #[serde(default = "default_history_floor_secs")]
    pub history_floor_secs: u64,

    /// Fraction of a track after which it counts as listened
    #[serde(default = "default_history_fraction")]
    pub history_fraction: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Virtual clock speed of the simulated output (1.0 = real time)
    #[serde(default = "default_speed")]
    pub speed: f32,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` overrides the default `resonance.toml`; an explicit path must
    /// exist. Environment variables prefixed with `RESONANCE_` override the
    /// file, with `__` between section and key
    /// (`RESONANCE_CATALOG__ACCESS_TOKEN`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("RESONANCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlayerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog.url.trim().is_empty() {
            return Err(PlayerError::Config(
                "Catalog URL is required (set RESONANCE_CATALOG__URL)".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err(PlayerError::Config(format!(
                "Volume must be between 0.0 and 1.0, got {}",
                self.playback.volume
            )));
        }

        if !(self.playback.history_fraction > 0.0 && self.playback.history_fraction <= 1.0) {
            return Err(PlayerError::Config(format!(
                "History fraction must be in (0.0, 1.0], got {}",
                self.playback.history_fraction
            )));
        }

        if !(self.output.speed.is_finite() && self.output.speed > 0.0) {
            return Err(PlayerError::Config(format!(
                "Output speed must be positive, got {}",
                self.output.speed
            )));
        }

        if self.output.tick_ms == 0 {
            return Err(PlayerError::Config("Output tick must be at least 1ms".to_string()));
        }

        Ok(())
    }

    /// Engine settings derived from the `[playback]` section
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            volume: self.playback.volume,
            shuffle_strategy: self.playback.shuffle_strategy,
            history_floor: Duration::from_secs(self.playback.history_floor_secs),
            history_fraction: self.playback.history_fraction,
        }
    }
}

// Default values
fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        url: default_catalog_url(),
        access_token: None,
    }
}

fn default_catalog_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        state_file: default_state_file(),
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./data/player.json")
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        volume: default_volume(),
        shuffle_strategy: ShuffleStrategy::default(),
        history_floor_secs: default_history_floor_secs(),
        history_fraction: default_history_fraction(),
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_history_floor_secs() -> u64 {
    30
}

fn default_history_fraction() -> f32 {
    0.5
}

fn default_output() -> OutputSettings {
    OutputSettings {
        speed: default_speed(),
        tick_ms: default_tick_ms(),
    }
}

fn default_speed() -> f32 {
    1.0
}

fn default_tick_ms() -> u64 {
    250
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            storage: default_storage(),
            playback: default_playback(),
            output: default_output(),
        }
    }
}
