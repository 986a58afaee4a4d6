//! Resonance Player
//!
//! Headless player for a Resonance catalog: resolves tracks over HTTP, plays
//! them through a simulated output and remembers the last track between runs.

pub mod config;
pub mod error;
pub mod session;

pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use session::Session;
