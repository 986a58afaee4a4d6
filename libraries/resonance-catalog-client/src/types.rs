//! Request/response types for the catalog API

use serde::{Deserialize, Serialize};

/// Connection settings for a catalog server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base URL, e.g. `https://music.example.com`
    pub url: String,

    /// Bearer token sent with every request, if any
    pub access_token: Option<String>,
}

impl CatalogConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Builder: authenticate with a bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Response of the stream endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUrlResponse {
    pub url: String,
    /// URL validity in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}
