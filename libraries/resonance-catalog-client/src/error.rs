//! Error types for the catalog client.

use resonance_core::ResonanceError;
use thiserror::Error;

/// Errors that can occur when talking to a catalog server.
#[derive(Error, Debug)]
pub enum CatalogClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Token missing, invalid or expired
    #[error("Authentication required")]
    AuthRequired,

    /// Catalog has no such entity
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

/// Result type for catalog client operations.
pub type Result<T> = std::result::Result<T, CatalogClientError>;

impl From<CatalogClientError> for ResonanceError {
    fn from(err: CatalogClientError) -> Self {
        match err {
            CatalogClientError::NotFound { entity, id } => ResonanceError::not_found(entity, id),
            CatalogClientError::InvalidUrl(msg) => ResonanceError::invalid_input(msg),
            other => ResonanceError::network(other.to_string()),
        }
    }
}
