//! Album types

use super::AlbumId;
use serde::{Deserialize, Serialize};

/// Reference to a cover image hosted by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute image URL
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// An album as returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,

    /// Cover art in the order the catalog lists it
    #[serde(default)]
    pub images: Vec<ImageRef>,
}
