mod album;
mod ids;
mod track;

pub use album::{Album, ImageRef};
pub use ids::{AlbumId, TrackId};
pub use track::Track;
