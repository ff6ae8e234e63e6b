//! Chunked tilemap.
//!
//! Tiles are registered once and referred to by a `u16` id, `0` meaning
//! empty. The map is split into square chunks that are created when first
//! written and drawn with the batch API, skipping chunks the camera cannot
//! see.

mod chunk;
mod tilemap;

pub use chunk::{ChunkPos, TilemapChunk};
pub use tilemap::{Tile, TilemapComponent};

/// Errors from tilemap operations.
#[derive(Debug, thiserror::Error)]
pub enum TilemapError {
    #[error("tile {0:?} is already registered")]
    DuplicateTile(Tile),
    #[error("maximum amount of tile types ({}) reached", u16::MAX)]
    TooManyTiles,
    #[error("tile {0:?} is not registered")]
    UnknownTile(Tile),
    #[error("chunk size must be positive")]
    InvalidChunkSize,
}

pub fn crate_info() -> &'static str {
    "woodgas-tilemap v0.1.0"
}
