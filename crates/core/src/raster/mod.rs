//! Tile data structures and operations

mod cell_type;
mod element;
mod grid;
mod tile;

pub use cell_type::CellType;
pub use element::RasterElement;
pub use grid::TypedTile;
pub use tile::{MultibandTile, Tile};

/// Canonical tile edge length in pixels
pub const DEFAULT_TILE_SIZE: usize = 256;
