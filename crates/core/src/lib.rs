//! # TileStack Core
//!
//! Core types for the TileStack layer catalog.
//!
//! This crate provides:
//! - `TypedTile<T>`, `Tile` and `MultibandTile`: dense single- and multiband tiles
//! - `SpatialKey` / `SpaceTimeKey` and the closed `LayerType` tag set
//! - `LayerId`, layout and `TileLayerMetadata`
//! - `LayerCollection<K, V>`: the keyed tile collection every stage exchanges

pub mod crs;
pub mod error;
pub mod layer;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use layer::{
    LayerCollection, LayerId, LayerKey, LayerType, LayerValue, MultibandTileLayer, SpaceTimeKey,
    SpatialKey, TileLayer, TileLayerMetadata,
};
pub use raster::{CellType, MultibandTile, RasterElement, Tile, TypedTile, DEFAULT_TILE_SIZE};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::layer::{
        Extent, KeyClass, LayerCollection, LayerId, LayerKey, LayerType, LayerValue,
        LayoutDefinition, MultibandTileLayer, SpaceTimeKey, SpatialKey, TileLayer,
        TileLayerMetadata, ValueClass,
    };
    pub use crate::raster::{CellType, MultibandTile, Tile, TypedTile, DEFAULT_TILE_SIZE};
}
