//! Keyed tile collections

use crate::error::{Error, Result};
use crate::layer::{KeyBounds, LayerKey, LayerValue, SpatialKey, TileLayerMetadata};
use crate::raster::{MultibandTile, Tile};

/// Tiles keyed by grid position plus the metadata they all share.
///
/// This is the unit of exchange between catalog reads, the stacking and
/// sampling stages, and catalog writes. A stage consumes a collection and
/// produces a new one; tiles are never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCollection<K, V> {
    metadata: TileLayerMetadata,
    tiles: Vec<(K, V)>,
}

pub type TileLayer = LayerCollection<SpatialKey, Tile>;
pub type MultibandTileLayer = LayerCollection<SpatialKey, MultibandTile>;

impl<K: LayerKey, V: LayerValue> LayerCollection<K, V> {
    pub fn new(metadata: TileLayerMetadata, tiles: Vec<(K, V)>) -> Self {
        Self { metadata, tiles }
    }

    pub fn metadata(&self) -> &TileLayerMetadata {
        &self.metadata
    }

    pub fn tiles(&self) -> &[(K, V)] {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.tiles.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.tiles.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tiles.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Key range of the tiles actually present
    pub fn key_bounds(&self) -> Option<KeyBounds> {
        KeyBounds::from_keys(self.keys())
    }

    /// Sort tiles by key so output order is reproducible
    pub fn sorted(mut self) -> Self {
        self.tiles.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    /// Check the collection invariants before it is persisted.
    ///
    /// Every tile must match the layout's tile dimensions, every key must
    /// address a tile of the layout grid, and keys must be unique.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.metadata.layout;
        for (key, value) in &self.tiles {
            self.metadata.check_tile_shape(value.shape())?;
            let sk = key.spatial_key();
            if !layout.contains(&sk) {
                return Err(Error::InvalidParameter {
                    name: "key",
                    value: format!("{:?}", key),
                    reason: format!(
                        "outside the {}x{} layout grid",
                        layout.layout_cols, layout.layout_rows
                    ),
                });
            }
        }
        let mut keys: Vec<&K> = self.keys().collect();
        keys.sort();
        if let Some(w) = keys.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::InvalidParameter {
                name: "tiles",
                value: format!("{:?}", w[0]),
                reason: "duplicate key in collection".into(),
            });
        }
        Ok(())
    }
}
