//! Layout and metadata shared by every tile of a layer

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::layer::{LayerKey, SpatialKey};
use crate::raster::{CellType, DEFAULT_TILE_SIZE};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// Regular grid of equally sized tiles covering an extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    pub extent: Extent,
    /// Pixel columns per tile
    pub tile_cols: usize,
    /// Pixel rows per tile
    pub tile_rows: usize,
    /// Tile columns in the grid
    pub layout_cols: u32,
    /// Tile rows in the grid
    pub layout_rows: u32,
}

impl LayoutDefinition {
    pub fn new(extent: Extent, layout_cols: u32, layout_rows: u32, tile_size: usize) -> Self {
        Self {
            extent,
            tile_cols: tile_size,
            tile_rows: tile_size,
            layout_cols,
            layout_rows,
        }
    }

    /// Tile dimensions as (rows, cols)
    pub fn tile_shape(&self) -> (usize, usize) {
        (self.tile_rows, self.tile_cols)
    }

    /// Whether a key addresses a tile of this grid
    pub fn contains(&self, key: &SpatialKey) -> bool {
        key.col < self.layout_cols && key.row < self.layout_rows
    }
}

/// Inclusive key range of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBounds {
    pub min_col: u32,
    pub min_row: u32,
    pub max_col: u32,
    pub max_row: u32,
    pub min_instant: i64,
    pub max_instant: i64,
}

impl KeyBounds {
    /// Bounds of a key set, or `None` if it is empty
    pub fn from_keys<'a, K: LayerKey>(keys: impl IntoIterator<Item = &'a K>) -> Option<Self> {
        keys.into_iter().fold(None, |acc: Option<KeyBounds>, key| {
            let sk = key.spatial_key();
            let t = key.instant().unwrap_or(0);
            Some(match acc {
                None => KeyBounds {
                    min_col: sk.col,
                    min_row: sk.row,
                    max_col: sk.col,
                    max_row: sk.row,
                    min_instant: t,
                    max_instant: t,
                },
                Some(b) => KeyBounds {
                    min_col: b.min_col.min(sk.col),
                    min_row: b.min_row.min(sk.row),
                    max_col: b.max_col.max(sk.col),
                    max_row: b.max_row.max(sk.row),
                    min_instant: b.min_instant.min(t),
                    max_instant: b.max_instant.max(t),
                },
            })
        })
    }
}

/// Metadata attached to every tile collection read from or written to a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerMetadata {
    pub cell_type: CellType,
    pub layout: LayoutDefinition,
    /// Data extent, which may be smaller than the layout extent
    pub extent: Extent,
    pub crs: CRS,
    pub bounds: Option<KeyBounds>,
}

impl TileLayerMetadata {
    pub fn new(cell_type: CellType, layout: LayoutDefinition, crs: CRS) -> Self {
        Self {
            cell_type,
            extent: layout.extent,
            layout,
            crs,
            bounds: None,
        }
    }

    /// Grid of canonical tiles over an extent of one map unit per tile
    pub fn with_grid(cell_type: CellType, layout_cols: u32, layout_rows: u32) -> Self {
        let extent = Extent::new(0.0, 0.0, layout_cols as f64, layout_rows as f64);
        Self::new(
            cell_type,
            LayoutDefinition::new(extent, layout_cols, layout_rows, DEFAULT_TILE_SIZE),
            CRS::default(),
        )
    }

    pub fn tile_shape(&self) -> (usize, usize) {
        self.layout.tile_shape()
    }

    /// Same metadata with a different cell type
    pub fn with_cell_type(&self, cell_type: CellType) -> Self {
        Self {
            cell_type,
            ..self.clone()
        }
    }

    /// Check that a tile of `shape` fits this layout
    pub fn check_tile_shape(&self, shape: (usize, usize)) -> Result<()> {
        let (er, ec) = self.tile_shape();
        let (ar, ac) = shape;
        if (er, ec) != (ar, ac) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::SpaceTimeKey;

    #[test]
    fn test_layout_contains() {
        let layout = LayoutDefinition::new(Extent::new(0.0, 0.0, 4.0, 2.0), 4, 2, 256);
        assert!(layout.contains(&SpatialKey::new(3, 1)));
        assert!(!layout.contains(&SpatialKey::new(4, 0)));
        assert!(!layout.contains(&SpatialKey::new(0, 2)));
    }

    #[test]
    fn test_key_bounds() {
        let keys = vec![
            SpaceTimeKey::new(2, 5, 100),
            SpaceTimeKey::new(7, 1, 50),
        ];
        let b = KeyBounds::from_keys(&keys).unwrap();
        assert_eq!((b.min_col, b.min_row, b.max_col, b.max_row), (2, 1, 7, 5));
        assert_eq!((b.min_instant, b.max_instant), (50, 100));
        assert!(KeyBounds::from_keys(&Vec::<SpatialKey>::new()).is_none());
    }

    #[test]
    fn test_metadata_serializes() {
        let md = TileLayerMetadata::with_grid(CellType::UInt8, 3, 2);
        let json = serde_json::to_string(&md).unwrap();
        let back: TileLayerMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, md);
    }
}
