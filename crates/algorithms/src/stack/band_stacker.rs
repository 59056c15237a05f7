//! Pairwise band stacking
//!
//! Joins two multiband layers on their spatial keys and appends the bands of
//! the right layer after the bands of the left one. Keys present on only one
//! side are dropped.

use tilestack_core::{CellType, MultibandTileLayer, Result};
use tilestack_parallel::Engine;
use tracing::{debug, warn};

/// Parameters for band stacking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackParams {
    /// Cell type every output band is converted to (default: Float64).
    pub cell_type: CellType,
}

impl Default for StackParams {
    fn default() -> Self {
        Self {
            cell_type: CellType::Float64,
        }
    }
}

/// Stack `b` onto `a` with default parameters.
///
/// See [`stack_with`].
pub fn stack(
    engine: &Engine,
    a: &MultibandTileLayer,
    b: &MultibandTileLayer,
) -> Result<MultibandTileLayer> {
    stack_with(engine, a, b, StackParams::default())
}

/// Inner-join two layers by key and concatenate their bands.
///
/// # Algorithm
///
/// For every key present in both inputs:
///
/// ```text
/// out[key] = crop(a[key]) ++ crop(b[key])
/// ```
///
/// where each band is converted to `params.cell_type` and then fitted to the
/// tile dimensions of `a`'s layout, padding with no-data. Valid cells keep
/// their values, so a class 0 in an unsigned label band stays 0. Band order is
/// always all of `a` then all of `b`, so `stack(stack(A, B), C)` holds the
/// bands of A, B and C in that order.
///
/// # Returns
/// A layer with `a`'s metadata (cell type replaced), sorted by key.
pub fn stack_with(
    engine: &Engine,
    a: &MultibandTileLayer,
    b: &MultibandTileLayer,
    params: StackParams,
) -> Result<MultibandTileLayer> {
    let (rows, cols) = a.metadata().tile_shape();
    let cell_type = params.cell_type;

    if !a.metadata().crs.is_equivalent(&b.metadata().crs) {
        warn!(
            left = %a.metadata().crs,
            right = %b.metadata().crs,
            "stacking layers with different coordinate systems"
        );
    }

    let joined = engine.join_by_key(a.tiles().to_vec(), b.tiles().to_vec());

    let dropped = (a.len() + b.len()).saturating_sub(2 * joined.len());
    if dropped > 0 {
        warn!(
            left = a.len(),
            right = b.len(),
            kept = joined.len(),
            dropped,
            "stacking dropped tiles without a matching key"
        );
    }

    let tiles = engine.try_map(joined, |(key, (left, right))| -> Result<_> {
        let left = left.convert(cell_type).crop(rows, cols);
        let right = right.convert(cell_type).crop(rows, cols);
        Ok((key, left.concat(right)?))
    })?;

    debug!(
        tiles = tiles.len(),
        bands = tiles.first().map(|(_, t)| t.band_count()).unwrap_or(0),
        "stacked layers"
    );

    let metadata = a.metadata().with_cell_type(cell_type);
    Ok(MultibandTileLayer::new(metadata, tiles).sorted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestack_core::{MultibandTile, SpatialKey, Tile, TileLayerMetadata, TypedTile};

    fn metadata(size: usize) -> TileLayerMetadata {
        let mut md = TileLayerMetadata::with_grid(CellType::Float64, 8, 8);
        md.layout.tile_cols = size;
        md.layout.tile_rows = size;
        md
    }

    fn layer(keys: &[(u32, u32)], values: &[f64], size: usize) -> MultibandTileLayer {
        let tiles = keys
            .iter()
            .map(|&(c, r)| {
                let bands = values
                    .iter()
                    .map(|&v| Tile::from(TypedTile::<f64>::filled(size, size, v)))
                    .collect();
                (SpatialKey::new(c, r), MultibandTile::new(bands).unwrap())
            })
            .collect();
        MultibandTileLayer::new(metadata(size), tiles)
    }

    #[test]
    fn test_stack_concatenates_in_order() {
        let engine = Engine::local();
        let a = layer(&[(0, 0)], &[1.0], 4);
        let b = layer(&[(0, 0)], &[2.0, 3.0], 4);
        let out = stack(&engine, &a, &b).unwrap();

        let (_, tile) = &out.tiles()[0];
        let firsts: Vec<f64> = tile.bands().iter().map(|t| t.get_f64(0, 0).unwrap()).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_stack_is_inner_join() {
        let engine = Engine::default();
        let a = layer(&[(0, 0), (1, 0), (2, 0)], &[1.0], 4);
        let b = layer(&[(1, 0), (2, 0), (3, 0)], &[2.0], 4);
        let out = stack(&engine, &a, &b).unwrap();
        let keys: Vec<SpatialKey> = out.keys().copied().collect();
        assert_eq!(keys, vec![SpatialKey::new(1, 0), SpatialKey::new(2, 0)]);
    }

    #[test]
    fn test_output_is_float64_with_left_metadata() {
        let engine = Engine::local();
        let mut a = layer(&[(0, 0)], &[1.0], 4);
        let int_tile = Tile::from(TypedTile::<u8>::filled(4, 4, 7));
        a = MultibandTileLayer::new(
            a.metadata().with_cell_type(CellType::UInt8),
            vec![(SpatialKey::new(0, 0), MultibandTile::from_single(int_tile))],
        );
        let b = layer(&[(0, 0)], &[2.0], 4);
        let out = stack(&engine, &a, &b).unwrap();

        assert_eq!(out.metadata().cell_type, CellType::Float64);
        assert_eq!(out.metadata().layout, a.metadata().layout);
        let (_, tile) = &out.tiles()[0];
        assert!(tile.bands().iter().all(|t| t.cell_type() == CellType::Float64));
        assert_eq!(tile.band(0).unwrap().get_f64(3, 3).unwrap(), 7.0);
    }

    #[test]
    fn test_bands_are_fitted_to_left_tile_size() {
        let engine = Engine::local();
        let a = layer(&[(0, 0)], &[1.0], 4);
        let b = layer(&[(0, 0)], &[2.0], 6);
        let out = stack(&engine, &a, &b).unwrap();
        let (_, tile) = &out.tiles()[0];
        assert_eq!(tile.shape(), (4, 4));
    }

    fn uint8_layer(size: usize, value: u8) -> MultibandTileLayer {
        let band = Tile::from(TypedTile::<u8>::filled(size, size, value));
        MultibandTileLayer::new(
            metadata(size).with_cell_type(CellType::UInt8),
            vec![(SpatialKey::new(0, 0), MultibandTile::from_single(band))],
        )
    }

    #[test]
    fn test_fitting_keeps_zero_valued_unsigned_cells() {
        let engine = Engine::local();
        let a = layer(&[(0, 0)], &[1.0], 4);

        let cropped = stack(&engine, &a, &uint8_layer(6, 0)).unwrap();
        let band = cropped.tiles()[0].1.band(1).unwrap().clone();
        assert_eq!(band.to_f64_vec(), vec![0.0; 16]);

        let padded = stack(&engine, &a, &uint8_layer(2, 0)).unwrap();
        let band = padded.tiles()[0].1.band(1).unwrap().clone();
        assert_eq!(band.get_f64(1, 1).unwrap(), 0.0);
        assert!(band.get_f64(3, 3).unwrap().is_nan());
    }

    #[test]
    fn test_label_class_zero_survives_as_band_zero() {
        let engine = Engine::local();
        let label = uint8_layer(6, 0);
        let features = layer(&[(0, 0)], &[2.0], 4);
        let mut label_md = label.metadata().clone();
        label_md.layout = features.metadata().layout;
        let label = MultibandTileLayer::new(label_md, label.tiles().to_vec());

        let out = stack(&engine, &label, &features).unwrap();
        let tile = &out.tiles()[0].1;
        assert_eq!(tile.shape(), (4, 4));
        assert_eq!(tile.band(0).unwrap().get_f64(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_crs_difference_does_not_block_stacking() {
        let engine = Engine::local();
        let a = layer(&[(0, 0)], &[1.0], 4);
        let mut md = a.metadata().clone();
        md.crs = tilestack_core::CRS::Epsg(4326);
        let b = MultibandTileLayer::new(md, layer(&[(0, 0)], &[2.0], 4).tiles().to_vec());
        assert_eq!(stack(&engine, &a, &b).unwrap().len(), 1);
    }

    #[test]
    fn test_custom_cell_type() {
        let engine = Engine::local();
        let a = layer(&[(0, 0)], &[1.0], 2);
        let b = layer(&[(0, 0)], &[2.0], 2);
        let params = StackParams {
            cell_type: CellType::Float32,
        };
        let out = stack_with(&engine, &a, &b, params).unwrap();
        assert_eq!(out.metadata().cell_type, CellType::Float32);
    }
}
