//! Per-pixel sample extraction from multiband layers

use tilestack_core::{Error, MultibandTile, MultibandTileLayer, Result, SpatialKey, Tile};

/// One pixel of a multiband tile, split into a label and features.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub key: SpatialKey,
    /// Pixel column inside the tile
    pub col: usize,
    /// Pixel row inside the tile
    pub row: usize,
    pub label: f64,
    /// Every band except the label band, in band order. No-data reads as NaN.
    pub features: Vec<f64>,
}

/// Lazily scatter a layer into one [`Sample`] per pixel.
///
/// Tiles are visited in collection order and pixels row-major within each
/// tile. Band `label_band` becomes the label; the remaining bands become the
/// features.
///
/// # Errors
/// `InvalidParameter` if any tile has no band `label_band`. This is checked
/// before the first sample is produced.
pub fn to_samples(
    layer: &MultibandTileLayer,
    label_band: usize,
) -> Result<impl Iterator<Item = Sample> + '_> {
    if let Some((key, tile)) = layer.iter().find(|(_, t)| label_band >= t.band_count()) {
        return Err(Error::InvalidParameter {
            name: "label_band",
            value: label_band.to_string(),
            reason: format!("tile {} has only {} bands", key, tile.band_count()),
        });
    }
    Ok(layer
        .iter()
        .flat_map(move |(key, tile)| tile_samples(*key, tile, label_band)))
}

fn tile_samples(key: SpatialKey, tile: &MultibandTile, label_band: usize) -> impl Iterator<Item = Sample> {
    let (rows, cols) = tile.shape();
    let bands: Vec<Vec<f64>> = tile.bands().iter().map(Tile::to_f64_vec).collect();

    (0..rows * cols).map(move |i| {
        let features = bands
            .iter()
            .enumerate()
            .filter(|(b, _)| *b != label_band)
            .map(|(_, values)| values[i])
            .collect();
        Sample {
            key,
            col: i % cols,
            row: i / cols,
            label: bands[label_band][i],
            features,
        }
    })
}
