//! Gather per-pixel values back into tiles

use super::Sample;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use tilestack_core::{
    CellType, Error, Result, SpatialKey, Tile, TileLayer, TileLayerMetadata, TypedTile,
};
use tilestack_parallel::Engine;
use tracing::info;

/// One value addressed by tile key and pixel offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelValue {
    pub key: SpatialKey,
    pub col: usize,
    pub row: usize,
    pub value: f64,
}

impl PixelValue {
    pub fn new(key: SpatialKey, col: usize, row: usize, value: f64) -> Self {
        Self {
            key,
            col,
            row,
            value,
        }
    }

    /// The sample's label at its pixel
    pub fn label_of(sample: &Sample) -> Self {
        Self::new(sample.key, sample.col, sample.row, sample.label)
    }

    /// One of the sample's features at its pixel
    pub fn feature_of(sample: &Sample, feature: usize) -> Option<Self> {
        sample
            .features
            .get(feature)
            .map(|&v| Self::new(sample.key, sample.col, sample.row, v))
    }
}

/// Rebuild a single-band Float64 layer from pixel values.
///
/// Values are grouped by key; each group fills a NaN tile of the layout's
/// tile dimensions. Pixels no value covers stay no-data. When two values
/// address the same pixel the later one wins.
///
/// # Errors
/// `IndexOutOfBounds` if a pixel offset falls outside the tile.
pub fn from_samples<I>(engine: &Engine, values: I, metadata: &TileLayerMetadata) -> Result<TileLayer>
where
    I: IntoIterator<Item = PixelValue>,
{
    let (rows, cols) = metadata.tile_shape();
    let keyed: Vec<(SpatialKey, PixelValue)> = values.into_iter().map(|p| (p.key, p)).collect();
    let count = keyed.len();

    let groups = engine.group_by_key(keyed);
    let tiles = engine.try_map(groups, |(key, pixels)| -> Result<(SpatialKey, Tile)> {
        let mut tile = TypedTile::<f64>::empty(rows, cols);
        for p in pixels {
            tile.set(p.row, p.col, p.value)?;
        }
        Ok((key, Tile::from(tile)))
    })?;

    info!(values = count, tiles = tiles.len(), "reassembled tiles");
    Ok(TileLayer::new(metadata.with_cell_type(CellType::Float64), tiles).sorted())
}

/// One row of a predictions file
#[derive(Debug, Deserialize)]
struct PredictionRecord {
    col: u32,
    row: u32,
    x: usize,
    y: usize,
    value: f64,
}

impl From<PredictionRecord> for PixelValue {
    fn from(r: PredictionRecord) -> Self {
        PixelValue::new(SpatialKey::new(r.col, r.row), r.x, r.y, r.value)
    }
}

/// Parse a `col,row,x,y,value` predictions CSV.
///
/// `col,row` is the tile key and `x,y` the pixel offset inside the tile.
/// The header line is required; columns are matched by name. Blank lines
/// and `#` comments are skipped.
pub fn read_predictions<R: Read>(reader: R) -> Result<Vec<PixelValue>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    rdr.deserialize::<PredictionRecord>()
        .map(|record| record.map(PixelValue::from).map_err(prediction_error))
        .collect()
}

fn prediction_error(e: csv::Error) -> Error {
    match e.position().map(|p| p.line()) {
        Some(line) => Error::InvalidParameter {
            name: "prediction",
            value: format!("line {}", line),
            reason: e.to_string(),
        },
        None => Error::Other(format!("reading predictions: {}", e)),
    }
}
