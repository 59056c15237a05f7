//! Tile value shapes a layer can hold

use crate::error::{Error, Result};
use crate::layer::ValueClass;
use crate::raster::{MultibandTile, Tile};

/// A tile value type a layer can be stored as.
pub trait LayerValue: Clone + Send + Sync + 'static {
    const CLASS: ValueClass;

    /// Dimensions as (rows, cols)
    fn shape(&self) -> (usize, usize);

    /// Bands in order, for encoding
    fn bands(&self) -> Vec<&Tile>;

    /// Rebuild a value from decoded bands stored under `stored`.
    ///
    /// A single-band layer read as multiband is promoted to a one-band tile.
    /// A multiband layer cannot be narrowed to a single band.
    fn from_bands(stored: ValueClass, bands: Vec<Tile>) -> Result<Self>;
}

impl LayerValue for Tile {
    const CLASS: ValueClass = ValueClass::SingleBand;

    fn shape(&self) -> (usize, usize) {
        Tile::shape(self)
    }

    fn bands(&self) -> Vec<&Tile> {
        vec![self]
    }

    fn from_bands(stored: ValueClass, bands: Vec<Tile>) -> Result<Self> {
        match stored {
            ValueClass::SingleBand => {
                let count = bands.len();
                let mut bands = bands.into_iter();
                match (bands.next(), bands.next()) {
                    (Some(tile), None) => Ok(tile),
                    _ => Err(Error::Corrupt(format!(
                        "single-band record holds {} bands",
                        count
                    ))),
                }
            }
            ValueClass::MultiBand => Err(Error::type_mismatch(
                "stored multiband",
                "requested singleband",
            )),
        }
    }
}

impl LayerValue for MultibandTile {
    const CLASS: ValueClass = ValueClass::MultiBand;

    fn shape(&self) -> (usize, usize) {
        MultibandTile::shape(self)
    }

    fn bands(&self) -> Vec<&Tile> {
        MultibandTile::bands(self).iter().collect()
    }

    fn from_bands(stored: ValueClass, bands: Vec<Tile>) -> Result<Self> {
        match stored {
            ValueClass::SingleBand => {
                let tile = Tile::from_bands(stored, bands)?;
                Ok(MultibandTile::from_single(tile))
            }
            ValueClass::MultiBand => MultibandTile::new(bands),
        }
    }
}
