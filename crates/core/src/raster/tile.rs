//! Runtime-typed single-band and multiband tiles

use crate::error::{Error, Result};
use crate::raster::{CellType, TypedTile};

/// A single-band tile whose cell type is known only at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Tile {
    Int8(TypedTile<i8>),
    UInt8(TypedTile<u8>),
    Int16(TypedTile<i16>),
    UInt16(TypedTile<u16>),
    Int32(TypedTile<i32>),
    Float32(TypedTile<f32>),
    Float64(TypedTile<f64>),
}

/// Apply the same expression to whichever typed tile is inside.
macro_rules! with_tile {
    ($tile:expr, $t:ident => $body:expr) => {
        match $tile {
            Tile::Int8($t) => $body,
            Tile::UInt8($t) => $body,
            Tile::Int16($t) => $body,
            Tile::UInt16($t) => $body,
            Tile::Int32($t) => $body,
            Tile::Float32($t) => $body,
            Tile::Float64($t) => $body,
        }
    };
}

macro_rules! impl_from_typed {
    ($t:ty, $variant:ident) => {
        impl From<TypedTile<$t>> for Tile {
            fn from(tile: TypedTile<$t>) -> Self {
                Tile::$variant(tile)
            }
        }
    };
}

impl_from_typed!(i8, Int8);
impl_from_typed!(u8, UInt8);
impl_from_typed!(i16, Int16);
impl_from_typed!(u16, UInt16);
impl_from_typed!(i32, Int32);
impl_from_typed!(f32, Float32);
impl_from_typed!(f64, Float64);

impl Tile {
    /// A tile of the given type with every cell set to no-data
    pub fn empty(cell_type: CellType, rows: usize, cols: usize) -> Self {
        match cell_type {
            CellType::Int8 => TypedTile::<i8>::empty(rows, cols).into(),
            CellType::UInt8 => TypedTile::<u8>::empty(rows, cols).into(),
            CellType::Int16 => TypedTile::<i16>::empty(rows, cols).into(),
            CellType::UInt16 => TypedTile::<u16>::empty(rows, cols).into(),
            CellType::Int32 => TypedTile::<i32>::empty(rows, cols).into(),
            CellType::Float32 => TypedTile::<f32>::empty(rows, cols).into(),
            CellType::Float64 => TypedTile::<f64>::empty(rows, cols).into(),
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Tile::Int8(_) => CellType::Int8,
            Tile::UInt8(_) => CellType::UInt8,
            Tile::Int16(_) => CellType::Int16,
            Tile::UInt16(_) => CellType::UInt16,
            Tile::Int32(_) => CellType::Int32,
            Tile::Float32(_) => CellType::Float32,
            Tile::Float64(_) => CellType::Float64,
        }
    }

    pub fn rows(&self) -> usize {
        with_tile!(self, t => t.rows())
    }

    pub fn cols(&self) -> usize {
        with_tile!(self, t => t.cols())
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        with_tile!(self, t => t.shape())
    }

    pub fn len(&self) -> usize {
        with_tile!(self, t => t.len())
    }

    pub fn is_empty(&self) -> bool {
        with_tile!(self, t => t.is_empty())
    }

    /// Cell value widened to f64; no-data reads as NaN
    pub fn get_f64(&self, row: usize, col: usize) -> Result<f64> {
        with_tile!(self, t => t.get_f64(row, col))
    }

    /// No-data value widened to f64, if the tile declares one
    pub fn nodata_f64(&self) -> Option<f64> {
        with_tile!(self, t => t.nodata().and_then(|nd| num_traits::cast(nd)))
    }

    /// Row-major cell values widened to f64; no-data reads as NaN
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_tile!(self, t => t
            .data()
            .iter()
            .map(|&v| if t.is_nodata(v) { f64::NAN } else { num_traits::cast(v).unwrap_or(f64::NAN) })
            .collect())
    }

    /// Convert to another cell type
    pub fn convert(&self, cell_type: CellType) -> Tile {
        if self.cell_type() == cell_type {
            return self.clone();
        }
        with_tile!(self, t => match cell_type {
            CellType::Int8 => Tile::Int8(t.convert()),
            CellType::UInt8 => Tile::UInt8(t.convert()),
            CellType::Int16 => Tile::Int16(t.convert()),
            CellType::UInt16 => Tile::UInt16(t.convert()),
            CellType::Int32 => Tile::Int32(t.convert()),
            CellType::Float32 => Tile::Float32(t.convert()),
            CellType::Float64 => Tile::Float64(t.convert()),
        })
    }

    /// Crop or pad to `rows` x `cols`, anchored top-left
    pub fn crop(&self, rows: usize, cols: usize) -> Tile {
        with_tile!(self, t => t.crop(rows, cols).into())
    }
}

/// An ordered sequence of same-sized bands.
///
/// Band order is significant: concatenation always appends, so band indices
/// of the left operand are preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct MultibandTile {
    bands: Vec<Tile>,
}

impl MultibandTile {
    /// Create a multiband tile; every band must share the first band's shape
    pub fn new(bands: Vec<Tile>) -> Result<Self> {
        let first = bands.first().ok_or_else(|| Error::InvalidParameter {
            name: "bands",
            value: "0".into(),
            reason: "a multiband tile needs at least one band".into(),
        })?;
        let (er, ec) = first.shape();
        if let Some(bad) = bands.iter().find(|b| b.shape() != (er, ec)) {
            let (ar, ac) = bad.shape();
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(Self { bands })
    }

    /// Promote a single-band tile to a one-band multiband tile
    pub fn from_single(tile: Tile) -> Self {
        Self { bands: vec![tile] }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&Tile> {
        self.bands.get(index)
    }

    pub fn bands(&self) -> &[Tile] {
        &self.bands
    }

    /// Dimensions as (rows, cols), shared by all bands
    pub fn shape(&self) -> (usize, usize) {
        self.bands[0].shape()
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// Append every band of `other` after every band of `self`
    pub fn concat(self, other: MultibandTile) -> Result<Self> {
        let mut bands = self.bands;
        bands.extend(other.bands);
        Self::new(bands)
    }

    /// Convert every band to one cell type
    pub fn convert(&self, cell_type: CellType) -> Self {
        Self {
            bands: self.bands.iter().map(|b| b.convert(cell_type)).collect(),
        }
    }

    /// Crop or pad every band to `rows` x `cols`
    pub fn crop(&self, rows: usize, cols: usize) -> Self {
        Self {
            bands: self.bands.iter().map(|b| b.crop(rows, cols)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(value: f64) -> Tile {
        TypedTile::<f64>::filled(4, 4, value).into()
    }

    #[test]
    fn test_convert_changes_cell_type() {
        let tile: Tile = TypedTile::<u8>::filled(2, 2, 9).into();
        let converted = tile.convert(CellType::Float64);
        assert_eq!(converted.cell_type(), CellType::Float64);
        assert_eq!(converted.get_f64(1, 1).unwrap(), 9.0);
    }

    #[test]
    fn test_multiband_rejects_mixed_shapes() {
        let small: Tile = TypedTile::<f64>::filled(2, 2, 0.0).into();
        let err = MultibandTile::new(vec![band(1.0), small]).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
        assert!(MultibandTile::new(Vec::new()).is_err());
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = MultibandTile::new(vec![band(1.0), band(2.0)]).unwrap();
        let b = MultibandTile::from_single(band(3.0));
        let stacked = a.concat(b).unwrap();
        let firsts: Vec<f64> = stacked
            .bands()
            .iter()
            .map(|t| t.get_f64(0, 0).unwrap())
            .collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_tile_reads_nan() {
        let tile = Tile::empty(CellType::Int16, 3, 3);
        assert!(tile.get_f64(2, 2).unwrap().is_nan());
        assert_eq!(tile.nodata_f64(), Some(i16::MIN as f64));
    }
}
