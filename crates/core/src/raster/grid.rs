//! Statically typed single-band tile

use crate::error::{Error, Result};
use crate::raster::RasterElement;
use ndarray::{s, Array2};

/// A dense 2D grid of cells of one element type.
///
/// Cells are stored in row-major order and addressed as `(row, col)`, where
/// `col` is the pixel x offset and `row` the pixel y offset inside the tile.
///
/// # Example
///
/// ```ignore
/// use tilestack_core::raster::TypedTile;
///
/// let mut tile: TypedTile<f64> = TypedTile::empty(256, 256);
/// tile.set(10, 20, 42.0)?;
/// assert_eq!(tile.get(10, 20)?, 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TypedTile<T: RasterElement> {
    data: Array2<T>,
    nodata: Option<T>,
}

impl<T: RasterElement> TypedTile<T> {
    /// Create a new tile filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            nodata: None,
        }
    }

    /// Create a tile where every cell is the type's no-data sentinel
    pub fn empty(rows: usize, cols: usize) -> Self {
        let nodata = T::default_nodata();
        Self {
            data: Array2::from_elem((rows, cols), nodata),
            nodata: Some(nodata),
        }
    }

    /// Create a tile from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            nodata: None,
        })
    }

    /// Builder-style no-data setter
    pub fn with_nodata(mut self, nodata: Option<T>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            }),
        }
    }

    /// Value at (row, col) widened to f64; no-data cells become NaN
    pub fn get_f64(&self, row: usize, col: usize) -> Result<f64> {
        let value = self.get(row, col)?;
        if self.is_nodata(value) {
            return Ok(f64::NAN);
        }
        Ok(value.to_f64().unwrap_or(f64::NAN))
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Check if a value is no-data for this tile
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Convert every cell to another element type.
    ///
    /// No-data cells map to the target type's sentinel, and so do values that
    /// do not fit the target type. The result always carries a no-data value.
    pub fn convert<U: RasterElement>(&self) -> TypedTile<U> {
        let target_nodata = U::default_nodata();
        let data = self.data.mapv(|v| {
            if self.is_nodata(v) {
                target_nodata
            } else {
                v.to_f64().map(U::from_f64).unwrap_or(target_nodata)
            }
        });
        TypedTile {
            data,
            nodata: Some(target_nodata),
        }
    }

    /// Crop (or pad) to exactly `rows` x `cols`, anchored at the top-left cell.
    ///
    /// Kept cells are never relabelled. Padded cells hold the tile's no-data
    /// value, or the type's sentinel if it declares none; in that case the
    /// sentinel is only declared as no-data when no kept cell carries it.
    pub fn crop(&self, rows: usize, cols: usize) -> Self {
        if self.shape() == (rows, cols) {
            return self.clone();
        }
        let keep_rows = rows.min(self.rows());
        let keep_cols = cols.min(self.cols());
        let kept = self.data.slice(s![..keep_rows, ..keep_cols]);
        let padded = rows > self.rows() || cols > self.cols();

        let fill = self.nodata.unwrap_or_else(T::default_nodata);
        let nodata = match self.nodata {
            Some(nd) => Some(nd),
            None if padded && !kept.iter().any(|v| v.is_nodata(Some(fill))) => Some(fill),
            None => None,
        };

        let mut data = Array2::from_elem((rows, cols), fill);
        data.slice_mut(s![..keep_rows, ..keep_cols]).assign(&kept);
        Self { data, nodata }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_creation() {
        let tile: TypedTile<f32> = TypedTile::filled(100, 200, 0.0);
        assert_eq!(tile.rows(), 100);
        assert_eq!(tile.cols(), 200);
        assert_eq!(tile.shape(), (100, 200));
    }

    #[test]
    fn test_tile_access() {
        let mut tile: TypedTile<f32> = TypedTile::filled(10, 10, 0.0);
        tile.set(5, 5, 42.0).unwrap();
        assert_eq!(tile.get(5, 5).unwrap(), 42.0);
        assert!(tile.set(10, 0, 1.0).is_err());
    }

    #[test]
    fn test_empty_tile_is_all_nodata() {
        let tile: TypedTile<u8> = TypedTile::empty(4, 4);
        assert_eq!(tile.nodata(), Some(0));
        assert!(tile.get_f64(3, 3).unwrap().is_nan());
    }

    #[test]
    fn test_convert_maps_nodata_to_nan() {
        let mut tile: TypedTile<i16> = TypedTile::filled(2, 2, 7).with_nodata(Some(-1));
        tile.set(0, 1, -1).unwrap();
        let converted: TypedTile<f64> = tile.convert();
        assert_eq!(converted.get(0, 0).unwrap(), 7.0);
        assert!(converted.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_crop_pads_with_nodata() {
        let tile: TypedTile<f64> = TypedTile::filled(2, 3, 1.0);
        let cropped = tile.crop(3, 2);
        assert_eq!(cropped.shape(), (3, 2));
        assert_eq!(cropped.get(1, 1).unwrap(), 1.0);
        assert!(cropped.get(2, 0).unwrap().is_nan());
    }

    #[test]
    fn test_crop_keeps_zero_cells_without_nodata() {
        let tile: TypedTile<u8> = TypedTile::filled(6, 6, 0);
        let cropped = tile.crop(4, 4);
        assert_eq!(cropped.nodata(), None);
        assert_eq!(cropped.get_f64(3, 3).unwrap(), 0.0);

        let padded = tile.crop(8, 8);
        assert_eq!(padded.nodata(), None);
        assert_eq!(padded.get_f64(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_crop_declares_sentinel_only_when_unused() {
        let tile: TypedTile<i16> = TypedTile::filled(2, 2, 5);
        let padded = tile.crop(3, 3);
        assert_eq!(padded.nodata(), Some(i16::MIN));
        assert_eq!(padded.get_f64(1, 1).unwrap(), 5.0);
        assert!(padded.get_f64(2, 2).unwrap().is_nan());
    }

    #[test]
    fn test_crop_keeps_declared_nodata() {
        let tile: TypedTile<u8> = TypedTile::filled(2, 2, 0).with_nodata(Some(255));
        let padded = tile.crop(3, 3);
        assert_eq!(padded.nodata(), Some(255));
        assert_eq!(padded.get_f64(0, 0).unwrap(), 0.0);
        assert!(padded.get_f64(2, 2).unwrap().is_nan());
    }
}
