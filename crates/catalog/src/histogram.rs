//! Fixed-bin histograms of layer cell values
//!
//! Written alongside single-band spatial layers so that later visualization
//! or classification can pick value breaks without rescanning tiles.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tilestack_core::Tile;

/// Default number of equal-width buckets
pub const DEFAULT_BUCKETS: usize = 256;

/// Attribute name histograms are stored under
pub const HISTOGRAM_ATTRIBUTE: &str = "histogram";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Smallest valid value, `None` if every cell was no-data
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Counts per equal-width bucket spanning `[min, max]`
    pub counts: Vec<u64>,
    /// Number of valid cells
    pub total: u64,
    pub nodata: u64,
    /// Zoom level of the layer the histogram was computed from
    #[serde(default)]
    pub zoom: u32,
}

impl Histogram {
    /// Two passes over the tiles: value range first, then bucket counts.
    pub fn from_tiles(tiles: &[&Tile], buckets: usize) -> Self {
        let buckets = buckets.max(1);

        let (min, max, total, nodata) = tiles
            .par_iter()
            .map(|tile| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                let mut valid = 0u64;
                let mut missing = 0u64;
                for v in tile.to_f64_vec() {
                    if v.is_finite() {
                        min = min.min(v);
                        max = max.max(v);
                        valid += 1;
                    } else {
                        missing += 1;
                    }
                }
                (min, max, valid, missing)
            })
            .reduce(
                || (f64::INFINITY, f64::NEG_INFINITY, 0, 0),
                |a, b| (a.0.min(b.0), a.1.max(b.1), a.2 + b.2, a.3 + b.3),
            );

        if total == 0 {
            return Self {
                min: None,
                max: None,
                counts: vec![0; buckets],
                total: 0,
                nodata,
                zoom: 0,
            };
        }

        let width = (max - min) / buckets as f64;
        let counts = tiles
            .par_iter()
            .map(|tile| {
                let mut counts = vec![0u64; buckets];
                for v in tile.to_f64_vec() {
                    if v.is_finite() {
                        counts[bucket_index(v, min, width, buckets)] += 1;
                    }
                }
                counts
            })
            .reduce(
                || vec![0u64; buckets],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            );

        Self {
            min: Some(min),
            max: Some(max),
            counts,
            total,
            nodata,
            zoom: 0,
        }
    }

    /// Same histogram, tagged with the zoom level it was computed from
    pub fn at_zoom(mut self, zoom: u32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn buckets(&self) -> usize {
        self.counts.len()
    }

    /// Value range `[lo, hi)` of one bucket
    pub fn bucket_bounds(&self, bucket: usize) -> Option<(f64, f64)> {
        let (min, max) = (self.min?, self.max?);
        if bucket >= self.counts.len() {
            return None;
        }
        let width = (max - min) / self.counts.len() as f64;
        Some((min + width * bucket as f64, min + width * (bucket + 1) as f64))
    }

    /// `n - 1` upper bucket edges splitting the valid cells into `n` classes
    /// of roughly equal population
    pub fn quantile_breaks(&self, n: usize) -> Vec<f64> {
        if n < 2 || self.total == 0 {
            return Vec::new();
        }
        let mut breaks = Vec::with_capacity(n - 1);
        let mut seen = 0u64;
        let mut next = 1;
        for (i, &count) in self.counts.iter().enumerate() {
            seen += count;
            while next < n && seen * n as u64 >= self.total * next as u64 {
                if let Some((_, hi)) = self.bucket_bounds(i) {
                    breaks.push(hi);
                }
                next += 1;
            }
        }
        breaks
    }
}

fn bucket_index(v: f64, min: f64, width: f64, buckets: usize) -> usize {
    if width <= 0.0 {
        return 0;
    }
    (((v - min) / width) as usize).min(buckets - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tilestack_core::TypedTile;

    fn ramp(rows: usize, cols: usize) -> Tile {
        let data = (0..rows * cols).map(|v| v as f64).collect();
        TypedTile::from_vec(data, rows, cols).unwrap().into()
    }

    #[test]
    fn test_counts_cover_every_valid_cell() {
        let a = ramp(10, 10);
        let mut b: TypedTile<f64> = TypedTile::filled(10, 10, 50.0);
        b.set(0, 0, f64::NAN).unwrap();
        let b: Tile = b.into();

        let h = Histogram::from_tiles(&[&a, &b], 10);
        assert_eq!(h.total, 199);
        assert_eq!(h.nodata, 1);
        assert_eq!(h.counts.iter().sum::<u64>(), 199);
        assert_eq!(h.min, Some(0.0));
        assert_eq!(h.max, Some(99.0));
        // The last bucket is closed on the right.
        assert!(h.counts[9] >= 1);
    }

    #[test]
    fn test_all_nodata() {
        let t = Tile::empty(tilestack_core::CellType::Float64, 4, 4);
        let h = Histogram::from_tiles(&[&t], 8);
        assert_eq!(h.total, 0);
        assert_eq!(h.nodata, 16);
        assert!(h.quantile_breaks(4).is_empty());
    }

    #[test]
    fn test_quantile_breaks_split_uniform_data() {
        let t = ramp(100, 100);
        let h = Histogram::from_tiles(&[&t], 100);
        let breaks = h.quantile_breaks(4);
        assert_eq!(breaks.len(), 3);
        assert_relative_eq!(breaks[1], 4999.5, epsilon = 100.0);
    }
}
