//! 3-D Hilbert curve over (col, row, time bucket)
//!
//! Uses Skilling's transpose formulation ("Programming the Hilbert curve",
//! AIP Conf. Proc. 707, 2004).

use tilestack_core::layer::KeyBounds;

/// Largest per-axis bit depth that still fits three axes into a u64
const MAX_BITS: u32 = 21;

#[derive(Debug, Clone)]
pub struct HilbertIndex {
    min_col: u32,
    min_row: u32,
    min_instant: i64,
    max_instant: i64,
    temporal_resolution: u32,
    bits: u32,
}

impl HilbertIndex {
    /// Build an index sized to cover `bounds`
    pub fn new(bounds: Option<KeyBounds>, temporal_resolution: u32) -> Self {
        let temporal_resolution = temporal_resolution.min(MAX_BITS);
        let b = bounds.unwrap_or(KeyBounds {
            min_col: 0,
            min_row: 0,
            max_col: 0,
            max_row: 0,
            min_instant: 0,
            max_instant: 0,
        });
        let x_bits = bits_for(b.max_col.saturating_sub(b.min_col));
        let y_bits = bits_for(b.max_row.saturating_sub(b.min_row));
        let bits = x_bits.max(y_bits).max(temporal_resolution).clamp(1, MAX_BITS);
        Self {
            min_col: b.min_col,
            min_row: b.min_row,
            min_instant: b.min_instant,
            max_instant: b.max_instant,
            temporal_resolution,
            bits,
        }
    }

    pub fn temporal_resolution(&self) -> u32 {
        self.temporal_resolution
    }

    /// Bits per axis
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Bucket of an instant within the bounds' time range
    fn time_bucket(&self, instant: i64) -> u32 {
        let buckets = 1i128 << self.temporal_resolution;
        let span = self.max_instant as i128 - self.min_instant as i128 + 1;
        if span <= 1 {
            return 0;
        }
        let offset = (instant as i128 - self.min_instant as i128).clamp(0, span - 1);
        ((offset * buckets) / span) as u32
    }

    pub fn index(&self, col: u32, row: u32, instant: i64) -> u64 {
        let mask = (1u32 << self.bits) - 1;
        let coords = [
            col.saturating_sub(self.min_col) & mask,
            row.saturating_sub(self.min_row) & mask,
            self.time_bucket(instant) & mask,
        ];
        hilbert_index(coords, self.bits)
    }
}

fn bits_for(range: u32) -> u32 {
    32 - range.leading_zeros()
}

/// Hilbert distance of a point in a `2^bits` cube
pub(crate) fn hilbert_index(mut x: [u32; 3], bits: u32) -> u64 {
    let n = x.len();
    let m = 1u32 << (bits - 1);

    // Inverse undo excess work
    let mut q = m;
    while q > 1 {
        let p = q - 1;
        for i in 0..n {
            if x[i] & q != 0 {
                x[0] ^= p;
            } else {
                let t = (x[0] ^ x[i]) & p;
                x[0] ^= t;
                x[i] ^= t;
            }
        }
        q >>= 1;
    }

    // Gray encode
    for i in 1..n {
        x[i] ^= x[i - 1];
    }
    let mut t = 0;
    let mut q = m;
    while q > 1 {
        if x[n - 1] & q != 0 {
            t ^= q - 1;
        }
        q >>= 1;
    }
    for xi in x.iter_mut() {
        *xi ^= t;
    }

    // Interleave the transposed form, most significant bit first
    let mut h = 0u64;
    for j in (0..bits).rev() {
        for xi in &x {
            h = (h << 1) | ((xi >> j) & 1) as u64;
        }
    }
    h
}
