//! Z-order (Morton) curve over (col, row)

/// Interleaves column bits (even positions) with row bits (odd positions).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZCurveIndex;

impl ZCurveIndex {
    pub fn index(&self, col: u32, row: u32) -> u64 {
        spread(col) | (spread(row) << 1)
    }
}

/// Spread the 32 bits of `v` over the even bits of a u64
fn spread(v: u32) -> u64 {
    let mut x = v as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}
