//! LibSVM text export of samples
//!
//! One line per sample: `label index:value ...` with 1-based feature indices.
//! No-data features are omitted, which LibSVM reads as sparse zeros.

use super::Sample;
use std::io::{self, Write};

/// Write samples to `writer`, skipping samples whose label is no-data.
///
/// # Returns
/// Number of lines written.
pub fn write_libsvm<I, W>(samples: I, mut writer: W) -> io::Result<usize>
where
    I: IntoIterator<Item = Sample>,
    W: Write,
{
    let mut written = 0;
    for sample in samples {
        if sample.label.is_nan() {
            continue;
        }
        write!(writer, "{}", sample.label)?;
        for (i, v) in sample.features.iter().enumerate() {
            if !v.is_nan() {
                write!(writer, " {}:{}", i + 1, v)?;
            }
        }
        writeln!(writer)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
