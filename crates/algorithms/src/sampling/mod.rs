//! Pixel-level scatter and gather
//!
//! - `to_samples`: one labelled sample per pixel of a multiband layer
//! - `from_samples`: per-pixel values back into single-band tiles
//! - `write_libsvm` / `read_predictions`: LibSVM out, CSV in, for an external
//!   classifier

mod libsvm;
mod reassembler;
mod sampler;

pub use libsvm::write_libsvm;
pub use reassembler::{from_samples, read_predictions, PixelValue};
pub use sampler::{to_samples, Sample};
