//! # TileStack Algorithms
//!
//! Pipeline stages over catalog layers.
//!
//! ## Available Stages
//!
//! - **stack**: band stacking of two layers, multi-layer stacks built from a catalog
//! - **sampling**: per-pixel labelled samples, reassembly of per-pixel values,
//!   LibSVM export and prediction import

pub mod sampling;
pub mod stack;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::sampling::{
        from_samples, read_predictions, to_samples, write_libsvm, PixelValue, Sample,
    };
    pub use crate::stack::{build_and_write, build_stack, stack, stack_with, StackParams};
    pub use tilestack_catalog::{CatalogConfig, CatalogHandle};
    pub use tilestack_core::prelude::*;
    pub use tilestack_parallel::Engine;
}
