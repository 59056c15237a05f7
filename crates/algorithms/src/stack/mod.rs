//! Layer stacking
//!
//! - `stack`: inner-join two multiband layers and concatenate their bands
//! - `build_stack`: fold `stack` over catalog layers at their finest zoom

mod band_stacker;
mod builder;

pub use band_stacker::{stack, stack_with, StackParams};
pub use builder::{build_and_write, build_stack, build_stack_with};
