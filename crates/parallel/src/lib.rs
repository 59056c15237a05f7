//! # TileStack Parallel
//!
//! Data-parallel execution for tile collections.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, global-pool or dedicated-pool execution
//! - `Engine`: per-element map and flat-map, shuffle-style join and group by key

pub mod engine;
pub mod strategy;

pub use engine::Engine;
pub use strategy::{EngineError, ProcessingMode};
