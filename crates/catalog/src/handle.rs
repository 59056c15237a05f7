//! Explicit catalog + engine context passed to every pipeline stage

use crate::catalog::LayerCatalog;
use crate::histogram::DEFAULT_BUCKETS;
use crate::store::BackingStore;
use std::path::PathBuf;
use std::sync::Arc;
use tilestack_core::{Error, Result};
use tilestack_parallel::{Engine, EngineError, ProcessingMode};
use tracing::debug;

/// Configuration for opening a [`CatalogHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    pub mode: ProcessingMode,
    /// Buckets of the histogram recorded with single-band spatial writes
    pub histogram_buckets: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Parallel,
            histogram_buckets: DEFAULT_BUCKETS,
        }
    }
}

impl CatalogConfig {
    pub fn local() -> Self {
        Self {
            mode: ProcessingMode::Sequential,
            ..Self::default()
        }
    }
}

/// A catalog together with the engine that fans out work over its layers.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    pub catalog: LayerCatalog,
    pub engine: Engine,
}

impl CatalogHandle {
    /// Open a directory-backed catalog
    pub fn open(root: impl Into<PathBuf>, config: CatalogConfig) -> Result<Self> {
        let root = root.into();
        debug!(root = %root.display(), mode = %config.mode, "opening catalog");
        Self::from_catalog(LayerCatalog::open(root), config)
    }

    /// Wrap any backing store
    pub fn with_store(store: Arc<dyn BackingStore>, config: CatalogConfig) -> Result<Self> {
        Self::from_catalog(LayerCatalog::new(store), config)
    }

    fn from_catalog(catalog: LayerCatalog, config: CatalogConfig) -> Result<Self> {
        let engine = Engine::new(config.mode).map_err(engine_error)?;
        Ok(Self {
            catalog: catalog.with_histogram_buckets(config.histogram_buckets),
            engine,
        })
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// Engine setup failures surface as [`Error::Engine`]
pub fn engine_error(e: EngineError) -> Error {
    Error::Engine(e.to_string())
}
