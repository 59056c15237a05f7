//! # TileStack Catalog
//!
//! Persistence for named, zoom-levelled tile layers.
//!
//! - [`store`]: backing stores (directory tree, in-memory)
//! - [`AttributeStore`]: layer headers and JSON attributes
//! - [`index`]: Z-order and Hilbert key indexes
//! - [`LayerCodec`] / [`LayerCatalog`]: typed reads and writes
//! - [`finest_zoom`]: zoom resolution across several layers
//! - [`CatalogHandle`]: the catalog and engine passed to pipeline stages

pub mod attributes;
pub mod catalog;
pub mod codec;
pub mod handle;
pub mod histogram;
pub mod index;
pub mod store;
pub mod zoom;

pub use attributes::{AttributeStore, LayerHeader};
pub use catalog::LayerCatalog;
pub use codec::{AnyLayer, LayerCodec};
pub use handle::{CatalogConfig, CatalogHandle};
pub use histogram::Histogram;
pub use index::{index_method, KeyIndexMethod, LayerIndex};
pub use store::{BackingStore, FileStore, MemoryStore};
pub use zoom::finest_zoom;
