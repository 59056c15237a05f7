//! Named, zoom-levelled layer catalog

use crate::attributes::{AttributeStore, LayerHeader, METADATA_ATTRIBUTE};
use crate::codec::{AnyLayer, LayerCodec};
use crate::histogram::{Histogram, HISTOGRAM_ATTRIBUTE};
use crate::store::{BackingStore, FileStore};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tilestack_core::{
    Error, LayerCollection, LayerId, LayerKey, LayerType, LayerValue, Result, SpatialKey, Tile,
    TileLayerMetadata,
};
use tracing::{debug, info};

/// Reads, writes and deletes layers in one backing store.
#[derive(Debug, Clone)]
pub struct LayerCatalog {
    codec: LayerCodec,
}

impl LayerCatalog {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self {
            codec: LayerCodec::new(AttributeStore::new(store)),
        }
    }

    /// Catalog over a directory tree
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(root)))
    }

    pub fn with_histogram_buckets(mut self, buckets: usize) -> Self {
        self.codec = self.codec.with_histogram_buckets(buckets);
        self
    }

    pub fn attributes(&self) -> &AttributeStore {
        self.codec.attributes()
    }

    pub fn root(&self) -> String {
        self.attributes().backing().root()
    }

    /// Read a layer; `NotFound` if no header exists for `id`
    pub fn read<K: LayerKey, V: LayerValue>(&self, id: &LayerId) -> Result<LayerCollection<K, V>> {
        self.codec.read(id)
    }

    pub fn read_any(&self, id: &LayerId) -> Result<AnyLayer> {
        self.codec.read_any(id)
    }

    /// Replace whatever is stored under `id` with `layer`.
    ///
    /// The layer is validated before the existing one is deleted. Delete and
    /// write are not atomic together: a failed write leaves `id` absent.
    pub fn write<K: LayerKey, V: LayerValue>(
        &self,
        id: &LayerId,
        layer: &LayerCollection<K, V>,
    ) -> Result<()> {
        layer.validate()?;
        if self.exists(id)? {
            debug!(layer = %id, "replacing existing layer");
            self.delete(id)?;
        }
        self.codec.write(id, layer)?;
        info!(layer = %id, tiles = layer.len(), "layer written");
        Ok(())
    }

    /// Delete one zoom level of a layer.
    ///
    /// Zoom 0 also holds the name's histogram slot; a histogram computed from
    /// another zoom survives the delete.
    pub fn delete(&self, id: &LayerId) -> Result<()> {
        let kept = match id.zoom {
            0 => self.stored_histogram(&id.name)?.filter(|h| h.zoom != 0),
            _ => None,
        };
        self.attributes().delete(id)?;
        if let Some(histogram) = kept {
            debug!(layer = %id, source_zoom = histogram.zoom, "keeping histogram slot");
            self.attributes()
                .write_attribute(id, HISTOGRAM_ATTRIBUTE, &histogram)?;
        }
        Ok(())
    }

    pub fn delete_all(&self, name: &str) -> Result<()> {
        self.attributes().delete_all(name)
    }

    pub fn exists(&self, id: &LayerId) -> Result<bool> {
        self.attributes().exists(id)
    }

    pub fn list_zooms(&self, name: &str) -> Result<BTreeSet<u32>> {
        self.attributes().list_zooms(name)
    }

    pub fn layer_ids(&self) -> Result<Vec<LayerId>> {
        self.attributes().layer_ids()
    }

    pub fn header(&self, id: &LayerId) -> Result<LayerHeader> {
        self.attributes().read_header(id)
    }

    /// Metadata of a stored layer, without reading its tiles
    pub fn metadata(&self, id: &LayerId) -> Result<TileLayerMetadata> {
        self.attributes().read_attribute(id, METADATA_ATTRIBUTE)
    }

    /// Histogram recorded by the last single-band spatial write of `name`.
    ///
    /// There is one slot per name, stored under zoom 0. It is `NotFound` once
    /// the zoom it was computed from is deleted or replaced by a layer of
    /// another type.
    pub fn histogram(&self, name: &str) -> Result<Histogram> {
        let histogram = self
            .stored_histogram(name)?
            .ok_or_else(|| Error::not_found(format!("histogram of layer {}", name)))?;
        let source = LayerId::new(name, histogram.zoom);
        let current = match self.header(&source) {
            Ok(header) => header.layer_type()? == LayerType::of::<SpatialKey, Tile>(),
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };
        if !current {
            return Err(Error::not_found(format!(
                "histogram of layer {} (source {} is gone)",
                name, source
            )));
        }
        Ok(histogram)
    }

    fn stored_histogram(&self, name: &str) -> Result<Option<Histogram>> {
        match self
            .attributes()
            .read_attribute(&LayerId::new(name, 0), HISTOGRAM_ATTRIBUTE)
        {
            Ok(h) => Ok(Some(h)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
