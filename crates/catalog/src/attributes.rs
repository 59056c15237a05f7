//! Layer headers and named JSON attributes
//!
//! Every query goes straight to the backing store; nothing is cached, so two
//! handles over the same root always agree.

use crate::index::KeyIndexMethod;
use crate::store::{check_name, BackingStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tilestack_core::{Error, LayerId, LayerType, Result};
use tracing::debug;

/// Attribute name the layer metadata is stored under
pub const METADATA_ATTRIBUTE: &str = "metadata";

/// Per-layer descriptor written last, so its presence marks a complete layer.
///
/// Type names are kept as plain strings so that a header written by a newer
/// or foreign tool still parses; [`LayerHeader::layer_type`] decides whether
/// they are supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerHeader {
    pub key_class: String,
    pub value_class: String,
    pub key_index: KeyIndexMethod,
    /// Store-relative location of the tile blob
    pub location: String,
    #[serde(default)]
    pub tile_count: usize,
}

impl LayerHeader {
    pub fn new(
        layer_type: LayerType,
        key_index: KeyIndexMethod,
        location: impl Into<String>,
        tile_count: usize,
    ) -> Self {
        Self {
            key_class: layer_type.key.name().to_string(),
            value_class: layer_type.value.name().to_string(),
            key_index,
            location: location.into(),
            tile_count,
        }
    }

    /// Stored type, or `TypeMismatch` if either name is unsupported
    pub fn layer_type(&self) -> Result<LayerType> {
        LayerType::from_names(&self.key_class, &self.value_class)
    }
}

/// Metadata queries over a backing store.
#[derive(Debug, Clone)]
pub struct AttributeStore {
    store: Arc<dyn BackingStore>,
}

impl AttributeStore {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self { store }
    }

    pub fn backing(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    /// Whether a header is present for `(name, zoom)`
    pub fn exists(&self, id: &LayerId) -> Result<bool> {
        self.store.has_header(id)
    }

    /// Zoom levels present for a name.
    ///
    /// Empty if the name is unknown, including names no layer could be
    /// stored under.
    pub fn list_zooms(&self, name: &str) -> Result<BTreeSet<u32>> {
        if check_name(name).is_err() {
            return Ok(BTreeSet::new());
        }
        Ok(self.store.zooms(name)?.into_iter().collect())
    }

    /// Every stored layer id, sorted
    pub fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let mut ids = self.store.layer_ids()?;
        ids.sort();
        Ok(ids)
    }

    pub fn read_header(&self, id: &LayerId) -> Result<LayerHeader> {
        let bytes = self.store.read_header(id)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Corrupt(format!("header of layer {}: {}", id, e)))
    }

    pub fn write_header(&self, id: &LayerId, header: &LayerHeader) -> Result<()> {
        let bytes = to_json(header)?;
        self.store.write_header(id, &bytes)
    }

    pub fn read_attribute<T: DeserializeOwned>(&self, id: &LayerId, attribute: &str) -> Result<T> {
        let bytes = self.store.read_attribute(id, attribute)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Corrupt(format!("attribute {} of layer {}: {}", attribute, id, e)))
    }

    pub fn write_attribute<T: Serialize>(
        &self,
        id: &LayerId,
        attribute: &str,
        value: &T,
    ) -> Result<()> {
        let bytes = to_json(value)?;
        self.store.write_attribute(id, attribute, &bytes)
    }

    /// Remove one zoom level. Deleting an absent layer succeeds.
    pub fn delete(&self, id: &LayerId) -> Result<()> {
        debug!(layer = %id, "deleting layer");
        self.store.delete(id)
    }

    /// Remove every zoom of a name, then the location the name occupied.
    ///
    /// Per-zoom deletes can leave an empty location behind in the backing
    /// store; it is removed here as well.
    pub fn delete_all(&self, name: &str) -> Result<()> {
        for zoom in self.list_zooms(name)? {
            self.delete(&LayerId::new(name, zoom))?;
        }
        self.store.delete_name(name)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| Error::Other(format!("JSON encoding failed: {}", e)))
}
