//! Backing persistence for layer headers, attributes and tile blobs
//!
//! A store treats every payload as an opaque blob keyed by [`LayerId`]; the
//! attribute store and codec decide what goes inside.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;
use tilestack_core::{Error, LayerId, Result};

/// Persistence the catalog is built on.
///
/// Reads of absent objects fail with [`Error::NotFound`]; deletes of absent
/// objects succeed.
pub trait BackingStore: Send + Sync + fmt::Debug {
    /// Human-readable location of the store root
    fn root(&self) -> String;

    /// Every layer id with a header present
    fn layer_ids(&self) -> Result<Vec<LayerId>>;

    /// Zoom levels with a header present for one name
    fn zooms(&self, name: &str) -> Result<Vec<u32>> {
        Ok(self
            .layer_ids()?
            .into_iter()
            .filter(|id| id.name == name)
            .map(|id| id.zoom)
            .collect())
    }

    fn has_header(&self, id: &LayerId) -> Result<bool>;

    fn read_header(&self, id: &LayerId) -> Result<Vec<u8>>;

    fn write_header(&self, id: &LayerId, bytes: &[u8]) -> Result<()>;

    /// Store-relative location of a layer's tile blob
    fn tiles_location(&self, id: &LayerId) -> String;

    fn read_tiles(&self, id: &LayerId) -> Result<Vec<u8>>;

    fn write_tiles(&self, id: &LayerId, bytes: &[u8]) -> Result<()>;

    fn read_attribute(&self, id: &LayerId, attribute: &str) -> Result<Vec<u8>>;

    fn write_attribute(&self, id: &LayerId, attribute: &str, bytes: &[u8]) -> Result<()>;

    /// Remove everything stored under one layer id
    fn delete(&self, id: &LayerId) -> Result<()>;

    /// Remove everything stored under a name, including empty locations
    fn delete_name(&self, name: &str) -> Result<()>;
}

/// Layer names become path components, so keep them to one safe segment.
pub(crate) fn check_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(Error::InvalidParameter {
            name: "layer name",
            value: name.to_string(),
            reason: "must be a single non-empty path segment without '/', '\\' or ':'".into(),
        });
    }
    Ok(())
}
