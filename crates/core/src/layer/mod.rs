//! Layer identifiers, keys, metadata and keyed tile collections

mod collection;
mod id;
mod key;
mod metadata;
mod value;

pub use collection::{LayerCollection, MultibandTileLayer, TileLayer};
pub use id::LayerId;
pub use key::{KeyClass, LayerKey, LayerType, SpaceTimeKey, SpatialKey, ValueClass};
pub use metadata::{Extent, KeyBounds, LayoutDefinition, TileLayerMetadata};
pub use value::LayerValue;
