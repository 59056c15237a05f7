//! Zoom level resolution across several layer names

use crate::attributes::AttributeStore;
use tilestack_core::{Error, Result};
use tracing::debug;

/// The zoom level to read every layer of `names` at.
///
/// Returns the largest zoom stored for any of the names. Fails with
/// `NotFound` when `names` is empty or any name has no zoom level at all.
/// The result is not checked to exist for every name; a name that lacks it
/// fails later, at read time.
pub fn finest_zoom<S: AsRef<str>>(attributes: &AttributeStore, names: &[S]) -> Result<u32> {
    if names.is_empty() {
        return Err(Error::not_found("zoom level for an empty layer list"));
    }

    let mut finest = None;
    for name in names {
        let name = name.as_ref();
        let zoom = attributes
            .list_zooms(name)?
            .last()
            .copied()
            .ok_or_else(|| Error::not_found(format!("any zoom level of layer {}", name)))?;
        debug!(layer = name, zoom, "finest stored zoom");
        finest = finest.max(Some(zoom));
    }
    finest.ok_or_else(|| Error::not_found("zoom level"))
}
