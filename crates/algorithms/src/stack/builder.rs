//! Multi-layer stacking against a catalog

use super::band_stacker::{stack_with, StackParams};
use tilestack_catalog::{finest_zoom, CatalogHandle};
use tilestack_core::{Error, LayerId, MultibandTileLayer, Result};
use tracing::{debug, info};

/// Read every layer of `names` at the finest zoom and stack them in order.
///
/// Single-band layers are promoted to one-band tiles on read. The first layer
/// that is missing at the resolved zoom aborts the build. Nothing is written.
/// A single name yields that layer as read.
///
/// # Returns
/// The stacked layer and the zoom it was read at.
pub fn build_stack<S: AsRef<str>>(
    handle: &CatalogHandle,
    names: &[S],
) -> Result<(MultibandTileLayer, u32)> {
    build_stack_with(handle, names, StackParams::default())
}

pub fn build_stack_with<S: AsRef<str>>(
    handle: &CatalogHandle,
    names: &[S],
    params: StackParams,
) -> Result<(MultibandTileLayer, u32)> {
    let zoom = finest_zoom(handle.catalog.attributes(), names)?;
    debug!(zoom, layers = names.len(), "resolved stack zoom");

    let mut acc: Option<MultibandTileLayer> = None;
    for name in names {
        let id = LayerId::new(name.as_ref(), zoom);
        let layer: MultibandTileLayer = handle.catalog.read(&id)?;
        debug!(layer = %id, tiles = layer.len(), "read stack input");
        acc = Some(match acc {
            None => layer,
            Some(stacked) => stack_with(&handle.engine, &stacked, &layer, params)?,
        });
    }

    let stacked = acc.ok_or_else(|| Error::not_found("layers to stack"))?;
    info!(
        layers = names.len(),
        zoom,
        tiles = stacked.len(),
        "built layer stack"
    );
    Ok((stacked, zoom))
}

/// Build a stack and write it as `output` at the resolved zoom
pub fn build_and_write<S: AsRef<str>>(
    handle: &CatalogHandle,
    names: &[S],
    output: &str,
) -> Result<LayerId> {
    let (stacked, zoom) = build_stack(handle, names)?;
    let id = LayerId::new(output, zoom);
    handle.catalog.write(&id, &stacked)?;
    Ok(id)
}
