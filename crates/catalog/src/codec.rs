//! Typed layer reads and writes
//!
//! A layer is persisted as three pieces under its [`LayerId`]: the tile blob,
//! the `metadata` attribute and finally the header. The header names the
//! stored key and value classes, which are checked against the requested Rust
//! types before the blob is touched.
//!
//! # Tile blob
//!
//! Little-endian throughout:
//!
//! ```text
//! "TSTK" | version: u16 | records: u32
//! per record, ascending by index:
//!   index: u64 | col: u32 | row: u32 | [instant: i64, space-time only] | bands: u16
//!   per band:
//!     cell type code: u8 | cols: u32 | rows: u32 | has_nodata: u8 | nodata: f64
//!     rows * cols cells at the cell type's native width, row-major
//! ```

use crate::attributes::{AttributeStore, LayerHeader, METADATA_ATTRIBUTE};
use crate::histogram::{Histogram, DEFAULT_BUCKETS, HISTOGRAM_ATTRIBUTE};
use crate::index::{index_method, LayerIndex};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read};
use tilestack_core::layer::{KeyClass, ValueClass};
use tilestack_core::{
    CellType, Error, LayerCollection, LayerId, LayerKey, LayerType, LayerValue, MultibandTile,
    Result, SpaceTimeKey, SpatialKey, Tile, TileLayerMetadata, TypedTile,
};
use tracing::debug;

const MAGIC: &[u8; 4] = b"TSTK";
const VERSION: u16 = 1;

/// A layer read without knowing its type up front.
#[derive(Debug, Clone)]
pub enum AnyLayer {
    SpatialTile(LayerCollection<SpatialKey, Tile>),
    SpatialMultiband(LayerCollection<SpatialKey, MultibandTile>),
    SpaceTimeTile(LayerCollection<SpaceTimeKey, Tile>),
    SpaceTimeMultiband(LayerCollection<SpaceTimeKey, MultibandTile>),
}

impl AnyLayer {
    pub fn layer_type(&self) -> LayerType {
        match self {
            AnyLayer::SpatialTile(_) => LayerType::of::<SpatialKey, Tile>(),
            AnyLayer::SpatialMultiband(_) => LayerType::of::<SpatialKey, MultibandTile>(),
            AnyLayer::SpaceTimeTile(_) => LayerType::of::<SpaceTimeKey, Tile>(),
            AnyLayer::SpaceTimeMultiband(_) => LayerType::of::<SpaceTimeKey, MultibandTile>(),
        }
    }

    pub fn metadata(&self) -> &TileLayerMetadata {
        match self {
            AnyLayer::SpatialTile(l) => l.metadata(),
            AnyLayer::SpatialMultiband(l) => l.metadata(),
            AnyLayer::SpaceTimeTile(l) => l.metadata(),
            AnyLayer::SpaceTimeMultiband(l) => l.metadata(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AnyLayer::SpatialTile(l) => l.len(),
            AnyLayer::SpatialMultiband(l) => l.len(),
            AnyLayer::SpaceTimeTile(l) => l.len(),
            AnyLayer::SpaceTimeMultiband(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encodes and decodes typed collections against an attribute store.
#[derive(Debug, Clone)]
pub struct LayerCodec {
    attributes: AttributeStore,
    histogram_buckets: usize,
}

impl LayerCodec {
    pub fn new(attributes: AttributeStore) -> Self {
        Self {
            attributes,
            histogram_buckets: DEFAULT_BUCKETS,
        }
    }

    pub fn with_histogram_buckets(mut self, buckets: usize) -> Self {
        self.histogram_buckets = buckets.max(1);
        self
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Read a layer as `(K, V)`.
    ///
    /// A single-band layer may be read as [`MultibandTile`]; every other
    /// disagreement between the stored and requested types is a
    /// `TypeMismatch`, raised before the tile blob is read.
    pub fn read<K: LayerKey, V: LayerValue>(&self, id: &LayerId) -> Result<LayerCollection<K, V>> {
        let header = self.attributes.read_header(id)?;
        let stored = header.layer_type()?;
        check_readable(stored, LayerType::of::<K, V>())?;

        let metadata: TileLayerMetadata = self.attributes.read_attribute(id, METADATA_ATTRIBUTE)?;
        let blob = self.attributes.backing().read_tiles(id)?;
        let records = decode(&blob, stored.key)?;

        let tiles = records
            .into_iter()
            .map(|(col, row, instant, bands)| {
                Ok((K::from_parts(col, row, instant), V::from_bands(stored.value, bands)?))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            layer = %id,
            stored = %stored,
            index = %header.key_index,
            tiles = tiles.len(),
            "read layer"
        );
        Ok(LayerCollection::new(metadata, tiles))
    }

    /// Read a layer as whatever type its header names
    pub fn read_any(&self, id: &LayerId) -> Result<AnyLayer> {
        let stored = self.attributes.read_header(id)?.layer_type()?;
        Ok(match (stored.key, stored.value) {
            (KeyClass::Spatial, ValueClass::SingleBand) => AnyLayer::SpatialTile(self.read(id)?),
            (KeyClass::Spatial, ValueClass::MultiBand) => {
                AnyLayer::SpatialMultiband(self.read(id)?)
            }
            (KeyClass::SpaceTime, ValueClass::SingleBand) => {
                AnyLayer::SpaceTimeTile(self.read(id)?)
            }
            (KeyClass::SpaceTime, ValueClass::MultiBand) => {
                AnyLayer::SpaceTimeMultiband(self.read(id)?)
            }
        })
    }

    /// Write a collection under `id`, header last.
    ///
    /// The collection is validated before anything reaches the store. Writing
    /// a spatial single-band layer also records a histogram of its cells under
    /// zoom 0 of the same name, tagged with the zoom it came from.
    pub fn write<K: LayerKey, V: LayerValue>(
        &self,
        id: &LayerId,
        layer: &LayerCollection<K, V>,
    ) -> Result<()> {
        layer.validate()?;

        let layer_type = LayerType::of::<K, V>();
        let method = index_method(layer_type);
        let bounds = layer.key_bounds();
        let index = LayerIndex::new(method, bounds);
        debug!(layer = %id, layer_type = %layer_type, index = %method, "selected key index");

        let mut records: Vec<(u64, &K, &V)> = layer
            .iter()
            .map(|(k, v)| (index.to_index(k), k, v))
            .collect();
        records.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let blob = encode(&records)?;
        let store = self.attributes.backing();
        store.write_tiles(id, &blob)?;

        let mut metadata = layer.metadata().clone();
        metadata.bounds = bounds;
        self.attributes.write_attribute(id, METADATA_ATTRIBUTE, &metadata)?;

        if layer_type == LayerType::new(KeyClass::Spatial, ValueClass::SingleBand) {
            let tiles: Vec<&Tile> = layer.iter().flat_map(|(_, v)| v.bands()).collect();
            let histogram =
                Histogram::from_tiles(&tiles, self.histogram_buckets).at_zoom(id.zoom);
            self.attributes.write_attribute(
                &LayerId::new(id.name.clone(), 0),
                HISTOGRAM_ATTRIBUTE,
                &histogram,
            )?;
        }

        let header = LayerHeader::new(layer_type, method, store.tiles_location(id), layer.len());
        self.attributes.write_header(id, &header)?;

        debug!(layer = %id, tiles = layer.len(), bytes = blob.len(), "wrote layer");
        Ok(())
    }
}

fn check_readable(stored: LayerType, requested: LayerType) -> Result<()> {
    let value_ok = stored.value == requested.value
        || (stored.value == ValueClass::SingleBand && requested.value == ValueClass::MultiBand);
    if stored.key != requested.key || !value_ok {
        return Err(Error::type_mismatch(
            format!("{} (requested {})", stored.key, requested.key),
            format!("{} (requested {})", stored.value, requested.value),
        ));
    }
    Ok(())
}

fn encode<K: LayerKey, V: LayerValue>(records: &[(u64, &K, &V)]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.write_u16::<LittleEndian>(VERSION).map_err(encoding)?;
    out.write_u32::<LittleEndian>(narrow(records.len(), "records")?)
        .map_err(encoding)?;

    for (index, key, value) in records {
        let bands = value.bands();
        write_key(&mut out, *index, *key, narrow(bands.len(), "bands")?).map_err(encoding)?;
        for band in bands {
            let cols = narrow(band.cols(), "tile cols")?;
            let rows = narrow(band.rows(), "tile rows")?;
            write_band(&mut out, band, cols, rows).map_err(encoding)?;
        }
    }
    Ok(out)
}

/// Narrow a count to the width the blob format stores it in
fn narrow<T: TryFrom<usize>>(n: usize, name: &'static str) -> Result<T> {
    T::try_from(n).map_err(|_| Error::InvalidParameter {
        name,
        value: n.to_string(),
        reason: format!("exceeds the {} field of the tile blob", std::any::type_name::<T>()),
    })
}

fn encoding(e: io::Error) -> Error {
    Error::Other(format!("encoding tiles: {}", e))
}

fn write_key<K: LayerKey>(out: &mut Vec<u8>, index: u64, key: &K, bands: u16) -> io::Result<()> {
    let sk = key.spatial_key();
    out.write_u64::<LittleEndian>(index)?;
    out.write_u32::<LittleEndian>(sk.col)?;
    out.write_u32::<LittleEndian>(sk.row)?;
    if let Some(instant) = key.instant() {
        out.write_i64::<LittleEndian>(instant)?;
    }
    out.write_u16::<LittleEndian>(bands)
}

fn write_nodata(out: &mut Vec<u8>, nodata: Option<f64>) -> io::Result<()> {
    out.write_u8(nodata.is_some() as u8)?;
    out.write_f64::<LittleEndian>(nodata.unwrap_or(f64::NAN))
}

fn write_band(out: &mut Vec<u8>, tile: &Tile, cols: u32, rows: u32) -> io::Result<()> {
    out.write_u8(tile.cell_type().code())?;
    out.write_u32::<LittleEndian>(cols)?;
    out.write_u32::<LittleEndian>(rows)?;
    write_nodata(out, tile.nodata_f64())?;
    match tile {
        Tile::Int8(t) => t.data().iter().try_for_each(|&v| out.write_i8(v)),
        Tile::UInt8(t) => t.data().iter().try_for_each(|&v| out.write_u8(v)),
        Tile::Int16(t) => t
            .data()
            .iter()
            .try_for_each(|&v| out.write_i16::<LittleEndian>(v)),
        Tile::UInt16(t) => t
            .data()
            .iter()
            .try_for_each(|&v| out.write_u16::<LittleEndian>(v)),
        Tile::Int32(t) => t
            .data()
            .iter()
            .try_for_each(|&v| out.write_i32::<LittleEndian>(v)),
        Tile::Float32(t) => t
            .data()
            .iter()
            .try_for_each(|&v| out.write_f32::<LittleEndian>(v)),
        Tile::Float64(t) => t
            .data()
            .iter()
            .try_for_each(|&v| out.write_f64::<LittleEndian>(v)),
    }
}

type Record = (u32, u32, i64, Vec<Tile>);

fn truncated(e: io::Error) -> Error {
    Error::Corrupt(format!("truncated tile blob: {}", e))
}

fn decode(blob: &[u8], key_class: KeyClass) -> Result<Vec<Record>> {
    let mut cur = Cursor::new(blob);

    let mut magic = [0u8; 4];
    cur.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(Error::Corrupt("tile blob has a bad magic number".into()));
    }
    let version = cur.read_u16::<LittleEndian>().map_err(truncated)?;
    if version != VERSION {
        return Err(Error::Corrupt(format!("unsupported tile blob version {}", version)));
    }
    let count = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;

    let mut records = Vec::with_capacity(count.min(blob.len()));
    for _ in 0..count {
        let _index = cur.read_u64::<LittleEndian>().map_err(truncated)?;
        let col = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let row = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let instant = match key_class {
            KeyClass::Spatial => 0,
            KeyClass::SpaceTime => cur.read_i64::<LittleEndian>().map_err(truncated)?,
        };
        let band_count = cur.read_u16::<LittleEndian>().map_err(truncated)?;
        let bands = (0..band_count)
            .map(|_| read_band(&mut cur))
            .collect::<Result<Vec<_>>>()?;
        records.push((col, row, instant, bands));
    }

    if (cur.position() as usize) != blob.len() {
        return Err(Error::Corrupt(format!(
            "{} trailing bytes after {} records",
            blob.len() - cur.position() as usize,
            count
        )));
    }
    Ok(records)
}

macro_rules! read_typed {
    ($t:ty, $rows:expr, $cols:expr, $nodata:expr, |$buf:ident| $fill:expr) => {{
        let mut $buf = vec![<$t>::default(); $rows * $cols];
        $fill.map_err(truncated)?;
        let tile = TypedTile::<$t>::from_vec($buf, $rows, $cols)?
            .with_nodata($nodata.map(|nd: f64| nd as $t));
        Tile::from(tile)
    }};
}

fn read_band(cur: &mut Cursor<&[u8]>) -> Result<Tile> {
    let cell_type = CellType::from_code(cur.read_u8().map_err(truncated)?)?;
    let cols = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let rows = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let has_nodata = cur.read_u8().map_err(truncated)? != 0;
    let nodata_value = cur.read_f64::<LittleEndian>().map_err(truncated)?;
    let nodata = has_nodata.then_some(nodata_value);

    let remaining = cur.get_ref().len() as u64 - cur.position();
    let needed = (rows as u64)
        .checked_mul(cols as u64)
        .and_then(|n| n.checked_mul(cell_type.bytes() as u64));
    if needed.map_or(true, |n| n > remaining) {
        return Err(Error::Corrupt(format!(
            "band of {}x{} {} cells exceeds the remaining {} bytes",
            rows, cols, cell_type, remaining
        )));
    }

    Ok(match cell_type {
        CellType::Int8 => read_typed!(i8, rows, cols, nodata, |buf| cur.read_i8_into(&mut buf)),
        CellType::UInt8 => read_typed!(u8, rows, cols, nodata, |buf| cur.read_exact(&mut buf)),
        CellType::Int16 => read_typed!(i16, rows, cols, nodata, |buf| cur
            .read_i16_into::<LittleEndian>(&mut buf)),
        CellType::UInt16 => read_typed!(u16, rows, cols, nodata, |buf| cur
            .read_u16_into::<LittleEndian>(&mut buf)),
        CellType::Int32 => read_typed!(i32, rows, cols, nodata, |buf| cur
            .read_i32_into::<LittleEndian>(&mut buf)),
        CellType::Float32 => read_typed!(f32, rows, cols, nodata, |buf| cur
            .read_f32_into::<LittleEndian>(&mut buf)),
        CellType::Float64 => read_typed!(f64, rows, cols, nodata, |buf| cur
            .read_f64_into::<LittleEndian>(&mut buf)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn codec() -> (Arc<MemoryStore>, LayerCodec) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), LayerCodec::new(AttributeStore::new(store)))
    }

    fn small_metadata(cell_type: CellType) -> TileLayerMetadata {
        let mut md = TileLayerMetadata::with_grid(cell_type, 4, 4);
        md.layout.tile_cols = 3;
        md.layout.tile_rows = 2;
        md
    }

    fn int_tile(offset: i16) -> Tile {
        let data = (0..6).map(|v| v + offset).collect();
        TypedTile::<i16>::from_vec(data, 2, 3)
            .unwrap()
            .with_nodata(Some(i16::MIN))
            .into()
    }

    #[test]
    fn test_native_cell_types_survive_roundtrip() {
        let (_, codec) = codec();
        let id = LayerId::new("dem", 2);
        let tiles = vec![
            (SpatialKey::new(1, 0), int_tile(10)),
            (SpatialKey::new(0, 0), int_tile(0)),
        ];
        let layer = LayerCollection::new(small_metadata(CellType::Int16), tiles);
        codec.write(&id, &layer).unwrap();

        let back: LayerCollection<SpatialKey, Tile> = codec.read(&id).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(&SpatialKey::new(1, 0)), Some(&int_tile(10)));
        assert_eq!(back.metadata().bounds, layer.key_bounds());
    }

    #[test]
    fn test_spacetime_multiband_roundtrip() {
        let (_, codec) = codec();
        let id = LayerId::new("series", 1);
        let band = |v: f32| -> Tile { TypedTile::<f32>::filled(2, 3, v).into() };
        let tiles = vec![
            (
                SpaceTimeKey::new(0, 0, 1_000),
                MultibandTile::new(vec![band(1.0), band(2.0)]).unwrap(),
            ),
            (
                SpaceTimeKey::new(0, 0, 2_000),
                MultibandTile::new(vec![band(3.0), band(f32::NAN)]).unwrap(),
            ),
        ];
        let layer = LayerCollection::new(small_metadata(CellType::Float32), tiles);
        codec.write(&id, &layer).unwrap();

        let header = codec.attributes().read_header(&id).unwrap();
        assert_eq!(header.key_index, index_method(LayerType::of::<SpaceTimeKey, MultibandTile>()));

        let back: LayerCollection<SpaceTimeKey, MultibandTile> = codec.read(&id).unwrap();
        let second = back.get(&SpaceTimeKey::new(0, 0, 2_000)).unwrap();
        assert_eq!(second.band_count(), 2);
        assert!(second.band(1).unwrap().get_f64(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_key_class_mismatch_is_rejected() {
        let (_, codec) = codec();
        let id = LayerId::new("dem", 0);
        let layer = LayerCollection::new(
            small_metadata(CellType::Int16),
            vec![(SpatialKey::new(0, 0), int_tile(0))],
        );
        codec.write(&id, &layer).unwrap();

        let err = codec.read::<SpaceTimeKey, Tile>(&id).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }), "{err}");
    }

    #[test]
    fn test_read_any_dispatches_on_header() {
        let (_, codec) = codec();
        let id = LayerId::new("dem", 0);
        let layer = LayerCollection::new(
            small_metadata(CellType::Int16),
            vec![(SpatialKey::new(0, 0), int_tile(0))],
        );
        codec.write(&id, &layer).unwrap();

        let any = codec.read_any(&id).unwrap();
        assert!(matches!(any, AnyLayer::SpatialTile(_)));
        assert_eq!(any.len(), 1);
        assert_eq!(any.layer_type(), LayerType::of::<SpatialKey, Tile>());
    }

    #[test]
    fn test_histogram_written_for_spatial_singleband() {
        let (_, codec) = codec();
        let id = LayerId::new("dem", 3);
        let layer = LayerCollection::new(
            small_metadata(CellType::Int16),
            vec![(SpatialKey::new(0, 0), int_tile(0))],
        );
        codec.write(&id, &layer).unwrap();

        let h: Histogram = codec
            .attributes()
            .read_attribute(&LayerId::new("dem", 0), HISTOGRAM_ATTRIBUTE)
            .unwrap();
        assert_eq!(h.total, 6);
        assert_eq!(h.max, Some(5.0));
        // The histogram location is not a layer of its own.
        assert_eq!(codec.attributes().list_zooms("dem").unwrap().len(), 1);
    }

    #[test]
    fn test_band_count_beyond_u16_is_rejected() {
        let bands = (0..=u16::MAX as usize)
            .map(|_| Tile::from(TypedTile::<u8>::filled(1, 1, 0)))
            .collect();
        let tile = MultibandTile::new(bands).unwrap();
        let key = SpatialKey::new(0, 0);
        match encode(&[(0, &key, &tile)]) {
            Err(Error::InvalidParameter { name, value, .. }) => {
                assert_eq!(name, "bands");
                assert_eq!(value, "65536");
            }
            other => panic!("expected InvalidParameter, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_narrow_fits() {
        assert_eq!(narrow::<u16>(65_535, "bands").unwrap(), u16::MAX);
        assert!(narrow::<u32>(u32::MAX as usize + 1, "records").is_err());
    }

    #[test]
    fn test_truncated_blob_is_corrupt() {
        let records: Vec<(u64, &SpatialKey, &Tile)> = Vec::new();
        let mut blob = encode(&records).unwrap();
        blob[0] = b'X';
        assert!(matches!(
            decode(&blob, KeyClass::Spatial),
            Err(Error::Corrupt(_))
        ));

        let key = SpatialKey::new(0, 0);
        let tile = int_tile(0);
        let blob = encode(&[(0, &key, &tile)]).unwrap();
        assert!(matches!(
            decode(&blob[..blob.len() - 1], KeyClass::Spatial),
            Err(Error::Corrupt(_))
        ));
    }
}
