//! Space-filling curve key indexes
//!
//! The index decides the physical order of records in a tile blob. Pure 2-D
//! layers use a Z-order curve; layers with a time dimension use a 3-D Hilbert
//! curve, which keeps neighbours in (col, row, time) closer together.

mod hilbert;
mod zcurve;

pub use hilbert::HilbertIndex;
pub use zcurve::ZCurveIndex;

use serde::{Deserialize, Serialize};
use std::fmt;
use tilestack_core::layer::{KeyBounds, KeyClass, ValueClass};
use tilestack_core::{LayerKey, LayerType};

/// Time bits used for every space-time layer
pub const DEFAULT_TEMPORAL_RESOLUTION: u32 = 1;

/// Index strategy for each supported layer type.
///
/// The match is exhaustive over the closed type set, so adding a key or value
/// class fails to compile until it is given an index here.
pub fn index_method(layer_type: LayerType) -> KeyIndexMethod {
    match (layer_type.key, layer_type.value) {
        (KeyClass::Spatial, ValueClass::SingleBand) | (KeyClass::Spatial, ValueClass::MultiBand) => {
            KeyIndexMethod::ZCurve
        }
        (KeyClass::SpaceTime, ValueClass::SingleBand)
        | (KeyClass::SpaceTime, ValueClass::MultiBand) => KeyIndexMethod::Hilbert {
            temporal_resolution: DEFAULT_TEMPORAL_RESOLUTION,
        },
    }
}

/// Index strategy persisted in a layer header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeyIndexMethod {
    ZCurve,
    Hilbert {
        /// Bits of the time axis; the bounds' instant range is split into
        /// `2^temporal_resolution` buckets
        temporal_resolution: u32,
    },
}

impl fmt::Display for KeyIndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyIndexMethod::ZCurve => f.write_str("zcurve"),
            KeyIndexMethod::Hilbert {
                temporal_resolution,
            } => write!(f, "hilbert(t={})", temporal_resolution),
        }
    }
}

/// A key index built for one collection's key bounds
#[derive(Debug, Clone)]
pub enum LayerIndex {
    ZCurve(ZCurveIndex),
    Hilbert(HilbertIndex),
}

impl LayerIndex {
    pub fn new(method: KeyIndexMethod, bounds: Option<KeyBounds>) -> Self {
        match method {
            KeyIndexMethod::ZCurve => LayerIndex::ZCurve(ZCurveIndex),
            KeyIndexMethod::Hilbert {
                temporal_resolution,
            } => LayerIndex::Hilbert(HilbertIndex::new(bounds, temporal_resolution)),
        }
    }

    pub fn method(&self) -> KeyIndexMethod {
        match self {
            LayerIndex::ZCurve(_) => KeyIndexMethod::ZCurve,
            LayerIndex::Hilbert(h) => KeyIndexMethod::Hilbert {
                temporal_resolution: h.temporal_resolution(),
            },
        }
    }

    pub fn to_index<K: LayerKey>(&self, key: &K) -> u64 {
        let sk = key.spatial_key();
        match self {
            LayerIndex::ZCurve(z) => z.index(sk.col, sk.row),
            LayerIndex::Hilbert(h) => h.index(sk.col, sk.row, key.instant().unwrap_or(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestack_core::{SpaceTimeKey, SpatialKey};

    #[test]
    fn test_index_method_table() {
        use tilestack_core::{MultibandTile, Tile};

        assert_eq!(
            index_method(LayerType::of::<SpatialKey, Tile>()),
            KeyIndexMethod::ZCurve
        );
        assert_eq!(
            index_method(LayerType::of::<SpatialKey, MultibandTile>()),
            KeyIndexMethod::ZCurve
        );
        let hilbert = KeyIndexMethod::Hilbert {
            temporal_resolution: 1,
        };
        assert_eq!(index_method(LayerType::of::<SpaceTimeKey, Tile>()), hilbert);
        assert_eq!(
            index_method(LayerType::of::<SpaceTimeKey, MultibandTile>()),
            hilbert
        );
    }

    #[test]
    fn test_method_roundtrips_through_json() {
        let m = KeyIndexMethod::Hilbert {
            temporal_resolution: 1,
        };
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"type":"hilbert","temporal_resolution":1}"#);
        assert_eq!(serde_json::from_str::<KeyIndexMethod>(&json).unwrap(), m);
    }

    #[test]
    fn test_layer_index_dispatch() {
        let z = LayerIndex::new(KeyIndexMethod::ZCurve, None);
        assert_eq!(z.to_index(&SpatialKey::new(1, 1)), 3);

        let keys = [SpaceTimeKey::new(0, 0, 0), SpaceTimeKey::new(3, 3, 10)];
        let h = LayerIndex::new(
            KeyIndexMethod::Hilbert {
                temporal_resolution: 1,
            },
            KeyBounds::from_keys(&keys),
        );
        assert!(matches!(h.method(), KeyIndexMethod::Hilbert { .. }));
        assert_ne!(h.to_index(&keys[0]), h.to_index(&keys[1]));
    }
}
