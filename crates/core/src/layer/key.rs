//! Tile keys and the closed set of layer type tags

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Position of one tile in a zoom level's regular grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpatialKey {
    pub col: u32,
    pub row: u32,
}

impl SpatialKey {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for SpatialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A spatial key plus an instant in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceTimeKey {
    pub col: u32,
    pub row: u32,
    pub instant: i64,
}

impl SpaceTimeKey {
    pub fn new(col: u32, row: u32, instant: i64) -> Self {
        Self { col, row, instant }
    }
}

/// Key dimension of a stored layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    Spatial,
    SpaceTime,
}

/// Value shape of a stored layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    SingleBand,
    MultiBand,
}

impl KeyClass {
    pub fn name(self) -> &'static str {
        match self {
            KeyClass::Spatial => "spatial",
            KeyClass::SpaceTime => "spacetime",
        }
    }
}

impl ValueClass {
    pub fn name(self) -> &'static str {
        match self {
            ValueClass::SingleBand => "singleband",
            ValueClass::MultiBand => "multiband",
        }
    }
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The (key, value) pair a layer is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerType {
    pub key: KeyClass,
    pub value: ValueClass,
}

impl LayerType {
    pub fn new(key: KeyClass, value: ValueClass) -> Self {
        Self { key, value }
    }

    /// Parse the stored type names of a header.
    ///
    /// Any name outside the known set fails with `TypeMismatch` naming both
    /// the key and value names as found.
    pub fn from_names(key: &str, value: &str) -> Result<Self> {
        let key_class = match key {
            "spatial" => Some(KeyClass::Spatial),
            "spacetime" => Some(KeyClass::SpaceTime),
            _ => None,
        };
        let value_class = match value {
            "singleband" => Some(ValueClass::SingleBand),
            "multiband" => Some(ValueClass::MultiBand),
            _ => None,
        };
        match (key_class, value_class) {
            (Some(key), Some(value)) => Ok(Self { key, value }),
            _ => Err(Error::type_mismatch(key, value)),
        }
    }

    pub fn of<K: LayerKey, V: crate::layer::LayerValue>() -> Self {
        Self::new(K::CLASS, V::CLASS)
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.key, self.value)
    }
}

/// A key type a layer can be stored under.
pub trait LayerKey: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {
    const CLASS: KeyClass;

    /// The tile's grid position, dropping any temporal component
    fn spatial_key(&self) -> SpatialKey;

    /// Temporal component, if the key has one
    fn instant(&self) -> Option<i64>;

    /// Rebuild a key from its stored parts; spatial keys ignore `instant`
    fn from_parts(col: u32, row: u32, instant: i64) -> Self;
}

impl LayerKey for SpatialKey {
    const CLASS: KeyClass = KeyClass::Spatial;

    fn spatial_key(&self) -> SpatialKey {
        *self
    }

    fn instant(&self) -> Option<i64> {
        None
    }

    fn from_parts(col: u32, row: u32, _instant: i64) -> Self {
        SpatialKey::new(col, row)
    }
}

impl LayerKey for SpaceTimeKey {
    const CLASS: KeyClass = KeyClass::SpaceTime;

    fn spatial_key(&self) -> SpatialKey {
        SpatialKey::new(self.col, self.row)
    }

    fn instant(&self) -> Option<i64> {
        Some(self.instant)
    }

    fn from_parts(col: u32, row: u32, instant: i64) -> Self {
        SpaceTimeKey::new(col, row, instant)
    }
}
