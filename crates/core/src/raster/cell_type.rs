//! Runtime cell type tags

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The declared numeric type of every cell in a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    Float32,
    Float64,
}

impl Default for CellType {
    fn default() -> Self {
        CellType::Float64
    }
}

impl CellType {
    pub const ALL: [CellType; 7] = [
        CellType::Int8,
        CellType::UInt8,
        CellType::Int16,
        CellType::UInt16,
        CellType::Int32,
        CellType::Float32,
        CellType::Float64,
    ];

    /// Stable one-byte code used by the tile blob format
    pub fn code(self) -> u8 {
        match self {
            CellType::Int8 => 1,
            CellType::UInt8 => 2,
            CellType::Int16 => 3,
            CellType::UInt16 => 4,
            CellType::Int32 => 5,
            CellType::Float32 => 6,
            CellType::Float64 => 7,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        CellType::ALL
            .into_iter()
            .find(|ct| ct.code() == code)
            .ok_or_else(|| Error::Corrupt(format!("unknown cell type code {}", code)))
    }

    pub fn name(self) -> &'static str {
        match self {
            CellType::Int8 => "int8",
            CellType::UInt8 => "uint8",
            CellType::Int16 => "int16",
            CellType::UInt16 => "uint16",
            CellType::Int32 => "int32",
            CellType::Float32 => "float32",
            CellType::Float64 => "float64",
        }
    }

    /// Size of one cell in bytes
    pub fn bytes(self) -> usize {
        match self {
            CellType::Int8 | CellType::UInt8 => 1,
            CellType::Int16 | CellType::UInt16 => 2,
            CellType::Int32 | CellType::Float32 => 4,
            CellType::Float64 => 8,
        }
    }

    /// The designated no-data sentinel, widened to f64
    pub fn nodata(self) -> f64 {
        match self {
            CellType::Int8 => i8::MIN as f64,
            CellType::UInt8 => u8::MIN as f64,
            CellType::Int16 => i16::MIN as f64,
            CellType::UInt16 => u16::MIN as f64,
            CellType::Int32 => i32::MIN as f64,
            CellType::Float32 | CellType::Float64 => f64::NAN,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CellType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CellType::ALL
            .into_iter()
            .find(|ct| ct.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter {
                name: "cell_type",
                value: s.to_string(),
                reason: "expected one of int8, uint8, int16, uint16, int32, float32, float64"
                    .into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        for ct in CellType::ALL {
            assert_eq!(CellType::from_code(ct.code()).unwrap(), ct);
        }
        assert!(CellType::from_code(0).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Float64".parse::<CellType>().unwrap(), CellType::Float64);
        assert_eq!("uint8".parse::<CellType>().unwrap(), CellType::UInt8);
        assert!("complex".parse::<CellType>().is_err());
    }
}
