//! Coordinate reference systems

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system of a layer's layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CRS {
    Epsg(u32),
    /// Well-known text, for systems without an EPSG code
    Wkt(String),
}

impl CRS {
    /// Web Mercator (EPSG:3857), the usual zoom-pyramid projection
    pub fn web_mercator() -> Self {
        CRS::Epsg(3857)
    }

    /// Same EPSG code, or byte-identical WKT
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        self == other
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CRS::Epsg(code) => write!(f, "EPSG:{}", code),
            CRS::Wkt(wkt) => {
                let head: String = wkt.chars().take(40).collect();
                write!(f, "WKT:{}", head)
            }
        }
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::web_mercator()
    }
}
