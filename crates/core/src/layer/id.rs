//! Layer identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// One zoom level of one named layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId {
    pub name: String,
    pub zoom: u32,
}

impl LayerId {
    pub fn new(name: impl Into<String>, zoom: u32) -> Self {
        Self {
            name: name.into(),
            zoom,
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.zoom)
    }
}
