//! Error types for TileStack

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for TileStack operations
#[derive(Error, Debug)]
pub enum Error {
    /// A named layer, zoom level or stored object is absent.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A key/value type pair outside the codec dispatch table.
    #[error("unsupported layer type: key = {key}, value = {value}")]
    TypeMismatch { key: String, value: String },

    /// The backing store could not be reached or failed mid-operation.
    #[error("backing store unavailable at {}: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt layer data: {0}")]
    Corrupt(String),

    #[error("Invalid tile dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in tile of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Tile size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("execution engine error: {0}")]
    Engine(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    pub fn type_mismatch(key: impl Into<String>, value: impl Into<String>) -> Self {
        Error::TypeMismatch {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Wrap an I/O failure, keeping "not found" distinct from an unreachable store.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                what: path.display().to_string(),
            }
        } else {
            Error::StoreUnavailable { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Result type alias for TileStack operations
pub type Result<T> = std::result::Result<T, Error>;
