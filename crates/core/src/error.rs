//! Error types for GeoToolbox core types and I/O

use thiserror::Error;

/// Main error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Band size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Coverage has no bands")]
    EmptyCoverage,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Unknown CRS identifier: {0}")]
    UnknownCrs(String),

    #[error("Field type mismatch for '{field}': expected {expected}")]
    FieldType { field: String, expected: String },

    #[error("{0}")]
    Other(String),
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
