use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KinshipError {
    #[error("Dimension mismatch: expected {expected}, got {got} in {context}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    #[error("Failed to write '{}': {}", .path.display(), .source)]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{method} requires sample keys of type String, found {found}")]
    KeyTypeNotString { method: String, found: String },

    #[error("Sample key error: {0}")]
    SampleKey(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KinshipError {
    /// Attach the output path to a write-side IO error.
    pub fn io_failure(path: &Path, source: std::io::Error) -> Self {
        KinshipError::IoFailure {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KinshipError>;
