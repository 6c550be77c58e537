//! Symmetric kinship (relatedness) matrices over row-partitioned backends,
//! with exporters for the PLINK and GCTA relationship formats.

pub mod error;
pub mod export;
pub mod history;
pub mod io;
pub mod key;
pub mod kinship;
pub mod matrix;
pub mod types;

pub use error::{KinshipError, Result};
pub use export::{ExportConfig, ExportFormat, Exporter};
pub use key::{KeyField, KeySchema, SampleKey};
pub use kinship::KinshipMatrix;
