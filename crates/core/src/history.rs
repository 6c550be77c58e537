//! Provenance for exported files.
//!
//! Exports themselves never record anything; an [`Exporter`](crate::export::Exporter)
//! calls a recorder after a successful write.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{KinshipError, Result};

/// Description of one completed export.
#[derive(Debug, Clone)]
pub struct ExportRecord<'a> {
    pub operation: &'static str,
    pub output: &'a Path,
    pub n_file: Option<&'a Path>,
    pub n_samples: usize,
    pub n_variants: u64,
    pub key_schema: String,
}

impl ExportRecord<'_> {
    /// The call as a single line, e.g. `export_rel(output="out.rel")`.
    pub fn call_line(&self) -> String {
        let mut line = format!("{}(output=\"{}\"", self.operation, self.output.display());
        if let Some(n) = self.n_file {
            line.push_str(&format!(", opt_n_file=\"{}\"", n.display()));
        }
        line.push(')');
        line
    }
}

/// Records where exported files came from.
pub trait ProvenanceRecorder: Send + Sync {
    fn record(&self, record: &ExportRecord<'_>) -> Result<()>;
}

/// Records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProvenance;

impl ProvenanceRecorder for NoProvenance {
    fn record(&self, _record: &ExportRecord<'_>) -> Result<()> {
        Ok(())
    }
}

/// Writes `<output>.history.txt` next to each exported file.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryFileRecorder;

/// Path of the history file for `output`.
pub fn history_path(output: &Path) -> PathBuf {
    let mut name: OsString = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".history.txt");
    output.with_file_name(name)
}

impl ProvenanceRecorder for HistoryFileRecorder {
    fn record(&self, record: &ExportRecord<'_>) -> Result<()> {
        let path = history_path(record.output);
        let mut text = String::new();
        text.push_str(&format!(
            "# generated by kinship-core {}\n",
            env!("CARGO_PKG_VERSION")
        ));
        text.push_str(&format!(
            "# samples: {}  variants: {}  key: {}\n",
            record.n_samples, record.n_variants, record.key_schema
        ));
        text.push_str(&record.call_line());
        text.push('\n');

        fs::write(&path, text).map_err(|e| KinshipError::io_failure(&path, e))?;
        log::debug!("Recorded history in '{}'", path.display());
        Ok(())
    }
}
