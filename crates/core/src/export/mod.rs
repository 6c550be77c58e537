//! Export codecs for PLINK and GCTA relatedness formats.
//!
//! Every codec makes one ordered pass over the matrix backend. Blocks are
//! read and encoded in parallel; a single writer appends them in row order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::{ExportRecord, NoProvenance, ProvenanceRecorder};
use crate::kinship::KinshipMatrix;

pub mod binary;
pub mod ids;
mod sink;
mod stream;
pub mod text;

/// Output format of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full matrix as tab-delimited text with a header of sample IDs.
    Tsv,
    /// PLINK `.rel`: lower triangle, one row per sample.
    Rel,
    /// GCTA `.grm`: one `i j n value` line per lower-triangle pair.
    GctaGrm,
    /// GCTA `.grm.bin`, optionally with a `.grm.N.bin` sidecar.
    GctaGrmBin { n_file: Option<PathBuf> },
    /// PLINK `.id`: family and individual ID per sample.
    IdFile,
}

impl ExportFormat {
    /// Name of the export operation.
    pub fn operation(&self) -> &'static str {
        match self {
            ExportFormat::Tsv => "export_tsv",
            ExportFormat::Rel => "export_rel",
            ExportFormat::GctaGrm => "export_gcta_grm",
            ExportFormat::GctaGrmBin { .. } => "export_gcta_grm_bin",
            ExportFormat::IdFile => "export_id_file",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Tsv => "tsv",
            ExportFormat::Rel => "rel",
            ExportFormat::GctaGrm => "grm",
            ExportFormat::GctaGrmBin { .. } => "grm.bin",
            ExportFormat::IdFile => "id",
        }
    }
}

/// Tuning knobs shared by all exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write to a staging file and rename it over the target on success.
    pub atomic: bool,
    /// Blocks read and encoded concurrently; 0 uses the rayon thread count.
    pub parallel_blocks: usize,
    /// Capacity of the output buffer in bytes.
    pub buffer_capacity: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            atomic: true,
            parallel_blocks: 0,
            buffer_capacity: 1 << 20,
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn window(&self) -> usize {
        if self.parallel_blocks == 0 {
            rayon::current_num_threads().max(1)
        } else {
            self.parallel_blocks
        }
    }
}

/// Runs exports of one matrix with a shared configuration and provenance
/// recorder.
///
/// ```no_run
/// use kinship_core::export::{ExportFormat, Exporter};
/// use kinship_core::history::HistoryFileRecorder;
/// # fn run(km: &kinship_core::KinshipMatrix) -> kinship_core::Result<()> {
/// Exporter::new(km)
///     .recorder(HistoryFileRecorder)
///     .export(&ExportFormat::GctaGrm, "cohort.grm")?;
/// # Ok(())
/// # }
/// ```
pub struct Exporter<'a> {
    matrix: &'a KinshipMatrix,
    config: ExportConfig,
    recorder: Box<dyn ProvenanceRecorder>,
}

impl<'a> Exporter<'a> {
    /// Create an exporter with default configuration and no provenance.
    pub fn new(matrix: &'a KinshipMatrix) -> Self {
        Self {
            matrix,
            config: ExportConfig::default(),
            recorder: Box::new(NoProvenance),
        }
    }

    /// Set the export configuration.
    pub fn config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the provenance recorder.
    pub fn recorder(mut self, recorder: impl ProvenanceRecorder + 'static) -> Self {
        self.recorder = Box::new(recorder);
        self
    }

    /// Write `format` to `output`, then record provenance for the call.
    ///
    /// The export result is what is returned. A recorder failure happens
    /// after the file is published, so it is logged as a warning instead.
    pub fn export<P: AsRef<Path>>(&self, format: &ExportFormat, output: P) -> Result<()> {
        let output = output.as_ref();
        write_format(self.matrix, format, output, &self.config)?;

        let n_file = match format {
            ExportFormat::GctaGrmBin { n_file } => n_file.as_deref(),
            _ => None,
        };
        let record = ExportRecord {
            operation: format.operation(),
            output,
            n_file,
            n_samples: self.matrix.n_samples(),
            n_variants: self.matrix.n_variants(),
            key_schema: self.matrix.key_schema().to_string(),
        };
        if let Err(e) = self.recorder.record(&record) {
            log::warn!(
                "Exported '{}' but could not record its history: {}",
                output.display(),
                e
            );
        }
        Ok(())
    }
}

/// Dispatch to the codec for `format`.
pub fn write_format(
    km: &KinshipMatrix,
    format: &ExportFormat,
    output: &Path,
    config: &ExportConfig,
) -> Result<()> {
    match format {
        ExportFormat::Tsv => text::write_tsv(km, output, config),
        ExportFormat::Rel => text::write_rel(km, output, config),
        ExportFormat::GctaGrm => text::write_gcta_grm(km, output, config),
        ExportFormat::GctaGrmBin { n_file } => {
            binary::write_gcta_grm_bin(km, output, n_file.as_deref(), config)
        }
        ExportFormat::IdFile => ids::write_id_file(km, output, config),
    }
}
