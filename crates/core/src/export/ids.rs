use std::path::Path;

use crate::error::Result;
use crate::kinship::KinshipMatrix;

use super::sink::OutputSink;
use super::ExportConfig;

/// PLINK `.id`: one `FID \t IID` line per sample, both set to the sample ID.
///
/// # Errors
/// `KinshipError::KeyTypeNotString` unless sample keys are strings.
pub fn write_id_file(km: &KinshipMatrix, output: &Path, config: &ExportConfig) -> Result<()> {
    km.require_string_keys("export_id_file")?;
    log::debug!("Writing {} sample IDs to '{}'", km.n_samples(), output.display());

    let mut sink = OutputSink::create(output, config)?;
    for id in km.sample_list() {
        sink.write_all(format!("{}\t{}\n", id, id).as_bytes())?;
    }
    let bytes = sink.finish()?;
    log::info!("Wrote {} bytes to '{}'", bytes, output.display());
    Ok(())
}
