//! GCTA binary relationship files.
//!
//! `.grm.bin` holds the lower triangle (diagonal included) in row-major
//! order as little-endian `f32`, with no header. The `.grm.N.bin` sidecar
//! has the same layout and holds the number of variants behind each pair.

use std::path::Path;

use crate::error::Result;
use crate::kinship::KinshipMatrix;
use crate::matrix::RowBlock;

use super::sink::OutputSink;
use super::stream::write_blocks_ordered;
use super::ExportConfig;

/// Write `.grm.bin`, and `.grm.N.bin` when `n_file` is given.
///
/// Every entry of the N file is `n_variants` as `f32`; pairwise
/// non-missing counts are not tracked. In atomic mode neither file is
/// published until both have been written.
pub fn write_gcta_grm_bin(
    km: &KinshipMatrix,
    output: &Path,
    n_file: Option<&Path>,
    config: &ExportConfig,
) -> Result<()> {
    log::debug!("Writing .grm.bin for {} samples to '{}'", km.n_samples(), output.display());

    let mut sink = OutputSink::create(output, config)?;
    write_blocks_ordered(km.matrix().as_ref(), config, &mut sink, encode_lower_f32)?;

    if let Some(n_path) = n_file {
        let n_sink = write_uniform_triangle(km.n_samples(), km.n_variants() as f32, n_path, config)?;
        let bytes = n_sink.finish()?;
        log::info!("Wrote {} bytes to '{}'", bytes, n_path.display());
    }

    let bytes = sink.finish()?;
    log::info!("Wrote {} bytes to '{}'", bytes, output.display());
    Ok(())
}

fn encode_lower_f32(block: &RowBlock) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, row) in block.iter() {
        out.reserve((i + 1) * 4);
        for &v in &row[..=i] {
            out.extend_from_slice(&(v as f32).to_le_bytes());
        }
    }
    out
}

/// Lower triangle of an `n x n` matrix whose entries all equal `value`,
/// written but not yet published.
fn write_uniform_triangle(
    n: usize,
    value: f32,
    output: &Path,
    config: &ExportConfig,
) -> Result<OutputSink> {
    log::debug!("Writing .grm.N.bin for {} samples to '{}'", n, output.display());

    let word = value.to_le_bytes();
    let full_row: Vec<u8> = word.iter().copied().cycle().take(n * 4).collect();

    let mut sink = OutputSink::create(output, config)?;
    for i in 0..n {
        sink.write_all(&full_row[..(i + 1) * 4])?;
    }
    Ok(sink)
}
