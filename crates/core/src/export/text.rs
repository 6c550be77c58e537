//! Text codecs: tab-delimited full matrix, PLINK `.rel`, GCTA `.grm`.
//!
//! Values are written with the shortest decimal representation that parses
//! back to the same `f64`, so files round-trip exactly.

use std::fmt::Write;
use std::path::Path;

use crate::error::Result;
use crate::kinship::KinshipMatrix;
use crate::matrix::RowBlock;

use super::sink::OutputSink;
use super::stream::write_blocks_ordered;
use super::ExportConfig;

/// Append `v` in round-trip decimal form.
pub(crate) fn push_value(out: &mut String, v: f64) {
    let _ = write!(out, "{:?}", v);
}

fn push_row(out: &mut String, values: &[f64]) {
    for (j, &v) in values.iter().enumerate() {
        if j > 0 {
            out.push('\t');
        }
        push_value(out, v);
    }
    out.push('\n');
}

/// Full matrix with a header line of sample IDs.
///
/// ```text
/// A	B	C
/// 1.0	0.2	0.1
/// 0.2	1.0	0.3
/// 0.1	0.3	1.0
/// ```
///
/// # Errors
/// `KinshipError::KeyTypeNotString` unless sample keys are strings.
pub fn write_tsv(km: &KinshipMatrix, output: &Path, config: &ExportConfig) -> Result<()> {
    km.require_string_keys("export_tsv")?;
    log::debug!("Writing {}x{} TSV to '{}'", km.n_samples(), km.n_samples(), output.display());

    let mut sink = OutputSink::create(output, config)?;
    let mut header = km.sample_list().join("\t");
    header.push('\n');
    sink.write_all(header.as_bytes())?;

    write_blocks_ordered(km.matrix().as_ref(), config, &mut sink, encode_full_rows)?;

    let bytes = sink.finish()?;
    log::info!("Wrote {} bytes to '{}'", bytes, output.display());
    Ok(())
}

/// PLINK `.rel`: row `i` holds the `i + 1` values `(i, 0..=i)`.
pub fn write_rel(km: &KinshipMatrix, output: &Path, config: &ExportConfig) -> Result<()> {
    log::debug!("Writing .rel for {} samples to '{}'", km.n_samples(), output.display());

    let mut sink = OutputSink::create(output, config)?;
    write_blocks_ordered(km.matrix().as_ref(), config, &mut sink, encode_rel_rows)?;

    let bytes = sink.finish()?;
    log::info!("Wrote {} bytes to '{}'", bytes, output.display());
    Ok(())
}

/// GCTA `.grm`: one line per pair `j <= i`, as `i+1 \t j+1 \t n_variants \t value`.
pub fn write_gcta_grm(km: &KinshipMatrix, output: &Path, config: &ExportConfig) -> Result<()> {
    log::debug!("Writing .grm for {} samples to '{}'", km.n_samples(), output.display());

    let n_variants = km.n_variants();
    let mut sink = OutputSink::create(output, config)?;
    write_blocks_ordered(km.matrix().as_ref(), config, &mut sink, |block| {
        encode_grm_rows(block, n_variants)
    })?;

    let bytes = sink.finish()?;
    log::info!("Wrote {} bytes to '{}'", bytes, output.display());
    Ok(())
}

fn encode_full_rows(block: &RowBlock) -> Vec<u8> {
    let mut out = String::new();
    for (_, row) in block.iter() {
        push_row(&mut out, row);
    }
    out.into_bytes()
}

fn encode_rel_rows(block: &RowBlock) -> Vec<u8> {
    let mut out = String::new();
    for (i, row) in block.iter() {
        push_row(&mut out, &row[..=i]);
    }
    out.into_bytes()
}

fn encode_grm_rows(block: &RowBlock, n_variants: u64) -> Vec<u8> {
    let mut out = String::new();
    for (i, row) in block.iter() {
        for (j, &v) in row[..=i].iter().enumerate() {
            let _ = write!(out, "{}\t{}\t{}\t", i + 1, j + 1, n_variants);
            push_value(&mut out, v);
            out.push('\n');
        }
    }
    out.into_bytes()
}
