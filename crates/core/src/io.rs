//! Readers for matrix and sample-list files produced by the exporters.

use std::path::Path;
use std::sync::Arc;

use crate::error::{KinshipError, Result};
use crate::kinship::KinshipMatrix;
use crate::matrix::DenseBlockMatrix;
use crate::types::DenseMatrix;

/// Read a tab-delimited matrix with a header line of sample IDs.
///
/// This is the layout written by [`KinshipMatrix::export_tsv`]: a header of
/// N IDs followed by N rows of N values. IDs are taken verbatim (no
/// quoting, no trimming); surrounding whitespace is ignored in values only.
///
/// # Errors
/// * `KinshipError::DimensionMismatch` if a row does not have N values or
///   the number of rows differs from N.
/// * `KinshipError::Data` if a value does not parse as a number.
pub fn read_tsv_matrix<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, DenseMatrix)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_path(path.as_ref())?;

    let ids: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let n = ids.len();

    let mut values = Vec::with_capacity(n * n);
    let mut n_rows = 0usize;
    for result in reader.records() {
        let record = result?;
        if record.len() != n {
            return Err(KinshipError::DimensionMismatch {
                expected: n,
                got: record.len(),
                context: format!("number of values in row {}", n_rows + 1),
            });
        }
        for (j, field) in record.iter().enumerate() {
            let v = field.trim().parse::<f64>().map_err(|_| {
                KinshipError::Data(format!(
                    "Value '{}' in row {}, column {} is not a number",
                    field,
                    n_rows + 1,
                    j + 1
                ))
            })?;
            values.push(v);
        }
        n_rows += 1;
    }

    if n_rows != n {
        return Err(KinshipError::DimensionMismatch {
            expected: n,
            got: n_rows,
            context: "number of matrix rows vs header IDs".into(),
        });
    }

    Ok((ids, DenseMatrix::from_row_slice(n, n, &values)))
}

/// Load a tab-delimited matrix file as a [`KinshipMatrix`] with string keys.
pub fn load_tsv_matrix<P: AsRef<Path>>(
    path: P,
    n_variants: u64,
    rows_per_block: usize,
) -> Result<KinshipMatrix> {
    let (ids, m) = read_tsv_matrix(path)?;
    let backend = DenseBlockMatrix::new(m, rows_per_block)?;
    KinshipMatrix::from_string_ids(Arc::new(backend), ids, n_variants)
}

/// Read the individual IDs of a PLINK `.id` (or `.fam`-like) file.
///
/// Lines with two or more tab-separated fields yield the second field; a
/// single-field line yields that field. IDs are taken verbatim.
pub fn read_id_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path.as_ref())?;

    let mut ids = Vec::new();
    for result in reader.records() {
        let record = result?;
        let id = match record.len() {
            0 => continue,
            1 => &record[0],
            _ => &record[1],
        };
        ids.push(id.to_string());
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    /// Helper: write content to a temporary file and return the path.
    fn write_temp(content: &str) -> String {
        let dir = std::env::temp_dir();
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("test_kinship_io_{}_{}.tsv", std::process::id(), id);
        let path = dir.join(file_name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_read_tsv_matrix_basic() {
        let path = write_temp("A\tB\n1.0\t0.25\n0.25\t1.0\n");
        let (ids, m) = read_tsv_matrix(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(m, DenseMatrix::from_row_slice(2, 2, &[1.0, 0.25, 0.25, 1.0]));
    }

    #[test]
    fn test_read_tsv_matrix_ragged_row() {
        let path = write_temp("A\tB\n1.0\t0.25\n0.25\n");
        let result = read_tsv_matrix(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(KinshipError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_read_tsv_matrix_missing_row() {
        let path = write_temp("A\tB\n1.0\t0.25\n");
        let result = read_tsv_matrix(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(KinshipError::DimensionMismatch { got: 1, .. })));
    }

    #[test]
    fn test_read_tsv_matrix_non_numeric() {
        let path = write_temp("A\tB\n1.0\tNA\n0.25\t1.0\n");
        let result = read_tsv_matrix(&path);
        std::fs::remove_file(&path).ok();
        let msg = format!("{}", result.unwrap_err());
        assert!(msg.contains("'NA'"), "got: {}", msg);
    }

    #[test]
    fn test_load_tsv_matrix() {
        let path = write_temp("X\tY\tZ\n1\t0\t0\n0\t1\t0\n0\t0\t1\n");
        let km = load_tsv_matrix(&path, 12, 2).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(km.sample_list(), &["X".to_string(), "Y".into(), "Z".into()]);
        assert_eq!(km.n_variants(), 12);
        assert_eq!(km.matrix().n_blocks(), 2);
    }

    #[test]
    fn test_read_id_file_takes_individual_column() {
        let path = write_temp("F1\tA\nF2\tB\nC\n");
        let ids = read_id_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_values_tolerate_padding() {
        let path = write_temp("A\tB\n 1.0\t0.25 \n0.25\t1.0\n");
        let (_, m) = read_tsv_matrix(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 1)], 0.25);
    }

    #[test]
    fn test_exported_ids_reload_verbatim() {
        let ids = vec![" A".to_string(), "\"B\"".to_string(), "C ".to_string()];
        let backend = DenseBlockMatrix::new(DenseMatrix::identity(3, 3), 2).unwrap();
        let km = KinshipMatrix::from_string_ids(Arc::new(backend), ids.clone(), 5).unwrap();

        let tsv = write_temp("");
        km.export_tsv(&tsv).unwrap();
        let reloaded = load_tsv_matrix(&tsv, 5, 2).unwrap();
        std::fs::remove_file(&tsv).ok();
        assert_eq!(reloaded.sample_list(), ids.as_slice());

        let id_file = write_temp("");
        km.export_id_file(&id_file).unwrap();
        let from_id_file = read_id_file(&id_file).unwrap();
        std::fs::remove_file(&id_file).ok();
        assert_eq!(from_id_file, ids);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_tsv_matrix("/nonexistent/path/matrix.tsv").is_err());
    }
}
