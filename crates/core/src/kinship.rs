use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::error::{KinshipError, Result};
use crate::export::{self, ExportConfig};
use crate::key::{KeySchema, SampleKey};
use crate::matrix::{collect_dense, FilteredView};
use crate::types::{DenseMatrix, SharedMatrix};

/// A symmetric matrix encoding the relatedness of each pair of samples.
///
/// Entry `(i, j)` is the relatedness of samples `i` and `j` in
/// [`KinshipMatrix::sample_list`]. The matrix is immutable once built; clones
/// share the same backend.
///
/// Export formats follow the PLINK `--make-rel` / `--make-grm` outputs also
/// consumed by GCTA.
#[derive(Debug, Clone)]
pub struct KinshipMatrix {
    key_schema: KeySchema,
    sample_ids: Vec<SampleKey>,
    matrix: SharedMatrix,
    n_variants: u64,
    sample_list: OnceLock<Vec<String>>,
}

impl KinshipMatrix {
    /// Wrap a block matrix computed elsewhere.
    ///
    /// No matrix data is read; only the dimensions and the sample keys are
    /// checked.
    ///
    /// # Arguments
    ///
    /// * `key_schema` - Type of the sample keys.
    /// * `matrix` - Square backend of relatedness values.
    /// * `sample_ids` - Keys of rows/columns, in matrix order.
    /// * `n_variants` - Number of variants used to compute the matrix.
    ///
    /// # Errors
    ///
    /// * `KinshipError::DimensionMismatch` if the backend is not square or
    ///   its dimension differs from the number of sample IDs.
    /// * `KinshipError::SampleKey` if a key does not conform to `key_schema`.
    pub fn from_block_matrix(
        key_schema: KeySchema,
        matrix: SharedMatrix,
        sample_ids: Vec<SampleKey>,
        n_variants: u64,
    ) -> Result<Self> {
        if matrix.n_rows() != matrix.n_cols() {
            return Err(KinshipError::DimensionMismatch {
                expected: matrix.n_rows(),
                got: matrix.n_cols(),
                context: "number of columns vs rows of a kinship matrix".into(),
            });
        }
        if sample_ids.len() != matrix.n_rows() {
            return Err(KinshipError::DimensionMismatch {
                expected: matrix.n_rows(),
                got: sample_ids.len(),
                context: "number of sample IDs vs matrix dimension".into(),
            });
        }
        for (i, key) in sample_ids.iter().enumerate() {
            key_schema.check(key).map_err(|e| match e {
                KinshipError::SampleKey(msg) => {
                    KinshipError::SampleKey(format!("sample {}: {}", i, msg))
                }
                other => other,
            })?;
        }

        Ok(Self {
            key_schema,
            sample_ids,
            matrix,
            n_variants,
            sample_list: OnceLock::new(),
        })
    }

    /// Wrap a block matrix indexed by plain string sample IDs.
    pub fn from_string_ids<S: Into<String>>(
        matrix: SharedMatrix,
        sample_ids: Vec<S>,
        n_variants: u64,
    ) -> Result<Self> {
        let keys = sample_ids
            .into_iter()
            .map(|s| SampleKey::Str(s.into()))
            .collect();
        Self::from_block_matrix(KeySchema::String, matrix, keys, n_variants)
    }

    /// Type of the key indexing this matrix.
    pub fn key_schema(&self) -> &KeySchema {
        &self.key_schema
    }

    /// External representation of every sample key, in matrix order.
    ///
    /// Computed on first call and reused afterwards.
    pub fn sample_list(&self) -> &[String] {
        self.sample_list.get_or_init(|| {
            self.sample_ids
                .iter()
                .map(|k| self.key_schema.to_external(k))
                .collect()
        })
    }

    /// Raw sample keys, in matrix order.
    pub fn sample_keys(&self) -> &[SampleKey] {
        &self.sample_ids
    }

    /// The backing matrix.
    pub fn matrix(&self) -> &SharedMatrix {
        &self.matrix
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of variants the relatedness values were computed from.
    pub fn n_variants(&self) -> u64 {
        self.n_variants
    }

    /// Fail unless sample keys are plain strings.
    pub fn require_string_keys(&self, method: &str) -> Result<()> {
        if self.key_schema.is_string() {
            Ok(())
        } else {
            Err(KinshipError::KeyTypeNotString {
                method: method.to_string(),
                found: self.key_schema.to_string(),
            })
        }
    }

    /// Keep the samples whose key satisfies `predicate`, preserving order.
    ///
    /// The result reads through a [`FilteredView`] of this matrix; no values
    /// are copied.
    pub fn filter_samples<F>(&self, predicate: F) -> Result<KinshipMatrix>
    where
        F: Fn(&SampleKey) -> bool,
    {
        let keep: Vec<usize> = self
            .sample_ids
            .iter()
            .enumerate()
            .filter(|(_, k)| predicate(k))
            .map(|(i, _)| i)
            .collect();
        let kept_keys = keep.iter().map(|&i| self.sample_ids[i].clone()).collect();

        let view = FilteredView::new(
            Arc::clone(&self.matrix),
            keep,
            self.matrix.rows_per_block().max(1),
        )?;

        Self::from_block_matrix(
            self.key_schema.clone(),
            Arc::new(view),
            kept_keys,
            self.n_variants,
        )
    }

    /// Keep the samples whose external ID is in `ids`, preserving matrix order.
    pub fn filter_sample_ids<S: AsRef<str>>(&self, ids: &[S]) -> Result<KinshipMatrix> {
        let wanted: HashSet<&str> = ids.iter().map(|s| s.as_ref()).collect();
        let external = self.sample_list();
        let keep: HashSet<usize> = external
            .iter()
            .enumerate()
            .filter(|(_, id)| wanted.contains(id.as_str()))
            .map(|(i, _)| i)
            .collect();
        let keys: HashSet<&SampleKey> = keep.iter().map(|&i| &self.sample_ids[i]).collect();
        self.filter_samples(|k| keys.contains(k))
    }

    /// Materialize the whole matrix locally.
    ///
    /// Only suitable for matrices that fit in memory.
    pub fn to_dense(&self) -> Result<DenseMatrix> {
        collect_dense(self.matrix.as_ref())
    }

    /// Export as a tab-delimited file with the sample list as header.
    pub fn export_tsv<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        export::text::write_tsv(self, output.as_ref(), &ExportConfig::default())
    }

    /// Export as a PLINK `.rel` file (lower triangle, one row per sample).
    pub fn export_rel<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        export::text::write_rel(self, output.as_ref(), &ExportConfig::default())
    }

    /// Export as a GCTA `.grm` text file.
    pub fn export_gcta_grm<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        export::text::write_gcta_grm(self, output.as_ref(), &ExportConfig::default())
    }

    /// Export as a GCTA `.grm.bin` file, plus a `.grm.N.bin` file when
    /// `opt_n_file` is given.
    pub fn export_gcta_grm_bin<P: AsRef<Path>>(
        &self,
        output: P,
        opt_n_file: Option<&Path>,
    ) -> Result<()> {
        export::binary::write_gcta_grm_bin(
            self,
            output.as_ref(),
            opt_n_file,
            &ExportConfig::default(),
        )
    }

    /// Export samples as a PLINK `.id` file.
    pub fn export_id_file<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        export::ids::write_id_file(self, output.as_ref(), &ExportConfig::default())
    }
}
