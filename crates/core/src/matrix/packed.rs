use nalgebra::DMatrix;

use crate::error::{KinshipError, Result};

use super::{block_rows, check_rows_per_block, DistributedMatrixBackend, RowBlock};

/// A symmetric matrix stored as its packed lower triangle (diagonal included).
///
/// Entry `(i, j)` with `j <= i` lives at `i * (i + 1) / 2 + j`. Full rows are
/// reconstructed by symmetry when a block is read.
#[derive(Debug, Clone)]
pub struct PackedLowerTriangle {
    n: usize,
    values: Vec<f64>,
    rows_per_block: usize,
}

/// Number of entries in the lower triangle (inclusive) of an `n x n` matrix.
pub fn triangle_len(n: usize) -> usize {
    n * (n + 1) / 2
}

impl PackedLowerTriangle {
    /// Wrap packed lower-triangle values for an `n x n` matrix.
    ///
    /// # Errors
    /// `KinshipError::DimensionMismatch` if `values.len() != n * (n + 1) / 2`.
    pub fn new(n: usize, values: Vec<f64>, rows_per_block: usize) -> Result<Self> {
        check_rows_per_block(rows_per_block)?;
        if values.len() != triangle_len(n) {
            return Err(KinshipError::DimensionMismatch {
                expected: triangle_len(n),
                got: values.len(),
                context: "packed lower-triangle length".into(),
            });
        }
        Ok(Self {
            n,
            values,
            rows_per_block,
        })
    }

    /// Build from ragged rows where row `i` holds `i + 1` values.
    pub fn from_lower_rows(rows: &[Vec<f64>], rows_per_block: usize) -> Result<Self> {
        let n = rows.len();
        let mut values = Vec::with_capacity(triangle_len(n));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != i + 1 {
                return Err(KinshipError::DimensionMismatch {
                    expected: i + 1,
                    got: row.len(),
                    context: format!("lower-triangle row {}", i),
                });
            }
            values.extend_from_slice(row);
        }
        Self::new(n, values, rows_per_block)
    }

    /// Pack the lower triangle of a dense matrix. The upper triangle is ignored.
    pub fn from_dense(m: &DMatrix<f64>, rows_per_block: usize) -> Result<Self> {
        if m.nrows() != m.ncols() {
            return Err(KinshipError::DimensionMismatch {
                expected: m.nrows(),
                got: m.ncols(),
                context: "number of columns vs rows of a kinship matrix".into(),
            });
        }
        let n = m.nrows();
        let values = (0..n)
            .flat_map(|i| (0..=i).map(move |j| m[(i, j)]))
            .collect();
        Self::new(n, values, rows_per_block)
    }

    /// Value at `(i, j)`, read through symmetry.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (hi, lo) = if i >= j { (i, j) } else { (j, i) };
        self.values[triangle_len(hi) + lo]
    }
}

impl DistributedMatrixBackend for PackedLowerTriangle {
    fn n_rows(&self) -> usize {
        self.n
    }

    fn n_cols(&self) -> usize {
        self.n
    }

    fn rows_per_block(&self) -> usize {
        self.rows_per_block
    }

    fn read_block(&self, block: usize) -> Result<RowBlock> {
        let range = block_rows(self.n, self.rows_per_block, block);
        let first_row = range.start;
        let rows = range
            .map(|i| (0..self.n).map(|j| self.get(i, j)).collect())
            .collect();
        Ok(RowBlock { first_row, rows })
    }
}
