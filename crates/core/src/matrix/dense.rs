use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::{KinshipError, Result};

use super::{block_rows, check_rows_per_block, DistributedMatrixBackend, RowBlock};

/// A square matrix held in local memory and served in row blocks.
#[derive(Debug, Clone)]
pub struct DenseBlockMatrix {
    data: Arc<DMatrix<f64>>,
    rows_per_block: usize,
}

impl DenseBlockMatrix {
    /// Wrap a square dense matrix.
    ///
    /// # Errors
    /// * `KinshipError::DimensionMismatch` if the matrix is not square.
    /// * `KinshipError::InvalidParameter` if `rows_per_block` is zero.
    pub fn new(data: DMatrix<f64>, rows_per_block: usize) -> Result<Self> {
        check_rows_per_block(rows_per_block)?;
        if data.nrows() != data.ncols() {
            return Err(KinshipError::DimensionMismatch {
                expected: data.nrows(),
                got: data.ncols(),
                context: "number of columns vs rows of a kinship matrix".into(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            rows_per_block,
        })
    }

    /// Build from `n * n` values in row-major order.
    pub fn from_row_slice(n: usize, values: &[f64], rows_per_block: usize) -> Result<Self> {
        if values.len() != n * n {
            return Err(KinshipError::DimensionMismatch {
                expected: n * n,
                got: values.len(),
                context: "number of values for a square matrix".into(),
            });
        }
        Self::new(DMatrix::from_row_slice(n, n, values), rows_per_block)
    }

    /// The backing matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Whether `|m[i,j] - m[j,i]| <= tol` for every pair.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.data.nrows();
        (0..n).all(|i| (0..i).all(|j| (self.data[(i, j)] - self.data[(j, i)]).abs() <= tol))
    }
}

impl DistributedMatrixBackend for DenseBlockMatrix {
    fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    fn rows_per_block(&self) -> usize {
        self.rows_per_block
    }

    fn read_block(&self, block: usize) -> Result<RowBlock> {
        let range = block_rows(self.n_rows(), self.rows_per_block, block);
        let first_row = range.start;
        let rows = range
            .map(|i| self.data.row(i).iter().copied().collect())
            .collect();
        Ok(RowBlock { first_row, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::collect_dense;

    fn example() -> DenseBlockMatrix {
        DenseBlockMatrix::from_row_slice(
            3,
            &[1.0, 0.2, 0.1, 0.2, 1.0, 0.3, 0.1, 0.3, 1.0],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_blocks_cover_rows_in_order() {
        let m = example();
        assert_eq!(m.n_blocks(), 2);

        let b0 = m.read_block(0).unwrap();
        assert_eq!(b0.first_row, 0);
        assert_eq!(b0.rows, vec![vec![1.0, 0.2, 0.1], vec![0.2, 1.0, 0.3]]);

        let b1 = m.read_block(1).unwrap();
        assert_eq!(b1.first_row, 2);
        assert_eq!(b1.rows, vec![vec![0.1, 0.3, 1.0]]);
    }

    #[test]
    fn test_collect_dense_matches_source() {
        let m = example();
        let dense = collect_dense(&m).unwrap();
        assert_eq!(&dense, m.as_matrix());
    }

    #[test]
    fn test_non_square_rejected() {
        let result = DenseBlockMatrix::new(DMatrix::zeros(2, 3), 4);
        assert!(matches!(result, Err(KinshipError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_wrong_value_count_rejected() {
        assert!(DenseBlockMatrix::from_row_slice(2, &[1.0, 0.0, 0.0], 4).is_err());
    }

    #[test]
    fn test_symmetry_check() {
        assert!(example().is_symmetric(0.0));
        let skewed = DenseBlockMatrix::from_row_slice(2, &[1.0, 0.5, 0.4, 1.0], 4).unwrap();
        assert!(!skewed.is_symmetric(1e-6));
        assert!(skewed.is_symmetric(0.2));
    }

    #[test]
    fn test_empty_matrix_has_no_blocks() {
        let m = DenseBlockMatrix::new(DMatrix::zeros(0, 0), 4).unwrap();
        assert_eq!(m.n_blocks(), 0);
    }
}
