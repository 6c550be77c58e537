use crate::error::{KinshipError, Result};
use crate::types::SharedMatrix;

use super::{block_rows, check_block, check_rows_per_block, DistributedMatrixBackend, RowBlock};

/// A lazy principal submatrix of another backend.
///
/// Row and column `k` of the view are row and column `keep[k]` of the inner
/// matrix. Nothing is copied up front; each block read pulls the inner
/// blocks it needs, one at a time.
#[derive(Debug, Clone)]
pub struct FilteredView {
    inner: SharedMatrix,
    keep: Vec<usize>,
    rows_per_block: usize,
}

impl FilteredView {
    /// Create a view keeping the given inner indices, in the given order.
    ///
    /// # Errors
    /// `KinshipError::InvalidParameter` if an index is out of range.
    pub fn new(inner: SharedMatrix, keep: Vec<usize>, rows_per_block: usize) -> Result<Self> {
        check_rows_per_block(rows_per_block)?;
        let n = inner.n_rows();
        if let Some(&bad) = keep.iter().find(|&&k| k >= n) {
            return Err(KinshipError::InvalidParameter(format!(
                "sample index {} out of range for a {}x{} matrix",
                bad, n, n
            )));
        }
        Ok(Self {
            inner,
            keep,
            rows_per_block,
        })
    }

    /// Inner indices retained by this view.
    pub fn kept_indices(&self) -> &[usize] {
        &self.keep
    }
}

impl DistributedMatrixBackend for FilteredView {
    fn n_rows(&self) -> usize {
        self.keep.len()
    }

    fn n_cols(&self) -> usize {
        self.keep.len()
    }

    fn rows_per_block(&self) -> usize {
        self.rows_per_block
    }

    fn read_block(&self, block: usize) -> Result<RowBlock> {
        let range = block_rows(self.keep.len(), self.rows_per_block, block);
        let first_row = range.start;
        let inner_bs = self.inner.rows_per_block().max(1);

        let mut current: Option<(usize, RowBlock)> = None;
        let mut rows = Vec::with_capacity(range.len());

        for &src in &self.keep[range] {
            let inner_block = src / inner_bs;
            let cached = matches!(&current, Some((b, _)) if *b == inner_block);
            if !cached {
                let fetched = self.inner.read_block(inner_block)?;
                check_block(self.inner.as_ref(), inner_block, &fetched)?;
                current = Some((inner_block, fetched));
            }
            if let Some((_, inner_rows)) = &current {
                let full = &inner_rows.rows[src - inner_rows.first_row];
                rows.push(self.keep.iter().map(|&c| full[c]).collect());
            }
        }

        Ok(RowBlock { first_row, rows })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::matrix::{collect_dense, DenseBlockMatrix};
    use nalgebra::DMatrix;

    fn four_by_four() -> SharedMatrix {
        Arc::new(
            DenseBlockMatrix::from_row_slice(
                4,
                &[
                    1.0, 0.1, 0.2, 0.3,
                    0.1, 1.1, 0.4, 0.5,
                    0.2, 0.4, 1.2, 0.6,
                    0.3, 0.5, 0.6, 1.3,
                ],
                2,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_submatrix_values() {
        let view = FilteredView::new(four_by_four(), vec![0, 2, 3], 2).unwrap();
        let dense = collect_dense(&view).unwrap();
        let expected = DMatrix::from_row_slice(3, 3, &[
            1.0, 0.2, 0.3,
            0.2, 1.2, 0.6,
            0.3, 0.6, 1.3,
        ]);
        assert_eq!(dense, expected);
    }

    #[test]
    fn test_empty_view() {
        let view = FilteredView::new(four_by_four(), vec![], 2).unwrap();
        assert_eq!(view.n_rows(), 0);
        assert_eq!(view.n_blocks(), 0);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let result = FilteredView::new(four_by_four(), vec![1, 4], 2);
        assert!(matches!(result, Err(KinshipError::InvalidParameter(_))));
    }
}
