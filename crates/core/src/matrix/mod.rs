//! Row-partitioned matrix backends.
//!
//! A kinship matrix never assumes its values are resident in local memory.
//! Backends hand out contiguous blocks of full rows; exports stream those
//! blocks in order.

use std::fmt::Debug;
use std::ops::Range;

use crate::error::{KinshipError, Result};
use crate::types::DenseMatrix;

pub mod dense;
pub mod filtered;
pub mod packed;
pub mod sparse;

pub use dense::DenseBlockMatrix;
pub use filtered::FilteredView;
pub use packed::PackedLowerTriangle;
pub use sparse::SparseBlockMatrix;

/// Default number of rows per block for local backends.
pub const DEFAULT_ROWS_PER_BLOCK: usize = 1024;

/// A contiguous run of full matrix rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    /// Global index of the first row in this block.
    pub first_row: usize,
    /// Row values; every row has `n_cols` entries.
    pub rows: Vec<Vec<f64>>,
}

impl RowBlock {
    /// Iterate over `(global_row_index, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(k, row)| (self.first_row + k, row.as_slice()))
    }
}

/// Capability interface over a (possibly distributed) square matrix.
///
/// Block `b` covers rows `[b * rows_per_block, min((b + 1) * rows_per_block, n_rows))`.
/// Implementations must return every row of the block in full.
pub trait DistributedMatrixBackend: Send + Sync + Debug {
    fn n_rows(&self) -> usize;

    fn n_cols(&self) -> usize;

    /// Number of rows in each block (the last block may be shorter).
    fn rows_per_block(&self) -> usize;

    /// Read one block of rows.
    fn read_block(&self, block: usize) -> Result<RowBlock>;

    fn n_blocks(&self) -> usize {
        let bs = self.rows_per_block().max(1);
        (self.n_rows() + bs - 1) / bs
    }
}

/// Row range covered by `block` under the standard block layout.
pub fn block_rows(n_rows: usize, rows_per_block: usize, block: usize) -> Range<usize> {
    let bs = rows_per_block.max(1);
    let start = (block * bs).min(n_rows);
    let end = (start + bs).min(n_rows);
    start..end
}

/// Validate a block against the layout the backend advertises.
pub(crate) fn check_block(
    backend: &dyn DistributedMatrixBackend,
    block: usize,
    rows: &RowBlock,
) -> Result<()> {
    let expected = block_rows(backend.n_rows(), backend.rows_per_block(), block);
    if rows.first_row != expected.start {
        return Err(KinshipError::Data(format!(
            "block {} starts at row {} but should start at row {}",
            block, rows.first_row, expected.start
        )));
    }
    if rows.rows.len() != expected.len() {
        return Err(KinshipError::DimensionMismatch {
            expected: expected.len(),
            got: rows.rows.len(),
            context: format!("number of rows in block {}", block),
        });
    }
    let n_cols = backend.n_cols();
    for (i, row) in rows.iter() {
        if row.len() != n_cols {
            return Err(KinshipError::DimensionMismatch {
                expected: n_cols,
                got: row.len(),
                context: format!("length of row {}", i),
            });
        }
    }
    Ok(())
}

/// Reject `rows_per_block == 0`.
pub(crate) fn check_rows_per_block(rows_per_block: usize) -> Result<()> {
    if rows_per_block == 0 {
        return Err(KinshipError::InvalidParameter(
            "rows_per_block must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Collect every block of a backend into a local dense matrix.
///
/// This materializes the whole matrix and is only meant for matrices that
/// comfortably fit in memory.
pub fn collect_dense(backend: &dyn DistributedMatrixBackend) -> Result<DenseMatrix> {
    let mut out = DenseMatrix::zeros(backend.n_rows(), backend.n_cols());
    for b in 0..backend.n_blocks() {
        let block = backend.read_block(b)?;
        check_block(backend, b, &block)?;
        for (i, row) in block.iter() {
            for (j, &v) in row.iter().enumerate() {
                out[(i, j)] = v;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_rows_layout() {
        assert_eq!(block_rows(10, 4, 0), 0..4);
        assert_eq!(block_rows(10, 4, 1), 4..8);
        assert_eq!(block_rows(10, 4, 2), 8..10);
        assert_eq!(block_rows(10, 4, 3), 10..10);
    }

    #[test]
    fn test_row_block_iter_uses_global_indices() {
        let block = RowBlock {
            first_row: 5,
            rows: vec![vec![1.0], vec![2.0]],
        };
        let idx: Vec<usize> = block.iter().map(|(i, _)| i).collect();
        assert_eq!(idx, vec![5, 6]);
    }

    #[derive(Debug)]
    struct ShortRows;

    impl DistributedMatrixBackend for ShortRows {
        fn n_rows(&self) -> usize {
            2
        }
        fn n_cols(&self) -> usize {
            2
        }
        fn rows_per_block(&self) -> usize {
            2
        }
        fn read_block(&self, _block: usize) -> Result<RowBlock> {
            Ok(RowBlock {
                first_row: 0,
                rows: vec![vec![1.0, 0.5], vec![0.5]],
            })
        }
    }

    #[test]
    fn test_collect_dense_rejects_ragged_rows() {
        let err = collect_dense(&ShortRows).unwrap_err();
        assert!(matches!(err, KinshipError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_zero_rows_per_block_rejected() {
        assert!(check_rows_per_block(0).is_err());
        assert!(check_rows_per_block(1).is_ok());
    }
}
