use sprs::TriMat;

use crate::error::{KinshipError, Result};
use crate::types::SparseMat;

use super::{block_rows, check_rows_per_block, DistributedMatrixBackend, RowBlock};

/// A sparse kinship matrix in CSR format; absent entries read as zero.
///
/// Thresholded relatedness estimates (e.g. only close relatives kept) are
/// mostly zero, so storing them sparsely keeps large cohorts in memory.
#[derive(Debug, Clone)]
pub struct SparseBlockMatrix {
    csr: SparseMat,
    rows_per_block: usize,
}

impl SparseBlockMatrix {
    /// Wrap a square sparse matrix. CSC input is converted to CSR.
    ///
    /// # Errors
    /// * `KinshipError::DimensionMismatch` if the matrix is not square.
    /// * `KinshipError::InvalidParameter` if `rows_per_block` is zero.
    pub fn new(mat: SparseMat, rows_per_block: usize) -> Result<Self> {
        check_rows_per_block(rows_per_block)?;
        if mat.rows() != mat.cols() {
            return Err(KinshipError::DimensionMismatch {
                expected: mat.rows(),
                got: mat.cols(),
                context: "number of columns vs rows of a kinship matrix".into(),
            });
        }
        let csr = if mat.is_csr() { mat } else { mat.to_csr() };
        Ok(Self {
            csr,
            rows_per_block,
        })
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.csr.nnz()
    }
}

impl DistributedMatrixBackend for SparseBlockMatrix {
    fn n_rows(&self) -> usize {
        self.csr.rows()
    }

    fn n_cols(&self) -> usize {
        self.csr.cols()
    }

    fn rows_per_block(&self) -> usize {
        self.rows_per_block
    }

    fn read_block(&self, block: usize) -> Result<RowBlock> {
        let n = self.n_cols();
        let range = block_rows(self.n_rows(), self.rows_per_block, block);
        let first_row = range.start;
        let rows = range
            .map(|i| {
                let mut row = vec![0.0; n];
                if let Some(view) = self.csr.outer_view(i) {
                    for (j, &v) in view.iter() {
                        row[j] = v;
                    }
                }
                row
            })
            .collect();
        Ok(RowBlock { first_row, rows })
    }
}

/// Incremental builder for symmetric sparse kinship matrices (COO format).
///
/// Off-diagonal entries are mirrored; duplicates at the same position are
/// summed when the matrix is built.
#[derive(Debug)]
pub struct SymmetricTripletBuilder {
    triplet: TriMat<f64>,
}

impl SymmetricTripletBuilder {
    /// Create a builder for an `n x n` matrix.
    pub fn new(n: usize) -> Self {
        Self {
            triplet: TriMat::new((n, n)),
        }
    }

    /// Set the pair `(i, j)` and its mirror `(j, i)`.
    pub fn add_pair(&mut self, i: usize, j: usize, val: f64) {
        self.triplet.add_triplet(i, j, val);
        if i != j {
            self.triplet.add_triplet(j, i, val);
        }
    }

    /// Build the backend.
    pub fn build(&self, rows_per_block: usize) -> Result<SparseBlockMatrix> {
        SparseBlockMatrix::new(self.triplet.to_csr(), rows_per_block)
    }
}
