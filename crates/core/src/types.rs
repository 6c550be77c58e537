use std::sync::Arc;

use crate::matrix::DistributedMatrixBackend;

/// The scalar type of relatedness coefficients.
pub type Scalar = f64;

/// Dense matrix type (column-major).
pub type DenseMatrix = nalgebra::DMatrix<Scalar>;

/// Sparse matrix type (CSR or CSC).
pub type SparseMat = sprs::CsMat<Scalar>;

/// Shared read-only handle to a matrix backend.
pub type SharedMatrix = Arc<dyn DistributedMatrixBackend>;
