//! Dense symmetric linear algebra for covariance matrices
//!
//! Kernel matrices are assembled as `ndarray` arrays. Factorizations run on
//! `nalgebra` matrices and are converted back at this boundary.

use crate::io::error::{Result, numerical_error};
use nalgebra::{Cholesky, DMatrix, Dyn, SymmetricEigen};
use ndarray::{Array1, Array2, ShapeBuilder};

/// Convergence threshold for the symmetric eigen-decomposition
pub const EIGEN_EPSILON: f64 = f64::EPSILON;

/// Iteration limit for the symmetric eigen-decomposition
pub const EIGEN_MAX_ITERATIONS: usize = 10_000;

fn check_square(matrix: &Array2<f64>, operation: &'static str) -> Result<()> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(numerical_error(
            operation,
            &format!("expected a square matrix, got {rows}x{cols}"),
        ));
    }
    if matrix.iter().any(|value| !value.is_finite()) {
        return Err(numerical_error(operation, &"matrix has non-finite entries"));
    }
    Ok(())
}

/// Copy an `ndarray` matrix into a column-major `nalgebra` matrix
pub fn to_dmatrix(matrix: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = matrix.dim();
    DMatrix::from_row_iterator(rows, cols, matrix.iter().copied())
}

/// Copy an `nalgebra` matrix back into an `ndarray` matrix
///
/// # Errors
///
/// Returns a numerical error if the storage does not match the shape
pub fn from_dmatrix(matrix: &DMatrix<f64>) -> Result<Array2<f64>> {
    Array2::from_shape_vec(matrix.shape().f(), matrix.as_slice().to_vec())
        .map_err(|e| numerical_error("matrix conversion", &e))
}

/// Cholesky factorization `L · Lᵗ = A` of a positive-definite matrix
#[derive(Clone, Debug)]
pub struct CholeskyFactor {
    factor: Cholesky<f64, Dyn>,
}

impl CholeskyFactor {
    /// Factor `matrix`
    ///
    /// # Errors
    ///
    /// Returns a numerical error if the matrix is not square, has non-finite
    /// entries, or is not positive definite (a pivot is not strictly positive)
    pub fn new(matrix: &Array2<f64>) -> Result<Self> {
        check_square(matrix, "cholesky")?;
        let factor = Cholesky::new(to_dmatrix(matrix))
            .ok_or_else(|| numerical_error("cholesky", &"matrix is not positive definite"))?;

        // A zero pivot passes the square root and poisons the rows below it
        if let Some((pivot, value)) = factor
            .l_dirty()
            .diagonal()
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite() || **value <= 0.0)
        {
            return Err(numerical_error(
                "cholesky",
                &format!("matrix is not positive definite (pivot {pivot} is {value:e})"),
            ));
        }

        Ok(Self { factor })
    }

    /// Order of the factored matrix
    pub fn dimension(&self) -> usize {
        self.factor.l_dirty().nrows()
    }

    /// Lower-triangular factor `L`
    ///
    /// # Errors
    ///
    /// Propagates conversion failures from [`from_dmatrix`]
    pub fn lower(&self) -> Result<Array2<f64>> {
        from_dmatrix(&self.factor.l())
    }

    /// Solve `A · X = rhs`
    ///
    /// # Errors
    ///
    /// Returns a numerical error if `rhs` does not have one row per column
    /// of `A` or contains non-finite entries
    pub fn solve(&self, rhs: &Array2<f64>) -> Result<Array2<f64>> {
        let rows = rhs.nrows();
        if rows != self.dimension() {
            return Err(numerical_error(
                "cholesky solve",
                &format!("right-hand side has {rows} rows, factor has {}", self.dimension()),
            ));
        }
        if rhs.iter().any(|value| !value.is_finite()) {
            return Err(numerical_error(
                "cholesky solve",
                &"right-hand side has non-finite entries",
            ));
        }
        from_dmatrix(&self.factor.solve(&to_dmatrix(rhs)))
    }
}

/// Add `epsilon` to every diagonal entry
pub fn add_to_diagonal(matrix: &mut Array2<f64>, epsilon: f64) {
    matrix.diag_mut().mapv_inplace(|value| value + epsilon);
}

/// Average a matrix with its transpose to remove rounding asymmetry
pub fn symmetrize(matrix: &Array2<f64>) -> Array2<f64> {
    (matrix + &matrix.t()) * 0.5
}

/// Whether `matrix` is square and equals its transpose within `tolerance`
pub fn is_symmetric(matrix: &Array2<f64>, tolerance: f64) -> bool {
    let (rows, cols) = matrix.dim();
    rows == cols
        && matrix
            .iter()
            .zip(matrix.t().iter())
            .all(|(value, mirrored)| (value - mirrored).abs() <= tolerance)
}

/// Eigenvalues and eigenvectors of a symmetric matrix
///
/// Returns `(values, vectors)` where column `k` of `vectors` is the unit
/// eigenvector for `values[k]`. Values are not sorted. The input is
/// symmetrized first.
///
/// # Errors
///
/// Returns a numerical error if the matrix is not square, has non-finite
/// entries, or the iteration does not converge within `EIGEN_MAX_ITERATIONS`
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    check_square(matrix, "eigen-decomposition")?;
    let eigen = SymmetricEigen::try_new(
        to_dmatrix(&symmetrize(matrix)),
        EIGEN_EPSILON,
        EIGEN_MAX_ITERATIONS,
    )
    .ok_or_else(|| {
        numerical_error(
            "eigen-decomposition",
            &format!("did not converge in {EIGEN_MAX_ITERATIONS} iterations"),
        )
    })?;

    let values = eigen.eigenvalues.iter().copied().collect::<Array1<f64>>();
    let vectors = from_dmatrix(&eigen.eigenvectors)?;
    Ok((values, vectors))
}

/// Eigenvalues of a symmetric matrix
///
/// # Errors
///
/// Propagates failures from [`symmetric_eigen`]
pub fn symmetric_eigenvalues(matrix: &Array2<f64>) -> Result<Array1<f64>> {
    symmetric_eigen(matrix).map(|(values, _)| values)
}
