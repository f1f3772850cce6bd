//! Gaussian sampling from a shared random stream

use crate::io::configuration::PSD_TOLERANCE;
use crate::io::error::{Result, numerical_error};
use crate::math::linalg::symmetric_eigen;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

/// `rows × cols` matrix of independent standard-normal draws, filled row by row
pub fn standard_normal_matrix<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_simple_fn((rows, cols), || rng.sample(StandardNormal))
}

/// Square root of a positive-semidefinite covariance for joint Gaussian draws
///
/// Stores `B = V · diag(sqrt(λ))` from the eigen-decomposition `Σ = V Λ Vᵗ`,
/// so `mean + B · z` with `z ~ N(0, I)` is distributed as `N(mean, Σ)`. The
/// eigen route tolerates the rank-deficient covariances that arise when a
/// test point coincides with a training point.
#[derive(Clone, Debug)]
pub struct GaussianFactor {
    root: Array2<f64>,
    eigenvalues: Array1<f64>,
}

impl GaussianFactor {
    /// Factor a covariance matrix
    ///
    /// Eigenvalues within `PSD_TOLERANCE` (relative to the largest magnitude)
    /// below zero are rounding noise and clipped to zero.
    ///
    /// # Errors
    ///
    /// Returns a numerical error if the decomposition fails or the matrix has
    /// a clearly negative eigenvalue
    pub fn new(covariance: &Array2<f64>) -> Result<Self> {
        let (eigenvalues, vectors) = symmetric_eigen(covariance)?;

        let largest = eigenvalues
            .iter()
            .fold(0.0_f64, |acc, value| acc.max(value.abs()));
        let floor = -PSD_TOLERANCE * largest.max(1.0);
        if let Some(worst) = eigenvalues.iter().copied().find(|&value| value < floor) {
            return Err(numerical_error(
                "gaussian factor",
                &format!("covariance is not positive semidefinite (eigenvalue {worst:e})"),
            ));
        }

        let scales = eigenvalues.mapv(|value| value.max(0.0).sqrt());
        let root = &vectors * &scales;

        Ok(Self { root, eigenvalues })
    }

    /// Number of jointly sampled variables
    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Eigenvalues of the factored covariance, before clipping
    pub const fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// One joint draw from `N(mean, Σ)`
    ///
    /// Consumes exactly `dimension()` standard-normal values from `rng`.
    ///
    /// # Errors
    ///
    /// Returns a numerical error if `mean` has the wrong length
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, mean: &Array1<f64>) -> Result<Array1<f64>> {
        if mean.len() != self.dimension() {
            return Err(numerical_error(
                "gaussian sample",
                &format!(
                    "mean has length {}, covariance has dimension {}",
                    mean.len(),
                    self.dimension()
                ),
            ));
        }
        let noise: Array1<f64> =
            Array1::from_shape_simple_fn(self.dimension(), || rng.sample(StandardNormal));
        Ok(mean + &self.root.dot(&noise))
    }
}
