use crate::io::configuration::REGULARIZATION_EPSILON;
use crate::math::hyperbolic::CovarianceFunction;
use crate::math::linalg::add_to_diagonal;
use crate::spatial::tiles::TileCoordinate;
use ndarray::Array2;

/// Assembles covariance matrices between coordinate sets from a kernel
#[derive(Clone, Copy, Debug)]
pub struct CovarianceBuilder<K> {
    kernel: K,
}

impl<K: CovarianceFunction> CovarianceBuilder<K> {
    /// Create a builder evaluating `kernel`
    pub const fn new(kernel: K) -> Self {
        Self { kernel }
    }

    /// Kernel used for every entry
    pub const fn kernel(&self) -> &K {
        &self.kernel
    }

    /// `|a| × |b|` matrix with entry `[i, j] = kernel(a[i], b[j])`
    ///
    /// Performs exactly `|a| · |b|` kernel evaluations.
    pub fn build(&self, a: &[TileCoordinate], b: &[TileCoordinate]) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((a.len(), b.len()));
        for (mut row, &point_a) in matrix.rows_mut().into_iter().zip(a) {
            for (entry, &point_b) in row.iter_mut().zip(b) {
                *entry = self.kernel.covariance(point_a, point_b);
            }
        }
        matrix
    }

    /// Self-covariance of `points` plus `REGULARIZATION_EPSILON · I`
    ///
    /// The jitter keeps the matrix invertible when coordinates repeat.
    pub fn build_regularized(&self, points: &[TileCoordinate]) -> Array2<f64> {
        let mut matrix = self.build(points, points);
        add_to_diagonal(&mut matrix, REGULARIZATION_EPSILON);
        matrix
    }
}
