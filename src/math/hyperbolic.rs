//! Hyperboloid embedding of planar coordinates and covariance kernels over it
//!
//! Planar points `(x, z)` are lifted onto the upper sheet of the two-sheeted
//! hyperboloid `y² - x² - z² = 1`. Distances are geodesic distances on that
//! sheet, which form a conditionally negative-definite metric; the exponential
//! of a negative multiple of such a metric is a valid positive-semidefinite
//! covariance.

use crate::io::configuration::require_positive;
use crate::io::error::Result;

/// Anything that assigns a covariance to a pair of planar coordinates
pub trait CovarianceFunction {
    /// Covariance between the values at `a` and `b`
    fn covariance(&self, a: [f64; 2], b: [f64; 2]) -> f64;
}

/// Height of the hyperboloid sheet above the planar coordinate `(x, z)`
pub fn lift(x: f64, z: f64) -> f64 {
    (1.0 + x * x + z * z).sqrt()
}

/// Minkowski inner product of two lifted coordinates
pub fn minkowski_inner(a: [f64; 2], b: [f64; 2]) -> f64 {
    let [x1, z1] = a;
    let [x2, z2] = b;
    let y1 = lift(x1, z1);
    let y2 = lift(x2, z2);
    y1 * y2 - x1 * x2 - z1 * z2
}

/// Amount by which the Minkowski inner product of two lifted points exceeds 1
///
/// Evaluated as `((x1-x2)² + (z1-z2)² - (y1-y2)²) / 2`, which equals
/// `minkowski_inner(a, b) - 1` in exact arithmetic but keeps full relative
/// precision for nearby points and is exactly zero when `a == b`.
pub fn minkowski_excess(a: [f64; 2], b: [f64; 2]) -> f64 {
    let [x1, z1] = a;
    let [x2, z2] = b;
    let dx = x1 - x2;
    let dz = z1 - z2;
    let dy = (x1 * x1 + z1 * z1 - (x2 * x2 + z2 * z2)) / (lift(x1, z1) + lift(x2, z2));
    0.5 * (dx * dx + dz * dz - dy * dy)
}

/// Geodesic distance between two planar coordinates on the hyperboloid
///
/// Equals `acosh(minkowski_inner(a, b))`. The inner product is at least 1 in
/// exact arithmetic; rounding can leave it marginally below 1 for nearly
/// identical points, where `acosh` is undefined, and those cases return 0.
/// That clamp is not a geodesic value.
pub fn hyperboloid_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let excess = minkowski_excess(a, b);
    if excess <= 0.0 {
        return 0.0;
    }
    // acosh(1 + t) = ln(1 + t + sqrt(t (t + 2)))
    (excess + (excess * (excess + 2.0)).sqrt()).ln_1p()
}

/// `sigma² · exp(-distance / alpha)` over hyperboloid distance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HyperbolicKernel {
    sigma: f64,
    alpha: f64,
}

impl HyperbolicKernel {
    /// Create a kernel with amplitude `sigma` and decay length `alpha`
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless both values are finite and positive
    pub fn new(sigma: f64, alpha: f64) -> Result<Self> {
        require_positive("sigma", sigma)?;
        require_positive("alpha", alpha)?;
        Ok(Self { sigma, alpha })
    }

    /// Kernel amplitude
    pub const fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Decay length
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Prior variance at any single point, `sigma²`
    pub const fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }

    /// Kernel value between `a` and `b`
    pub fn evaluate(&self, a: [f64; 2], b: [f64; 2]) -> f64 {
        self.variance() * (-hyperboloid_distance(a, b) / self.alpha).exp()
    }
}

impl CovarianceFunction for HyperbolicKernel {
    fn covariance(&self, a: [f64; 2], b: [f64; 2]) -> f64 {
        self.evaluate(a, b)
    }
}

/// `sigma² · exp(-0.5 · distance / lengthscale²)` over hyperboloid distance
///
/// Same functional family as [`HyperbolicKernel`] with the decay expressed
/// through a lengthscale. Only used for cold-start draws when configured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthscaleKernel {
    sigma: f64,
    lengthscale: f64,
}

impl LengthscaleKernel {
    /// Create a kernel with amplitude `sigma` and the given lengthscale
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless both values are finite and positive
    pub fn new(sigma: f64, lengthscale: f64) -> Result<Self> {
        require_positive("sigma", sigma)?;
        require_positive("lengthscale", lengthscale)?;
        Ok(Self { sigma, lengthscale })
    }

    /// Kernel lengthscale
    pub const fn lengthscale(&self) -> f64 {
        self.lengthscale
    }
}

impl CovarianceFunction for LengthscaleKernel {
    fn covariance(&self, a: [f64; 2], b: [f64; 2]) -> f64 {
        let decay = 0.5 * hyperboloid_distance(a, b) / (self.lengthscale * self.lengthscale);
        self.sigma * self.sigma * (-decay).exp()
    }
}
