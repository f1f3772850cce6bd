//! Mathematical utilities for the sampler

/// Hyperboloid embedding, geodesic distance and covariance kernels
pub mod hyperbolic;
/// Cholesky factorization and symmetric eigen-decomposition over `nalgebra`
pub mod linalg;
/// Gaussian sampling from a shared random stream
pub mod probability;
