//! Cold-start draws from the GP prior when a world has no tiles yet

use crate::algorithm::covariance::CovarianceBuilder;
use crate::io::configuration::{BootstrapKernel, Hyperparameters};
use crate::io::error::{Result, invalid_parameter};
use crate::math::hyperbolic::{CovarianceFunction, HyperbolicKernel, LengthscaleKernel};
use crate::math::linalg::CholeskyFactor;
use crate::math::probability::standard_normal_matrix;
use crate::spatial::tiles::TileCoordinate;
use ndarray::Array2;
use rand::Rng;
use tracing::debug;

/// Prior covariance used for the first batch of a world
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PriorKernel {
    /// The conditioning kernel itself
    Hyperbolic(HyperbolicKernel),
    /// Lengthscale form over the same hyperboloid distance
    Lengthscale(LengthscaleKernel),
}

impl PriorKernel {
    /// Build the configured prior kernel
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid hyperparameters
    pub fn from_config(kind: BootstrapKernel, hyperparameters: &Hyperparameters) -> Result<Self> {
        match kind {
            BootstrapKernel::Hyperbolic => Ok(Self::Hyperbolic(HyperbolicKernel::new(
                hyperparameters.sigma,
                hyperparameters.alpha,
            )?)),
            BootstrapKernel::Lengthscale => Ok(Self::Lengthscale(LengthscaleKernel::new(
                hyperparameters.sigma,
                hyperparameters.lengthscale,
            )?)),
        }
    }
}

impl CovarianceFunction for PriorKernel {
    fn covariance(&self, a: [f64; 2], b: [f64; 2]) -> f64 {
        match self {
            Self::Hyperbolic(kernel) => kernel.covariance(a, b),
            Self::Lengthscale(kernel) => kernel.covariance(a, b),
        }
    }
}

/// Prior draw for an empty world
#[derive(Clone, Debug)]
pub struct BootstrapDraw {
    /// `n × d` latents; row `i` belongs to requested coordinate `i`
    pub latents: Array2<f64>,
    /// Regularized prior covariance the rows were drawn from
    pub covariance: Array2<f64>,
}

/// Draws jointly correlated latent vectors from the GP prior
#[derive(Clone, Debug)]
pub struct BootstrapInitializer<K> {
    builder: CovarianceBuilder<K>,
    latent_dim: usize,
}

impl<K: CovarianceFunction> BootstrapInitializer<K> {
    /// Create an initializer for `latent_dim`-dimensional latent vectors
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `latent_dim` is zero
    pub fn new(kernel: K, latent_dim: usize) -> Result<Self> {
        if latent_dim == 0 {
            return Err(invalid_parameter(
                "latent_dim",
                &latent_dim,
                &"must be at least 1",
            ));
        }
        Ok(Self {
            builder: CovarianceBuilder::new(kernel),
            latent_dim,
        })
    }

    /// Latent dimension `d`
    pub const fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Draw `L · Z` where `L Lᵗ = K + εI` and `Z` is `n × d` standard normal
    ///
    /// Rows are correlated through the prior covariance; columns (latent
    /// dimensions) are independent.
    ///
    /// # Errors
    ///
    /// Returns a numerical error if the prior covariance cannot be factored
    pub fn draw<R: Rng + ?Sized>(
        &self,
        coordinates: &[TileCoordinate],
        rng: &mut R,
    ) -> Result<BootstrapDraw> {
        let covariance = self.builder.build_regularized(coordinates);
        let lower = CholeskyFactor::new(&covariance)?.lower()?;
        let noise = standard_normal_matrix(rng, coordinates.len(), self.latent_dim);
        let latents = lower.dot(&noise);

        debug!(
            tiles = coordinates.len(),
            latent_dim = self.latent_dim,
            "bootstrap draw from prior"
        );

        Ok(BootstrapDraw {
            latents,
            covariance,
        })
    }
}
