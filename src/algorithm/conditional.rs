//! Gaussian process posterior inference and conditional draws
//!
//! Each latent dimension is an independent GP over tile positions sharing
//! one kernel, so the posterior covariance is computed once and reused for
//! every dimension while the posterior mean differs per dimension.
//! Correlation between latent dimensions is not modeled.
//!
//! Every call refactors the full `m × m` training covariance, costing
//! O(m³) in the number of training tiles. [`ConditioningCost`] reports that
//! work for each draw.

use crate::algorithm::covariance::CovarianceBuilder;
use crate::io::error::{Result, invalid_parameter, invalid_state};
use crate::math::hyperbolic::CovarianceFunction;
use crate::math::linalg::{CholeskyFactor, symmetrize};
use crate::math::probability::GaussianFactor;
use crate::spatial::tiles::TileCoordinate;
use ndarray::Array2;
use rand::Rng;
use tracing::debug;

/// Work performed by one conditional draw
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConditioningCost {
    /// Number of training tiles `m`
    pub training_points: usize,
    /// Number of requested tiles `n`
    pub test_points: usize,
    /// Latent dimension `d`
    pub latent_dim: usize,
    /// Kernel evaluations for `K`, `K*` and `K**`: `m² + m·n + n²`
    pub kernel_evaluations: usize,
    /// Floating-point operations of the training Cholesky factorization, `m³ / 3`
    pub factorization_flops: f64,
}

impl ConditioningCost {
    /// Cost of conditioning `test_points` tiles on `training_points` tiles
    pub fn estimate(training_points: usize, test_points: usize, latent_dim: usize) -> Self {
        let m = training_points;
        let n = test_points;
        Self {
            training_points: m,
            test_points: n,
            latent_dim,
            kernel_evaluations: m * m + m * n + n * n,
            factorization_flops: (m as f64).powi(3) / 3.0,
        }
    }
}

/// Posterior mean and covariance at the requested positions
#[derive(Clone, Debug)]
pub struct Posterior {
    /// `n × d` posterior mean, one column per latent dimension
    pub mean: Array2<f64>,
    /// `n × n` posterior covariance shared by all latent dimensions
    pub covariance: Array2<f64>,
}

/// Latent vectors drawn from the posterior together with their distribution
#[derive(Clone, Debug)]
pub struct ConditionalDraw {
    /// `n × d` matrix; row `i` is the latent vector for requested position `i`
    pub latents: Array2<f64>,
    /// Distribution the latents were drawn from
    pub posterior: Posterior,
    /// Work performed
    pub cost: ConditioningCost,
}

/// Draws latent vectors at new positions conditioned on existing tiles
#[derive(Clone, Debug)]
pub struct GpConditionalSampler<K> {
    builder: CovarianceBuilder<K>,
    latent_dim: usize,
}

impl<K: CovarianceFunction> GpConditionalSampler<K> {
    /// Create a sampler for `latent_dim`-dimensional latent vectors
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

    /// Covariance builder shared with callers that need raw matrices
    pub const fn builder(&self) -> &CovarianceBuilder<K> {
        &self.builder
    }

    /// Posterior over the latent values at `test` given the training tiles
    ///
    /// `training_latents` is `m × d` with one row per training coordinate.
    ///
    /// # Errors
    ///
    /// Returns an invalid state error when there are no training tiles, a
    /// configuration error on shape mismatches, and a numerical error when
    /// the regularized training covariance cannot be factored
    pub fn posterior(
        &self,
        training: &[TileCoordinate],
        training_latents: &Array2<f64>,
        test: &[TileCoordinate],
    ) -> Result<Posterior> {
        if training.is_empty() {
            return Err(invalid_state(
                &"no training tiles available; use bootstrap path",
            ));
        }
        let (rows, cols) = training_latents.dim();
        if rows != training.len() {
            return Err(invalid_parameter(
                "training_latents",
                &rows,
                &format!("expected one row per training tile ({})", training.len()),
            ));
        }
        if cols != self.latent_dim {
            return Err(invalid_parameter(
                "latent_dim",
                &cols,
                &format!("training latents must have dimension {}", self.latent_dim),
            ));
        }

        let train_cov = self.builder.build_regularized(training);
        let train_test_cov = self.builder.build(training, test);
        let test_cov = self.builder.build(test, test);

        let factor = CholeskyFactor::new(&train_cov)?;
        // K⁻¹ · K*, shared by the mean and covariance
        let weights = factor.solve(&train_test_cov)?;

        let mean = weights.t().dot(training_latents);
        let covariance = symmetrize(&(test_cov - train_test_cov.t().dot(&weights)));

        Ok(Posterior { mean, covariance })
    }

    /// Draw one latent vector per test position
    ///
    /// For each latent dimension in turn, a single joint draw over all test
    /// positions is taken from `rng`, so tiles requested together are
    /// correlated with each other as well as with the training tiles.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`GpConditionalSampler::posterior`] and
    /// returns a numerical error if the posterior covariance is not
    /// positive semidefinite
    pub fn sample<R: Rng + ?Sized>(
        &self,
        training: &[TileCoordinate],
        training_latents: &Array2<f64>,
        test: &[TileCoordinate],
        rng: &mut R,
    ) -> Result<ConditionalDraw> {
        let cost = ConditioningCost::estimate(training.len(), test.len(), self.latent_dim);
        let posterior = self.posterior(training, training_latents, test)?;
        let gaussian = GaussianFactor::new(&posterior.covariance)?;

        let mut latents = Array2::<f64>::zeros((test.len(), self.latent_dim));
        for (mut column, mean) in latents
            .columns_mut()
            .into_iter()
            .zip(posterior.mean.columns())
        {
            let draw = gaussian.sample(rng, &mean.to_owned())?;
            column.assign(&draw);
        }

        debug!(
            training_points = cost.training_points,
            test_points = cost.test_points,
            latent_dim = cost.latent_dim,
            kernel_evaluations = cost.kernel_evaluations,
            factorization_flops = cost.factorization_flops,
            "conditional draw"
        );

        Ok(ConditionalDraw {
            latents,
            posterior,
            cost,
        })
    }
}
