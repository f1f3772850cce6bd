//! Sampler configuration values and runtime defaults

use crate::io::error::{Result, invalid_parameter, persistence_error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default kernel amplitude
pub const DEFAULT_SIGMA: f64 = 1.0;
/// Default kernel decay length along the hyperboloid
pub const DEFAULT_ALPHA: f64 = 1.0;
/// Default lengthscale for the lengthscale prior kernel
pub const DEFAULT_LENGTHSCALE: f64 = 1.0;
/// Default latent dimensionality of the generative backend
pub const DEFAULT_LATENT_DIM: usize = 8;
/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;
/// Default edge length of rendered tile images in pixels
pub const DEFAULT_IMAGE_SIZE: u32 = 32;
/// Default directory holding the world store
pub const DEFAULT_STORE_DIR: &str = "world_data";

/// Regularization added to the diagonal of training covariance matrices
pub const REGULARIZATION_EPSILON: f64 = 1e-8;

/// Tolerated negative eigenvalue mass (relative) in a posterior covariance
pub const PSD_TOLERANCE: f64 = 1e-6;

// Persistence layout
/// File name of the tile table inside the store directory
pub const WORLD_TABLE_FILE: &str = "world_data.csv";
/// File name of the hyperparameter record inside the store directory
pub const WORLD_META_FILE: &str = "world_meta.json";
/// Directory name for rendered tile images inside the store directory
pub const IMAGE_DIR: &str = "images";

/// Largest accepted rendered image edge
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Kernel hyperparameters shared by every tile of a world
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Kernel amplitude, the prior standard deviation of each latent coordinate
    pub sigma: f64,
    /// Decay length of covariance along hyperboloid distance
    pub alpha: f64,
    /// Lengthscale of the optional lengthscale prior kernel
    pub lengthscale: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            alpha: DEFAULT_ALPHA,
            lengthscale: DEFAULT_LENGTHSCALE,
        }
    }
}

impl Hyperparameters {
    /// Check every hyperparameter is finite and strictly positive
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending parameter
    pub fn validate(&self) -> Result<()> {
        require_positive("sigma", self.sigma)?;
        require_positive("alpha", self.alpha)?;
        require_positive("lengthscale", self.lengthscale)?;
        Ok(())
    }
}

/// Reject values that are not finite and strictly positive
///
/// # Errors
///
/// Returns a configuration error naming `parameter`
pub fn require_positive(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid_parameter(
            parameter,
            &value,
            &"must be finite and greater than zero",
        ))
    }
}

/// Covariance used to draw the first tiles of an empty world
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapKernel {
    /// `sigma² · exp(-d / alpha)`, the same kernel used for conditioning
    #[default]
    Hyperbolic,
    /// `sigma² · exp(-0.5 · d / lengthscale²)` over the hyperboloid distance
    Lengthscale,
}

/// Latent-to-image backend selected at configuration time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Seeded linear projection of the latent vector onto pixel colours
    #[default]
    Projection,
    /// Flat colour swatch from the leading latent coordinates
    Swatch,
}

/// Complete configuration for one world and its sampler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Kernel hyperparameters, fixed for the lifetime of the world
    pub hyperparameters: Hyperparameters,
    /// Dimension of every latent vector
    pub latent_dim: usize,
    /// Directory holding the tile table, metadata and images
    pub store_dir: PathBuf,
    /// Seed of the shared random stream
    pub seed: u64,
    /// Covariance used for the cold-start draw
    pub bootstrap_kernel: BootstrapKernel,
    /// Image backend
    pub backend: BackendKind,
    /// Rendered image edge length in pixels
    pub image_size: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            latent_dim: DEFAULT_LATENT_DIM,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            seed: DEFAULT_SEED,
            bootstrap_kernel: BootstrapKernel::default(),
            backend: BackendKind::default(),
            image_size: DEFAULT_IMAGE_SIZE,
        }
    }
}

impl SamplerConfig {
    /// Load a configuration from a JSON file; absent fields take defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON for
    /// this schema, or holds invalid values
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| persistence_error(path, "read configuration", e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| invalid_parameter("config", &path.display(), &e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check all values before any world is opened
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-positive hyperparameters, a zero
    /// latent dimension or an image size outside `1..=MAX_IMAGE_SIZE`
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        if self.latent_dim == 0 {
            return Err(invalid_parameter(
                "latent_dim",
                &self.latent_dim,
                &"must be at least 1",
            ));
        }
        if self.image_size == 0 || self.image_size > MAX_IMAGE_SIZE {
            return Err(invalid_parameter(
                "image_size",
                &self.image_size,
                &format!("must be between 1 and {MAX_IMAGE_SIZE}"),
            ));
        }
        Ok(())
    }

    /// Same configuration rooted at a different store directory
    #[must_use]
    pub fn with_store_dir(&self, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..self.clone()
        }
    }
}
