//! Latent-to-image capability and the built-in decoders
//!
//! The orchestrator only sees `dyn LatentToImage`; which decoder sits behind
//! it is decided once, from configuration, by [`backend_from_config`].

use crate::io::configuration::{BackendKind, SamplerConfig};
use crate::io::error::{Result, invalid_parameter};
use image::{Rgba, RgbaImage};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

/// Turns latent vectors into images
pub trait LatentToImage: Send + Sync {
    /// Dimension of the latent vectors this backend accepts
    fn latent_dim(&self) -> usize;

    /// Render one latent vector
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong dimension or the backend
    /// fails
    fn render(&self, latent: &[f64]) -> Result<RgbaImage>;

    /// Render an ordered batch, returning images in the same order
    ///
    /// # Errors
    ///
    /// Returns the first failure; no partial batch is returned
    fn render_batch(&self, latents: &[Vec<f64>]) -> Result<Vec<RgbaImage>> {
        latents.iter().map(|latent| self.render(latent)).collect()
    }
}

fn check_latent(latent: &[f64], latent_dim: usize) -> Result<()> {
    if latent.len() != latent_dim {
        return Err(invalid_parameter(
            "latent_vector",
            &latent.len(),
            &format!("backend expects dimension {latent_dim}"),
        ));
    }
    if latent.iter().any(|value| !value.is_finite()) {
        return Err(invalid_parameter(
            "latent_vector",
            &format!("{latent:?}"),
            &"latent values must be finite",
        ));
    }
    Ok(())
}

fn logistic(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

fn channel(unit: f64) -> u8 {
    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Fixed random linear decoder from latent space to RGB pixels
///
/// Each pixel channel is a logistic squash of a seeded Gaussian projection of
/// the latent vector, so nearby latents render to similar images.
#[derive(Clone, Debug)]
pub struct ProjectionDecoder {
    latent_dim: usize,
    size: u32,
    weights: Array2<f64>,
}

impl ProjectionDecoder {
    /// Create a decoder producing `size × size` images
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `latent_dim` or `size` is zero
    pub fn new(latent_dim: usize, size: u32, seed: u64) -> Result<Self> {
        if latent_dim == 0 {
            return Err(invalid_parameter("latent_dim", &latent_dim, &"must be at least 1"));
        }
        if size == 0 {
            return Err(invalid_parameter("image_size", &size, &"must be at least 1"));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let outputs = size as usize * size as usize * 3;
        let scale = (latent_dim as f64).sqrt().recip();
        let weights = Array2::from_shape_simple_fn((outputs, latent_dim), || {
            rng.sample::<f64, _>(StandardNormal) * scale
        });

        Ok(Self {
            latent_dim,
            size,
            weights,
        })
    }

    /// Edge length of rendered images
    pub const fn size(&self) -> u32 {
        self.size
    }
}

impl LatentToImage for ProjectionDecoder {
    fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    fn render(&self, latent: &[f64]) -> Result<RgbaImage> {
        check_latent(latent, self.latent_dim)?;
        let projected = self.weights.dot(&Array1::from(latent.to_vec()));

        Ok(RgbaImage::from_fn(self.size, self.size, |x, y| {
            let base = (y as usize * self.size as usize + x as usize) * 3;
            let value = |offset: usize| {
                channel(logistic(projected.get(base + offset).copied().unwrap_or(0.0)))
            };
            Rgba([value(0), value(1), value(2), 255])
        }))
    }
}

/// Flat colour swatch from the first three latent coordinates
///
/// Missing coordinates (for latent dimensions below three) read as zero.
/// A mild radial falloff marks the tile centre.
#[derive(Clone, Copy, Debug)]
pub struct SwatchDecoder {
    latent_dim: usize,
    size: u32,
}

impl SwatchDecoder {
    /// Create a decoder producing `size × size` images
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `latent_dim` or `size` is zero
    pub fn new(latent_dim: usize, size: u32) -> Result<Self> {
        if latent_dim == 0 {
            return Err(invalid_parameter("latent_dim", &latent_dim, &"must be at least 1"));
        }
        if size == 0 {
            return Err(invalid_parameter("image_size", &size, &"must be at least 1"));
        }
        Ok(Self { latent_dim, size })
    }
}

impl LatentToImage for SwatchDecoder {
    fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    fn render(&self, latent: &[f64]) -> Result<RgbaImage> {
        check_latent(latent, self.latent_dim)?;
        let colour: [f64; 3] =
            std::array::from_fn(|k| logistic(latent.get(k).copied().unwrap_or(0.0)));

        let centre = f64::from(self.size - 1) / 2.0;
        let radius = centre.hypot(centre).max(1.0);

        Ok(RgbaImage::from_fn(self.size, self.size, |x, y| {
            let distance = (f64::from(x) - centre).hypot(f64::from(y) - centre) / radius;
            let shade = 1.0 - 0.35 * distance;
            Rgba([
                channel(colour[0] * shade),
                channel(colour[1] * shade),
                channel(colour[2] * shade),
                255,
            ])
        }))
    }
}

/// Backend selected by `config.backend`
///
/// # Errors
///
/// Returns a configuration error for an invalid latent dimension or image size
pub fn backend_from_config(config: &SamplerConfig) -> Result<Box<dyn LatentToImage>> {
    match config.backend {
        BackendKind::Projection => Ok(Box::new(ProjectionDecoder::new(
            config.latent_dim,
            config.image_size,
            config.seed,
        )?)),
        BackendKind::Swatch => Ok(Box::new(SwatchDecoder::new(
            config.latent_dim,
            config.image_size,
        )?)),
    }
}
