//! Coordinates one generation request against a world store
//!
//! A request runs as: read the world, draw one latent vector per requested
//! coordinate (from the prior if the world is empty, otherwise from the GP
//! posterior), render every latent through the image backend, then commit
//! tiles and images in a single append. Any failure before the commit leaves
//! the world exactly as it was; the whole batch is rolled back rather than
//! keeping the tiles that succeeded.
//!
//! Taking the store by `&mut` makes the read-compute-append sequence an
//! exclusive critical section for that world. Several worlds can run in
//! parallel through [`crate::spatial::registry::WorldRegistry`].

use crate::algorithm::backend::LatentToImage;
use crate::algorithm::bootstrap::{BootstrapInitializer, PriorKernel};
use crate::algorithm::conditional::{ConditioningCost, GpConditionalSampler};
use crate::io::configuration::SamplerConfig;
use crate::io::error::{HypertileError, Result, invalid_parameter, invalid_state};
use crate::math::hyperbolic::HyperbolicKernel;
use crate::spatial::store::{WorldMetadata, WorldStateStore};
use crate::spatial::tiles::{Tile, TileCoordinate, is_finite_coordinate};
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;
use tracing::{info, warn};

/// Batch of tile positions to generate
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationRequest {
    /// Requested positions, processed in order
    pub coordinates: Vec<TileCoordinate>,
    /// Existing tile indices to condition on; `None` uses the whole world
    pub context: Option<Vec<u64>>,
}

impl GenerationRequest {
    /// Request tiles at `coordinates`, conditioning on the whole world
    pub const fn new(coordinates: Vec<TileCoordinate>) -> Self {
        Self {
            coordinates,
            context: None,
        }
    }

    /// Restrict conditioning to the listed existing tiles
    #[must_use]
    pub fn with_context(mut self, context: Vec<u64>) -> Self {
        self.context = Some(context);
        self
    }
}

/// Which distribution produced a batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingPath {
    /// Prior draw for an empty world
    Bootstrap,
    /// Posterior draw conditioned on existing tiles
    Conditional,
}

/// Outcome of a committed generation request
#[derive(Clone, Debug)]
pub struct GenerationReport {
    /// Newly appended tiles in request order
    pub tiles: Vec<Tile>,
    /// Saved image for each new tile
    pub image_paths: Vec<PathBuf>,
    /// Distribution the latents were drawn from
    pub path: SamplingPath,
    /// Conditioning work, for conditional draws
    pub cost: Option<ConditioningCost>,
}

/// Generates tiles for one world configuration
pub struct TileGenerationOrchestrator {
    conditional: GpConditionalSampler<HyperbolicKernel>,
    bootstrap: BootstrapInitializer<PriorKernel>,
    backend: Box<dyn LatentToImage>,
    metadata: WorldMetadata,
    rng: StdRng,
}

impl TileGenerationOrchestrator {
    /// Create an orchestrator seeded from `config.seed`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid hyperparameters or when the
    /// backend's latent dimension differs from the configured one
    pub fn new(config: &SamplerConfig, backend: Box<dyn LatentToImage>) -> Result<Self> {
        Self::with_rng(config, backend, StdRng::seed_from_u64(config.seed))
    }

    /// Create an orchestrator drawing from the given random stream
    ///
    /// # Errors
    ///
    /// Same as [`TileGenerationOrchestrator::new`]
    pub fn with_rng(
        config: &SamplerConfig,
        backend: Box<dyn LatentToImage>,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        if backend.latent_dim() != config.latent_dim {
            return Err(invalid_parameter(
                "latent_dim",
                &config.latent_dim,
                &format!("backend produces images from dimension {}", backend.latent_dim()),
            ));
        }

        let hyperparameters = &config.hyperparameters;
        let kernel = HyperbolicKernel::new(hyperparameters.sigma, hyperparameters.alpha)?;
        let prior = PriorKernel::from_config(config.bootstrap_kernel, hyperparameters)?;

        Ok(Self {
            conditional: GpConditionalSampler::new(kernel, config.latent_dim)?,
            bootstrap: BootstrapInitializer::new(prior, config.latent_dim)?,
            backend,
            metadata: WorldMetadata::from_config(config),
            rng,
        })
    }

    /// Bootstrap an empty world with initial tiles
    ///
    /// # Errors
    ///
    /// Returns an invalid state error if the world already has tiles, plus
    /// anything [`TileGenerationOrchestrator::generate`] can return
    pub fn seed(
        &mut self,
        store: &mut WorldStateStore,
        coordinates: Vec<TileCoordinate>,
    ) -> Result<GenerationReport> {
        if !store.world().is_empty() {
            return Err(invalid_state(&format!(
                "world already holds {} tiles; seeding requires an empty world",
                store.world().len()
            )));
        }
        self.generate(store, &GenerationRequest::new(coordinates))
    }

    /// Generate, render and append one tile per requested coordinate
    ///
    /// New tiles are numbered from the current world size in request order.
    /// On any error the store is unchanged.
    ///
    /// # Errors
    ///
    /// - Configuration: non-finite coordinates or a store created with other
    ///   hyperparameters
    /// - Invalid state: context hints that are empty or name missing tiles
    /// - Numerical: covariance factorization failures
    /// - Image / persistence: backend or write failures (batch rolled back)
    pub fn generate(
        &mut self,
        store: &mut WorldStateStore,
        request: &GenerationRequest,
    ) -> Result<GenerationReport> {
        store.metadata().ensure_matches(&self.metadata)?;
        if let Some(bad) = request
            .coordinates
            .iter()
            .find(|&&coordinate| !is_finite_coordinate(coordinate))
        {
            return Err(invalid_parameter(
                "coordinates",
                &format!("{bad:?}"),
                &"coordinates must be finite",
            ));
        }

        let world = store.world();
        let first_index = world.next_index();
        let requested = &request.coordinates;

        if requested.is_empty() {
            let path = if world.is_empty() {
                SamplingPath::Bootstrap
            } else {
                SamplingPath::Conditional
            };
            return Ok(GenerationReport {
                tiles: Vec::new(),
                image_paths: Vec::new(),
                path,
                cost: None,
            });
        }

        let (latents, path, cost) = if world.is_empty() {
            if request.context.is_some() {
                return Err(invalid_state(
                    &"context hint given but the world has no tiles",
                ));
            }
            let draw = self.bootstrap.draw(requested, &mut self.rng)?;
            (draw.latents, SamplingPath::Bootstrap, None)
        } else {
            let (training, training_latents) = world.training_set(request.context.as_deref())?;
            let draw =
                self.conditional
                    .sample(&training, &training_latents, requested, &mut self.rng)?;
            (draw.latents, SamplingPath::Conditional, Some(draw.cost))
        };

        let vectors = latent_rows(&latents);
        let images = self.backend.render_batch(&vectors).map_err(|e| {
            warn!(first_index, count = vectors.len(), error = %e, "image generation failed; batch rolled back");
            HypertileError::ImageGeneration {
                first_index,
                count: vectors.len(),
                reason: e.to_string(),
            }
        })?;
        if images.len() != vectors.len() {
            return Err(HypertileError::ImageGeneration {
                first_index,
                count: vectors.len(),
                reason: format!(
                    "backend returned {} images for {} latents",
                    images.len(),
                    vectors.len()
                ),
            });
        }

        let tiles: Vec<Tile> = requested
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(offset, (&coordinate, latent))| {
                Tile::new(first_index + offset as u64, coordinate, latent)
            })
            .collect();

        let image_paths = store.commit(tiles.clone(), &images)?;

        info!(
            first_index,
            count = tiles.len(),
            world_size = store.world().len(),
            path = ?path,
            "generated tile batch"
        );

        Ok(GenerationReport {
            tiles,
            image_paths,
            path,
            cost,
        })
    }
}

fn latent_rows(latents: &Array2<f64>) -> Vec<Vec<f64>> {
    latents.rows().into_iter().map(|row| row.to_vec()).collect()
}
