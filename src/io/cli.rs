//! Command-line interface for seeding, growing and inspecting a world

use crate::algorithm::backend::backend_from_config;
use crate::algorithm::orchestrator::{
    GenerationReport, GenerationRequest, SamplingPath, TileGenerationOrchestrator,
};
use crate::io::configuration::{BackendKind, BootstrapKernel, SamplerConfig};
use crate::io::error::Result;
use crate::io::progress::GenerationProgress;
use crate::spatial::store::WorldStateStore;
use crate::spatial::tiles::{TileCoordinate, parse_coordinate};
use clap::{Args, Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hypertile")]
#[command(
    author,
    version,
    about = "Grow a spatially coherent world of latent tiles over hyperbolic space"
)]
/// Command-line arguments for the tile world tool
pub struct Cli {
    /// Configuration overrides shared by all commands
    #[command(flatten)]
    pub settings: Settings,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Options that shape the sampler configuration
#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
    /// JSON configuration file; flags below override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// World store directory
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Kernel amplitude
    #[arg(long, global = true)]
    pub sigma: Option<f64>,

    /// Kernel decay length along the hyperboloid
    #[arg(long, global = true)]
    pub alpha: Option<f64>,

    /// Lengthscale of the lengthscale prior kernel
    #[arg(long, global = true)]
    pub lengthscale: Option<f64>,

    /// Latent vector dimension
    #[arg(short = 'd', long, global = true)]
    pub latent_dim: Option<usize>,

    /// Random seed for reproducible generation
    #[arg(short, long, global = true)]
    pub seed: Option<u64>,

    /// Covariance for the first batch of an empty world
    #[arg(long, value_enum, global = true)]
    pub bootstrap_kernel: Option<BootstrapKernel>,

    /// Image backend
    #[arg(short, long, value_enum, global = true)]
    pub backend: Option<BackendKind>,

    /// Rendered image edge length in pixels
    #[arg(long, global = true)]
    pub image_size: Option<u32>,

    /// Log debug detail, including conditioning cost
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress output and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Bootstrap an empty world with initial tiles
    Init {
        /// Tile coordinates as `x,y`; pass negative pairs after `--`
        #[arg(value_name = "X,Y", required = true, value_parser = parse_coordinate)]
        coords: Vec<TileCoordinate>,
    },
    /// Generate new tiles conditioned on the existing world
    Generate {
        /// Tile coordinates as `x,y`; pass negative pairs after `--`
        #[arg(value_name = "X,Y", required = true, value_parser = parse_coordinate)]
        coords: Vec<TileCoordinate>,

        /// Existing tile indices to condition on (default: all tiles)
        #[arg(long, value_delimiter = ',')]
        context: Option<Vec<u64>>,
    },
    /// Print the tiles of the world
    Show,
}

impl Settings {
    /// Resolve the sampler configuration from file and flags
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or the
    /// resulting configuration is invalid
    pub fn sampler_config(&self) -> Result<SamplerConfig> {
        let mut config = match &self.config {
            Some(path) => SamplerConfig::from_json_file(path)?,
            None => SamplerConfig::default(),
        };

        if let Some(store) = &self.store {
            config.store_dir.clone_from(store);
        }
        if let Some(sigma) = self.sigma {
            config.hyperparameters.sigma = sigma;
        }
        if let Some(alpha) = self.alpha {
            config.hyperparameters.alpha = alpha;
        }
        if let Some(lengthscale) = self.lengthscale {
            config.hyperparameters.lengthscale = lengthscale;
        }
        if let Some(latent_dim) = self.latent_dim {
            config.latent_dim = latent_dim;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(kernel) = self.bootstrap_kernel {
            config.bootstrap_kernel = kernel;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(image_size) = self.image_size {
            config.image_size = image_size;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Stream seed for one invocation against a world of `world_size` tiles
///
/// Each run restarts the process, so mixing in the world size keeps
/// successive requests from reusing the same noise while staying
/// reproducible for a given seed and world.
pub const fn run_seed(seed: u64, world_size: usize) -> u64 {
    seed ^ (world_size as u64).rotate_left(32)
}

/// Executes one parsed command
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the command
    ///
    /// # Errors
    ///
    /// Returns any configuration, sampling, image or persistence failure
    pub fn run(&self) -> Result<()> {
        let config = self.cli.settings.sampler_config()?;
        let mut store = WorldStateStore::open(&config)?;

        match &self.cli.command {
            Command::Init { coords } => {
                let mut orchestrator = self.orchestrator(&config, &store)?;
                let progress = self.progress();
                progress.start(coords.len(), store.world().len());
                let report = finish_progress(
                    &progress,
                    orchestrator.seed(&mut store, coords.clone()),
                )?;
                print_report(&report);
            }
            Command::Generate { coords, context } => {
                let mut orchestrator = self.orchestrator(&config, &store)?;
                let mut request = GenerationRequest::new(coords.clone());
                if let Some(context) = context {
                    request = request.with_context(context.clone());
                }
                let progress = self.progress();
                progress.start(coords.len(), store.world().len());
                let report =
                    finish_progress(&progress, orchestrator.generate(&mut store, &request))?;
                print_report(&report);
            }
            Command::Show => print_world(&store),
        }

        Ok(())
    }

    fn orchestrator(
        &self,
        config: &SamplerConfig,
        store: &WorldStateStore,
    ) -> Result<TileGenerationOrchestrator> {
        let backend = backend_from_config(config)?;
        let rng = StdRng::seed_from_u64(run_seed(config.seed, store.world().len()));
        TileGenerationOrchestrator::with_rng(config, backend, rng)
    }

    fn progress(&self) -> GenerationProgress {
        if self.cli.settings.should_show_progress() {
            GenerationProgress::new()
        } else {
            GenerationProgress::hidden()
        }
    }
}

fn finish_progress(
    progress: &GenerationProgress,
    outcome: Result<GenerationReport>,
) -> Result<GenerationReport> {
    match &outcome {
        Ok(report) => progress.finish(format!("committed {} tiles", report.tiles.len())),
        Err(_) => progress.abandon(),
    }
    outcome
}

// Allow print for command output
#[allow(clippy::print_stdout)]
fn print_report(report: &GenerationReport) {
    let path = match report.path {
        SamplingPath::Bootstrap => "prior",
        SamplingPath::Conditional => "posterior",
    };
    for (tile, image) in report.tiles.iter().zip(&report.image_paths) {
        println!(
            "tile {} at ({}, {}) from {path} -> {}",
            tile.tile_index(),
            tile.tile_x(),
            tile.tile_y(),
            image.display()
        );
    }
    if let Some(cost) = report.cost {
        println!(
            "conditioned on {} tiles ({} kernel evaluations, ~{:.0} factorization flops)",
            cost.training_points, cost.kernel_evaluations, cost.factorization_flops
        );
    }
}

// Allow print for command output
#[allow(clippy::print_stdout)]
fn print_world(store: &WorldStateStore) {
    let world = store.world();
    let metadata = store.metadata();
    println!(
        "world at {}: {} tiles, latent_dim {}, sigma {}, alpha {}, lengthscale {}",
        store.root().display(),
        world.len(),
        metadata.latent_dim,
        metadata.hyperparameters.sigma,
        metadata.hyperparameters.alpha,
        metadata.hyperparameters.lengthscale
    );
    for tile in world.tiles() {
        println!(
            "{:>6}  ({:>10.4}, {:>10.4})  |z| = {:.4}",
            tile.tile_index(),
            tile.tile_x(),
            tile.tile_y(),
            tile.latent_vector().iter().map(|v| v * v).sum::<f64>().sqrt()
        );
    }
}
