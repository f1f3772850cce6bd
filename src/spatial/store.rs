//! Durable, append-only store for one world
//!
//! A store directory holds three things:
//! - `world_data.csv`, the tile table (see [`crate::io::table`])
//! - `world_meta.json`, the hyperparameters the tiles were generated with
//! - `images/tile{index}.png`, one rendered image per tile
//!
//! Every commit rewrites the whole table through a temporary file and a
//! rename, so a crash leaves either the old or the new table on disk.

use crate::io::configuration::{
    BootstrapKernel, Hyperparameters, IMAGE_DIR, SamplerConfig, WORLD_META_FILE, WORLD_TABLE_FILE,
};
use crate::io::error::{HypertileError, Result, invalid_parameter, persistence_error};
use crate::io::image::{remove_files, save_tile_images};
use crate::io::table::{TableReadError, read_table, write_table};
use crate::spatial::tiles::Tile;
use crate::spatial::world::World;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Model parameters recorded alongside the tiles they produced
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldMetadata {
    /// Kernel hyperparameters
    pub hyperparameters: Hyperparameters,
    /// Latent dimension of every tile
    pub latent_dim: usize,
    /// Covariance used for the cold-start draw
    pub bootstrap_kernel: BootstrapKernel,
}

impl WorldMetadata {
    /// Metadata implied by a sampler configuration
    pub const fn from_config(config: &SamplerConfig) -> Self {
        Self {
            hyperparameters: config.hyperparameters,
            latent_dim: config.latent_dim,
            bootstrap_kernel: config.bootstrap_kernel,
        }
    }

    /// Fail unless `other` describes the same statistical model
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first differing parameter
    pub fn ensure_matches(&self, other: &Self) -> Result<()> {
        let stored = self.hyperparameters;
        let requested = other.hyperparameters;
        let checks = [
            ("sigma", stored.sigma, requested.sigma),
            ("alpha", stored.alpha, requested.alpha),
            ("lengthscale", stored.lengthscale, requested.lengthscale),
        ];
        for (parameter, stored_value, requested_value) in checks {
            if stored_value.to_bits() != requested_value.to_bits() {
                return Err(invalid_parameter(
                    parameter,
                    &requested_value,
                    &format!("world was generated with {parameter} = {stored_value}"),
                ));
            }
        }
        if self.latent_dim != other.latent_dim {
            return Err(invalid_parameter(
                "latent_dim",
                &other.latent_dim,
                &format!("world was generated with latent_dim = {}", self.latent_dim),
            ));
        }
        if self.bootstrap_kernel != other.bootstrap_kernel {
            return Err(invalid_parameter(
                "bootstrap_kernel",
                &format!("{:?}", other.bootstrap_kernel),
                &format!(
                    "world was generated with bootstrap_kernel = {:?}",
                    self.bootstrap_kernel
                ),
            ));
        }
        Ok(())
    }
}

/// World persisted in a store directory
#[derive(Debug)]
pub struct WorldStateStore {
    root: PathBuf,
    metadata: WorldMetadata,
    world: World,
}

impl WorldStateStore {
    /// Open the store at `config.store_dir`, creating it if absent
    ///
    /// A new store records the configured hyperparameters. An existing store
    /// must have been created with identical hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid or mismatched
    /// hyperparameters and a persistence error if the directory, metadata or
    /// table cannot be read or written
    pub fn open(config: &SamplerConfig) -> Result<Self> {
        config.validate()?;
        let root = config.store_dir.clone();
        let requested = WorldMetadata::from_config(config);

        std::fs::create_dir_all(&root)
            .map_err(|e| persistence_error(&root, "create directory", e))?;

        let metadata_path = root.join(WORLD_META_FILE);
        let metadata = if metadata_path.exists() {
            let stored = read_metadata(&metadata_path)?;
            stored.ensure_matches(&requested)?;
            stored
        } else {
            write_metadata(&metadata_path, &requested)?;
            requested
        };

        let table_path = root.join(WORLD_TABLE_FILE);
        let world = if table_path.exists() {
            load_world(&table_path, metadata.latent_dim)?
        } else {
            World::new(metadata.latent_dim)
        };

        info!(
            store = %root.display(),
            tiles = world.len(),
            latent_dim = metadata.latent_dim,
            "opened world store"
        );

        Ok(Self {
            root,
            metadata,
            world,
        })
    }

    /// Current world contents
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Hyperparameters recorded for this world
    pub const fn metadata(&self) -> &WorldMetadata {
        &self.metadata
    }

    /// Store directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the tile table
    pub fn table_path(&self) -> PathBuf {
        self.root.join(WORLD_TABLE_FILE)
    }

    /// Directory of rendered tile images
    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    /// Atomically append a batch of tiles with their rendered images
    ///
    /// Images are written first, then the table. If any step fails the
    /// images already written are removed and the world is left unchanged.
    /// Returns the image paths in tile order.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch does not continue the world's index
    /// sequence, image and tile counts differ, or any write fails
    pub fn commit(&mut self, tiles: Vec<Tile>, images: &[RgbaImage]) -> Result<Vec<PathBuf>> {
        if tiles.len() != images.len() {
            return Err(invalid_parameter(
                "images",
                &images.len(),
                &format!("expected one image per tile ({} tiles)", tiles.len()),
            ));
        }
        if tiles.is_empty() {
            return Ok(Vec::new());
        }

        let mut staged = self.world.clone();
        staged.append(tiles)?;

        let first_index = self.world.next_index();
        let image_paths = save_tile_images(&self.image_dir(), first_index, images)?;

        if let Err(error) = self.write_table(staged.tiles()) {
            remove_files(&image_paths);
            return Err(error);
        }

        debug!(
            first_index,
            count = image_paths.len(),
            total = staged.len(),
            "committed tile batch"
        );
        self.world = staged;
        Ok(image_paths)
    }

    fn write_table(&self, tiles: &[Tile]) -> Result<()> {
        let table_path = self.table_path();
        let temporary = self.root.join(format!("{WORLD_TABLE_FILE}.tmp"));

        let file = File::create(&temporary)
            .map_err(|e| persistence_error(&temporary, "create table", e))?;
        let mut writer = BufWriter::new(file);
        if let Err(e) = write_table(&mut writer, tiles) {
            let _ = std::fs::remove_file(&temporary);
            return Err(persistence_error(&temporary, "write table", e));
        }
        drop(writer);

        std::fs::rename(&temporary, &table_path).map_err(|e| {
            let _ = std::fs::remove_file(&temporary);
            persistence_error(&table_path, "replace table", e)
        })
    }

    /// Re-read the table from disk, replacing the in-memory world
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the table cannot be read or decoded
    pub fn reload(&mut self) -> Result<()> {
        let table_path = self.table_path();
        self.world = if table_path.exists() {
            load_world(&table_path, self.metadata.latent_dim)?
        } else {
            World::new(self.metadata.latent_dim)
        };
        Ok(())
    }
}

fn read_metadata(path: &Path) -> Result<WorldMetadata> {
    let text =
        std::fs::read_to_string(path).map_err(|e| persistence_error(path, "read metadata", e))?;
    serde_json::from_str(&text).map_err(|e| HypertileError::CorruptRecord {
        path: path.to_path_buf(),
        line: Some(e.line()).filter(|&line| line > 0),
        reason: e.to_string(),
    })
}

fn write_metadata(path: &Path, metadata: &WorldMetadata) -> Result<()> {
    let text = serde_json::to_string_pretty(metadata).map_err(|e| HypertileError::CorruptRecord {
        path: path.to_path_buf(),
        line: None,
        reason: e.to_string(),
    })?;
    std::fs::write(path, text).map_err(|e| persistence_error(path, "write metadata", e))
}

fn load_world(table_path: &Path, latent_dim: usize) -> Result<World> {
    let file = File::open(table_path).map_err(|e| persistence_error(table_path, "open table", e))?;
    let tiles = read_table(BufReader::new(file)).map_err(|e| match e {
        TableReadError::Io(source) => persistence_error(table_path, "read table", source),
        TableReadError::Record { line, error } => HypertileError::CorruptRecord {
            path: table_path.to_path_buf(),
            line: Some(line),
            reason: error.to_string(),
        },
    })?;

    World::from_tiles(latent_dim, tiles).map_err(|e| HypertileError::CorruptRecord {
        path: table_path.to_path_buf(),
        line: None,
        reason: e.to_string(),
    })
}
