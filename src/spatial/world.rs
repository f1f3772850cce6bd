//! Append-only in-memory world of tiles
//!
//! Tiles are numbered from 0 in insertion order, so the tile with index `i`
//! is always the `i`-th element and the next tile receives `len()`.

use crate::io::error::{Result, invalid_parameter, invalid_state};
use crate::spatial::tiles::{Tile, TileCoordinate, is_finite_coordinate};
use ndarray::Array2;

/// Ordered, append-only collection of tiles with a fixed latent dimension
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    latent_dim: usize,
    tiles: Vec<Tile>,
}

impl World {
    /// Create an empty world whose tiles carry `latent_dim` coordinates
    pub const fn new(latent_dim: usize) -> Self {
        Self {
            latent_dim,
            tiles: Vec::new(),
        }
    }

    /// Rebuild a world from previously committed tiles
    ///
    /// # Errors
    ///
    /// Returns an error if the tiles are not numbered `0..n` in order, have a
    /// latent dimension other than `latent_dim`, or hold non-finite values
    pub fn from_tiles(latent_dim: usize, tiles: Vec<Tile>) -> Result<Self> {
        let mut world = Self::new(latent_dim);
        world.append(tiles)?;
        Ok(world)
    }

    /// Latent dimension shared by every tile
    pub const fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Number of tiles
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no tile has been placed yet
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All tiles in index order
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile with the given index
    pub fn get(&self, tile_index: u64) -> Option<&Tile> {
        usize::try_from(tile_index)
            .ok()
            .and_then(|position| self.tiles.get(position))
    }

    /// Index the next appended tile will receive
    pub fn next_index(&self) -> u64 {
        self.tiles.len() as u64
    }

    /// Positions of all tiles in index order
    pub fn coordinates(&self) -> Vec<TileCoordinate> {
        self.tiles.iter().map(Tile::coordinate).collect()
    }

    /// Training coordinates and the `m × d` latent matrix to condition on
    ///
    /// With `context == None` every tile is used. Otherwise only the listed
    /// tiles are used, in the order given.
    ///
    /// # Errors
    ///
    /// Returns an invalid state error if the world is empty, the context list
    /// is empty, or it names a tile that does not exist
    pub fn training_set(
        &self,
        context: Option<&[u64]>,
    ) -> Result<(Vec<TileCoordinate>, Array2<f64>)> {
        if self.is_empty() {
            return Err(invalid_state(
                &"no training tiles available; use bootstrap path",
            ));
        }

        let selected: Vec<&Tile> = match context {
            None => self.tiles.iter().collect(),
            Some([]) => {
                return Err(invalid_state(&"context hint lists no tiles"));
            }
            Some(indices) => indices
                .iter()
                .map(|&index| {
                    self.get(index).ok_or_else(|| {
                        invalid_state(&format!(
                            "context hint references tile {index}, world has {} tiles",
                            self.len()
                        ))
                    })
                })
                .collect::<Result<_>>()?,
        };

        let coordinates = selected.iter().map(|tile| tile.coordinate()).collect();
        let mut latents = Array2::<f64>::zeros((selected.len(), self.latent_dim));
        for (mut row, tile) in latents.rows_mut().into_iter().zip(&selected) {
            for (slot, &value) in row.iter_mut().zip(tile.latent_vector()) {
                *slot = value;
            }
        }

        Ok((coordinates, latents))
    }

    /// Check that `tiles` may be appended as the next contiguous batch
    ///
    /// # Errors
    ///
    /// Returns a configuration error on a latent dimension mismatch or
    /// non-finite values, and an invalid state error on out-of-sequence indices
    pub fn validate_batch(&self, tiles: &[Tile]) -> Result<()> {
        let start = self.next_index();
        for (offset, tile) in tiles.iter().enumerate() {
            let expected = start + offset as u64;
            if tile.tile_index() != expected {
                return Err(invalid_state(&format!(
                    "tile index {} out of sequence, expected {expected}",
                    tile.tile_index()
                )));
            }
            if tile.latent_dim() != self.latent_dim {
                return Err(invalid_parameter(
                    "latent_dim",
                    &tile.latent_dim(),
                    &format!(
                        "tile {} does not match world dimension {}",
                        tile.tile_index(),
                        self.latent_dim
                    ),
                ));
            }
            if !is_finite_coordinate(tile.coordinate())
                || tile.latent_vector().iter().any(|value| !value.is_finite())
            {
                return Err(invalid_parameter(
                    "tile",
                    &tile.tile_index(),
                    &"coordinates and latent values must be finite",
                ));
            }
        }
        Ok(())
    }

    /// Append a validated batch; nothing is appended if any tile is rejected
    ///
    /// # Errors
    ///
    /// Propagates the failure from [`World::validate_batch`]
    pub fn append(&mut self, tiles: Vec<Tile>) -> Result<()> {
        self.validate_batch(&tiles)?;
        self.tiles.extend(tiles);
        Ok(())
    }
}
