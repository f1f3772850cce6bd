//! Positioned tiles and their latent vectors
//!
//! A tile is written once, when its batch commits, and never edited. Fields
//! are private so that the only way to obtain a tile with a given latent
//! vector is to construct it.

/// Planar coordinate `(x, y)` of a tile in the embedding space
pub type TileCoordinate = [f64; 2];

/// One positioned unit of generated content
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    tile_index: u64,
    tile_x: f64,
    tile_y: f64,
    latent_vector: Vec<f64>,
}

impl Tile {
    /// Create a tile at `coordinate` holding `latent_vector`
    pub const fn new(tile_index: u64, coordinate: TileCoordinate, latent_vector: Vec<f64>) -> Self {
        Self {
            tile_index,
            tile_x: coordinate[0],
            tile_y: coordinate[1],
            latent_vector,
        }
    }

    /// Unique index of the tile within its world
    pub const fn tile_index(&self) -> u64 {
        self.tile_index
    }

    /// Horizontal coordinate
    pub const fn tile_x(&self) -> f64 {
        self.tile_x
    }

    /// Vertical coordinate
    pub const fn tile_y(&self) -> f64 {
        self.tile_y
    }

    /// Position as a coordinate pair
    pub const fn coordinate(&self) -> TileCoordinate {
        [self.tile_x, self.tile_y]
    }

    /// Latent vector consumed by the image backend
    pub fn latent_vector(&self) -> &[f64] {
        &self.latent_vector
    }

    /// Dimension of the latent vector
    pub fn latent_dim(&self) -> usize {
        self.latent_vector.len()
    }
}

/// Whether both components of a coordinate are finite
pub fn is_finite_coordinate(coordinate: TileCoordinate) -> bool {
    coordinate.iter().all(|value| value.is_finite())
}

/// Parse an `x,y` pair such as `0.5,-1`
///
/// # Errors
///
/// Returns a description of the problem if the text is not two finite
/// comma-separated numbers
pub fn parse_coordinate(text: &str) -> Result<TileCoordinate, String> {
    let mut parts = text.split(',').map(str::trim);
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected 'x,y', got '{text}'"));
    };

    let x: f64 = x
        .parse()
        .map_err(|e| format!("invalid x coordinate '{x}': {e}"))?;
    let y: f64 = y
        .parse()
        .map_err(|e| format!("invalid y coordinate '{y}': {e}"))?;

    let coordinate = [x, y];
    if is_finite_coordinate(coordinate) {
        Ok(coordinate)
    } else {
        Err(format!("coordinates must be finite, got '{text}'"))
    }
}
