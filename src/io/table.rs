//! Row-oriented text table for persisted tiles
//!
//! Layout is a header line followed by one row per tile:
//!
//! ```text
//! tile_index,tile_x,tile_y,latent_vector
//! 0,0.0,0.0,"[0.12, -1.5, 3e-7]"
//! ```
//!
//! Numbers are written with Rust's shortest round-trip formatting, so reading
//! a table back reproduces every `f64` bit for bit. The latent column is read
//! by a strict parser that accepts only a bracketed list of finite decimal
//! numbers.

use crate::spatial::tiles::Tile;
use std::fmt;
use std::io::{BufRead, Write};

/// Header line of the tile table
pub const TABLE_HEADER: &str = "tile_index,tile_x,tile_y,latent_vector";

/// Reason a table row was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    message: String,
}

impl RecordError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RecordError {}

/// Format a latent vector as `[a, b, c]`
pub fn format_latent_vector(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|value| format!("{value:?}")).collect();
    format!("[{}]", items.join(", "))
}

/// Parse a bracketed, comma-separated list of finite numbers
///
/// Whitespace around items is ignored. Anything else, including nested
/// lists, identifiers, `NaN` or infinities, is rejected.
///
/// # Errors
///
/// Returns a [`RecordError`] describing the first offending item
pub fn parse_latent_vector(text: &str) -> Result<Vec<f64>, RecordError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| RecordError::new(format!("latent vector must be bracketed: '{text}'")))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .enumerate()
        .map(|(position, item)| parse_finite(item.trim(), "latent value", position))
        .collect()
}

fn parse_finite(item: &str, what: &str, position: usize) -> Result<f64, RecordError> {
    let is_numeric = !item.is_empty()
        && item
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !is_numeric {
        return Err(RecordError::new(format!(
            "{what} {position} is not a number: '{item}'"
        )));
    }

    let value: f64 = item
        .parse()
        .map_err(|e| RecordError::new(format!("{what} {position} '{item}': {e}")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RecordError::new(format!(
            "{what} {position} is not finite: '{item}'"
        )))
    }
}

/// Format one tile as a table row (without trailing newline)
pub fn format_row(tile: &Tile) -> String {
    format!(
        "{},{:?},{:?},\"{}\"",
        tile.tile_index(),
        tile.tile_x(),
        tile.tile_y(),
        format_latent_vector(tile.latent_vector())
    )
}

/// Parse one table row
///
/// # Errors
///
/// Returns a [`RecordError`] if the row does not have the four expected
/// columns or any column fails to parse
pub fn parse_row(line: &str) -> Result<Tile, RecordError> {
    let mut columns = line.splitn(4, ',');
    let (Some(index), Some(x), Some(y), Some(latent)) = (
        columns.next(),
        columns.next(),
        columns.next(),
        columns.next(),
    ) else {
        return Err(RecordError::new("expected four columns"));
    };

    let tile_index: u64 = index
        .trim()
        .parse()
        .map_err(|e| RecordError::new(format!("tile_index '{index}': {e}")))?;
    let tile_x = parse_finite(x.trim(), "tile_x", 0)?;
    let tile_y = parse_finite(y.trim(), "tile_y", 0)?;

    let quoted = latent.trim();
    let unquoted = quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(quoted);
    let latent_vector = parse_latent_vector(unquoted)?;

    Ok(Tile::new(tile_index, [tile_x, tile_y], latent_vector))
}

/// Write the header and one row per tile
///
/// # Errors
///
/// Propagates I/O failures from `writer`
pub fn write_table<W: Write>(writer: &mut W, tiles: &[Tile]) -> std::io::Result<()> {
    writeln!(writer, "{TABLE_HEADER}")?;
    for tile in tiles {
        writeln!(writer, "{}", format_row(tile))?;
    }
    writer.flush()
}

/// Outcome of reading a table: tiles, or the failing line and reason
#[derive(Debug)]
pub enum TableReadError {
    /// Underlying reader failed
    Io(std::io::Error),
    /// A line was rejected (one-based line number)
    Record {
        /// One-based line number
        line: usize,
        /// Why it was rejected
        error: RecordError,
    },
}

/// Read a table written by [`write_table`]
///
/// Blank lines are skipped. The header must match [`TABLE_HEADER`].
///
/// # Errors
///
/// Returns [`TableReadError::Io`] on read failures and
/// [`TableReadError::Record`] for a missing header or malformed row
pub fn read_table<R: BufRead>(reader: R) -> Result<Vec<Tile>, TableReadError> {
    let mut tiles = Vec::new();
    let mut header_seen = false;

    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(TableReadError::Io)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !header_seen {
            if trimmed != TABLE_HEADER {
                return Err(TableReadError::Record {
                    line: number + 1,
                    error: RecordError::new(format!("unexpected header '{trimmed}'")),
                });
            }
            header_seen = true;
            continue;
        }

        let tile = parse_row(trimmed).map_err(|error| TableReadError::Record {
            line: number + 1,
            error,
        })?;
        tiles.push(tile);
    }

    Ok(tiles)
}
