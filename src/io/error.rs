//! Error types for world construction, sampling and persistence

use std::fmt;
use std::path::PathBuf;

/// Coarse failure classes used when reporting an aborted generation request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid hyperparameters, dimensions or other construction-time input
    Configuration,
    /// Operation not valid for the current world contents
    InvalidState,
    /// Factorization or decomposition failure on a covariance matrix
    Numerical,
    /// Reading or writing the world store failed
    Persistence,
    /// The latent-to-image backend or image export failed
    Image,
}

/// Main error type for all sampling and world operations
#[derive(Debug)]
pub enum HypertileError {
    /// Configuration value failed validation
    Configuration {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Operation is not valid against the current world
    ///
    /// Raised when conditional sampling is attempted without training tiles,
    /// when a context hint references tiles that do not exist, or when a
    /// world is seeded twice.
    InvalidState {
        /// Description of the violated precondition
        reason: String,
    },

    /// Numerical computation failed on an ill-conditioned matrix
    Numerical {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// File system operation on the world store failed
    Persistence {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A persisted record could not be decoded
    CorruptRecord {
        /// File containing the record
        path: PathBuf,
        /// One-based line number of the record, or `None` when the whole
        /// file is rejected
        line: Option<usize>,
        /// Why the record was rejected
        reason: String,
    },

    /// Latent-to-image backend failed for part of a batch
    ImageGeneration {
        /// Index the first tile of the failed batch would have received
        first_index: u64,
        /// Number of tiles in the failed batch
        count: usize,
        /// Backend failure description
        reason: String,
    },

    /// Failed to save a tile image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },
}

impl HypertileError {
    /// Map this error onto its reporting category
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::InvalidState { .. } => ErrorCategory::InvalidState,
            Self::Numerical { .. } => ErrorCategory::Numerical,
            Self::Persistence { .. } | Self::CorruptRecord { .. } => ErrorCategory::Persistence,
            Self::ImageGeneration { .. } | Self::ImageExport { .. } => ErrorCategory::Image,
        }
    }
}

impl fmt::Display for HypertileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid configuration '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidState { reason } => {
                write!(f, "Invalid world state: {reason}")
            }
            Self::Numerical { operation, reason } => {
                write!(f, "Numerical error in {operation}: {reason}")
            }
            Self::Persistence {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "Persistence error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::CorruptRecord { path, line, reason } => match line {
                Some(line) => write!(
                    f,
                    "Corrupt record at '{}' line {line}: {reason}",
                    path.display()
                ),
                None => write!(f, "Corrupt record at '{}': {reason}", path.display()),
            },
            Self::ImageGeneration {
                first_index,
                count,
                reason,
            } => {
                write!(
                    f,
                    "Image generation failed for tiles {first_index}..{}: {reason}",
                    first_index + *count as u64
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for HypertileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence { source, .. } => Some(source),
            Self::ImageExport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, HypertileError>;

/// Create a configuration error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> HypertileError {
    HypertileError::Configuration {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a numerical error
pub fn numerical_error(operation: &'static str, reason: &impl ToString) -> HypertileError {
    HypertileError::Numerical {
        operation,
        reason: reason.to_string(),
    }
}

/// Create an invalid state error
pub fn invalid_state(reason: &impl ToString) -> HypertileError {
    HypertileError::InvalidState {
        reason: reason.to_string(),
    }
}

/// Create a persistence error for an I/O failure on `path`
pub fn persistence_error(
    path: impl Into<PathBuf>,
    operation: &'static str,
    source: std::io::Error,
) -> HypertileError {
    HypertileError::Persistence {
        path: path.into(),
        operation,
        source,
    }
}
