//! Input/output, configuration and error handling

/// Command-line interface
pub mod cli;
/// Configuration values and defaults
pub mod configuration;
/// Error types
pub mod error;
/// PNG export of tile images
pub mod image;
/// Tracing subscriber setup
pub mod logging;
/// Progress display
pub mod progress;
/// Text table codec for persisted tiles
pub mod table;
