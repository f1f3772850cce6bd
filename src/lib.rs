//! Spatially coherent tile worlds sampled from a Gaussian process over hyperbolic space
//!
//! Every tile has a position in the plane and a latent vector. New tiles draw
//! their latent vectors from a GP posterior conditioned on the tiles already
//! placed, using a covariance kernel built on geodesic distance in the
//! hyperboloid model, so neighbouring tiles decode to related images.

#![forbid(unsafe_code)]

/// Covariance assembly, prior and posterior sampling, and request orchestration
pub mod algorithm;
/// Configuration, errors, persistence codecs and the command-line interface
pub mod io;
/// Hyperbolic geometry, dense linear algebra and Gaussian sampling
pub mod math;
/// Tiles, worlds and their durable stores
pub mod spatial;

pub use io::error::{HypertileError, Result};
