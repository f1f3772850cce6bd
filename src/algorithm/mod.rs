/// Latent-to-image capability and built-in decoders
pub mod backend;
/// Cold-start sampling from the GP prior
pub mod bootstrap;
/// GP posterior inference and conditional sampling
pub mod conditional;
/// Covariance matrices between coordinate sets
pub mod covariance;
/// Generation request coordination and batch commit
pub mod orchestrator;
