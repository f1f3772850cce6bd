//! Spatial data structures and world persistence
//!
//! This module contains:
//! - Tiles and planar coordinates
//! - The append-only in-memory world
//! - Durable stores and the per-session registry

/// Independent per-session worlds
pub mod registry;
/// Durable world store
pub mod store;
/// Tile records and coordinates
pub mod tiles;
/// Append-only in-memory world
pub mod world;

pub use store::WorldStateStore;
pub use world::World;
