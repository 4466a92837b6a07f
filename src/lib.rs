//! Endless procedural terrain: fractal noise height maps, LOD meshes and chunk
//! streaming around a moving viewer, with generation on a worker pool.

pub mod config;
pub mod core;
pub mod error;
pub mod terrain;
pub mod threading;

pub use error::{Result, TerrainError};
