use std::io;

use thiserror::Error;

/// Errors surfaced at the configuration and setup boundary.
///
/// Generation itself never fails once its inputs are clamped; a fault inside a
/// background computation is logged and swallowed by the pipeline instead.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse TOML config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid region table: {0}")]
    InvalidRegionTable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPoolBuild(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
