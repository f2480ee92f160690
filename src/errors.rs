use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for hypha_morph
#[derive(Error, Debug)]
pub enum HyphaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {}: {source}", .path.display())]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("Raster is not binary: found value {value}, expected {foreground} or {background}")]
    NonBinaryRaster {
        value: u8,
        foreground: u8,
        background: u8,
    },

    #[error("Raster buffer holds {actual} pixels, expected {expected}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },

    #[error("Raster has zero width or height")]
    EmptyRaster,

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid input path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, HyphaError>;
