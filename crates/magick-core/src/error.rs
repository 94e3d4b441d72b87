//! Error types for magick-core

use thiserror::Error;

/// Errors that can occur in the core image layer
#[derive(Debug, Error)]
pub enum CoreError {
    /// Image dimensions are unusable
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A geometry argument string could not be parsed
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
