//! Error types for magick-morph

use thiserror::Error;

/// Errors that can occur while building or applying kernels
#[derive(Debug, Error)]
pub enum MorphError {
    /// Core image layer error
    #[error("core error: {0}")]
    Core(#[from] magick_core::CoreError),

    /// A kernel definition string could not be parsed
    #[error("failed to parse kernel #{index}: {reason}")]
    KernelParse { index: usize, reason: String },

    /// A built-in kernel was given unusable arguments
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// The named kernel does not exist
    #[error("unknown kernel \"{0}\"")]
    UnknownKernel(String),

    /// The operation was cancelled by the progress callback
    #[error("morphology cancelled")]
    Cancelled,
}

/// Result type for morphology operations
pub type MorphResult<T> = Result<T, MorphError>;
