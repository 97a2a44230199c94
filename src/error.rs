//! Error types for the frame correction pipeline.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Frame-to-frame registration could not be computed
    #[error("registration error: {0}")]
    Registration(String),

    /// The external rectangle detector failed
    #[error("detection error: {0}")]
    Detection(String),

    /// Depth buffer metadata does not describe its payload
    #[error("depth conversion error: {0}")]
    DepthConversion(String),

    /// Image processing operation failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Image similarity comparison failed
    #[error("comparison error: {0}")]
    Compare(#[from] image_compare::CompareError),

    /// Invalid input parameters provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
