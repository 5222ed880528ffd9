//! Error types for the edgerec-layers crate.
//!
//! Shape problems detected by the layers themselves are reported with their
//! own variants; anything the candle backend rejects is wrapped in
//! [`LayerError::Backend`].

use thiserror::Error;

/// Error type for layer operations.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Shape mismatch between expected and actual tensor shapes.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape
        expected: Vec<usize>,
        /// The actual shape that was provided
        actual: Vec<usize>,
    },

    /// Invalid input dimension for the layer.
    #[error("Invalid input dimension: expected {expected}, got {actual}")]
    InvalidInputDimension {
        /// The expected input dimension
        expected: usize,
        /// The actual input dimension
        actual: usize,
    },

    /// Error during weight initialization.
    #[error("Initialization error: {message}")]
    InitializationError {
        /// Description of the initialization error
        message: String,
    },

    /// Error during forward pass computation.
    #[error("Forward pass error: {message}")]
    ForwardError {
        /// Description of the forward pass error
        message: String,
    },

    /// Configuration error for the layer.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// The tensor backend rejected an operation.
    #[error("Backend error: {0}")]
    Backend(#[from] candle_core::Error),
}

/// Result type alias for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;
