//! Error types for models and the training loop.

use edgerec_data::DataError;
use edgerec_layers::LayerError;
use thiserror::Error;

use crate::hooks::HookError;

/// Errors raised while building or running a CTR model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model dimensions are inconsistent; raised before any tensor work.
    #[error("Model configuration error: {0}")]
    Config(String),

    /// A layer rejected its inputs during the forward pass.
    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),

    /// The tensor backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] candle_core::Error),

    /// `output` was requested before any forward pass.
    #[error("No prediction available: forward has not been run")]
    NotComputed,
}

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that abort a training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Building or running the model failed.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Slicing the dataset failed.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// The tensor backend failed outside the model (binding, loss, backward).
    #[error("Backend error: {0}")]
    Backend(#[from] candle_core::Error),

    /// The optimizer could not be created or could not apply an update.
    #[error("Optimizer error: {0}")]
    Optimizer(String),

    /// A training hook failed.
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    /// The run configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for training operations.
pub type TrainingResult<T> = Result<T, TrainingError>;
