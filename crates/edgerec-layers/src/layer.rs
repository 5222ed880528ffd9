//! Layer trait definition for neural network layers.
//!
//! Layers compute on candle [`Tensor`]s and expose their weights as candle
//! [`Var`]s, so gradients come from `Tensor::backward` rather than from a
//! hand-written backward pass.

use candle_core::{Tensor, Var};

use crate::error::LayerResult;

/// A neural network layer with a single-input forward pass.
///
/// # Example
///
/// ```
/// use candle_core::{DType, Device, Tensor};
/// use edgerec_layers::dense::Dense;
/// use edgerec_layers::initializer::Initializer;
/// use edgerec_layers::layer::Layer;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let layer = Dense::new(128, 64, Initializer::Zeros, &mut rng, &Device::Cpu).unwrap();
/// let input = Tensor::zeros((32, 128), DType::F32, &Device::Cpu).unwrap();
/// let output = layer.forward(&input).unwrap();
/// assert_eq!(output.dims(), &[32, 64]);
/// ```
pub trait Layer: Send + Sync {
    /// Performs a forward pass through the layer.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerError`](crate::error::LayerError) if the input shape
    /// is incompatible with the layer
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor>;

    /// Returns the layer's learnable parameters in a stable order.
    fn parameters(&self) -> Vec<Var> {
        Vec::new()
    }

    /// Returns the name of the layer for debugging and logging purposes.
    fn name(&self) -> &str {
        "Layer"
    }

    /// Returns whether the layer is in training mode.
    fn is_training(&self) -> bool {
        false
    }

    /// Sets the layer's training mode.
    fn set_training(&mut self, _training: bool) {}
}
