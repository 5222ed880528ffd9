//! Activation functions.
//!
//! [`ActivationType`] is the serializable selector used by layer configs;
//! [`LeakyReLU`] and [`Sigmoid`] wrap the two activations the prediction head
//! applies as standalone [`Layer`]s.
//!
//! # Example
//!
//! ```
//! use candle_core::{Device, Tensor};
//! use edgerec_layers::activation::ActivationType;
//!
//! let x = Tensor::new(&[[-2.0f32, 0.0, 3.0]], &Device::Cpu).unwrap();
//! let y = ActivationType::LeakyReLU(0.1).apply(&x).unwrap();
//! assert_eq!(y.to_vec2::<f32>().unwrap(), vec![vec![-0.2, 0.0, 3.0]]);
//! ```

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::LayerResult;
use crate::layer::Layer;

/// Activation function selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationType {
    /// Rectified Linear Unit
    ReLU,
    /// Leaky ReLU with the given negative slope
    LeakyReLU(f32),
    /// Sigmoid function
    Sigmoid,
}

impl Default for ActivationType {
    fn default() -> Self {
        Self::ReLU
    }
}

impl ActivationType {
    /// Applies the activation element-wise.
    pub fn apply(&self, input: &Tensor) -> LayerResult<Tensor> {
        let out = match *self {
            ActivationType::ReLU => input.relu()?,
            ActivationType::LeakyReLU(slope) => {
                candle_nn::ops::leaky_relu(input, f64::from(slope))?
            }
            ActivationType::Sigmoid => candle_nn::ops::sigmoid(input)?,
        };
        Ok(out)
    }
}

/// Leaky ReLU activation function.
///
/// Computes `f(x) = max(alpha * x, x)` element-wise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LeakyReLU {
    /// Negative slope
    alpha: f32,
}

impl LeakyReLU {
    /// Creates a new LeakyReLU with the specified negative slope.
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    /// The negative slope.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for LeakyReLU {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Layer for LeakyReLU {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        ActivationType::LeakyReLU(self.alpha).apply(input)
    }

    fn name(&self) -> &str {
        "LeakyReLU"
    }
}

/// Sigmoid activation function.
///
/// Computes `f(x) = 1 / (1 + exp(-x))` element-wise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sigmoid;

impl Sigmoid {
    /// Creates a new Sigmoid activation.
    pub fn new() -> Self {
        Self
    }
}

impl Layer for Sigmoid {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        ActivationType::Sigmoid.apply(input)
    }

    fn name(&self) -> &str {
        "Sigmoid"
    }
}
