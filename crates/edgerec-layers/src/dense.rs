//! Fully connected layer without bias.
//!
//! Computes `y = x @ W` for `x: [batch, in_features]` and
//! `W: [in_features, out_features]`. The weight is a candle [`Var`], so it
//! receives gradients from any loss built on the output.

use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;

use crate::error::{LayerError, LayerResult};
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::dims2;

/// Dense (linear) layer.
#[derive(Debug, Clone)]
pub struct Dense {
    weight: Var,
    in_features: usize,
    out_features: usize,
}

impl Dense {
    /// Creates a dense layer with a freshly initialized `[in, out]` weight.
    pub fn new(
        in_features: usize,
        out_features: usize,
        initializer: Initializer,
        rng: &mut StdRng,
        device: &Device,
    ) -> LayerResult<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(LayerError::ConfigError {
                message: format!(
                    "dense layer needs positive dims, got {in_features}x{out_features}"
                ),
            });
        }
        let weight = initializer.initialize((in_features, out_features), rng, device)?;
        Ok(Self {
            weight,
            in_features,
            out_features,
        })
    }

    /// Wraps an existing `[in, out]` weight matrix.
    pub fn from_weight(weight: Var) -> LayerResult<Self> {
        let (in_features, out_features) = dims2(weight.as_tensor())?;
        Ok(Self {
            weight,
            in_features,
            out_features,
        })
    }

    /// Input width.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Output width.
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// The weight variable.
    pub fn weight(&self) -> &Var {
        &self.weight
    }
}

impl Layer for Dense {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        let (_, width) = dims2(input)?;
        if width != self.in_features {
            return Err(LayerError::InvalidInputDimension {
                expected: self.in_features,
                actual: width,
            });
        }
        Ok(input.matmul(self.weight.as_tensor())?)
    }

    fn parameters(&self) -> Vec<Var> {
        vec![self.weight.clone()]
    }

    fn name(&self) -> &str {
        "Dense"
    }
}
