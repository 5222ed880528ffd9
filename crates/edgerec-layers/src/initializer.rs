//! Seeded weight initialization.
//!
//! All random initializers draw from a caller-supplied [`StdRng`], so two
//! models built from the same seed start from identical weights.

use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};

/// Strategy for filling a weight matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// Gaussian with the given mean and standard deviation.
    Normal {
        /// Mean of the distribution
        mean: f32,
        /// Standard deviation of the distribution
        std: f32,
    },
    /// All zeros.
    Zeros,
}

impl Default for Initializer {
    fn default() -> Self {
        Self::standard_normal()
    }
}

impl Initializer {
    /// Zero-mean, unit-variance Gaussian.
    pub fn standard_normal() -> Self {
        Self::Normal {
            mean: 0.0,
            std: 1.0,
        }
    }

    /// Creates a `[rows, cols]` trainable variable on `device`.
    pub fn initialize(
        &self,
        shape: (usize, usize),
        rng: &mut StdRng,
        device: &Device,
    ) -> LayerResult<Var> {
        let (rows, cols) = shape;
        let n = rows * cols;
        let data = match *self {
            Initializer::Zeros => vec![0.0; n],
            Initializer::Normal { mean, std } => sample_normal(n, mean, std, rng)?,
        };
        let tensor = Tensor::from_vec(data, (rows, cols), device)?;
        Ok(Var::from_tensor(&tensor)?)
    }
}

fn sample_normal(n: usize, mean: f32, std: f32, rng: &mut StdRng) -> LayerResult<Vec<f32>> {
    if !(std.is_finite() && std >= 0.0) || !mean.is_finite() {
        return Err(LayerError::InitializationError {
            message: format!("invalid normal({mean}, {std}): std must be finite and non-negative"),
        });
    }
    let normal = Normal::new(mean, std).map_err(|e| LayerError::InitializationError {
        message: format!("invalid normal({mean}, {std}): {e}"),
    })?;
    Ok((0..n).map(|_| normal.sample(rng)).collect())
}
