//! Inverted dropout with its own seeded generator.
//!
//! In training mode each element is zeroed with probability `rate` and the
//! survivors are scaled by `1 / (1 - rate)`, so evaluation mode is a plain
//! identity. Masks are sampled from a [`StdRng`] owned by the layer.

use std::fmt;
use std::sync::Mutex;

use candle_core::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{LayerError, LayerResult};
use crate::layer::Layer;

/// Dropout layer.
pub struct Dropout {
    rate: f32,
    training: bool,
    rng: Mutex<StdRng>,
}

impl Dropout {
    /// Creates a dropout layer dropping each element with probability `rate`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::ConfigError`] unless `0 <= rate < 1`.
    pub fn new(rate: f32, seed: u64) -> LayerResult<Self> {
        if !(0.0..1.0).contains(&rate) {
            return Err(LayerError::ConfigError {
                message: format!("dropout rate must be in [0, 1), got {rate}"),
            });
        }
        Ok(Self {
            rate,
            training: true,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    /// Drop probability.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl fmt::Debug for Dropout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropout")
            .field("rate", &self.rate)
            .field("training", &self.training)
            .finish()
    }
}

impl Layer for Dropout {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        if !self.training || self.rate == 0.0 {
            return Ok(input.clone());
        }
        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        let mask: Vec<f32> = {
            let mut rng = self.rng.lock().map_err(|_| LayerError::ForwardError {
                message: "dropout generator lock poisoned".to_string(),
            })?;
            (0..input.elem_count())
                .map(|_| if rng.gen::<f32>() < keep { scale } else { 0.0 })
                .collect()
        };
        let mask = Tensor::from_vec(mask, input.dims(), input.device())?;
        Ok(input.mul(&mask)?)
    }

    fn name(&self) -> &str {
        "Dropout"
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn ones(rows: usize, cols: usize) -> Tensor {
        Tensor::ones((rows, cols), DType::F32, &Device::Cpu).unwrap()
    }

    fn flat(t: &Tensor) -> Vec<f32> {
        t.flatten_all().unwrap().to_vec1::<f32>().unwrap()
    }

    #[test]
    fn test_rejects_bad_rate() {
        assert!(Dropout::new(1.0, 0).is_err());
        assert!(Dropout::new(-0.1, 0).is_err());
        assert!(Dropout::new(0.0, 0).is_ok());
    }

    #[test]
    fn test_eval_is_identity() {
        let mut dropout = Dropout::new(0.5, 3).unwrap();
        dropout.set_training(false);
        let out = dropout.forward(&ones(4, 8)).unwrap();
        assert!(flat(&out).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_training_zeroes_and_scales() {
        let dropout = Dropout::new(0.5, 3).unwrap();
        assert!(dropout.is_training());
        let v = flat(&dropout.forward(&ones(50, 50)).unwrap());

        assert!(v.iter().all(|&x| x == 0.0 || (x - 2.0).abs() < 1e-6));
        let dropped = v.iter().filter(|&&x| x == 0.0).count() as f32 / v.len() as f32;
        assert!((dropped - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_same_seed_same_mask() {
        let a = Dropout::new(0.3, 11).unwrap();
        let b = Dropout::new(0.3, 11).unwrap();
        let input = ones(8, 8);
        assert_eq!(
            flat(&a.forward(&input).unwrap()),
            flat(&b.forward(&input).unwrap())
        );
    }
}
