//! Click-probability prediction head.
//!
//! [`PredictionMlp`] is a stack of bias-free [`Dense`] layers. Every hidden
//! layer is followed by a leaky ReLU and a [`Dropout`]; the final layer has a
//! single unit followed by a sigmoid, so each example gets a probability in
//! `(0, 1)`.
//!
//! # Example
//!
//! ```
//! use candle_core::{DType, Device, Tensor};
//! use edgerec_layers::layer::Layer;
//! use edgerec_layers::mlp::{MlpConfig, PredictionMlp};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mlp = PredictionMlp::new(12, &MlpConfig::default(), &mut rng, &Device::Cpu).unwrap();
//! assert_eq!(mlp.parameters().len(), 3);
//!
//! let x = Tensor::zeros((4, 12), DType::F32, &Device::Cpu).unwrap();
//! assert_eq!(mlp.forward(&x).unwrap().dims(), &[4, 1]);
//! ```

use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::{LeakyReLU, Sigmoid};
use crate::dense::Dense;
use crate::dropout::Dropout;
use crate::error::{LayerError, LayerResult};
use crate::initializer::Initializer;
use crate::layer::Layer;

/// Configuration of the prediction head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer widths; a final single-unit layer is always appended
    pub hidden_units: Vec<usize>,
    /// Negative slope of the hidden activations
    pub leaky_slope: f32,
    /// Drop probability applied after every hidden layer in training mode
    pub dropout_rate: f32,
    /// Weight initializer
    pub initializer: Initializer,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl MlpConfig {
    /// 200 → 80 → 1 with dropout 0.01.
    pub fn baseline() -> Self {
        Self {
            hidden_units: vec![200, 80],
            leaky_slope: 0.1,
            dropout_rate: 0.01,
            initializer: Initializer::default(),
        }
    }

    /// 200 → 80 → 1 with dropout 0.001.
    pub fn din() -> Self {
        Self {
            dropout_rate: 0.001,
            ..Self::baseline()
        }
    }

    /// Sets the hidden layer widths.
    pub fn with_hidden_units(mut self, units: Vec<usize>) -> Self {
        self.hidden_units = units;
        self
    }

    /// Sets the leaky ReLU slope.
    pub fn with_leaky_slope(mut self, slope: f32) -> Self {
        self.leaky_slope = slope;
        self
    }

    /// Sets the dropout rate.
    pub fn with_dropout_rate(mut self, rate: f32) -> Self {
        self.dropout_rate = rate;
        self
    }

    /// Sets the weight initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LayerResult<()> {
        if self.hidden_units.iter().any(|&u| u == 0) {
            return Err(LayerError::ConfigError {
                message: format!("hidden units must be positive: {:?}", self.hidden_units),
            });
        }
        if !self.leaky_slope.is_finite() {
            return Err(LayerError::ConfigError {
                message: format!("leaky slope must be finite, got {}", self.leaky_slope),
            });
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(LayerError::ConfigError {
                message: format!("dropout rate must be in [0, 1), got {}", self.dropout_rate),
            });
        }
        Ok(())
    }
}

/// Feed-forward prediction head ending in a sigmoid.
#[derive(Debug)]
pub struct PredictionMlp {
    hidden: Vec<(Dense, Dropout)>,
    output: Dense,
    activation: LeakyReLU,
    training: bool,
}

impl PredictionMlp {
    /// Builds the head for inputs of width `input_dim`.
    ///
    /// Weights are drawn from `rng` in layer order; each dropout layer gets
    /// its own generator seeded from `rng`.
    pub fn new(
        input_dim: usize,
        config: &MlpConfig,
        rng: &mut StdRng,
        device: &Device,
    ) -> LayerResult<Self> {
        config.validate()?;
        let mut hidden = Vec::with_capacity(config.hidden_units.len());
        let mut in_features = input_dim;
        for &units in &config.hidden_units {
            let dense = Dense::new(in_features, units, config.initializer, rng, device)?;
            let dropout = Dropout::new(config.dropout_rate, rng.gen())?;
            hidden.push((dense, dropout));
            in_features = units;
        }
        let output = Dense::new(in_features, 1, config.initializer, rng, device)?;
        Ok(Self {
            hidden,
            output,
            activation: LeakyReLU::new(config.leaky_slope),
            training: true,
        })
    }

    /// Expected input width.
    pub fn input_dim(&self) -> usize {
        self.hidden
            .first()
            .map(|(dense, _)| dense.in_features())
            .unwrap_or_else(|| self.output.in_features())
    }

    /// Number of dense layers, including the output layer.
    pub fn num_layers(&self) -> usize {
        self.hidden.len() + 1
    }
}

impl Layer for PredictionMlp {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        let mut x = input.clone();
        for (dense, dropout) in &self.hidden {
            x = dense.forward(&x)?;
            x = self.activation.forward(&x)?;
            x = dropout.forward(&x)?;
        }
        Sigmoid.forward(&self.output.forward(&x)?)
    }

    /// `W0, W1, ..., W_out` in layer order.
    fn parameters(&self) -> Vec<Var> {
        self.hidden
            .iter()
            .map(|(dense, _)| dense.weight().clone())
            .chain(std::iter::once(self.output.weight().clone()))
            .collect()
    }

    fn name(&self) -> &str {
        "PredictionMlp"
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
        for (_, dropout) in &mut self.hidden {
            dropout.set_training(training);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use rand::SeedableRng;

    fn small_config() -> MlpConfig {
        MlpConfig::default().with_initializer(Initializer::Normal {
            mean: 0.0,
            std: 0.1,
        })
    }

    #[test]
    fn test_defaults() {
        let baseline = MlpConfig::baseline();
        assert_eq!(baseline.hidden_units, vec![200, 80]);
        assert_eq!(baseline.leaky_slope, 0.1);
        assert_eq!(baseline.dropout_rate, 0.01);
        assert_eq!(MlpConfig::din().dropout_rate, 0.001);
        assert_eq!(MlpConfig::default(), baseline);
    }

    #[test]
    fn test_validate() {
        assert!(MlpConfig::default().with_dropout_rate(1.0).validate().is_err());
        assert!(MlpConfig::default()
            .with_hidden_units(vec![16, 0])
            .validate()
            .is_err());
        assert!(MlpConfig::default()
            .with_leaky_slope(f32::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_parameter_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let mlp = PredictionMlp::new(10, &small_config(), &mut rng, &Device::Cpu).unwrap();
        let shapes: Vec<Vec<usize>> = mlp.parameters().iter().map(|p| p.dims().to_vec()).collect();
        assert_eq!(shapes, vec![vec![10, 200], vec![200, 80], vec![80, 1]]);
        assert_eq!(mlp.input_dim(), 10);
        assert_eq!(mlp.num_layers(), 3);
    }

    #[test]
    fn test_output_is_probability() {
        let mut rng = StdRng::seed_from_u64(1);
        let mlp = PredictionMlp::new(6, &small_config(), &mut rng, &Device::Cpu).unwrap();
        let x = Tensor::randn(0.0f32, 3.0, (16, 6), &Device::Cpu).unwrap();
        let p = mlp.forward(&x).unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(p.len(), 16);
        assert!(p.iter().all(|&v| v > 0.0 && v < 1.0));
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut mlp = PredictionMlp::new(
            4,
            &small_config().with_dropout_rate(0.5),
            &mut rng,
            &Device::Cpu,
        )
        .unwrap();
        mlp.set_training(false);
        assert!(!mlp.is_training());

        let x = Tensor::ones((3, 4), DType::F32, &Device::Cpu).unwrap();
        let a = mlp.forward(&x).unwrap().to_vec2::<f32>().unwrap();
        let b = mlp.forward(&x).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let mut rng = StdRng::seed_from_u64(3);
        let mlp = PredictionMlp::new(4, &small_config(), &mut rng, &Device::Cpu).unwrap();
        let x = Tensor::ones((3, 5), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            mlp.forward(&x),
            Err(LayerError::InvalidInputDimension { .. })
        ));
    }
}
