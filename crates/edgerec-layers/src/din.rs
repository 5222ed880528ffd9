//! Deep Interest Network (DIN) attention pooling.
//!
//! Every behavior slot `i` of a user's history owns a dedicated two-layer
//! scoring network ([`AttentionUnit`]). The unit sees the slot's behavior
//! vector, the outer-product interaction of the whole history with the
//! candidate item, and the item itself, and produces one relevance score per
//! example. The slot's behavior vector is scaled by that score, and the
//! scaled vectors are sum-pooled into a single user-interest vector.
//!
//! # Architecture
//!
//! For slot `i` with `ub_i: [B, D]`, `out_prod: [B, S*D*D]`, `item: [B, D]`:
//! 1. `concat = [ub_i, out_prod, item]` → `[B, D + S*D*D + D]`
//! 2. `score = ReLU(concat @ Att0[i]) @ Att1[i]` → `[B, 1]`
//! 3. `act_i = ub_i * score` (broadcast over `D`)
//!
//! The pooled output is `sum_i act_i` → `[B, D]`.
//!
//! # Example
//!
//! ```
//! use candle_core::{DType, Device, Tensor};
//! use edgerec_layers::din::{DinAttention, DinConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let din = DinAttention::new(DinConfig::new(3, 4), &mut rng, &Device::Cpu).unwrap();
//!
//! let behaviors = Tensor::zeros((2, 3 * 4), DType::F32, &Device::Cpu).unwrap();
//! let item = Tensor::zeros((2, 4), DType::F32, &Device::Cpu).unwrap();
//! let interest = din.forward_attention(&behaviors, &item).unwrap();
//! assert_eq!(interest.dims(), &[2, 4]);
//! ```
//!
//! # References
//!
//! - Zhou, G., et al. "Deep Interest Network for Click-Through Rate Prediction." KDD 2018.

use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;
use crate::dense::Dense;
use crate::error::{LayerError, LayerResult};
use crate::initializer::Initializer;
use crate::interaction::outer_product_features;
use crate::layer::Layer;
use crate::pooling::{Pooling, SumPooling};
use crate::tensor::{check_shape, dims2};

/// Configuration for DIN attention pooling.
///
/// # Example
///
/// ```
/// use edgerec_layers::din::DinConfig;
///
/// let config = DinConfig::new(5, 8).with_attention_hidden_units(16);
/// assert_eq!(config.attention_input_dim(), 8 + 5 * 8 * 8 + 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DinConfig {
    /// Behavior sequence length `S`
    pub behavior_size: usize,
    /// Behavior and item embedding dimension `D`
    pub behavior_dim: usize,
    /// Width of the hidden layer of each attention unit
    pub attention_hidden_units: usize,
    /// Initializer for the attention weights
    pub initializer: Initializer,
}

impl DinConfig {
    /// Creates a configuration for `behavior_size` slots of dimension
    /// `behavior_dim`, with 36 hidden attention units.
    pub fn new(behavior_size: usize, behavior_dim: usize) -> Self {
        Self {
            behavior_size,
            behavior_dim,
            attention_hidden_units: 36,
            initializer: Initializer::default(),
        }
    }

    /// Sets the hidden width of each attention unit.
    pub fn with_attention_hidden_units(mut self, units: usize) -> Self {
        self.attention_hidden_units = units;
        self
    }

    /// Sets the weight initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    /// Width of the concatenated input of one attention unit.
    pub fn attention_input_dim(&self) -> usize {
        let d = self.behavior_dim;
        d + self.behavior_size * d * d + d
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LayerResult<()> {
        if self.behavior_size == 0 || self.behavior_dim == 0 {
            return Err(LayerError::ConfigError {
                message: format!(
                    "behavior_size and behavior_dim must be positive, got {} and {}",
                    self.behavior_size, self.behavior_dim
                ),
            });
        }
        if self.attention_hidden_units == 0 {
            return Err(LayerError::ConfigError {
                message: "attention_hidden_units must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Scoring network of a single behavior slot.
#[derive(Debug, Clone)]
pub struct AttentionUnit {
    hidden: Dense,
    score: Dense,
}

impl AttentionUnit {
    /// Creates a unit with `Att0: [input_dim, hidden_units]` and
    /// `Att1: [hidden_units, 1]`.
    pub fn new(
        input_dim: usize,
        hidden_units: usize,
        initializer: Initializer,
        rng: &mut StdRng,
        device: &Device,
    ) -> LayerResult<Self> {
        Ok(Self {
            hidden: Dense::new(input_dim, hidden_units, initializer, rng, device)?,
            score: Dense::new(hidden_units, 1, initializer, rng, device)?,
        })
    }

    /// Relevance score `[B, 1]` of this slot for every example.
    pub fn score(&self, behavior: &Tensor, out_prod: &Tensor, item: &Tensor) -> LayerResult<Tensor> {
        let concat = Tensor::cat(&[behavior, out_prod, item], 1)?;
        let hidden = ActivationType::ReLU.apply(&self.hidden.forward(&concat)?)?;
        self.score.forward(&hidden)
    }

    /// Gates `behavior: [B, D]` by its score, returning `[B, D]`.
    pub fn forward(&self, behavior: &Tensor, out_prod: &Tensor, item: &Tensor) -> LayerResult<Tensor> {
        let score = self.score(behavior, out_prod, item)?;
        Ok(behavior.broadcast_mul(&score)?)
    }

    /// `Att0` of this slot.
    pub fn att0(&self) -> &Var {
        self.hidden.weight()
    }

    /// `Att1` of this slot.
    pub fn att1(&self) -> &Var {
        self.score.weight()
    }
}

/// Per-slot attention followed by sum pooling.
#[derive(Debug, Clone)]
pub struct DinAttention {
    config: DinConfig,
    units: Vec<AttentionUnit>,
}

impl DinAttention {
    /// Builds one [`AttentionUnit`] per behavior slot.
    pub fn new(config: DinConfig, rng: &mut StdRng, device: &Device) -> LayerResult<Self> {
        config.validate()?;
        let input_dim = config.attention_input_dim();
        let units = (0..config.behavior_size)
            .map(|_| {
                AttentionUnit::new(
                    input_dim,
                    config.attention_hidden_units,
                    config.initializer,
                    rng,
                    device,
                )
            })
            .collect::<LayerResult<Vec<_>>>()?;
        Ok(Self { config, units })
    }

    /// The layer configuration.
    pub fn config(&self) -> &DinConfig {
        &self.config
    }

    /// Attention units, indexed by slot.
    pub fn units(&self) -> &[AttentionUnit] {
        &self.units
    }

    /// Pools `behaviors: [B, S*D]` against `item: [B, D]` into `[B, D]`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::ShapeMismatch`] when either input disagrees with
    /// the configured `S` and `D`; no tensor work is done in that case.
    pub fn forward_attention(&self, behaviors: &Tensor, item: &Tensor) -> LayerResult<Tensor> {
        let s = self.config.behavior_size;
        let d = self.config.behavior_dim;
        let (batch, _) = dims2(behaviors)?;
        check_shape(behaviors, &[batch, s * d])?;
        check_shape(item, &[batch, d])?;

        let out_prod = outer_product_features(behaviors, item)?;
        let gated = self
            .units
            .iter()
            .enumerate()
            .map(|(i, unit)| {
                let behavior = behaviors.narrow(1, i * d, d)?;
                unit.forward(&behavior, &out_prod, item)
            })
            .collect::<LayerResult<Vec<_>>>()?;
        SumPooling.pool(&gated)
    }

    /// `Att0[0..S]` followed by `Att1[0..S]`.
    pub fn parameters(&self) -> Vec<Var> {
        let att0 = self.units.iter().map(|u| u.att0().clone());
        let att1 = self.units.iter().map(|u| u.att1().clone());
        att0.chain(att1).collect()
    }
}
