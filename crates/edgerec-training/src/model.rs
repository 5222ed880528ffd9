//! CTR model variants.
//!
//! Both variants implement [`CtrModel`], so the trainer never needs to know
//! which one it is driving:
//!
//! - [`SimpleMlp`] feeds the raw flattened behavior matrix straight into the
//!   prediction head.
//! - [`DinNet`] pools the behaviors with per-slot attention against the
//!   candidate item first, then feeds the pooled user interest to the head.
//!
//! # Example
//!
//! ```
//! use candle_core::{DType, Device, Tensor};
//! use edgerec_training::model::{CtrModel, ModelConfig, ModelKind};
//!
//! let config = ModelConfig::new(ModelKind::Din).with_dims(2, 3, 4, 4, 1);
//! let mut model = config.build().unwrap();
//! assert_eq!(model.learnable().len(), 3 + 2 * 3);
//!
//! let zeros = |cols: usize| Tensor::zeros((8, cols), DType::F32, &Device::Cpu).unwrap();
//! model
//!     .forward(&zeros(2), &zeros(12), &zeros(4), &zeros(1), 8, 3, 4)
//!     .unwrap();
//! assert_eq!(model.output().unwrap().dims(), &[8, 1]);
//! ```

use std::fmt;
use std::str::FromStr;

use candle_core::{Device, Tensor, Var};
use edgerec_data::SampleInfo;
use edgerec_layers::din::{DinAttention, DinConfig};
use edgerec_layers::initializer::Initializer;
use edgerec_layers::mlp::{MlpConfig, PredictionMlp};
use edgerec_layers::tensor::{concat_features, dims2};
use edgerec_layers::{Layer, LayerError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Which model variant to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Plain MLP over the raw behavior matrix.
    Baseline,
    /// Deep Interest Network with per-slot attention pooling.
    #[default]
    Din,
}

impl ModelKind {
    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Baseline => "baseline",
            ModelKind::Din => "din",
        }
    }

    /// Dropout rate of the prediction head when none is configured.
    pub fn default_dropout_rate(&self) -> f32 {
        match self {
            ModelKind::Baseline => MlpConfig::baseline().dropout_rate,
            ModelKind::Din => MlpConfig::din().dropout_rate,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" | "mlp" | "simple_mlp" => Ok(ModelKind::Baseline),
            "din" => Ok(ModelKind::Din),
            other => Err(ModelError::Config(format!("unknown model kind: {other}"))),
        }
    }
}

/// Dimensions and hyper-parameters of a CTR model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model variant
    pub kind: ModelKind,
    /// User profile width
    pub user_profile_dim: usize,
    /// Behavior sequence length `S`
    pub behavior_size: usize,
    /// Behavior embedding dimension `D`
    pub behavior_dim: usize,
    /// Item feature width; must equal `behavior_dim`
    pub item_feature_dim: usize,
    /// Context width
    pub ctx_feature_dim: usize,
    /// Hidden widths of the prediction head
    pub hidden_units: Vec<usize>,
    /// Negative slope of the head's leaky ReLUs
    pub leaky_slope: f32,
    /// Dropout rate of the head; `None` uses the variant default
    pub dropout_rate: Option<f32>,
    /// Hidden width of each attention unit
    pub attention_hidden_units: usize,
    /// Standard deviation of the zero-mean Gaussian weight initializer
    pub init_std: f32,
    /// Seed for weight initialization and dropout masks
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::default(),
            user_profile_dim: 4,
            behavior_size: 5,
            behavior_dim: 4,
            item_feature_dim: 4,
            ctx_feature_dim: 2,
            hidden_units: vec![200, 80],
            leaky_slope: 0.1,
            dropout_rate: None,
            attention_hidden_units: 36,
            init_std: 1.0,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Default configuration for `kind`.
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Derives the feature dimensions from a dataset layout.
    pub fn from_sample_info(
        kind: ModelKind,
        info: &SampleInfo,
        behavior_size: usize,
    ) -> ModelResult<Self> {
        let behavior_dim = info
            .behavior_dim(behavior_size)
            .map_err(|e| ModelError::Config(e.to_string()))?;
        Ok(Self::new(kind).with_dims(
            info.user_profile_dim(),
            behavior_size,
            behavior_dim,
            info.item_feature_dim(),
            info.ctx_feature_dim(),
        ))
    }

    /// Sets every feature dimension at once.
    pub fn with_dims(
        mut self,
        user_profile_dim: usize,
        behavior_size: usize,
        behavior_dim: usize,
        item_feature_dim: usize,
        ctx_feature_dim: usize,
    ) -> Self {
        self.user_profile_dim = user_profile_dim;
        self.behavior_size = behavior_size;
        self.behavior_dim = behavior_dim;
        self.item_feature_dim = item_feature_dim;
        self.ctx_feature_dim = ctx_feature_dim;
        self
    }

    /// Sets the model variant.
    pub fn with_kind(mut self, kind: ModelKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the hidden widths of the prediction head.
    pub fn with_hidden_units(mut self, units: Vec<usize>) -> Self {
        self.hidden_units = units;
        self
    }

    /// Overrides the variant's default dropout rate.
    pub fn with_dropout_rate(mut self, rate: f32) -> Self {
        self.dropout_rate = Some(rate);
        self
    }

    /// Sets the weight initializer's standard deviation.
    pub fn with_init_std(mut self, std: f32) -> Self {
        self.init_std = std;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Weight initializer shared by every layer.
    pub fn initializer(&self) -> Initializer {
        Initializer::Normal {
            mean: 0.0,
            std: self.init_std,
        }
    }

    /// Effective dropout rate of the prediction head.
    pub fn dropout_rate(&self) -> f32 {
        self.dropout_rate
            .unwrap_or_else(|| self.kind.default_dropout_rate())
    }

    /// Configuration of the prediction head.
    pub fn mlp_config(&self) -> MlpConfig {
        MlpConfig::baseline()
            .with_hidden_units(self.hidden_units.clone())
            .with_leaky_slope(self.leaky_slope)
            .with_dropout_rate(self.dropout_rate())
            .with_initializer(self.initializer())
    }

    /// Configuration of the attention pooling.
    pub fn din_config(&self) -> DinConfig {
        DinConfig::new(self.behavior_size, self.behavior_dim)
            .with_attention_hidden_units(self.attention_hidden_units)
            .with_initializer(self.initializer())
    }

    /// Width of the prediction head's input.
    ///
    /// The baseline sees all `S * D` behavior columns, DIN sees the pooled
    /// `D`-wide interest vector.
    pub fn mlp_input_dim(&self) -> usize {
        let behavior = match self.kind {
            ModelKind::Baseline => self.behavior_size * self.behavior_dim,
            ModelKind::Din => self.behavior_dim,
        };
        self.user_profile_dim + behavior + self.item_feature_dim + self.ctx_feature_dim
    }

    /// Checks the invariants every model relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] when the behavior embedding and item
    /// feature dimensions differ, or when a dimension is zero.
    pub fn validate(&self) -> ModelResult<()> {
        if self.behavior_dim != self.item_feature_dim {
            return Err(ModelError::Config(format!(
                "behavior dim {} does not match item feature dim {}",
                self.behavior_dim, self.item_feature_dim
            )));
        }
        if self.behavior_size == 0 || self.behavior_dim == 0 {
            return Err(ModelError::Config(format!(
                "behavior size and dim must be positive, got {} and {}",
                self.behavior_size, self.behavior_dim
            )));
        }
        if !(self.init_std.is_finite() && self.init_std > 0.0) {
            return Err(ModelError::Config(format!(
                "init_std must be positive, got {}",
                self.init_std
            )));
        }
        Ok(())
    }

    /// Builds the configured variant.
    pub fn build(&self) -> ModelResult<Box<dyn CtrModel>> {
        let model: Box<dyn CtrModel> = match self.kind {
            ModelKind::Baseline => Box::new(SimpleMlp::new(self.clone())?),
            ModelKind::Din => Box::new(DinNet::new(self.clone())?),
        };
        Ok(model)
    }
}

/// Capability shared by every CTR model.
pub trait CtrModel: Send + fmt::Debug {
    /// Human-readable model name.
    fn name(&self) -> &str;

    /// The configuration the model was built from.
    fn config(&self) -> &ModelConfig;

    /// Learnable parameters: `W0, W1, W2`, then `Att0[0..S]`, then
    /// `Att1[0..S]` for attention models.
    fn learnable(&self) -> Vec<Var>;

    /// Runs the forward pass and stores the prediction for [`output`].
    ///
    /// `user_behaviors` may be `[B, S*D]` or `[B, S, D]`.
    ///
    /// [`output`]: CtrModel::output
    #[allow(clippy::too_many_arguments)]
    fn forward(
        &mut self,
        user_profile: &Tensor,
        user_behaviors: &Tensor,
        item_feature: &Tensor,
        ctx_feature: &Tensor,
        batch_size: usize,
        behavior_size: usize,
        behavior_dim: usize,
    ) -> ModelResult<()>;

    /// Click probabilities `[B, 1]` of the last forward pass.
    fn output(&self) -> Option<&Tensor>;

    /// Like [`output`](CtrModel::output) but an error before any forward pass.
    fn prediction(&self) -> ModelResult<&Tensor> {
        self.output().ok_or(ModelError::NotComputed)
    }

    /// Whether dropout is active.
    fn is_training(&self) -> bool;

    /// Switches dropout on or off.
    fn set_training(&mut self, training: bool);
}

/// Flattens the behavior input to `[B, S*D]`, rejecting any other size.
fn flatten_behaviors(
    user_behaviors: &Tensor,
    batch_size: usize,
    behavior_size: usize,
    behavior_dim: usize,
) -> ModelResult<Tensor> {
    let width = behavior_size * behavior_dim;
    let leading = user_behaviors.dims().first().copied();
    if user_behaviors.elem_count() != batch_size * width || leading != Some(batch_size) {
        return Err(LayerError::ShapeMismatch {
            expected: vec![batch_size, width],
            actual: user_behaviors.dims().to_vec(),
        }
        .into());
    }
    Ok(user_behaviors.reshape((batch_size, width))?)
}

fn check_config_dims(
    config: &ModelConfig,
    behavior_size: usize,
    behavior_dim: usize,
) -> ModelResult<()> {
    if behavior_size != config.behavior_size || behavior_dim != config.behavior_dim {
        return Err(LayerError::ShapeMismatch {
            expected: vec![config.behavior_size, config.behavior_dim],
            actual: vec![behavior_size, behavior_dim],
        }
        .into());
    }
    Ok(())
}

/// Baseline model: prediction head over the raw behavior matrix.
#[derive(Debug)]
pub struct SimpleMlp {
    config: ModelConfig,
    mlp: PredictionMlp,
    output: Option<Tensor>,
}

impl SimpleMlp {
    /// Builds the model on the CPU.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the configuration is inconsistent,
    /// before any weight is allocated.
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mlp = PredictionMlp::new(
            config.mlp_input_dim(),
            &config.mlp_config(),
            &mut rng,
            &Device::Cpu,
        )?;
        Ok(Self {
            config,
            mlp,
            output: None,
        })
    }
}

impl CtrModel for SimpleMlp {
    fn name(&self) -> &str {
        "simple_mlp"
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn learnable(&self) -> Vec<Var> {
        self.mlp.parameters()
    }

    fn forward(
        &mut self,
        user_profile: &Tensor,
        user_behaviors: &Tensor,
        item_feature: &Tensor,
        ctx_feature: &Tensor,
        batch_size: usize,
        behavior_size: usize,
        behavior_dim: usize,
    ) -> ModelResult<()> {
        check_config_dims(&self.config, behavior_size, behavior_dim)?;
        let behaviors = flatten_behaviors(user_behaviors, batch_size, behavior_size, behavior_dim)?;
        let input = concat_features(&[user_profile, &behaviors, item_feature, ctx_feature])?;
        self.output = Some(self.mlp.forward(&input)?);
        Ok(())
    }

    fn output(&self) -> Option<&Tensor> {
        self.output.as_ref()
    }

    fn is_training(&self) -> bool {
        self.mlp.is_training()
    }

    fn set_training(&mut self, training: bool) {
        self.mlp.set_training(training);
    }
}

/// Deep Interest Network: attention-pooled behaviors feeding the head.
#[derive(Debug)]
pub struct DinNet {
    config: ModelConfig,
    attention: DinAttention,
    mlp: PredictionMlp,
    output: Option<Tensor>,
}

impl DinNet {
    /// Builds the model on the CPU.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the configuration is inconsistent,
    /// before any weight is allocated.
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let device = Device::Cpu;
        let mlp = PredictionMlp::new(
            config.mlp_input_dim(),
            &config.mlp_config(),
            &mut rng,
            &device,
        )?;
        let attention = DinAttention::new(config.din_config(), &mut rng, &device)?;
        Ok(Self {
            config,
            attention,
            mlp,
            output: None,
        })
    }

    /// The attention pooling layer.
    pub fn attention(&self) -> &DinAttention {
        &self.attention
    }
}

impl CtrModel for DinNet {
    fn name(&self) -> &str {
        "din"
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn learnable(&self) -> Vec<Var> {
        let mut params = self.mlp.parameters();
        params.extend(self.attention.parameters());
        params
    }

    fn forward(
        &mut self,
        user_profile: &Tensor,
        user_behaviors: &Tensor,
        item_feature: &Tensor,
        ctx_feature: &Tensor,
        batch_size: usize,
        behavior_size: usize,
        behavior_dim: usize,
    ) -> ModelResult<()> {
        let (_, item_dim) = dims2(item_feature)?;
        if item_dim != behavior_dim {
            return Err(LayerError::ShapeMismatch {
                expected: vec![batch_size, behavior_dim],
                actual: item_feature.dims().to_vec(),
            }
            .into());
        }
        check_config_dims(&self.config, behavior_size, behavior_dim)?;
        let behaviors = flatten_behaviors(user_behaviors, batch_size, behavior_size, behavior_dim)?;

        let interest = self.attention.forward_attention(&behaviors, item_feature)?;
        let input = concat_features(&[user_profile, &interest, item_feature, ctx_feature])?;
        self.output = Some(self.mlp.forward(&input)?);
        Ok(())
    }

    fn output(&self) -> Option<&Tensor> {
        self.output.as_ref()
    }

    fn is_training(&self) -> bool {
        self.mlp.is_training()
    }

    fn set_training(&mut self, training: bool) {
        self.mlp.set_training(training);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    fn small(kind: ModelKind) -> ModelConfig {
        ModelConfig::new(kind)
            .with_dims(2, 3, 2, 2, 1)
            .with_hidden_units(vec![8, 4])
            .with_init_std(0.1)
            .with_seed(7)
    }

    fn randn(rows: usize, cols: usize, seed: u64) -> Tensor {
        use rand_distr::{Distribution, Normal};
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0f32, 1.0).unwrap();
        let data: Vec<f32> = (0..rows * cols).map(|_| normal.sample(&mut rng)).collect();
        Tensor::from_vec(data, (rows, cols), &Device::Cpu).unwrap()
    }

    fn run(model: &mut dyn CtrModel, batch: usize) -> Vec<f32> {
        let c = model.config().clone();
        model
            .forward(
                &randn(batch, c.user_profile_dim, 1),
                &randn(batch, c.behavior_size * c.behavior_dim, 2),
                &randn(batch, c.item_feature_dim, 3),
                &randn(batch, c.ctx_feature_dim, 4),
                batch,
                c.behavior_size,
                c.behavior_dim,
            )
            .unwrap();
        model
            .output()
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1::<f32>()
            .unwrap()
    }

    #[test]
    fn test_construction_rejects_dim_mismatch() {
        for kind in [ModelKind::Baseline, ModelKind::Din] {
            let config = ModelConfig::new(kind).with_dims(2, 3, 8, 4, 1);
            let err = config.build().unwrap_err();
            assert!(matches!(err, ModelError::Config(_)), "{kind}: {err}");
        }
        let built = ModelConfig::new(ModelKind::Din).with_dims(1, 2, 4, 4, 1).build();
        assert!(format!("{built:?}").contains("DinNet"));
        assert!(matches!(
            SimpleMlp::new(ModelConfig::new(ModelKind::Baseline).with_dims(1, 2, 8, 4, 1)),
            Err(ModelError::Config(_))
        ));
        assert!(matches!(
            DinNet::new(ModelConfig::new(ModelKind::Din).with_dims(1, 2, 8, 4, 1)),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn test_learnable_order_and_count() {
        let din = DinNet::new(small(ModelKind::Din)).unwrap();
        let params = din.learnable();
        assert_eq!(params.len(), 3 + 2 * 3);

        let shapes: Vec<Vec<usize>> = params.iter().map(|p| p.dims().to_vec()).collect();
        // mlp input: profile 2 + interest 2 + item 2 + ctx 1
        assert_eq!(shapes[0], vec![7, 8]);
        assert_eq!(shapes[1], vec![8, 4]);
        assert_eq!(shapes[2], vec![4, 1]);
        for s in &shapes[3..6] {
            assert_eq!(s, &vec![2 + 3 * 2 * 2 + 2, 36]);
        }
        for s in &shapes[6..] {
            assert_eq!(s, &vec![36, 1]);
        }

        let baseline = SimpleMlp::new(small(ModelKind::Baseline)).unwrap();
        let shapes: Vec<Vec<usize>> = baseline.learnable().iter().map(|p| p.dims().to_vec()).collect();
        assert_eq!(shapes, vec![vec![11, 8], vec![8, 4], vec![4, 1]]);
    }

    #[test]
    fn test_output_before_forward() {
        let model = DinNet::new(small(ModelKind::Din)).unwrap();
        assert!(model.output().is_none());
        assert!(matches!(model.prediction(), Err(ModelError::NotComputed)));
    }

    #[test]
    fn test_outputs_are_probabilities() {
        for kind in [ModelKind::Baseline, ModelKind::Din] {
            let mut model = small(kind).build().unwrap();
            let p = run(model.as_mut(), 16);
            assert_eq!(p.len(), 16);
            assert!(p.iter().all(|&v| v > 0.0 && v < 1.0), "{kind}: {p:?}");
        }
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let mut model = small(ModelKind::Din).with_dropout_rate(0.5).build().unwrap();
        assert!(model.is_training());
        model.set_training(false);
        assert!(!model.is_training());
        let a = run(model.as_mut(), 4);
        let b = run(model.as_mut(), 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = DinNet::new(small(ModelKind::Din)).unwrap();
        let b = DinNet::new(small(ModelKind::Din)).unwrap();
        for (x, y) in a.learnable().iter().zip(b.learnable().iter()) {
            assert_eq!(
                x.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
                y.flatten_all().unwrap().to_vec1::<f32>().unwrap()
            );
        }
    }

    #[test]
    fn test_din_forward_rejects_item_dim() {
        let mut model = DinNet::new(small(ModelKind::Din)).unwrap();
        let zeros = |cols: usize| Tensor::zeros((2, cols), DType::F32, &Device::Cpu).unwrap();
        let err = model
            .forward(&zeros(2), &zeros(6), &zeros(3), &zeros(1), 2, 3, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Layer(LayerError::ShapeMismatch { .. })
        ));
        assert!(model.output().is_none());
    }

    #[test]
    fn test_forward_rejects_behavior_shape() {
        let mut model = SimpleMlp::new(small(ModelKind::Baseline)).unwrap();
        let zeros = |cols: usize| Tensor::zeros((2, cols), DType::F32, &Device::Cpu).unwrap();
        let err = model
            .forward(&zeros(2), &zeros(5), &zeros(2), &zeros(1), 2, 3, 2)
            .unwrap_err();
        assert!(matches!(err, ModelError::Layer(_)));
    }

    #[test]
    fn test_accepts_three_dim_behaviors() {
        let mut model = DinNet::new(small(ModelKind::Din)).unwrap();
        let dev = Device::Cpu;
        let zeros = |cols: usize| Tensor::zeros((2, cols), DType::F32, &dev).unwrap();
        let behaviors = Tensor::zeros((2, 3, 2), DType::F32, &dev).unwrap();
        model
            .forward(&zeros(2), &behaviors, &zeros(2), &zeros(1), 2, 3, 2)
            .unwrap();
        assert_eq!(model.output().unwrap().dims(), &[2, 1]);
    }

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("din".parse::<ModelKind>().unwrap(), ModelKind::Din);
        assert_eq!("Baseline".parse::<ModelKind>().unwrap(), ModelKind::Baseline);
        assert!("dien".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Din.to_string(), "din");
    }

    #[test]
    fn test_config_defaults_and_serde() {
        let config = ModelConfig::new(ModelKind::Baseline);
        assert_eq!(config.dropout_rate(), 0.01);
        assert_eq!(ModelConfig::new(ModelKind::Din).dropout_rate(), 0.001);
        assert_eq!(config.clone().with_dropout_rate(0.2).dropout_rate(), 0.2);

        let json = serde_json::to_string(&config).unwrap();
        let back: ModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);

        let partial: ModelConfig = serde_json::from_str(r#"{"kind": "baseline", "seed": 9}"#).unwrap();
        assert_eq!(partial.kind, ModelKind::Baseline);
        assert_eq!(partial.seed, 9);
        assert_eq!(partial.hidden_units, vec![200, 80]);
    }

    #[test]
    fn test_from_sample_info() {
        let info = SampleInfo::contiguous(3, 12, 4, 2);
        let config = ModelConfig::from_sample_info(ModelKind::Din, &info, 3).unwrap();
        assert_eq!(config.behavior_dim, 4);
        assert_eq!(config.user_profile_dim, 3);
        assert_eq!(config.ctx_feature_dim, 2);
        assert!(ModelConfig::from_sample_info(ModelKind::Din, &info, 5).is_err());
    }
}
