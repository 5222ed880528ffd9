//! Minibatch training loop.
//!
//! A [`Trainer`] owns one model and walks through a fixed state machine:
//!
//! 1. **Setup** ([`Trainer::new`]): derive the [`Placeholders`] from the
//!    sample layout, check them against the model's dimensions, run a
//!    dry evaluation-mode forward pass on zero-valued inputs so shape errors
//!    surface before any data is touched, then create the [`Solver`].
//! 2. **Epochs** ([`Trainer::train`]): for each epoch, for each of the
//!    `floor(N / B)` full batches, slice and bind the batch, run forward,
//!    compute the mean squared error, backpropagate and step the solver.
//! 3. **Report**: the epoch's mean loss goes to every hook.
//! 4. **Terminate**: hooks see `end`, and a [`TrainReport`] is returned.
//!
//! There is no early stopping, validation split or checkpointing; a run
//! always performs exactly the configured number of epochs, and the first
//! error aborts it.

use candle_core::{DType, Device, Tensor};
use edgerec_data::{CtrDataset, FeatureBatch, SampleInfo};
use edgerec_layers::LayerError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{ModelError, TrainingError, TrainingResult};
use crate::hooks::{Hook, HookList, LoggingHook};
use crate::metrics::{accuracy, roc_auc, Metrics, MetricsRecorder};
use crate::model::CtrModel;
use crate::optimizer::{OptimizerConfig, Solver};

/// Configuration of a training run.
///
/// # Example
///
/// ```
/// use edgerec_training::optimizer::OptimizerConfig;
/// use edgerec_training::trainer::TrainConfig;
///
/// let config = TrainConfig::default()
///     .with_epochs(3)
///     .with_batch_size(32)
///     .with_optimizer(OptimizerConfig::adam(0.01));
/// assert_eq!(config.epochs, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of full passes over the dataset
    pub epochs: usize,
    /// Examples per batch; fixed for the whole run
    pub batch_size: usize,
    /// Behavior sequence length `S`
    pub behavior_size: usize,
    /// Solver settings
    pub optimizer: OptimizerConfig,
    /// Batch losses are logged every N steps at debug level
    pub log_every_n_steps: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 64,
            behavior_size: 5,
            optimizer: OptimizerConfig::default(),
            log_every_n_steps: 100,
        }
    }
}

impl TrainConfig {
    /// Sets the number of epochs.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the behavior sequence length.
    pub fn with_behavior_size(mut self, behavior_size: usize) -> Self {
        self.behavior_size = behavior_size;
        self
    }

    /// Sets the solver.
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TrainingResult<()> {
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.behavior_size == 0 {
            return Err(TrainingError::InvalidConfig(
                "behavior_size must be positive".to_string(),
            ));
        }
        self.optimizer.validate()
    }
}

/// A named input slot with a fixed `[rows, cols]` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    /// Input name
    pub name: &'static str,
    /// `[batch_size, width]`
    pub shape: [usize; 2],
}

impl Placeholder {
    fn new(name: &'static str, rows: usize, cols: usize) -> Self {
        Self {
            name,
            shape: [rows, cols],
        }
    }

    /// Converts `values` into a tensor after checking its shape.
    pub fn bind(&self, values: &Array2<f32>, device: &Device) -> TrainingResult<Tensor> {
        let (rows, cols) = values.dim();
        if [rows, cols] != self.shape {
            debug!(placeholder = self.name, shape = ?self.shape, rows, cols, "Bind shape mismatch");
            return Err(ModelError::from(LayerError::ShapeMismatch {
                expected: self.shape.to_vec(),
                actual: vec![rows, cols],
            })
            .into());
        }
        let data: Vec<f32> = values.iter().copied().collect();
        Ok(Tensor::from_vec(data, (rows, cols), device)?)
    }

    /// A zero-valued tensor of this placeholder's shape.
    pub fn zeros(&self, device: &Device) -> TrainingResult<Tensor> {
        Ok(Tensor::zeros(
            (self.shape[0], self.shape[1]),
            DType::F32,
            device,
        )?)
    }
}

/// Input tensors of one bound batch.
#[derive(Debug, Clone)]
pub struct BoundBatch {
    /// `[B, profile_dim]`
    pub user_profile: Tensor,
    /// `[B, S * D]`
    pub user_behaviors: Tensor,
    /// `[B, D]`
    pub item_feature: Tensor,
    /// `[B, ctx_dim]`
    pub ctx_feature: Tensor,
    /// `[B, 1]`
    pub labels: Tensor,
}

/// The five input slots of the training graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    /// User profile features
    pub user_profile: Placeholder,
    /// Flattened behavior matrix
    pub user_behaviors: Placeholder,
    /// Candidate item features
    pub item_feature: Placeholder,
    /// Context features
    pub ctx_feature: Placeholder,
    /// Click labels
    pub labels: Placeholder,
}

impl Placeholders {
    /// Shapes for batches of `batch_size` rows laid out as in `info`.
    pub fn new(info: &SampleInfo, batch_size: usize) -> Self {
        Self {
            user_profile: Placeholder::new("xUserProfile", batch_size, info.user_profile_dim()),
            user_behaviors: Placeholder::new(
                "xUserBehaviorMatrix",
                batch_size,
                info.user_behavior_width(),
            ),
            item_feature: Placeholder::new("xItemFeature", batch_size, info.item_feature_dim()),
            ctx_feature: Placeholder::new("xCtxFeature", batch_size, info.ctx_feature_dim()),
            labels: Placeholder::new("y", batch_size, 1),
        }
    }

    /// Rows per batch.
    pub fn batch_size(&self) -> usize {
        self.labels.shape[0]
    }

    /// Binds every group of `batch`.
    pub fn bind(&self, batch: &FeatureBatch, device: &Device) -> TrainingResult<BoundBatch> {
        Ok(BoundBatch {
            user_profile: self.user_profile.bind(&batch.user_profile, device)?,
            user_behaviors: self.user_behaviors.bind(&batch.user_behaviors, device)?,
            item_feature: self.item_feature.bind(&batch.item_feature, device)?,
            ctx_feature: self.ctx_feature.bind(&batch.ctx_feature, device)?,
            labels: self.labels.bind(&batch.labels, device)?,
        })
    }

    /// A batch of zeros with every placeholder's shape.
    pub fn zeros(&self, device: &Device) -> TrainingResult<BoundBatch> {
        Ok(BoundBatch {
            user_profile: self.user_profile.zeros(device)?,
            user_behaviors: self.user_behaviors.zeros(device)?,
            item_feature: self.item_feature.zeros(device)?,
            ctx_feature: self.ctx_feature.zeros(device)?,
            labels: self.labels.zeros(device)?,
        })
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// Epochs completed
    pub epochs: usize,
    /// Full batches per epoch
    pub batches_per_epoch: usize,
    /// Solver steps taken over the trainer's lifetime
    pub global_step: u64,
    /// Mean batch loss of every epoch
    pub epoch_losses: Vec<f64>,
}

impl TrainReport {
    /// Mean loss of the last epoch.
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Mean squared error between predictions and labels, as a scalar tensor.
pub fn mse_loss(predictions: &Tensor, labels: &Tensor) -> candle_core::Result<Tensor> {
    predictions.sub(labels)?.sqr()?.mean_all()
}

/// Drives one model through training, evaluation and prediction.
pub struct Trainer {
    config: TrainConfig,
    info: SampleInfo,
    behavior_dim: usize,
    placeholders: Placeholders,
    model: Box<dyn CtrModel>,
    solver: Solver,
    hooks: HookList,
    device: Device,
    global_step: u64,
}

impl Trainer {
    /// Sets up a trainer for `model` over data laid out as in `info`.
    ///
    /// # Errors
    ///
    /// Fails before any batch is processed when the configuration is
    /// invalid, when the model's dimensions disagree with `info`, or when
    /// the dry-run forward pass rejects the placeholder shapes.
    pub fn new(config: TrainConfig, info: SampleInfo, model: Box<dyn CtrModel>) -> TrainingResult<Self> {
        config.validate()?;
        info.validate(info.width())?;
        let behavior_dim = info.behavior_dim(config.behavior_size)?;
        check_model_dims(model.config(), &info, config.behavior_size, behavior_dim)?;

        let placeholders = Placeholders::new(&info, config.batch_size);
        let device = Device::Cpu;
        let mut trainer_model = model;
        compile(
            trainer_model.as_mut(),
            &placeholders,
            &device,
            config.behavior_size,
            behavior_dim,
        )?;

        let solver = Solver::new(&config.optimizer, trainer_model.learnable())?;
        let mut hooks = HookList::new();
        hooks.add(LoggingHook::new(config.log_every_n_steps));

        info!(
            model = trainer_model.name(),
            batch_size = config.batch_size,
            behavior_size = config.behavior_size,
            behavior_dim,
            parameters = trainer_model.learnable().len(),
            "Trainer ready"
        );

        Ok(Self {
            config,
            info,
            behavior_dim,
            placeholders,
            model: trainer_model,
            solver,
            hooks,
            device,
            global_step: 0,
        })
    }

    /// Registers an additional hook.
    pub fn add_hook<H: Hook + 'static>(&mut self, hook: H) {
        self.hooks.add(hook);
    }

    /// The run configuration.
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// The placeholder shapes.
    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    /// The model being trained.
    pub fn model(&self) -> &dyn CtrModel {
        self.model.as_ref()
    }

    /// Releases the trained model.
    pub fn into_model(self) -> Box<dyn CtrModel> {
        self.model
    }

    /// Solver steps taken so far.
    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// One forward, backward and solver step on `batch`; returns its loss.
    pub fn train_step(&mut self, batch: &FeatureBatch) -> TrainingResult<f32> {
        if !self.model.is_training() {
            self.model.set_training(true);
        }
        let bound = self.placeholders.bind(batch, &self.device)?;
        self.forward(&bound)?;

        let loss = mse_loss(self.model.prediction()?, &bound.labels)?;
        let value = loss.to_scalar::<f32>()?;
        let grads = loss.backward()?;
        self.solver.step(&grads)?;
        self.global_step += 1;
        Ok(value)
    }

    /// Runs exactly `epochs` passes over every full batch of `dataset`.
    pub fn train(&mut self, dataset: &CtrDataset) -> TrainingResult<TrainReport> {
        self.info.validate(dataset.input_width())?;
        let batch_size = self.config.batch_size;
        let batches = dataset.num_batches(batch_size);
        if batches == 0 {
            return Err(TrainingError::InvalidConfig(format!(
                "dataset has {} examples, fewer than one batch of {}",
                dataset.len(),
                batch_size
            )));
        }
        info!(
            epochs = self.config.epochs,
            batches,
            examples = dataset.len(),
            "Starting training"
        );

        self.model.set_training(true);
        let mut recorder = MetricsRecorder::new();
        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let mut last: Option<Metrics> = None;

        for epoch in 0..self.config.epochs {
            recorder.reset();
            for b in 0..batches {
                let rows = dataset.batch_rows(b, batch_size);
                let batch = dataset.batch(&self.info, rows.start, rows.end)?;
                let loss = self.train_step(&batch).map_err(|e| {
                    error!(epoch, batch = b, error = %e, "Training step failed");
                    e
                })?;

                let metrics = Metrics::new(f64::from(loss), self.global_step);
                recorder.record(&metrics);
                self.hooks.after_step(self.global_step, &metrics)?;
            }
            let summary = recorder.summary(self.global_step);
            self.hooks.after_epoch(epoch, &summary)?;
            epoch_losses.push(summary.loss);
            last = Some(summary);
        }

        self.hooks.end(self.global_step, last.as_ref())?;
        Ok(TrainReport {
            epochs: self.config.epochs,
            batches_per_epoch: batches,
            global_step: self.global_step,
            epoch_losses,
        })
    }

    /// Evaluation-mode predictions for every full batch of `dataset`.
    ///
    /// Trailing examples that do not fill a batch are not predicted.
    pub fn predict(&mut self, dataset: &CtrDataset) -> TrainingResult<Vec<f32>> {
        self.info.validate(dataset.input_width())?;
        let was_training = self.model.is_training();
        self.model.set_training(false);
        let result = self.predict_batches(dataset);
        self.model.set_training(was_training);
        result
    }

    /// Loss, accuracy and ROC-AUC over every full batch of `dataset`.
    pub fn evaluate(&mut self, dataset: &CtrDataset) -> TrainingResult<Metrics> {
        let predictions = self.predict(dataset)?;
        let labels: Vec<f32> = dataset
            .targets()
            .column(0)
            .iter()
            .take(predictions.len())
            .copied()
            .collect();
        let loss = if predictions.is_empty() {
            0.0
        } else {
            predictions
                .iter()
                .zip(&labels)
                .map(|(p, y)| f64::from(p - y).powi(2))
                .sum::<f64>()
                / predictions.len() as f64
        };
        let metrics = Metrics::new(loss, self.global_step)
            .with_accuracy(accuracy(&predictions, &labels))
            .with_auc(roc_auc(&predictions, &labels));
        info!(
            loss = metrics.loss,
            accuracy = ?metrics.accuracy,
            auc = ?metrics.auc,
            examples = predictions.len(),
            "Evaluation finished"
        );
        Ok(metrics)
    }

    fn predict_batches(&mut self, dataset: &CtrDataset) -> TrainingResult<Vec<f32>> {
        let batch_size = self.config.batch_size;
        let mut predictions = Vec::with_capacity(dataset.len());
        for b in 0..dataset.num_batches(batch_size) {
            let rows = dataset.batch_rows(b, batch_size);
            let batch = dataset.batch(&self.info, rows.start, rows.end)?;
            let bound = self.placeholders.bind(&batch, &self.device)?;
            self.forward(&bound)?;
            let out = self.model.prediction()?.flatten_all()?.to_vec1::<f32>()?;
            predictions.extend(out);
        }
        Ok(predictions)
    }

    fn forward(&mut self, bound: &BoundBatch) -> TrainingResult<()> {
        self.model.forward(
            &bound.user_profile,
            &bound.user_behaviors,
            &bound.item_feature,
            &bound.ctx_feature,
            self.placeholders.batch_size(),
            self.config.behavior_size,
            self.behavior_dim,
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .field("solver", &self.solver)
            .field("hooks", &self.hooks)
            .field("global_step", &self.global_step)
            .finish()
    }
}

fn check_model_dims(
    model: &crate::model::ModelConfig,
    info: &SampleInfo,
    behavior_size: usize,
    behavior_dim: usize,
) -> TrainingResult<()> {
    let expected = [
        ("user_profile_dim", model.user_profile_dim, info.user_profile_dim()),
        ("behavior_size", model.behavior_size, behavior_size),
        ("behavior_dim", model.behavior_dim, behavior_dim),
        ("item_feature_dim", model.item_feature_dim, info.item_feature_dim()),
        ("ctx_feature_dim", model.ctx_feature_dim, info.ctx_feature_dim()),
    ];
    for (name, in_model, in_data) in expected {
        if in_model != in_data {
            return Err(ModelError::Config(format!(
                "model {name} is {in_model} but the data provides {in_data}"
            ))
            .into());
        }
    }
    Ok(())
}

/// Dry-runs the forward pass and loss on zero inputs in evaluation mode.
fn compile(
    model: &mut dyn CtrModel,
    placeholders: &Placeholders,
    device: &Device,
    behavior_size: usize,
    behavior_dim: usize,
) -> TrainingResult<()> {
    let zeros = placeholders.zeros(device)?;
    let was_training = model.is_training();
    model.set_training(false);
    let result = model.forward(
        &zeros.user_profile,
        &zeros.user_behaviors,
        &zeros.item_feature,
        &zeros.ctx_feature,
        placeholders.batch_size(),
        behavior_size,
        behavior_dim,
    );
    model.set_training(was_training);
    result?;
    mse_loss(model.prediction()?, &zeros.labels)?;
    debug!(model = model.name(), "Dry run passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelConfig, ModelKind};
    use edgerec_data::SyntheticConfig;

    fn tiny_setup(kind: ModelKind) -> (CtrDataset, SampleInfo, Box<dyn CtrModel>) {
        let (dataset, info) = SyntheticConfig::default()
            .with_num_examples(10)
            .with_behaviors(2, 2)
            .with_side_features(1, 1)
            .generate()
            .unwrap();
        let model = ModelConfig::from_sample_info(kind, &info, 2)
            .unwrap()
            .with_hidden_units(vec![8, 4])
            .with_init_std(0.1)
            .build()
            .unwrap();
        (dataset, info, model)
    }

    #[test]
    fn test_placeholders_from_layout() {
        let info = SampleInfo::contiguous(3, 8, 4, 2);
        let p = Placeholders::new(&info, 16);
        assert_eq!(p.user_profile.shape, [16, 3]);
        assert_eq!(p.user_behaviors.shape, [16, 8]);
        assert_eq!(p.item_feature.shape, [16, 4]);
        assert_eq!(p.ctx_feature.shape, [16, 2]);
        assert_eq!(p.labels.shape, [16, 1]);
        assert_eq!(p.batch_size(), 16);
    }

    #[test]
    fn test_bind_checks_shape() {
        let p = Placeholder::new("x", 2, 3);
        let ok = Array2::<f32>::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = p.bind(&ok, &Device::Cpu).unwrap();
        assert_eq!(
            t.to_vec2::<f32>().unwrap(),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
        );

        let bad = Array2::<f32>::zeros((3, 3));
        assert!(matches!(
            p.bind(&bad, &Device::Cpu),
            Err(TrainingError::Model(ModelError::Layer(_)))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainConfig::default().validate().is_ok());
        assert!(TrainConfig::default().with_batch_size(0).validate().is_err());
        assert!(TrainConfig::default().with_behavior_size(0).validate().is_err());
        assert!(TrainConfig::default()
            .with_optimizer(OptimizerConfig::sgd(-1.0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_setup_rejects_mismatched_model() {
        let (_, info, _) = tiny_setup(ModelKind::Din);
        let other = ModelConfig::new(ModelKind::Din)
            .with_dims(1, 2, 3, 3, 1)
            .build()
            .unwrap();
        let config = TrainConfig::default().with_batch_size(2).with_behavior_size(2);
        let err = Trainer::new(config, info, other).unwrap_err();
        assert!(matches!(err, TrainingError::Model(ModelError::Config(_))));
    }

    #[test]
    fn test_train_counts_epochs_and_batches() {
        let (dataset, info, model) = tiny_setup(ModelKind::Baseline);
        let config = TrainConfig::default()
            .with_epochs(3)
            .with_batch_size(3)
            .with_behavior_size(2);
        let mut trainer = Trainer::new(config, info, model).unwrap();
        let report = trainer.train(&dataset).unwrap();

        assert_eq!(report.epochs, 3);
        assert_eq!(report.batches_per_epoch, 3);
        assert_eq!(report.global_step, 9);
        assert_eq!(report.epoch_losses.len(), 3);
        assert!(report.final_loss().unwrap().is_finite());
    }

    #[test]
    fn test_train_rejects_tiny_dataset() {
        let (dataset, info, model) = tiny_setup(ModelKind::Din);
        let config = TrainConfig::default().with_batch_size(11).with_behavior_size(2);
        let mut trainer = Trainer::new(config, info, model).unwrap();
        assert!(matches!(
            trainer.train(&dataset),
            Err(TrainingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_predict_restores_mode() {
        let (dataset, info, model) = tiny_setup(ModelKind::Din);
        let config = TrainConfig::default().with_batch_size(4).with_behavior_size(2);
        let mut trainer = Trainer::new(config, info, model).unwrap();
        assert!(trainer.model().is_training());

        let predictions = trainer.predict(&dataset).unwrap();
        assert_eq!(predictions.len(), 8);
        assert!(predictions.iter().all(|&p| p > 0.0 && p < 1.0));
        assert!(trainer.model().is_training());
    }

    #[test]
    fn test_mse_loss() {
        let dev = Device::Cpu;
        let pred = Tensor::new(&[[0.5f32], [1.0]], &dev).unwrap();
        let labels = Tensor::new(&[[1.0f32], [0.0]], &dev).unwrap();
        let loss = mse_loss(&pred, &labels).unwrap().to_scalar::<f32>().unwrap();
        assert!((loss - 0.625).abs() < 1e-6);
    }
}
