//! CTR models and the minibatch training loop for EdgeRec.
//!
//! This crate ties the feature layout from `edgerec-data` and the layers
//! from `edgerec-layers` into trainable click-through-rate models:
//!
//! - **Models**: a plain MLP baseline and the Deep Interest Network, both
//!   behind the [`CtrModel`] trait and built from one [`ModelConfig`]
//! - **Optimizers**: Adam and SGD bound to a model's learnable variables
//! - **Trainer**: a fixed epoch/batch loop with a mean squared error loss
//! - **Hooks and metrics**: per-batch and per-epoch observation, plus
//!   accuracy and ROC-AUC for evaluation
//!
//! ```text
//!            ┌──────────────┐
//!            │ SampleInfo   │──► Placeholders
//!            └──────────────┘         │
//!  ModelConfig ──► CtrModel ──► Trainer ◄── OptimizerConfig
//!                                  │
//!                   ┌──────────────┼──────────────┐
//!                   ▼              ▼              ▼
//!                train()       evaluate()     predict()
//! ```
//!
//! # Example
//!
//! ```rust
//! use edgerec_data::SyntheticConfig;
//! use edgerec_training::{ModelConfig, ModelKind, OptimizerConfig, TrainConfig, Trainer};
//!
//! let (dataset, info) = SyntheticConfig::default()
//!     .with_num_examples(32)
//!     .generate()
//!     .unwrap();
//! let model = ModelConfig::from_sample_info(ModelKind::Din, &info, 5)
//!     .unwrap()
//!     .with_hidden_units(vec![16, 8])
//!     .build()
//!     .unwrap();
//! let config = TrainConfig::default()
//!     .with_epochs(2)
//!     .with_batch_size(8)
//!     .with_behavior_size(5)
//!     .with_optimizer(OptimizerConfig::adam(0.001));
//!
//! let mut trainer = Trainer::new(config, info, model).unwrap();
//! let report = trainer.train(&dataset).unwrap();
//! assert_eq!(report.global_step, 8);
//! ```

pub mod error;
pub mod hooks;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod trainer;

pub use error::{ModelError, ModelResult, TrainingError, TrainingResult};
pub use hooks::{Hook, HookError, HookList, HookResult, LoggingHook};
pub use metrics::{accuracy, roc_auc, Metrics, MetricsRecorder};
pub use model::{CtrModel, DinNet, ModelConfig, ModelKind, SimpleMlp};
pub use optimizer::{OptimizerConfig, Solver};
pub use trainer::{
    mse_loss, BoundBatch, Placeholder, Placeholders, TrainConfig, TrainReport, Trainer,
};
