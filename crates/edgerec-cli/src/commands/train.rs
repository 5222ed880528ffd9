//! Train Command Implementation
//!
//! Trains a CTR model on seeded synthetic data. Configuration comes from an
//! optional JSON file; command-line flags override individual fields.

use anyhow::{Context, Result};
use clap::Args;
use edgerec_data::SyntheticConfig;
use edgerec_training::{ModelConfig, ModelKind, TrainConfig, TrainReport, Trainer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything a training run needs, as read from a JSON config file.
///
/// Every section is optional in the file; missing fields keep their
/// defaults. A missing `model` section uses [`CLI_INIT_STD`] instead of the
/// library's unit-variance initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Model variant and hyper-parameters
    pub model: ModelConfig,
    /// Epochs, batch size and solver
    pub train: TrainConfig,
    /// Synthetic dataset shape
    pub data: SyntheticConfig,
}

/// Weight std of the default run. With unit variance the 200/80 head
/// saturates the sigmoid on almost every example and the loss gets no
/// gradient.
pub const CLI_INIT_STD: f32 = 0.1;

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default().with_init_std(CLI_INIT_STD),
            train: TrainConfig::default(),
            data: SyntheticConfig::default(),
        }
    }
}

impl RunConfig {
    /// Reads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text).context("Failed to parse config JSON")
    }

    /// Makes the model and trainer agree with the dataset layout.
    ///
    /// The data section is authoritative for feature widths and the
    /// behavior sequence length.
    pub fn reconcile(&mut self) {
        let data = &self.data;
        self.train.behavior_size = data.behavior_size;
        self.model = self.model.clone().with_dims(
            data.user_profile_dim,
            data.behavior_size,
            data.behavior_dim,
            data.behavior_dim,
            data.ctx_feature_dim,
        );
    }
}

/// Train a CTR model on synthetic click data
///
/// # Example
///
/// ```bash
/// edgerec train --model din --epochs 20 --batch-size 64 --eval
/// edgerec train --config run.json --learning-rate 0.01
/// ```
#[derive(Args, Debug, Clone, Default)]
pub struct TrainCommand {
    /// Path to a JSON run configuration
    #[arg(long, short = 'c', env = "EDGEREC_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Model variant: din or baseline
    #[arg(long, short = 'm', value_parser = parse_model_kind)]
    pub model: Option<ModelKind>,

    /// Number of epochs
    #[arg(long, short = 'e')]
    pub epochs: Option<usize>,

    /// Examples per batch
    #[arg(long, short = 'b')]
    pub batch_size: Option<usize>,

    /// Number of synthetic examples to generate
    #[arg(long)]
    pub examples: Option<usize>,

    /// Solver learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Seed for both data generation and model initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Evaluate loss, accuracy and AUC on the training data afterwards
    #[arg(long, default_value = "false")]
    pub eval: bool,
}

fn parse_model_kind(s: &str) -> Result<ModelKind, String> {
    s.parse::<ModelKind>().map_err(|e| e.to_string())
}

impl TrainCommand {
    /// Resolves the file and flags into one configuration.
    pub fn resolve_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config from: {:?}", path);
                RunConfig::load(path)?
            }
            None => {
                warn!("No config file provided, using default configuration");
                RunConfig::default()
            }
        };

        if let Some(kind) = self.model {
            config.model.kind = kind;
        }
        if let Some(epochs) = self.epochs {
            config.train.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.train.batch_size = batch_size;
        }
        if let Some(examples) = self.examples {
            config.data.num_examples = examples;
        }
        if let Some(lr) = self.learning_rate {
            config.train.optimizer = config.train.optimizer.with_learning_rate(lr);
        }
        if let Some(seed) = self.seed {
            config.data.seed = seed;
            config.model.seed = seed;
        }
        config.reconcile();
        Ok(config)
    }

    /// Executes the train command.
    pub fn run(&self) -> Result<TrainReport> {
        let config = self.resolve_config()?;
        info!(
            model = %config.model.kind,
            epochs = config.train.epochs,
            batch_size = config.train.batch_size,
            learning_rate = config.train.optimizer.learning_rate(),
            examples = config.data.num_examples,
            "Training configuration"
        );

        let (dataset, sample_info) = config
            .data
            .generate()
            .context("Failed to generate synthetic data")?;
        let model = config.model.build().context("Failed to build model")?;
        let mut trainer = Trainer::new(config.train.clone(), sample_info, model)
            .context("Failed to set up trainer")?;

        let report = trainer.train(&dataset).context("Training failed")?;
        if self.eval {
            let metrics = trainer.evaluate(&dataset).context("Evaluation failed")?;
            info!(
                "Evaluation: loss = {:.6}, accuracy = {:.4}, AUC = {:.4}",
                metrics.loss,
                metrics.accuracy.unwrap_or_default(),
                metrics.auc.unwrap_or_default()
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgerec_training::OptimizerConfig;

    #[test]
    fn test_train_command_defaults() {
        let cmd = TrainCommand::default();
        let config = cmd.resolve_config().unwrap();
        assert_eq!(config.model.kind, ModelKind::Din);
        assert_eq!(config.train.epochs, TrainConfig::default().epochs);
        assert_eq!(config.train.behavior_size, config.data.behavior_size);
        assert_eq!(config.model.item_feature_dim, config.data.behavior_dim);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cmd = TrainCommand {
            model: Some(ModelKind::Baseline),
            epochs: Some(3),
            batch_size: Some(16),
            examples: Some(100),
            learning_rate: Some(0.05),
            seed: Some(9),
            ..TrainCommand::default()
        };
        let config = cmd.resolve_config().unwrap();
        assert_eq!(config.model.kind, ModelKind::Baseline);
        assert_eq!(config.train.epochs, 3);
        assert_eq!(config.train.batch_size, 16);
        assert_eq!(config.data.num_examples, 100);
        assert_eq!(config.train.optimizer, OptimizerConfig::adam(0.05));
        assert_eq!(config.model.seed, 9);
        assert_eq!(config.data.seed, 9);
    }

    #[test]
    fn test_default_run_is_not_saturated() {
        let config = TrainCommand {
            examples: Some(128),
            ..TrainCommand::default()
        }
        .resolve_config()
        .unwrap();
        assert_eq!(config.model.init_std, CLI_INIT_STD);

        let (dataset, info) = config.data.generate().unwrap();
        let model = config.model.build().unwrap();
        let mut trainer = Trainer::new(config.train.clone(), info, model).unwrap();
        let predictions = trainer.predict(&dataset).unwrap();

        assert_eq!(predictions.len(), 128);
        let interior = predictions
            .iter()
            .filter(|&&p| p > 1e-3 && p < 1.0 - 1e-3)
            .count();
        assert_eq!(interior, predictions.len());
    }

    #[test]
    fn test_reconcile_follows_data() {
        let mut config = RunConfig::default();
        config.data = config.data.with_behaviors(3, 6).with_side_features(2, 0);
        config.reconcile();
        assert_eq!(config.train.behavior_size, 3);
        assert_eq!(config.model.behavior_size, 3);
        assert_eq!(config.model.behavior_dim, 6);
        assert_eq!(config.model.item_feature_dim, 6);
        assert_eq!(config.model.user_profile_dim, 2);
        assert_eq!(config.model.ctx_feature_dim, 0);
    }

    #[test]
    fn test_parse_model_kind() {
        assert_eq!(parse_model_kind("din").unwrap(), ModelKind::Din);
        assert_eq!(parse_model_kind("baseline").unwrap(), ModelKind::Baseline);
        assert!(parse_model_kind("wide_deep").is_err());
    }
}
