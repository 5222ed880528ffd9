use std::io::Write;

use clap::Parser;
use edgerec_cli::{Cli, Commands, RunConfig};
use edgerec_training::{ModelKind, OptimizerConfig};

fn train_command(args: &[&str]) -> edgerec_cli::TrainCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Train(cmd) => cmd,
    }
}

#[test]
fn parses_train_flags() {
    let cmd = train_command(&[
        "edgerec",
        "train",
        "--model",
        "baseline",
        "--epochs",
        "2",
        "--batch-size",
        "8",
        "--examples",
        "64",
        "--learning-rate",
        "0.01",
        "--seed",
        "5",
        "--eval",
    ]);
    assert_eq!(cmd.model, Some(ModelKind::Baseline));
    assert_eq!(cmd.epochs, Some(2));
    assert_eq!(cmd.batch_size, Some(8));
    assert_eq!(cmd.examples, Some(64));
    assert_eq!(cmd.learning_rate, Some(0.01));
    assert_eq!(cmd.seed, Some(5));
    assert!(cmd.eval);
}

#[test]
fn rejects_unknown_model() {
    assert!(Cli::try_parse_from(["edgerec", "train", "--model", "wide_deep"]).is_err());
}

#[test]
fn flags_override_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "model": {{"kind": "baseline", "hidden_units": [8, 4]}},
            "train": {{"epochs": 5, "batch_size": 4,
                       "optimizer": {{"type": "sgd", "learning_rate": 0.1}}}},
            "data": {{"num_examples": 32, "behavior_size": 2, "behavior_dim": 3}}
        }}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let cmd = train_command(&["edgerec", "train", "--config", &path, "--epochs", "2"]);
    let config: RunConfig = cmd.resolve_config().unwrap();

    assert_eq!(config.model.kind, ModelKind::Baseline);
    assert_eq!(config.model.hidden_units, vec![8, 4]);
    assert_eq!(config.train.epochs, 2);
    assert_eq!(config.train.batch_size, 4);
    assert_eq!(config.train.optimizer, OptimizerConfig::sgd(0.1));
    assert_eq!(config.train.behavior_size, 2);
    assert_eq!(config.model.behavior_dim, 3);
    assert_eq!(config.model.item_feature_dim, 3);
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let cmd = train_command(&["edgerec", "train", "--config", missing.to_str().unwrap()]);
    let err = cmd.resolve_config().unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn runs_a_small_training_job() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"model": {{"hidden_units": [8, 4], "init_std": 0.1}},
            "data": {{"num_examples": 24}}}}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let cmd = train_command(&[
        "edgerec",
        "train",
        "--config",
        &path,
        "--epochs",
        "2",
        "--batch-size",
        "8",
        "--eval",
    ]);
    let report = cmd.run().unwrap();
    assert_eq!(report.epochs, 2);
    assert_eq!(report.batches_per_epoch, 3);
    assert_eq!(report.global_step, 6);
}
