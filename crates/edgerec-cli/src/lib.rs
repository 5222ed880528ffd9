//! EdgeRec CLI Library
//!
//! Command-line front end for training EdgeRec click-through-rate models.
//!
//! # Example
//!
//! ```bash
//! # Train the attention model for 20 epochs and report AUC
//! edgerec train --model din --epochs 20 --eval
//!
//! # Start from a JSON config and override the learning rate
//! edgerec train --config run.json --learning-rate 0.01
//! ```

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::{RunConfig, TrainCommand};

/// EdgeRec - click-through-rate models with attention over user behavior
#[derive(Parser, Debug)]
#[command(name = "edgerec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model on seeded synthetic data
    Train(TrainCommand),
}

/// Result type alias for CLI operations
pub type CliResult<T> = anyhow::Result<T>;
