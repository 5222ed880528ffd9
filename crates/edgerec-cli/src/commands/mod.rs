//! CLI Command Implementations
//!
//! - [`train`]: train a CTR model on synthetic data

pub mod train;

pub use train::{RunConfig, TrainCommand};
