//! Gradient-descent solvers.
//!
//! [`OptimizerConfig`] is the serializable choice of algorithm and
//! hyper-parameters; [`Solver`] binds it to a model's learnable variables
//! and applies one update per batch from a candle [`GradStore`].

use candle_core::backprop::GradStore;
use candle_core::Var;
use candle_nn::{AdamW, Optimizer, ParamsAdamW, SGD};
use serde::{Deserialize, Serialize};

use crate::error::{TrainingError, TrainingResult};

/// Optimizer algorithm and hyper-parameters.
///
/// # Example
///
/// ```
/// use edgerec_training::optimizer::OptimizerConfig;
///
/// let config: OptimizerConfig =
///     serde_json::from_str(r#"{"type": "sgd", "learning_rate": 0.1}"#).unwrap();
/// assert_eq!(config.learning_rate(), 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    /// Adam with bias correction and no weight decay.
    Adam {
        /// Step size
        learning_rate: f64,
        /// First moment decay
        beta1: f64,
        /// Second moment decay
        beta2: f64,
        /// Denominator epsilon
        epsilon: f64,
    },
    /// Plain stochastic gradient descent.
    Sgd {
        /// Step size
        learning_rate: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(0.001)
    }
}

impl OptimizerConfig {
    /// Adam with the usual betas and epsilon.
    pub fn adam(learning_rate: f64) -> Self {
        Self::Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// SGD with a fixed step size.
    pub fn sgd(learning_rate: f64) -> Self {
        Self::Sgd { learning_rate }
    }

    /// The configured step size.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam { learning_rate, .. } | Self::Sgd { learning_rate } => *learning_rate,
        }
    }

    /// Returns a copy with a different step size.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        match &mut self {
            Self::Adam { learning_rate, .. } | Self::Sgd { learning_rate } => *learning_rate = lr,
        }
        self
    }

    /// Checks that every hyper-parameter is usable.
    pub fn validate(&self) -> TrainingResult<()> {
        let lr = self.learning_rate();
        if !(lr.is_finite() && lr > 0.0) {
            return Err(TrainingError::InvalidConfig(format!(
                "learning rate must be positive, got {lr}"
            )));
        }
        if let Self::Adam { beta1, beta2, .. } = self {
            if !(0.0..1.0).contains(beta1) || !(0.0..1.0).contains(beta2) {
                return Err(TrainingError::InvalidConfig(format!(
                    "adam betas must be in [0, 1), got {beta1} and {beta2}"
                )));
            }
        }
        Ok(())
    }
}

/// An optimizer bound to a fixed set of variables.
pub enum Solver {
    /// candle's AdamW with zero weight decay.
    Adam(AdamW),
    /// candle's SGD.
    Sgd(SGD),
}

impl Solver {
    /// Creates a solver updating `vars`.
    pub fn new(config: &OptimizerConfig, vars: Vec<Var>) -> TrainingResult<Self> {
        config.validate()?;
        let solver = match *config {
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let params = ParamsAdamW {
                    lr: learning_rate,
                    beta1,
                    beta2,
                    eps: epsilon,
                    weight_decay: 0.0,
                };
                Solver::Adam(AdamW::new(vars, params).map_err(optimizer_error)?)
            }
            OptimizerConfig::Sgd { learning_rate } => {
                Solver::Sgd(SGD::new(vars, learning_rate).map_err(optimizer_error)?)
            }
        };
        Ok(solver)
    }

    /// Applies one update from the gradients of the last backward pass.
    pub fn step(&mut self, grads: &GradStore) -> TrainingResult<()> {
        match self {
            Solver::Adam(opt) => opt.step(grads),
            Solver::Sgd(opt) => opt.step(grads),
        }
        .map_err(optimizer_error)
    }

    /// Current step size.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Solver::Adam(opt) => opt.learning_rate(),
            Solver::Sgd(opt) => opt.learning_rate(),
        }
    }
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Solver::Adam(_) => "adam",
            Solver::Sgd(_) => "sgd",
        };
        f.debug_struct("Solver")
            .field("kind", &kind)
            .field("learning_rate", &self.learning_rate())
            .finish()
    }
}

fn optimizer_error(err: candle_core::Error) -> TrainingError {
    TrainingError::Optimizer(err.to_string())
}
