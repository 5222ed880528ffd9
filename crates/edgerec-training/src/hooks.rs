//! Training hooks for observing the training loop.
//!
//! Hooks are called after every batch, after every epoch and once at the
//! end of a run. They observe; they cannot stop training early, since a run
//! always completes its configured number of epochs.

use thiserror::Error;
use tracing::{debug, info};

use crate::metrics::Metrics;

/// Errors that can occur during hook execution.
#[derive(Debug, Error)]
pub enum HookError {
    /// A custom hook error.
    #[error("Hook error: {0}")]
    Custom(String),
}

/// Result type for hook operations.
pub type HookResult<T> = Result<T, HookError>;

/// Trait for training hooks.
///
/// # Examples
///
/// ```
/// use edgerec_training::hooks::{Hook, HookResult};
/// use edgerec_training::metrics::Metrics;
///
/// struct EpochPrinter;
///
/// impl Hook for EpochPrinter {
///     fn name(&self) -> &str {
///         "epoch_printer"
///     }
///
///     fn after_epoch(&mut self, epoch: usize, metrics: &Metrics) -> HookResult<()> {
///         println!("Epoch {}: loss = {}", epoch, metrics.loss);
///         Ok(())
///     }
/// }
/// ```
pub trait Hook: Send + Sync {
    /// Returns the name of this hook for logging purposes.
    fn name(&self) -> &str;

    /// Called after each batch with that batch's loss.
    fn after_step(&mut self, _step: u64, _metrics: &Metrics) -> HookResult<()> {
        Ok(())
    }

    /// Called after each epoch with the epoch's mean loss.
    fn after_epoch(&mut self, _epoch: usize, _metrics: &Metrics) -> HookResult<()> {
        Ok(())
    }

    /// Called once when the run finishes.
    fn end(&mut self, _step: u64, _metrics: Option<&Metrics>) -> HookResult<()> {
        Ok(())
    }
}

/// A hook that logs per-epoch loss and, every N steps, per-batch loss.
///
/// # Examples
///
/// ```
/// use edgerec_training::hooks::LoggingHook;
///
/// // Log batch losses every 100 steps
/// let hook = LoggingHook::new(100);
/// ```
#[derive(Debug)]
pub struct LoggingHook {
    every_n_steps: u64,
}

impl LoggingHook {
    /// Creates a new logging hook that logs batch losses every N steps.
    pub fn new(every_n_steps: u64) -> Self {
        Self {
            every_n_steps: every_n_steps.max(1),
        }
    }

    /// Whether batch `step` would be logged.
    pub fn should_log_step(&self, step: u64) -> bool {
        step % self.every_n_steps == 0
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Hook for LoggingHook {
    fn name(&self) -> &str {
        "logging_hook"
    }

    fn after_step(&mut self, step: u64, metrics: &Metrics) -> HookResult<()> {
        if self.should_log_step(step) {
            debug!(step, loss = metrics.loss, "Batch finished");
        }
        Ok(())
    }

    fn after_epoch(&mut self, epoch: usize, metrics: &Metrics) -> HookResult<()> {
        let mut msg = format!("Epoch {} | cost {:.6}", epoch, metrics.loss);
        if let Some(acc) = metrics.accuracy {
            msg.push_str(&format!(", accuracy = {:.4}", acc));
        }
        if let Some(auc) = metrics.auc {
            msg.push_str(&format!(", AUC = {:.4}", auc));
        }
        info!("{}", msg);
        Ok(())
    }

    fn end(&mut self, step: u64, metrics: Option<&Metrics>) -> HookResult<()> {
        if let Some(m) = metrics {
            info!(
                "Training finished at step {}: final loss = {:.6}",
                step, m.loss
            );
        } else {
            info!("Training finished at step {}", step);
        }
        Ok(())
    }
}

/// A collection of hooks that are run together.
#[derive(Default)]
pub struct HookList {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookList {
    /// Creates a new empty hook list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hook to the list.
    pub fn add<H: Hook + 'static>(&mut self, hook: H) {
        self.hooks.push(Box::new(hook));
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` when no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs `after_step` on all hooks.
    pub fn after_step(&mut self, step: u64, metrics: &Metrics) -> HookResult<()> {
        for hook in &mut self.hooks {
            hook.after_step(step, metrics)?;
        }
        Ok(())
    }

    /// Runs `after_epoch` on all hooks.
    pub fn after_epoch(&mut self, epoch: usize, metrics: &Metrics) -> HookResult<()> {
        for hook in &mut self.hooks {
            hook.after_epoch(epoch, metrics)?;
        }
        Ok(())
    }

    /// Runs `end` on all hooks.
    pub fn end(&mut self, step: u64, metrics: Option<&Metrics>) -> HookResult<()> {
        for hook in &mut self.hooks {
            hook.end(step, metrics)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookList").field("hooks", &names).finish()
    }
}
