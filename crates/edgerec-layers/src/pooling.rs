//! Pooling helpers for lists of tensors.

use candle_core::Tensor;

use crate::error::{LayerError, LayerResult};
use crate::tensor::check_shape;

/// Trait for pooling a list of same-shaped tensors into one.
pub trait Pooling {
    /// Combines `inputs` into a single tensor of the common shape.
    fn pool(&self, inputs: &[Tensor]) -> LayerResult<Tensor>;
}

/// Sum pooling.
///
/// Starts from a zero accumulator of the common shape and adds every input,
/// so the output shape never depends on the number of inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumPooling;

impl Pooling for SumPooling {
    fn pool(&self, inputs: &[Tensor]) -> LayerResult<Tensor> {
        let first = inputs.first().ok_or_else(|| LayerError::ForwardError {
            message: "SumPooling expects non-empty input list".to_string(),
        })?;
        let mut acc = first.zeros_like()?;
        for t in inputs {
            check_shape(t, first.dims())?;
            acc = acc.add(t)?;
        }
        Ok(acc)
    }
}
