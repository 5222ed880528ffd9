//! Shape helpers over candle tensors.

use candle_core::Tensor;

use crate::error::{LayerError, LayerResult};

/// Returns `(rows, cols)` of a rank-2 tensor, or a shape error naming the
/// actual dims.
pub fn dims2(tensor: &Tensor) -> LayerResult<(usize, usize)> {
    match tensor.dims() {
        &[rows, cols] => Ok((rows, cols)),
        other => Err(LayerError::ForwardError {
            message: format!("expected a rank-2 tensor, got shape {other:?}"),
        }),
    }
}

/// Fails with [`LayerError::ShapeMismatch`] unless `tensor` has exactly
/// `expected` dims.
pub fn check_shape(tensor: &Tensor, expected: &[usize]) -> LayerResult<()> {
    if tensor.dims() != expected {
        return Err(LayerError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: tensor.dims().to_vec(),
        });
    }
    Ok(())
}

/// Concatenates rank-2 tensors along the feature axis, skipping groups with
/// zero columns.
pub fn concat_features(parts: &[&Tensor]) -> LayerResult<Tensor> {
    let mut non_empty = Vec::with_capacity(parts.len());
    for part in parts {
        if dims2(part)?.1 > 0 {
            non_empty.push(*part);
        }
    }
    if non_empty.is_empty() {
        return Err(LayerError::ForwardError {
            message: "nothing to concatenate".to_string(),
        });
    }
    Ok(Tensor::cat(&non_empty, 1)?)
}
