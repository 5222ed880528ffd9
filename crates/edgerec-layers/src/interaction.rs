//! Behavior × item outer-product features.
//!
//! For each example `b`, the full flattened behavior vector `u_b` of length
//! `S * D` and the item vector `v_b` of length `D` produce the matrix
//! `u_b ⊗ v_b` of shape `[S * D, D]`, flattened row-major to `S * D * D`
//! values. The batch is computed in one broadcast multiply
//! `[B, S*D, 1] * [B, 1, D]`, so entry `(k, j)` of row `b` is only ever
//! `u_b[k] * v_b[j]` and rows never mix.
//!
//! # Example
//!
//! ```
//! use candle_core::{Device, Tensor};
//! use edgerec_layers::interaction::outer_product_features;
//!
//! let behaviors = Tensor::new(&[[1.0f32, 2.0]], &Device::Cpu).unwrap();
//! let item = Tensor::new(&[[3.0f32, 4.0]], &Device::Cpu).unwrap();
//! let out = outer_product_features(&behaviors, &item).unwrap();
//! assert_eq!(out.to_vec2::<f32>().unwrap(), vec![vec![3.0, 4.0, 6.0, 8.0]]);
//! ```

use candle_core::Tensor;

use crate::error::{LayerError, LayerResult};
use crate::tensor::dims2;

/// Per-example outer product of `behaviors: [B, S*D]` and `item: [B, D]`,
/// returned as `[B, S*D*D]`.
pub fn outer_product_features(behaviors: &Tensor, item: &Tensor) -> LayerResult<Tensor> {
    let (batch, width) = dims2(behaviors)?;
    let (item_batch, dim) = dims2(item)?;
    if batch != item_batch {
        return Err(LayerError::ShapeMismatch {
            expected: vec![batch, dim],
            actual: vec![item_batch, dim],
        });
    }

    let left = behaviors.reshape((batch, width, 1))?;
    let right = item.reshape((batch, 1, dim))?;
    Ok(left.broadcast_mul(&right)?.reshape((batch, width * dim))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_hand_computed_case() {
        let dev = Device::Cpu;
        let behaviors = Tensor::new(&[[1.0f32, 2.0]], &dev).unwrap();
        let item = Tensor::new(&[[3.0f32, 4.0]], &dev).unwrap();
        let out = outer_product_features(&behaviors, &item).unwrap();
        assert_eq!(out.dims(), &[1, 4]);
        assert_eq!(out.to_vec2::<f32>().unwrap(), vec![vec![3.0, 4.0, 6.0, 8.0]]);
    }

    #[test]
    fn test_rows_do_not_mix() {
        let dev = Device::Cpu;
        let ub: Vec<Vec<f32>> = vec![vec![1.0, -1.0, 0.5, 2.0], vec![3.0, 0.0, -2.0, 1.0]];
        let it: Vec<Vec<f32>> = vec![vec![2.0, 5.0], vec![-1.0, 4.0]];
        let behaviors = Tensor::new(&[[1.0f32, -1.0, 0.5, 2.0], [3.0, 0.0, -2.0, 1.0]], &dev)
            .unwrap();
        let item = Tensor::new(&[[2.0f32, 5.0], [-1.0, 4.0]], &dev).unwrap();

        let out = outer_product_features(&behaviors, &item)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        for b in 0..2 {
            let expected: Vec<f32> = ub[b]
                .iter()
                .flat_map(|u| it[b].iter().map(move |v| u * v))
                .collect();
            assert_eq!(out[b], expected);
        }
    }

    #[test]
    fn test_batch_mismatch() {
        let dev = Device::Cpu;
        let behaviors = Tensor::new(&[[1.0f32, 2.0], [3.0, 4.0]], &dev).unwrap();
        let item = Tensor::new(&[[3.0f32, 4.0]], &dev).unwrap();
        assert!(matches!(
            outer_product_features(&behaviors, &item),
            Err(LayerError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_gradient_flows_to_both_inputs() {
        let dev = Device::Cpu;
        let behaviors = candle_core::Var::new(&[[1.0f32, 2.0]], &dev).unwrap();
        let item = candle_core::Var::new(&[[3.0f32, 4.0]], &dev).unwrap();
        let loss = outer_product_features(behaviors.as_tensor(), item.as_tensor())
            .unwrap()
            .sum_all()
            .unwrap();
        let grads = loss.backward().unwrap();

        // d/du_k sum_j u_k v_j = sum_j v_j
        let gu = grads.get(behaviors.as_tensor()).unwrap();
        assert_eq!(gu.to_vec2::<f32>().unwrap(), vec![vec![7.0, 7.0]]);
        let gv = grads.get(item.as_tensor()).unwrap();
        assert_eq!(gv.to_vec2::<f32>().unwrap(), vec![vec![3.0, 3.0]]);
    }
}
