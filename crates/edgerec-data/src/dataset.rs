//! Dense CTR datasets and minibatch slicing.
//!
//! A [`CtrDataset`] owns the full input matrix `[N, F]` and the label column
//! `[N, 1]`. Batches are cut by row range, then split into feature groups by
//! the column ranges of a [`SampleInfo`].
//!
//! # Example
//!
//! ```
//! use edgerec_data::{CtrDataset, SampleInfo};
//! use ndarray::Array2;
//!
//! let info = SampleInfo::contiguous(1, 2, 2, 1);
//! let inputs = Array2::<f32>::zeros((10, info.width()));
//! let targets = Array2::<f32>::zeros((10, 1));
//! let dataset = CtrDataset::new(inputs, targets).unwrap();
//!
//! assert_eq!(dataset.num_batches(4), 2);
//! let batch = dataset.batch(&info, 4, 8).unwrap();
//! assert_eq!(batch.batch_size(), 4);
//! assert_eq!(batch.user_behaviors.dim(), (4, 2));
//! ```

use std::ops::Range;

use ndarray::{s, Array2};

use crate::error::{DataError, DataResult};
use crate::sample_info::SampleInfo;

/// One minibatch split into the model's input groups.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    /// `[B, profile_dim]`
    pub user_profile: Array2<f32>,
    /// `[B, S * D]`
    pub user_behaviors: Array2<f32>,
    /// `[B, D]`
    pub item_feature: Array2<f32>,
    /// `[B, ctx_dim]`
    pub ctx_feature: Array2<f32>,
    /// `[B, 1]` click labels in {0, 1}
    pub labels: Array2<f32>,
}

impl FeatureBatch {
    /// Number of examples in the batch.
    pub fn batch_size(&self) -> usize {
        self.labels.nrows()
    }
}

/// Full in-memory dataset of flattened samples and their labels.
#[derive(Debug, Clone)]
pub struct CtrDataset {
    inputs: Array2<f32>,
    targets: Array2<f32>,
}

impl CtrDataset {
    /// Wraps an input matrix `[N, F]` and a label column `[N, 1]`.
    pub fn new(inputs: Array2<f32>, targets: Array2<f32>) -> DataResult<Self> {
        if inputs.nrows() != targets.nrows() {
            return Err(DataError::RowMismatch {
                inputs: inputs.nrows(),
                targets: targets.nrows(),
            });
        }
        if targets.ncols() != 1 {
            return Err(DataError::TargetWidth(targets.ncols()));
        }
        Ok(Self { inputs, targets })
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    /// Returns `true` when the dataset holds no examples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of input columns.
    pub fn input_width(&self) -> usize {
        self.inputs.ncols()
    }

    /// The raw input matrix.
    pub fn inputs(&self) -> &Array2<f32> {
        &self.inputs
    }

    /// The raw label column.
    pub fn targets(&self) -> &Array2<f32> {
        &self.targets
    }

    /// Number of full batches of `batch_size`; the remainder is dropped.
    pub fn num_batches(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            0
        } else {
            self.len() / batch_size
        }
    }

    /// Row range of batch `index` for a fixed `batch_size`.
    pub fn batch_rows(&self, index: usize, batch_size: usize) -> Range<usize> {
        let start = index * batch_size;
        start..start + batch_size
    }

    /// Slices rows `start..end` and splits them by the ranges in `info`.
    pub fn batch(&self, info: &SampleInfo, start: usize, end: usize) -> DataResult<FeatureBatch> {
        if start > end || end > self.len() {
            return Err(DataError::RowsOutOfBounds {
                start,
                end,
                len: self.len(),
            });
        }
        info.validate(self.input_width())?;

        let cols = |range: &Range<usize>| {
            self.inputs
                .slice(s![start..end, range.start..range.end])
                .to_owned()
        };

        Ok(FeatureBatch {
            user_profile: cols(&info.user_profile_range),
            user_behaviors: cols(&info.user_behavior_range),
            item_feature: cols(&info.item_feature_range),
            ctx_feature: cols(&info.ctx_feature_range),
            labels: self.targets.slice(s![start..end, ..]).to_owned(),
        })
    }

    /// Iterates over every full batch in order.
    pub fn batches<'a>(
        &'a self,
        info: &'a SampleInfo,
        batch_size: usize,
    ) -> impl Iterator<Item = DataResult<FeatureBatch>> + 'a {
        (0..self.num_batches(batch_size)).map(move |b| {
            let rows = self.batch_rows(b, batch_size);
            self.batch(info, rows.start, rows.end)
        })
    }
}
