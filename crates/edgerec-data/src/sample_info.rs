//! Column layout of a flattened CTR sample.
//!
//! Every training example is stored as one row of a dense input matrix. A
//! [`SampleInfo`] records which contiguous columns belong to each feature
//! group, so the trainer can cut a minibatch into the four model inputs.
//!
//! # Example
//!
//! ```
//! use edgerec_data::SampleInfo;
//!
//! // 2 profile columns, 3 behaviors of dim 4, item dim 4, 1 context column
//! let info = SampleInfo::contiguous(2, 3 * 4, 4, 1);
//! assert_eq!(info.user_behavior_range, 2..14);
//! assert_eq!(info.item_feature_dim(), 4);
//! assert_eq!(info.width(), 19);
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// Half-open column ranges of each feature group within an input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Columns holding the user profile features
    pub user_profile_range: Range<usize>,
    /// Columns holding the flattened behavior sequence (`S * D` wide)
    pub user_behavior_range: Range<usize>,
    /// Columns holding the candidate item embedding
    pub item_feature_range: Range<usize>,
    /// Columns holding the context features
    pub ctx_feature_range: Range<usize>,
}

impl SampleInfo {
    /// Lays the four groups out back to back in the canonical order
    /// profile, behavior, item, context.
    pub fn contiguous(
        user_profile_dim: usize,
        user_behavior_width: usize,
        item_feature_dim: usize,
        ctx_feature_dim: usize,
    ) -> Self {
        let behavior_start = user_profile_dim;
        let item_start = behavior_start + user_behavior_width;
        let ctx_start = item_start + item_feature_dim;
        Self {
            user_profile_range: 0..user_profile_dim,
            user_behavior_range: behavior_start..item_start,
            item_feature_range: item_start..ctx_start,
            ctx_feature_range: ctx_start..ctx_start + ctx_feature_dim,
        }
    }

    /// Width of the user profile group.
    pub fn user_profile_dim(&self) -> usize {
        self.user_profile_range.len()
    }

    /// Width of the flattened behavior group.
    pub fn user_behavior_width(&self) -> usize {
        self.user_behavior_range.len()
    }

    /// Width of the item feature group.
    pub fn item_feature_dim(&self) -> usize {
        self.item_feature_range.len()
    }

    /// Width of the context group.
    pub fn ctx_feature_dim(&self) -> usize {
        self.ctx_feature_range.len()
    }

    /// Smallest input width that contains every range.
    pub fn width(&self) -> usize {
        self.named_ranges()
            .iter()
            .map(|(_, r)| r.end)
            .max()
            .unwrap_or(0)
    }

    /// Splits the behavior width into `behavior_size` slots and returns the
    /// per-slot embedding dimension.
    pub fn behavior_dim(&self, behavior_size: usize) -> DataResult<usize> {
        let width = self.user_behavior_width();
        if behavior_size == 0 || width % behavior_size != 0 {
            return Err(DataError::BehaviorLayout {
                width,
                behavior_size,
            });
        }
        Ok(width / behavior_size)
    }

    /// Checks that all ranges fit in `input_width` columns and do not overlap.
    ///
    /// Behavior and item ranges must be non-empty; profile and context may be
    /// empty for models without those features.
    pub fn validate(&self, input_width: usize) -> DataResult<()> {
        for (name, range) in self.named_ranges() {
            let required = matches!(name, "user_behavior" | "item_feature");
            if range.start > range.end || range.end > input_width || (required && range.is_empty())
            {
                return Err(DataError::InvalidRange {
                    feature: name,
                    range: range.clone(),
                    width: input_width,
                });
            }
        }

        let ranges = self.named_ranges();
        for (i, &(first, a)) in ranges.iter().enumerate() {
            for &(second, b) in &ranges[i + 1..] {
                if !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end {
                    return Err(DataError::OverlappingRanges {
                        first,
                        first_range: a.clone(),
                        second,
                        second_range: b.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn named_ranges(&self) -> [(&'static str, &Range<usize>); 4] {
        [
            ("user_profile", &self.user_profile_range),
            ("user_behavior", &self.user_behavior_range),
            ("item_feature", &self.item_feature_range),
            ("ctx_feature", &self.ctx_feature_range),
        ]
    }
}
