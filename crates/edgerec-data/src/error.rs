//! Error types for the edgerec-data crate.

use std::ops::Range;

use thiserror::Error;

/// Errors raised while describing or slicing a CTR dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// A feature range is malformed or falls outside the input width.
    #[error("Invalid range for {feature}: {range:?} (input width {width})")]
    InvalidRange {
        /// Feature group the range belongs to
        feature: &'static str,
        /// The offending column range
        range: Range<usize>,
        /// Number of columns in the input matrix
        width: usize,
    },

    /// Two feature groups claim the same columns.
    #[error("Feature ranges overlap: {first} {first_range:?} and {second} {second_range:?}")]
    OverlappingRanges {
        /// First feature group
        first: &'static str,
        /// Column range of the first group
        first_range: Range<usize>,
        /// Second feature group
        second: &'static str,
        /// Column range of the second group
        second_range: Range<usize>,
    },

    /// Inputs and targets disagree on the number of examples.
    #[error("Row count mismatch: inputs have {inputs} rows, targets have {targets}")]
    RowMismatch {
        /// Rows in the input matrix
        inputs: usize,
        /// Rows in the target matrix
        targets: usize,
    },

    /// Targets must be a single column of labels.
    #[error("Targets must have exactly one column, got {0}")]
    TargetWidth(usize),

    /// A row range reaches past the end of the dataset.
    #[error("Rows {start}..{end} out of bounds for dataset of {len} examples")]
    RowsOutOfBounds {
        /// First requested row
        start: usize,
        /// One past the last requested row
        end: usize,
        /// Number of examples in the dataset
        len: usize,
    },

    /// Behavior columns do not split evenly into `behavior_size` slots.
    #[error("Behavior width {width} is not divisible by sequence length {behavior_size}")]
    BehaviorLayout {
        /// Number of behavior columns
        width: usize,
        /// Requested behavior sequence length
        behavior_size: usize,
    },

    /// Generator or dataset configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for data operations.
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::RowMismatch {
            inputs: 10,
            targets: 9,
        };
        assert!(err.to_string().contains("Row count mismatch"));

        let err = DataError::InvalidRange {
            feature: "item_feature",
            range: 4..12,
            width: 8,
        };
        assert!(err.to_string().contains("item_feature"));
    }
}
