//! Dataset plumbing for EdgeRec CTR models.
//!
//! This crate owns everything the training loop needs to know about data:
//!
//! - [`SampleInfo`]: which columns of a flattened row hold the user profile,
//!   the behavior sequence, the candidate item and the context
//! - [`CtrDataset`]: an ndarray-backed input matrix plus label column, cut into
//!   [`FeatureBatch`]es by row range
//! - [`SyntheticConfig`]: seeded synthetic click data for demos and tests
//!
//! # Example
//!
//! ```
//! use edgerec_data::SyntheticConfig;
//!
//! let (dataset, info) = SyntheticConfig::default()
//!     .with_num_examples(64)
//!     .generate()
//!     .unwrap();
//!
//! for batch in dataset.batches(&info, 16) {
//!     let batch = batch.unwrap();
//!     assert_eq!(batch.batch_size(), 16);
//! }
//! ```

#![warn(missing_docs)]

pub mod dataset;
pub mod error;
pub mod sample_info;
pub mod synthetic;

pub use dataset::{CtrDataset, FeatureBatch};
pub use error::{DataError, DataResult};
pub use sample_info::SampleInfo;
pub use synthetic::SyntheticConfig;
