//! Seeded synthetic click data.
//!
//! Generates datasets whose labels depend on how well the candidate item
//! matches the user's behavior history, which is exactly the signal an
//! attention-pooling model should be able to pick up. Used by the CLI and by
//! tests that need realistic-looking inputs.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::CtrDataset;
use crate::error::{DataError, DataResult};
use crate::sample_info::SampleInfo;

/// Shape and randomness of a synthetic dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Number of examples to generate
    pub num_examples: usize,
    /// User profile width
    pub user_profile_dim: usize,
    /// Behavior sequence length `S`
    pub behavior_size: usize,
    /// Behavior / item embedding dimension `D`
    pub behavior_dim: usize,
    /// Context width
    pub ctx_feature_dim: usize,
    /// Standard deviation of the generated embeddings
    pub feature_std: f32,
    /// Seed for the generator
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_examples: 1024,
            user_profile_dim: 4,
            behavior_size: 5,
            behavior_dim: 4,
            ctx_feature_dim: 2,
            feature_std: 0.5,
            seed: 2120,
        }
    }
}

impl SyntheticConfig {
    /// Sets the number of examples.
    pub fn with_num_examples(mut self, n: usize) -> Self {
        self.num_examples = n;
        self
    }

    /// Sets the behavior sequence length and embedding dimension.
    pub fn with_behaviors(mut self, behavior_size: usize, behavior_dim: usize) -> Self {
        self.behavior_size = behavior_size;
        self.behavior_dim = behavior_dim;
        self
    }

    /// Sets the profile and context widths.
    pub fn with_side_features(mut self, user_profile_dim: usize, ctx_feature_dim: usize) -> Self {
        self.user_profile_dim = user_profile_dim;
        self.ctx_feature_dim = ctx_feature_dim;
        self
    }

    /// Sets the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Column layout of the generated rows.
    pub fn sample_info(&self) -> SampleInfo {
        SampleInfo::contiguous(
            self.user_profile_dim,
            self.behavior_size * self.behavior_dim,
            self.behavior_dim,
            self.ctx_feature_dim,
        )
    }

    /// Generates the dataset and its column layout.
    ///
    /// The click probability of each row is `sigmoid(4 * max_i cos(item, b_i))`,
    /// so the label is driven by the single most similar past behavior.
    pub fn generate(&self) -> DataResult<(CtrDataset, SampleInfo)> {
        if self.behavior_size == 0 || self.behavior_dim == 0 {
            return Err(DataError::Config(
                "behavior_size and behavior_dim must be positive".to_string(),
            ));
        }
        if !(self.feature_std.is_finite() && self.feature_std >= 0.0) {
            return Err(DataError::Config(format!(
                "feature_std must be finite and non-negative, got {}",
                self.feature_std
            )));
        }
        let normal = Normal::new(0.0f32, self.feature_std)
            .map_err(|e| DataError::Config(format!("invalid feature_std: {e}")))?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let info = self.sample_info();
        let width = info.width();
        let mut inputs = Array2::<f32>::zeros((self.num_examples, width));
        let mut targets = Array2::<f32>::zeros((self.num_examples, 1));

        for row in 0..self.num_examples {
            for col in 0..width {
                inputs[[row, col]] = normal.sample(&mut rng);
            }

            let item: Vec<f32> = info
                .item_feature_range
                .clone()
                .map(|c| inputs[[row, c]])
                .collect();
            let best = (0..self.behavior_size)
                .map(|slot| {
                    let start = info.user_behavior_range.start + slot * self.behavior_dim;
                    let behavior: Vec<f32> = (start..start + self.behavior_dim)
                        .map(|c| inputs[[row, c]])
                        .collect();
                    cosine(&behavior, &item)
                })
                .fold(f32::NEG_INFINITY, f32::max);

            let p = 1.0 / (1.0 + (-4.0 * best).exp());
            targets[[row, 0]] = if rng.gen::<f32>() < p { 1.0 } else { 0.0 };
        }

        debug!(
            examples = self.num_examples,
            width,
            positives = targets.sum(),
            "Generated synthetic CTR dataset"
        );
        Ok((CtrDataset::new(inputs, targets)?, info))
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
