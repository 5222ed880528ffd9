//! Neural network layers for EdgeRec.
//!
//! Building blocks of the Deep Interest Network click-through-rate model,
//! computed with [`candle_core`] so that gradients come from candle's
//! reverse-mode autodiff:
//!
//! - **Dense**: bias-free linear transformations over candle [`Var`]s
//! - **Activations**: ReLU, leaky ReLU and sigmoid
//! - **Dropout**: inverted dropout with a per-layer seeded generator
//! - **Interaction**: per-example behavior × item outer products
//! - **DIN**: per-slot attention units followed by sum pooling
//! - **MLP**: the 200 → 80 → 1 prediction head
//!
//! # Quick Start
//!
//! ```
//! use edgerec_layers::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let device = Device::Cpu;
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // 4 behaviors of dimension 3
//! let din = DinAttention::new(DinConfig::new(4, 3), &mut rng, &device).unwrap();
//! let behaviors = Tensor::zeros((8, 12), DType::F32, &device).unwrap();
//! let item = Tensor::zeros((8, 3), DType::F32, &device).unwrap();
//! let interest = din.forward_attention(&behaviors, &item).unwrap();
//!
//! let mlp = PredictionMlp::new(3, &MlpConfig::din(), &mut rng, &device).unwrap();
//! let prob = mlp.forward(&interest).unwrap();
//! assert_eq!(prob.dims(), &[8, 1]);
//! ```
//!
//! [`Var`]: candle_core::Var

#![warn(missing_docs)]

pub mod activation;
pub mod dense;
pub mod din;
pub mod dropout;
pub mod error;
pub mod initializer;
pub mod interaction;
pub mod layer;
pub mod mlp;
pub mod pooling;
pub mod tensor;

/// Commonly used types.
pub mod prelude {
    pub use crate::activation::{ActivationType, LeakyReLU, Sigmoid};
    pub use crate::dense::Dense;
    pub use crate::din::{AttentionUnit, DinAttention, DinConfig};
    pub use crate::dropout::Dropout;
    pub use crate::error::{LayerError, LayerResult};
    pub use crate::initializer::Initializer;
    pub use crate::interaction::outer_product_features;
    pub use crate::layer::Layer;
    pub use crate::mlp::{MlpConfig, PredictionMlp};
    pub use crate::pooling::{Pooling, SumPooling};
    pub use candle_core::{DType, Device, Tensor, Var};
}

pub use error::{LayerError, LayerResult};
pub use layer::Layer;
