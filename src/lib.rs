//! # rbfnet
//!
//! Curve fitting with a small radial-basis-function network.
//!
//! ## Overview
//!
//! The network maps a scalar input through an affine projection to a hidden
//! width, applies a Gaussian bump to every hidden unit and reads the result
//! out with a second affine map:
//!
//! ```text
//! h_i = exp(-(w_i x + b_i)^2 / 2)
//! y   = Σ_i v_i h_i + c
//! ```
//!
//! Training is full-batch Adam on mean squared error over data rescaled by
//! its maxima. A run is one-shot: normalize, train for a fixed number of
//! epochs, evaluate on query points, denormalize.
//!
//! ## Structure
//!
//! - [`core`] — Network layers, forward/backward passes, error type
//! - [`optim`] — Adam optimizer
//! - [`data`] — Training sets, normalization, query grids
//! - [`training`] — Fixed-epoch training loop and the [`train`] entry point
//! - [`utils`] — Gaussian helpers and error metrics

pub mod core;
pub mod data;
pub mod optim;
pub mod training;
pub mod utils;

pub use crate::core::{Activations, Gradients, Linear, RbfError, RbfLayer, RbfNet, RbfResult};
pub use data::{query_range, Normalizer, TrainingSet};
pub use optim::{Adam, Optimizer};
pub use training::{fit, fit_best_of, train, train_with_config, Fitted, TrainReport};

/// Training configuration for a single fit.
///
/// Used by [`fit`], [`fit_best_of`] and [`train_with_config`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of RBF units in the hidden layer.
    pub num_middle: usize,
    /// Number of full-batch optimizer steps.
    pub epochs: usize,
    /// Adam step size.
    pub learning_rate: f32,
    /// RNG seed for weight initialization; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Emit a debug loss line every N epochs (0 disables).
    pub log_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_middle: 3,
            epochs: 2000,
            learning_rate: 1e-3,
            seed: None,
            log_every: 200,
        }
    }
}
