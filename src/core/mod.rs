//! Core RBF network implementation.
//!
//! This module provides the network structures and their passes:
//! - Gaussian hidden layer over an affine pre-activation
//! - Linear readout to a scalar
//! - Batched forward pass (evaluation) and cached forward pass (training)
//! - Backward pass for mean squared error
//!
//! ## Model
//!
//! For a batch of scalar inputs `x` (length n) and hidden width m:
//! ```text
//! z = x ⊗ w + b          (n, m)
//! h = exp(-z² / 2)       (n, m)
//! y = h v + c            (n)
//! L = (1/n) Σ (y - t)²
//! ```

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::Rng;
use std::error::Error;
use std::fmt;

use crate::utils::{d_gaussian, gaussian};

/// Error type for RBF network operations.
#[derive(Debug, Clone)]
pub enum RbfError {
    /// Lengths of paired sequences or parameter buffers disagree
    ShapeMismatch(String),
    /// Invalid network or training configuration
    InvalidConfig(String),
    /// File could not be read or written
    Io(String),
    /// Input document could not be parsed
    Parse(String),
}

impl fmt::Display for RbfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbfError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            RbfError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            RbfError::Io(msg) => write!(f, "I/O error: {}", msg),
            RbfError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl Error for RbfError {}

pub type RbfResult<T> = Result<T, RbfError>;

/// Hidden layer: one input feature projected to `num_middle` Gaussian bumps.
///
/// Unit `i` responds with `exp(-(w_i x + b_i)^2 / 2)`, a bump centred at
/// `x = -b_i / w_i` whose width shrinks as `|w_i|` grows.
#[derive(Debug, Clone)]
pub struct RbfLayer {
    /// Projection weights, shape (num_middle)
    pub w: Array1<f32>,
    /// Projection biases, shape (num_middle)
    pub b: Array1<f32>,
}

impl RbfLayer {
    /// Create a layer with Xavier/Glorot uniform weights and zero biases.
    ///
    /// `W ~ U(-limit, limit)` where `limit = sqrt(6 / (fan_in + fan_out))`,
    /// with `fan_in = 1` and `fan_out = out_features`.
    pub fn new<R: Rng + ?Sized>(out_features: usize, rng: &mut R) -> RbfResult<Self> {
        if out_features == 0 {
            return Err(RbfError::InvalidConfig(
                "RBF layer needs at least one hidden unit".to_string(),
            ));
        }

        let limit = (6.0f32 / (1 + out_features) as f32).sqrt();
        let w = Array1::random_using(out_features, Uniform::new(-limit, limit), rng);
        let b = Array1::zeros(out_features);

        Ok(Self { w, b })
    }

    /// Number of hidden units.
    pub fn width(&self) -> usize {
        self.w.len()
    }

    /// Affine pre-activation `z[i, j] = w_j x_i + b_j`, shape (n, num_middle).
    pub fn pre_activation(&self, x: &Array1<f32>) -> Array2<f32> {
        let x_col = x.view().insert_axis(Axis(1));
        let w_row = self.w.view().insert_axis(Axis(0));
        let mut z = &x_col * &w_row;
        z += &self.b;
        z
    }

    /// Gaussian activations for a batch, shape (n, num_middle).
    pub fn forward(&self, x: &Array1<f32>) -> Array2<f32> {
        self.pre_activation(x).mapv(gaussian)
    }
}

/// Output layer: affine map from the hidden width to a scalar.
#[derive(Debug, Clone)]
pub struct Linear {
    /// Readout weights, shape (num_middle)
    pub w: Array1<f32>,
    /// Readout bias, shape (1)
    pub b: Array1<f32>,
}

impl Linear {
    /// Create a readout with the usual library default initialization:
    /// weight and bias drawn from `U(-k, k)` with `k = 1 / sqrt(in_features)`.
    pub fn new<R: Rng + ?Sized>(in_features: usize, rng: &mut R) -> RbfResult<Self> {
        if in_features == 0 {
            return Err(RbfError::InvalidConfig(
                "Linear layer needs at least one input feature".to_string(),
            ));
        }

        let bound = 1.0 / (in_features as f32).sqrt();
        let dist = Uniform::new(-bound, bound);
        let w = Array1::random_using(in_features, dist, rng);
        let b = Array1::random_using(1, dist, rng);

        Ok(Self { w, b })
    }

    /// Batched readout `y = h v + c`, shape (n).
    pub fn forward(&self, h: &Array2<f32>) -> Array1<f32> {
        h.dot(&self.w) + self.b[0]
    }
}

/// Intermediate values of a training forward pass, kept for backprop.
#[derive(Debug, Clone)]
pub struct Activations {
    /// Inputs, shape (n)
    pub x: Array1<f32>,
    /// Hidden pre-activations, shape (n, num_middle)
    pub z: Array2<f32>,
    /// Hidden activations, shape (n, num_middle)
    pub h: Array2<f32>,
    /// Outputs, shape (n)
    pub y: Array1<f32>,
}

/// Gradient buffers, one per parameter tensor of [`RbfNet`].
#[derive(Debug, Clone)]
pub struct Gradients {
    pub hidden_w: Array1<f32>,
    pub hidden_b: Array1<f32>,
    pub output_w: Array1<f32>,
    pub output_b: Array1<f32>,
}

impl Gradients {
    /// Zeroed buffers for a network of the given hidden width.
    pub fn zeros(num_middle: usize) -> Self {
        Self {
            hidden_w: Array1::zeros(num_middle),
            hidden_b: Array1::zeros(num_middle),
            output_w: Array1::zeros(num_middle),
            output_b: Array1::zeros(1),
        }
    }

    /// Reset every buffer to zero, keeping allocations.
    pub fn zero(&mut self) {
        self.hidden_w.fill(0.0);
        self.hidden_b.fill(0.0);
        self.output_w.fill(0.0);
        self.output_b.fill(0.0);
    }

    /// Buffers in the same order as [`RbfNet::parameters_mut`].
    pub fn as_array(&self) -> [&Array1<f32>; 4] {
        [&self.hidden_w, &self.hidden_b, &self.output_w, &self.output_b]
    }
}

/// Two-layer RBF network: Gaussian hidden layer followed by a linear readout.
#[derive(Debug, Clone)]
pub struct RbfNet {
    pub hidden: RbfLayer,
    pub output: Linear,
}

impl RbfNet {
    /// Create a network with `num_middle` hidden units.
    ///
    /// # Errors
    /// - `InvalidConfig` if `num_middle` is zero
    pub fn new<R: Rng + ?Sized>(num_middle: usize, rng: &mut R) -> RbfResult<Self> {
        let hidden = RbfLayer::new(num_middle, rng)?;
        let output = Linear::new(num_middle, rng)?;
        Ok(Self { hidden, output })
    }

    /// Hidden width.
    pub fn num_middle(&self) -> usize {
        self.hidden.width()
    }

    /// Evaluation pass: outputs only, nothing retained for gradients.
    pub fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        self.output.forward(&self.hidden.forward(x))
    }

    /// Training pass: outputs plus the intermediates [`RbfNet::backward`] needs.
    pub fn forward_cached(&self, x: &Array1<f32>) -> Activations {
        let z = self.hidden.pre_activation(x);
        let h = z.mapv(gaussian);
        let y = self.output.forward(&h);
        Activations {
            x: x.clone(),
            z,
            h,
            y,
        }
    }

    /// Mean squared error between predictions and targets.
    pub fn mse(pred: &Array1<f32>, target: &Array1<f32>) -> f32 {
        let diff = pred - target;
        diff.dot(&diff) / diff.len() as f32
    }

    /// Accumulate gradients of the mean squared error into `grads`.
    ///
    /// # Algorithm
    ///
    /// ```text
    /// dy = 2 (y - t) / n
    /// dv = hᵀ dy             dc = Σ dy
    /// dz = (dy ⊗ v) ⊙ (-z h)
    /// dw = dzᵀ x             db = Σ_rows dz
    /// ```
    ///
    /// Gradients are added to the existing buffer contents; call
    /// [`Gradients::zero`] before each step.
    pub fn backward(
        &self,
        cache: &Activations,
        targets: &Array1<f32>,
        grads: &mut Gradients,
    ) -> RbfResult<()> {
        if targets.len() != cache.y.len() {
            return Err(RbfError::ShapeMismatch(format!(
                "{} predictions vs {} targets",
                cache.y.len(),
                targets.len()
            )));
        }
        if grads.hidden_w.len() != self.num_middle() {
            return Err(RbfError::ShapeMismatch(format!(
                "gradient width {} vs network width {}",
                grads.hidden_w.len(),
                self.num_middle()
            )));
        }

        let n = cache.y.len() as f32;
        let dy = (&cache.y - targets) * (2.0 / n);

        grads.output_w += &cache.h.t().dot(&dy);
        grads.output_b[0] += dy.sum();

        let dy_col = dy.view().insert_axis(Axis(1));
        let v_row = self.output.w.view().insert_axis(Axis(0));
        let dh = &dy_col * &v_row;
        let dz = dh * &cache.z.mapv(d_gaussian);

        grads.hidden_w += &dz.t().dot(&cache.x);
        grads.hidden_b += &dz.sum_axis(Axis(0));

        Ok(())
    }

    /// Mutable parameter tensors, in the order of [`Gradients::as_array`].
    pub fn parameters_mut(&mut self) -> [&mut Array1<f32>; 4] {
        [
            &mut self.hidden.w,
            &mut self.hidden.b,
            &mut self.output.w,
            &mut self.output.b,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_network_init() {
        let net = RbfNet::new(3, &mut seeded()).unwrap();
        assert_eq!(net.num_middle(), 3);
        assert_eq!(net.output.w.len(), 3);
        assert_eq!(net.output.b.len(), 1);
    }

    #[test]
    fn test_hidden_init_ranges() {
        let layer = RbfLayer::new(8, &mut seeded()).unwrap();
        let limit = (6.0f32 / 9.0).sqrt();
        assert!(layer.w.iter().all(|w| w.abs() <= limit));
        assert!(layer.b.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_output_init_ranges() {
        let layer = Linear::new(4, &mut seeded()).unwrap();
        assert!(layer.w.iter().all(|w| w.abs() <= 0.5));
        assert!(layer.b[0].abs() <= 0.5);
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(RbfNet::new(0, &mut seeded()).is_err());
    }

    #[test]
    fn test_hidden_forward_values() {
        let layer = RbfLayer {
            w: ndarray::array![1.0, 2.0],
            b: ndarray::array![0.0, -1.0],
        };
        let h = layer.forward(&ndarray::array![0.5]);
        assert!((h[[0, 0]] - (-0.125f32).exp()).abs() < 1e-6);
        // 2 * 0.5 - 1 = 0, peak of the bump
        assert!((h[[0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_forward_shape() {
        let net = RbfNet::new(5, &mut seeded()).unwrap();
        let y = net.forward(&ndarray::array![-1.0, 0.0, 0.25, 1.0]);
        assert_eq!(y.len(), 4);
        assert!(y.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_forward_cached_matches_forward() {
        let net = RbfNet::new(3, &mut seeded()).unwrap();
        let x = ndarray::array![-0.5, 0.0, 0.5];
        let cache = net.forward_cached(&x);
        assert_eq!(cache.y, net.forward(&x));
        assert_eq!(cache.z.shape(), &[3, 3]);
    }

    #[test]
    fn test_mse() {
        let pred = ndarray::array![1.0, 2.0];
        let target = ndarray::array![0.0, 0.0];
        assert_eq!(RbfNet::mse(&pred, &target), 2.5);
    }

    #[test]
    fn test_backward_matches_finite_difference() {
        let mut net = RbfNet::new(3, &mut seeded()).unwrap();
        net.hidden.b = ndarray::array![0.1, -0.2, 0.3];
        let x = ndarray::array![-1.0, -0.5, 0.0, 0.5, 1.0];
        let t = ndarray::array![1.0, -1.0, -1.0, 1.0, 1.0];

        let mut grads = Gradients::zeros(3);
        let cache = net.forward_cached(&x);
        net.backward(&cache, &t, &mut grads).unwrap();
        let analytic: Vec<Vec<f32>> = grads.as_array().iter().map(|g| g.to_vec()).collect();

        let h = 1e-2f32;
        for p in 0..4 {
            for j in 0..analytic[p].len() {
                let mut plus = net.clone();
                plus.parameters_mut()[p][j] += h;
                let mut minus = net.clone();
                minus.parameters_mut()[p][j] -= h;
                let numeric = (RbfNet::mse(&plus.forward(&x), &t)
                    - RbfNet::mse(&minus.forward(&x), &t))
                    / (2.0 * h);
                assert!(
                    (numeric - analytic[p][j]).abs() < 1e-2,
                    "param {p}[{j}]: numeric {numeric} vs analytic {}",
                    analytic[p][j]
                );
            }
        }
    }

    #[test]
    fn test_backward_accumulates_until_zeroed() {
        let net = RbfNet::new(2, &mut seeded()).unwrap();
        let x = ndarray::array![0.3, -0.7];
        let t = ndarray::array![1.0, 0.0];
        let cache = net.forward_cached(&x);

        let mut grads = Gradients::zeros(2);
        net.backward(&cache, &t, &mut grads).unwrap();
        let once = grads.output_b[0];
        net.backward(&cache, &t, &mut grads).unwrap();
        assert!((grads.output_b[0] - 2.0 * once).abs() < 1e-6);

        grads.zero();
        assert_eq!(grads.output_b[0], 0.0);
        assert!(grads.hidden_w.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_backward_rejects_target_mismatch() {
        let net = RbfNet::new(2, &mut seeded()).unwrap();
        let cache = net.forward_cached(&ndarray::array![0.0, 1.0]);
        let mut grads = Gradients::zeros(2);
        let result = net.backward(&cache, &ndarray::array![1.0], &mut grads);
        assert!(matches!(result, Err(RbfError::ShapeMismatch(_))));
    }
}
