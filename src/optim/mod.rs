//! Gradient-based optimizers.

use ndarray::{Array1, Zip};

use crate::core::{RbfError, RbfResult};

/// Trait for optimizers that update parameter tensors in place.
///
/// `params` and `grads` are matched by position.
pub trait Optimizer {
    fn step(&mut self, params: &mut [&mut Array1<f32>], grads: &[&Array1<f32>]) -> RbfResult<()>;
}

/// Adam: adaptive moment estimation with bias correction.
///
/// ```text
/// m ← β1 m + (1 - β1) g
/// v ← β2 v + (1 - β2) g²
/// p ← p - (lr / (1 - β1ᵗ)) · m / (sqrt(v) / sqrt(1 - β2ᵗ) + ε)
/// ```
#[derive(Debug, Clone)]
pub struct Adam {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m: Vec<Array1<f32>>,
    v: Vec<Array1<f32>>,
    t: i32,
}

impl Adam {
    pub fn new(lr: f32) -> Self {
        Self::with_betas(lr, 0.9, 0.999)
    }

    pub fn with_betas(lr: f32, beta1: f32, beta2: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon: 1e-8,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> usize {
        self.t as usize
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Array1<f32>], grads: &[&Array1<f32>]) -> RbfResult<()> {
        if params.len() != grads.len() {
            return Err(RbfError::ShapeMismatch(format!(
                "{} parameters vs {} gradients",
                params.len(),
                grads.len()
            )));
        }
        for (i, (p, g)) in params.iter().zip(grads).enumerate() {
            if p.len() != g.len() {
                return Err(RbfError::ShapeMismatch(format!(
                    "parameter {i} has {} elements, gradient has {}",
                    p.len(),
                    g.len()
                )));
            }
        }

        // Moment buffers are sized on the first step
        if self.m.is_empty() {
            self.m = params.iter().map(|p| Array1::zeros(p.len())).collect();
            self.v = params.iter().map(|p| Array1::zeros(p.len())).collect();
        } else if self.m.len() != params.len() {
            return Err(RbfError::ShapeMismatch(format!(
                "optimizer tracks {} parameters, got {}",
                self.m.len(),
                params.len()
            )));
        }

        self.t += 1;
        let bc1 = 1.0 - self.beta1.powi(self.t);
        let bc2_sqrt = (1.0 - self.beta2.powi(self.t)).sqrt();
        let step_size = self.lr / bc1;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);

        for ((p, g), (m, v)) in params
            .iter_mut()
            .zip(grads)
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            Zip::from(&mut **p)
                .and(*g)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= step_size * *m / (v.sqrt() / bc2_sqrt + eps);
                });
        }

        Ok(())
    }
}
