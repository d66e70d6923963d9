//! Training data, max-normalization and query grids.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::core::{RbfError, RbfResult};

/// Paired training sequences `(x[i], y[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

impl TrainingSet {
    /// Pair `x` with `y`.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the sequences differ in length
    /// - `InvalidConfig` if they are empty
    pub fn new(x: Vec<f32>, y: Vec<f32>) -> RbfResult<Self> {
        if x.len() != y.len() {
            return Err(RbfError::ShapeMismatch(format!(
                "{} inputs vs {} targets",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(RbfError::InvalidConfig(
                "Training set must contain at least one point".to_string(),
            ));
        }
        Ok(Self { x, y })
    }

    /// The five-point set the `fit-curve` binary uses by default.
    pub fn demo() -> Self {
        Self {
            x: vec![-100.0, -50.0, 0.0, 50.0, 100.0],
            y: vec![100.0, -100.0, -100.0, 100.0, 100.0],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Load a training set from a JSON document of the form `{"x": [...], "y": [...]}`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the sequences
/// fail [`TrainingSet::new`] validation.
pub fn load_points(path: &Path) -> RbfResult<TrainingSet> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| RbfError::Io(format!("Failed to read {}: {e}", path.display())))?;
    let raw: TrainingSet = serde_json::from_str(&json)
        .map_err(|e| RbfError::Parse(format!("Failed to parse {}: {e}", path.display())))?;
    TrainingSet::new(raw.x, raw.y)
}

/// Per-run scale factors: the maxima of the training inputs and targets.
///
/// Values are divided by their maximum on the way in and multiplied back on
/// the way out. A zero maximum is not guarded against; the resulting
/// infinities and NaNs flow through training and prediction unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    pub max_x: f32,
    pub max_y: f32,
}

impl Normalizer {
    pub fn from_set(set: &TrainingSet) -> Self {
        let max_x = max_of(&set.x);
        let max_y = max_of(&set.y);

        if max_x == 0.0 {
            warn!("max(x) is zero, normalized inputs will be non-finite");
        }
        if max_y == 0.0 {
            warn!("max(y) is zero, normalized targets will be non-finite");
        }

        Self { max_x, max_y }
    }

    pub fn normalize_x(&self, x: &[f32]) -> Array1<f32> {
        x.iter().map(|v| v / self.max_x).collect()
    }

    pub fn normalize_y(&self, y: &[f32]) -> Array1<f32> {
        y.iter().map(|v| v / self.max_y).collect()
    }

    pub fn denormalize_y(&self, y: &Array1<f32>) -> Vec<f32> {
        y.iter().map(|v| v * self.max_y).collect()
    }
}

fn max_of(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Evenly spaced query points `lb, lb + step, ...` strictly below `rb`.
///
/// # Errors
/// - `InvalidConfig` if `step` is not positive or a bound is not finite
pub fn query_range(lb: f32, rb: f32, step: f32) -> RbfResult<Vec<f32>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(RbfError::InvalidConfig(format!(
            "Query step must be positive, got {step}"
        )));
    }
    if !lb.is_finite() || !rb.is_finite() {
        return Err(RbfError::InvalidConfig(format!(
            "Query bounds must be finite, got [{lb}, {rb})"
        )));
    }

    let mut points = Vec::new();
    let mut i = 0usize;
    loop {
        let x = lb + step * i as f32;
        if x >= rb {
            break;
        }
        points.push(x);
        i += 1;
    }
    Ok(points)
}
