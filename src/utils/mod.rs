//! Math utilities: the Gaussian bump, its derivative, and error metrics.

/// Gaussian bump: exp(-z² / 2).
#[inline]
pub fn gaussian(z: f32) -> f32 {
    (-(z * z) / 2.0).exp()
}

/// Derivative of the Gaussian bump: -z · exp(-z² / 2).
#[inline]
pub fn d_gaussian(z: f32) -> f32 {
    -z * gaussian(z)
}

/// Mean absolute difference between two equally long sequences.
///
/// Extra elements of the longer sequence are ignored. Returns 0 for empty input.
pub fn mean_abs_error(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let total: f32 = a.iter().zip(b).map(|(p, q)| (p - q).abs()).sum();
    total / n as f32
}
