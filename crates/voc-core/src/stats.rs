//! Normalization statistics: `(mean[], std[], n_dim)`, applied as an affine
//! transform at the feature boundary.

use crate::error::{VocError, VocResult};

/// A `(mean, std)` pair per feature dimension. `std[i] > 0` is an invariant
/// checked once at construction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NormStats {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl NormStats {
    /// Build stats from explicit mean/std vectors, validating the
    /// `std[i] > 0` invariant.
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> VocResult<Self> {
        if mean.len() != std.len() {
            return Err(VocError::StatsDimMismatch {
                expected: mean.len(),
                got: std.len(),
            });
        }
        for (i, &s) in std.iter().enumerate() {
            if !(s > 0.0) {
                return Err(VocError::NonPositiveStd { index: i, value: s });
            }
        }
        Ok(Self { mean, std })
    }

    /// Identity stats (mean 0, std 1) of the given dimension, used as a
    /// sensible placeholder when no trained stats are available.
    pub fn identity(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            std: vec![1.0; dim],
        }
    }

    #[inline]
    pub fn n_dim(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    #[inline]
    pub fn std(&self) -> &[f32] {
        &self.std
    }

    /// `out[i] = (x[i] - mean[i]) / std[i]`.
    pub fn normalize(&self, x: &[f32], out: &mut [f32]) {
        for i in 0..self.mean.len() {
            out[i] = (x[i] - self.mean[i]) / self.std[i];
        }
    }

    /// `out[i] = x[i] * std[i] + mean[i]`.
    pub fn denormalize(&self, x: &[f32], out: &mut [f32]) {
        for i in 0..self.mean.len() {
            out[i] = x[i] * self.std[i] + self.mean[i];
        }
    }

    /// In-place variant of [`Self::normalize`].
    pub fn normalize_in_place(&self, x: &mut [f32]) {
        for i in 0..self.mean.len() {
            x[i] = (x[i] - self.mean[i]) / self.std[i];
        }
    }

    /// In-place variant of [`Self::denormalize`].
    pub fn denormalize_in_place(&self, x: &mut [f32]) {
        for i in 0..self.mean.len() {
            x[i] = x[i] * self.std[i] + self.mean[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let stats = NormStats::new(vec![1.0, -2.0], vec![2.0, 0.5]).unwrap();
        let x = [3.0, -1.5];
        let mut n = [0.0; 2];
        stats.normalize(&x, &mut n);
        let mut back = [0.0; 2];
        stats.denormalize(&n, &mut back);
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_non_positive_std() {
        assert!(NormStats::new(vec![0.0], vec![0.0]).is_err());
    }
}
