//! Dense / linear-dense layer (§4.2).

use voc_core::DenseWeights;
use voc_dsp::{activations, sgemv_accum};

/// A single fully-connected layer: `out = activation(bias + W * x)`.
pub struct Dense {
    weights: DenseWeights,
}

impl Dense {
    pub fn new(weights: DenseWeights) -> Self {
        Self { weights }
    }

    pub fn in_dim(&self) -> usize {
        self.weights.in_dim()
    }

    pub fn out_dim(&self) -> usize {
        self.weights.out_dim()
    }

    /// Write the activated projection of `x` into `out`.
    pub fn forward(&self, x: &[f32], out: &mut [f32]) {
        debug_assert_eq!(x.len(), self.in_dim());
        debug_assert_eq!(out.len(), self.out_dim());
        out.copy_from_slice(&self.weights.bias);
        sgemv_accum(out, &self.weights.weights, x);
        activations::apply(self.weights.activation, out);
    }

    /// Convenience allocating variant of [`Self::forward`].
    pub fn forward_alloc(&self, x: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; self.out_dim()];
        self.forward(x, &mut out);
        out
    }

    /// Project `x` into an existing preactivation buffer without applying
    /// the activation, for callers that fuse several projections (e.g. a
    /// GRU's gate preactivations) before activating.
    pub fn accumulate_preactivation(&self, x: &[f32], out: &mut [f32]) {
        debug_assert_eq!(x.len(), self.in_dim());
        debug_assert_eq!(out.len(), self.out_dim());
        out.copy_from_slice(&self.weights.bias);
        sgemv_accum(out, &self.weights.weights, x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_core::{Activation, Matrix};

    #[test]
    fn forward_applies_bias_weights_and_activation() {
        let w = Matrix::dense(vec![1.0, 0.0, 0.0, 1.0], 2, 2).unwrap();
        let dense = Dense::new(DenseWeights::new(w, vec![0.0, 0.0], Activation::Relu).unwrap());
        let mut out = [0.0; 2];
        dense.forward(&[1.0, -1.0], &mut out);
        assert_eq!(out, [1.0, 0.0]);
    }
}
