//! Standard keras-style `reset_after=True` GRU (§4.2).
//!
//! Gates are packed `[z, r, h]`. Per the weight table's convention the
//! candidate state multiplies the recurrent `h` projection by `z`, not `r` —
//! mathematically unusual, but the trained weights require it (§4.2 note).

use voc_core::GruWeights;
use voc_dsp::{activations, sgemv_accum};

#[inline]
fn sigmoid_scalar(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// A single-layer dense-recurrent GRU, holding its own hidden state between
/// calls.
pub struct Gru {
    weights: GruWeights,
    state: Vec<f32>,
}

impl Gru {
    pub fn new(weights: GruWeights) -> Self {
        let hidden = weights.hidden_size;
        Self {
            weights,
            state: vec![0.0; hidden],
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.weights.hidden_size
    }

    pub fn state(&self) -> &[f32] {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    /// `input` is the gate preactivation `input_weights * x + input_bias`,
    /// already computed by the caller (e.g. a [`crate::dense::Dense`] feature
    /// projection), packed `[z, r, h]`, length `3 * hidden_size`.
    pub fn step(&mut self, input: &[f32]) -> &[f32] {
        let h = self.hidden_size();
        debug_assert_eq!(input.len(), 3 * h);

        let mut recur = self.weights.recurrent_bias.clone();
        sgemv_accum(&mut recur, &self.weights.recurrent_weights, &self.state);

        let (iz, ir, ih) = (&input[0..h], &input[h..2 * h], &input[2 * h..3 * h]);
        let (rz, rr, rh) = (&recur[0..h], &recur[h..2 * h], &recur[2 * h..3 * h]);

        let mut z = vec![0.0; h];
        let mut r = vec![0.0; h];
        for i in 0..h {
            z[i] = sigmoid_scalar(iz[i] + rz[i]);
            r[i] = sigmoid_scalar(ir[i] + rr[i]);
        }

        let mut candidate = vec![0.0; h];
        for i in 0..h {
            candidate[i] = ih[i] + z[i] * rh[i];
        }
        activations::apply(self.weights.activation, &mut candidate);

        for i in 0..h {
            self.state[i] = r[i] * self.state[i] + (1.0 - r[i]) * candidate[i];
        }
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_core::{Activation, Matrix};

    fn zero_gru(hidden: usize) -> Gru {
        let rows = 3 * hidden;
        let w = Matrix::dense(vec![0.0; rows * hidden], rows, hidden).unwrap();
        Gru::new(GruWeights::new(w, vec![0.0; rows], Activation::Tanh, hidden).unwrap())
    }

    #[test]
    fn zero_weights_and_zero_input_hold_state_at_zero() {
        let mut gru = zero_gru(4);
        let input = vec![0.0; 12];
        let state = gru.step(&input);
        assert!(state.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn low_reset_gate_pulls_state_toward_candidate() {
        let mut gru = zero_gru(2);
        // z, r preactivations pushed very negative (sigmoid ~ 0), h preactivation at 1:
        // with r ~ 0, state <- r*old + (1-r)*candidate ~= candidate = tanh(1).
        let input = vec![-10.0, -10.0, -10.0, -10.0, 1.0, 1.0];
        let state = gru.step(&input);
        assert!(state[0] > 0.5 && state[1] > 0.5);
    }
}
