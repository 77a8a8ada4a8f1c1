//! Block-sparse frame-GRU (§4.2).
//!
//! Recurrent accumulation is `bias + diagonal .* state + block_sparse(W, state)`:
//! an explicit per-gate diagonal term plus a 16-row-block-sparse mat-vec over
//! only the present blocks, rather than a dense `hidden x hidden` matrix.

use voc_core::SparseGruWeights;
use voc_dsp::{activations, sgemv_accum_sparse_gate};

#[inline]
fn sigmoid_scalar(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub struct SparseFrameGru {
    weights: SparseGruWeights,
    state: Vec<f32>,
    /// Row offset of each gate's present blocks inside the concatenated
    /// recurrent matrix: `gate_offsets[g]..gate_offsets[g+1]`.
    gate_offsets: [usize; 4],
}

impl SparseFrameGru {
    pub fn new(weights: SparseGruWeights) -> Self {
        let hidden = weights.hidden_size;
        let mut offsets = [0usize; 4];
        for g in 0..3 {
            offsets[g + 1] = offsets[g] + weights.block_indices[g].len() * 16;
        }
        Self {
            state: vec![0.0; hidden],
            weights,
            gate_offsets: offsets,
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

    /// `input` is the gate preactivation computed by the caller's input
    /// projection, packed `[z, r, h]`, length `3 * hidden_size`.
    pub fn step(&mut self, input: &[f32]) -> &[f32] {
        let h = self.hidden_size();
        debug_assert_eq!(input.len(), 3 * h);

        let mut recur = self.weights.recurrent_bias.clone();
        for i in 0..3 * h {
            recur[i] += self.weights.diagonal[i] * self.state[i % h];
        }
        for gate in 0..3 {
            let row_start = self.gate_offsets[gate];
            let blocks = &self.weights.block_indices[gate];
            let out_gate = &mut recur[gate * h..(gate + 1) * h];
            sgemv_accum_sparse_gate(
                out_gate,
                &self.weights.recurrent_weights,
                &self.state,
                blocks,
                row_start,
                h,
            );
        }

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

    fn empty_sparse_gru(hidden: usize) -> SparseFrameGru {
        // No present blocks at all: recurrent contribution is diagonal-only.
        let w = Matrix::dense(vec![], 0, hidden).unwrap();
        let weights = SparseGruWeights::new(
            w,
            vec![0.0; 3 * hidden],
            vec![0.0; 3 * hidden],
            vec![vec![], vec![], vec![]],
            Activation::Tanh,
            hidden,
        )
        .unwrap();
        SparseFrameGru::new(weights)
    }

    #[test]
    fn diagonal_only_gru_holds_zero_state_on_zero_input() {
        let mut gru = empty_sparse_gru(16);
        let input = vec![0.0; 48];
        let state = gru.step(&input);
        assert!(state.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn diagonal_only_gru_moves_state_toward_candidate_with_open_gates() {
        let mut gru = empty_sparse_gru(16);
        let mut input = vec![0.0; 48];
        for i in 0..16 {
            input[i] = -10.0; // z preact
            input[16 + i] = -10.0; // r preact
            input[32 + i] = 1.0; // h preact
        }
        let state = gru.step(&input);
        assert!(state.iter().all(|&v| v > 0.5));
    }
}
