//! Causal 1-D convolution with a sliding memory buffer (§4.2 Conv1dLinear).

use voc_core::ConvWeights;
use voc_dsp::sgemv_accum;

/// Causal convolution: each call appends one new input vector to a sliding
/// memory of `kernel_size - 1` past inputs, projects the concatenation
/// through a flat weight matrix, and stores the tail back as the new memory
/// (no activation — §4.2 says so explicitly).
pub struct CausalConv1d {
    weights: ConvWeights,
    memory: Vec<f32>,
}

impl CausalConv1d {
    pub fn new(weights: ConvWeights) -> Self {
        let mem_len = weights.nb_inputs * (weights.kernel_size - 1);
        Self {
            weights,
            memory: vec![0.0; mem_len],
        }
    }

    pub fn nb_inputs(&self) -> usize {
        self.weights.nb_inputs
    }

    pub fn out_dim(&self) -> usize {
        self.weights.nb_neurons()
    }

    pub fn reset(&mut self) {
        self.memory.fill(0.0);
    }

    /// Fill the sliding memory with copies of `frame`, used once on the
    /// first frame a stream sees instead of the zero-fill default
    /// (§4.3 startup, §4.4 flush).
    pub fn prime_replicate(&mut self, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.nb_inputs());
        for chunk in self.memory.chunks_mut(self.nb_inputs()) {
            chunk.copy_from_slice(frame);
        }
    }

    pub fn forward(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), self.nb_inputs());
        debug_assert_eq!(out.len(), self.out_dim());

        let nb_inputs = self.nb_inputs();
        let kernel_size = self.weights.kernel_size;
        let mut concat = Vec::with_capacity(nb_inputs * kernel_size);
        concat.extend_from_slice(&self.memory);
        concat.extend_from_slice(input);

        out.copy_from_slice(&self.weights.bias);
        sgemv_accum(out, &self.weights.weights, &concat);

        self.memory.copy_from_slice(&concat[nb_inputs..]);
    }

    pub fn forward_alloc(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; self.out_dim()];
        self.forward(input, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_core::Matrix;

    fn make(kernel_size: usize, nb_inputs: usize) -> CausalConv1d {
        let rows = 1;
        let cols = nb_inputs * kernel_size;
        let data = vec![1.0; rows * cols];
        let w = Matrix::dense(data, rows, cols).unwrap();
        CausalConv1d::new(ConvWeights::new(w, vec![0.0], nb_inputs, kernel_size).unwrap())
    }

    #[test]
    fn zero_initial_memory_gives_zero_contribution_on_first_call() {
        let mut conv = make(3, 2);
        let mut out = [0.0; 1];
        conv.forward(&[1.0, 1.0], &mut out);
        // memory starts at zero: only the new input contributes
        assert_eq!(out[0], 2.0);
    }

    #[test]
    fn sliding_memory_accumulates_across_calls() {
        let mut conv = make(3, 2);
        let mut out = [0.0; 1];
        conv.forward(&[1.0, 1.0], &mut out);
        conv.forward(&[1.0, 1.0], &mut out);
        // now memory holds the first call's input too
        assert_eq!(out[0], 4.0);
    }

    #[test]
    fn replicate_priming_seeds_memory_with_first_frame() {
        let mut conv = make(3, 2);
        conv.prime_replicate(&[1.0, 1.0]);
        let mut out = [0.0; 1];
        conv.forward(&[1.0, 1.0], &mut out);
        assert_eq!(out[0], 6.0);
    }
}
