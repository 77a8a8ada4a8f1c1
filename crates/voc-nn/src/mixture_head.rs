//! Dual-FC mixture head with data-driven linear prediction (§4.2
//! DualFCMwdlp10).
//!
//! Each channel's dense projection is split per band into three segments —
//! `DLPC_ORDER` sign values, `DLPC_ORDER` magnitude values, `MID_OUT`
//! mid-logit values — activated (tanh / sigmoid / tanh respectively) and
//! fused across channels by the weight table's learned per-band factors. The
//! fused mid-logits go through a final shared FC to produce per-band
//! quantization logits; the fused sign/magnitude values correct those logits
//! using a short history of previously sampled codes (the "data-driven
//! linear prediction" step).

use voc_core::constants::{DLPC_ORDER, MID_OUT, SQRT_QUANTIZE};
use voc_core::DualFcWeights;
use voc_dsp::{activations, dual_fc_combine, fc_logits_fused, sgemv_accum};

#[derive(Clone, Copy)]
struct HistorySlot {
    code: usize,
    logit: f32,
}

/// Produces per-band quantization logits from a shared hidden vector, using
/// a rolling per-band history of `DLPC_ORDER` prior (code, logit) pairs.
pub struct DualFcMixtureHead {
    weights: DualFcWeights,
    history: Vec<Vec<HistorySlot>>,
}

impl DualFcMixtureHead {
    pub fn new(weights: DualFcWeights) -> Self {
        let bands = weights.bands;
        let history = (0..bands)
            .map(|_| vec![HistorySlot { code: 0, logit: 0.0 }; DLPC_ORDER])
            .collect();
        Self { weights, history }
    }

    pub fn bands(&self) -> usize {
        self.weights.bands
    }

    pub fn reset(&mut self) {
        for ring in &mut self.history {
            for slot in ring.iter_mut() {
                *slot = HistorySlot { code: 0, logit: 0.0 };
            }
        }
    }

    fn block_size(&self) -> usize {
        2 * DLPC_ORDER + MID_OUT
    }

    fn project_channel(weights: &voc_core::DenseWeights, hidden: &[f32]) -> Vec<f32> {
        let mut out = weights.bias.clone();
        sgemv_accum(&mut out, &weights.weights, hidden);
        out
    }

    /// Activate a channel's raw per-band segments in place: sign (tanh),
    /// magnitude (sigmoid), mid-logits (tanh).
    fn activate_segments(raw: &mut [f32], bands: usize, block: usize) {
        for b in 0..bands {
            let base = b * block;
            activations::tanh(&mut raw[base..base + DLPC_ORDER]);
            activations::sigmoid(&mut raw[base + DLPC_ORDER..base + 2 * DLPC_ORDER]);
            activations::tanh(&mut raw[base + 2 * DLPC_ORDER..base + block]);
        }
    }

    /// Compute this step's `bands * SQRT_QUANTIZE` logits, folding in the
    /// data-driven linear-prediction correction from history recorded by
    /// prior [`Self::record`] calls. Does not mutate history itself.
    pub fn compute_logits(&self, hidden: &[f32]) -> Vec<f32> {
        let bands = self.bands();
        let block = self.block_size();

        let mut c1 = Self::project_channel(&self.weights.channel1, hidden);
        let mut c2 = Self::project_channel(&self.weights.channel2, hidden);
        Self::activate_segments(&mut c1, bands, block);
        Self::activate_segments(&mut c2, bands, block);

        let mut fused = vec![0.0; bands * block];
        dual_fc_combine(&mut fused, &self.weights.fusion1, &c1, &self.weights.fusion2, &c2);

        let mut mids = vec![0.0; bands * MID_OUT];
        for b in 0..bands {
            let base = b * block + 2 * DLPC_ORDER;
            mids[b * MID_OUT..(b + 1) * MID_OUT].copy_from_slice(&fused[base..base + MID_OUT]);
        }

        let mut logits = vec![0.0; bands * SQRT_QUANTIZE];
        fc_logits_fused(
            &mut logits,
            &self.weights.logits_fc.weights,
            &self.weights.logits_fc.bias,
            &mids,
            bands,
            MID_OUT,
            SQRT_QUANTIZE,
        );
        activations::apply(self.weights.logits_fc.activation, &mut logits);

        for b in 0..bands {
            let base = b * block;
            for (k, slot) in self.history[b].iter().enumerate() {
                let sign = fused[base + k];
                let magnitude = fused[base + DLPC_ORDER + k];
                logits[b * SQRT_QUANTIZE + slot.code] += sign * magnitude * slot.logit;
            }
        }

        logits
    }

    /// Record the code actually sampled for `band` this step, along with its
    /// logit value, so the next [`Self::compute_logits`] call can use it for
    /// linear prediction.
    pub fn record(&mut self, band: usize, code: usize, logits: &[f32]) {
        let logit = logits[band * SQRT_QUANTIZE + code];
        let ring = &mut self.history[band];
        ring.rotate_left(1);
        let last = ring.len() - 1;
        ring[last] = HistorySlot { code, logit };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_core::{Activation, DenseWeights, Matrix};

    fn make_head(bands: usize, hidden: usize) -> DualFcMixtureHead {
        let block = 2 * DLPC_ORDER + MID_OUT;
        let out_per_channel = bands * block;
        let channel1 = DenseWeights::new(
            Matrix::dense(vec![0.0; out_per_channel * hidden], out_per_channel, hidden).unwrap(),
            vec![0.0; out_per_channel],
            Activation::Linear,
        )
        .unwrap();
        let channel2 = channel1.clone();
        let logits_fc = DenseWeights::new(
            Matrix::dense(vec![0.0; SQRT_QUANTIZE * MID_OUT], SQRT_QUANTIZE, MID_OUT).unwrap(),
            vec![0.0; SQRT_QUANTIZE],
            Activation::Linear,
        )
        .unwrap();
        let weights = DualFcWeights {
            channel1,
            channel2,
            fusion1: vec![0.5; out_per_channel],
            fusion2: vec![0.5; out_per_channel],
            logits_fc,
            bands,
        };
        DualFcMixtureHead::new(weights)
    }

    #[test]
    fn zero_weights_give_zero_logits_before_any_history() {
        let head = make_head(2, 4);
        let logits = head.compute_logits(&vec![1.0; 4]);
        assert_eq!(logits.len(), 2 * SQRT_QUANTIZE);
        assert!(logits.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn record_then_recompute_changes_logits_only_via_correction() {
        let mut head = make_head(1, 4);
        let logits_before = head.compute_logits(&vec![0.0; 4]);
        head.record(0, 3, &logits_before);
        // all-zero weights => fused sign/magnitude are tanh(0)=0 / sigmoid(0)=0.5,
        // so the correction term is 0 regardless of the recorded logit.
        let logits_after = head.compute_logits(&vec![0.0; 4]);
        assert_eq!(logits_before, logits_after);
    }
}
