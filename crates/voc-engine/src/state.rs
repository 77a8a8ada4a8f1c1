//! Per-stream vocoder state (§4.4, §5).
//!
//! Every buffer here is sized once from compile-time model constants and
//! owned exclusively by this object — two streams never share mutable
//! state, which is what makes the state-isolation and determinism
//! properties (§8) hold by construction rather than by convention.

use rand_chacha::ChaCha8Rng;

use voc_core::constants::{
    FEATURES_DIM, FEATURE_CONV_DELAY, INIT_LAST_SAMPLE, N_BANDS, N_SAMPLE_BANDS, PQMF_DELAY,
    RNN_MAIN_NEURONS, SQRT_QUANTIZE,
};
use voc_core::{NormStats, VocoderConfig, VocoderWeights};
use voc_nn::{CausalConv1d, Dense, DualFcMixtureHead, Embedding, Gru, SparseFrameGru};

/// Owns every layer object and all mutable per-stream state the waveform
/// generator touches.
pub struct VocoderState {
    input_conv: CausalConv1d,
    input_dense: Dense,
    gru_a_dense_feature: Dense,
    gru_b_dense_feature: Dense,
    gru_c_dense_feature: Dense,
    gru_a: SparseFrameGru,
    gru_b: Gru,
    gru_c: Gru,
    gru_b_dense_state: Dense,
    gru_c_dense_state: Dense,
    embed_coarse: voc_core::EmbeddingTable,
    embed_fine: voc_core::EmbeddingTable,
    embed_coarse_for_fine: voc_core::EmbeddingTable,
    coarse_head: DualFcMixtureHead,
    fine_head: DualFcMixtureHead,
    feature_norm: NormStats,
    pqmf: voc_dsp::PqmfSynthesizer,
    deemph: voc_dsp::Deemphasis,
    mu_law_table: Vec<f32>,

    last_coarse: Vec<usize>,
    last_fine: Vec<usize>,
    pub(crate) frame_count: u64,
    pub(crate) sample_count: u64,
    first_flag: bool,
    pub(crate) last_feature: Vec<f32>,
    rng: ChaCha8Rng,
    dlpc: bool,
}

impl VocoderState {
    pub fn new(weights: &VocoderWeights, config: &VocoderConfig) -> Self {
        Self {
            input_conv: CausalConv1d::new(weights.input_conv.clone()),
            input_dense: Dense::new(weights.input_dense.clone()),
            gru_a_dense_feature: Dense::new(weights.gru_a_dense_feature.clone()),
            gru_b_dense_feature: Dense::new(weights.gru_b_dense_feature.clone()),
            gru_c_dense_feature: Dense::new(weights.gru_c_dense_feature.clone()),
            gru_a: SparseFrameGru::new(weights.gru_a.clone()),
            gru_b: Gru::new(weights.gru_b.clone()),
            gru_c: Gru::new(weights.gru_c.clone()),
            gru_b_dense_state: Dense::new(weights.gru_b_dense_state.clone()),
            gru_c_dense_state: Dense::new(weights.gru_c_dense_state.clone()),
            embed_coarse: weights.embed_coarse.clone(),
            embed_fine: weights.embed_fine.clone(),
            embed_coarse_for_fine: weights.embed_coarse_for_fine.clone(),
            coarse_head: DualFcMixtureHead::new(weights.coarse_head.clone()),
            fine_head: DualFcMixtureHead::new(weights.fine_head.clone()),
            feature_norm: weights.feature_norm.clone(),
            pqmf: voc_dsp::PqmfSynthesizer::new(weights.pqmf_synth_filter.clone()),
            deemph: voc_dsp::Deemphasis::new(),
            mu_law_table: voc_dsp::build_mu_law_table(),
            last_coarse: vec![INIT_LAST_SAMPLE / SQRT_QUANTIZE; N_BANDS],
            last_fine: vec![INIT_LAST_SAMPLE % SQRT_QUANTIZE; N_BANDS],
            frame_count: 0,
            sample_count: 0,
            first_flag: false,
            last_feature: vec![0.0; FEATURES_DIM],
            rng: voc_dsp::rng_from_seed(config.seed),
            dlpc: config.dlpc,
        }
    }

    /// Process one `FEATURES_DIM`-wide raw (un-normalized) feature frame,
    /// writing emitted PCM into `pcm_out` and returning the count written.
    ///
    /// Always advances the input conv's sliding memory, even during warm-up,
    /// so the window is correct by the time the delay is met.
    pub(crate) fn process_frame(&mut self, raw_feature: &[f32], pcm_out: &mut [i16]) -> usize {
        let mut normalized = raw_feature.to_vec();
        self.feature_norm.normalize_in_place(&mut normalized);

        if self.frame_count == 0 {
            self.input_conv.prime_replicate(&normalized);
        }
        let conv_out = self.input_conv.forward_alloc(&normalized);

        self.last_feature.copy_from_slice(raw_feature);
        let was_warmup = self.frame_count < FEATURE_CONV_DELAY as u64;
        self.frame_count += 1;
        if was_warmup {
            log::trace!(
                "vocoder warm-up frame {}/{}",
                self.frame_count,
                FEATURE_CONV_DELAY
            );
            return 0;
        }
        if self.frame_count == FEATURE_CONV_DELAY as u64 + 1 {
            log::debug!("vocoder conv warm-up complete, entering steady state");
        }

        let shared = self.input_dense.forward_alloc(&conv_out);
        let gru_a_cond = self.gru_a_dense_feature.forward_alloc(&shared);
        let gru_b_cond = self.gru_b_dense_feature.forward_alloc(&shared);
        let gru_c_cond = self.gru_c_dense_feature.forward_alloc(&shared);

        let mut n = 0;
        for _ in 0..N_SAMPLE_BANDS {
            let pcm_band = self.run_sample_step(&gru_a_cond, &gru_b_cond, &gru_c_cond);
            n += self.emit_sample_step(pcm_band, &mut pcm_out[n..]);
        }
        n
    }

    /// One coarse+fine sampling pass, producing one dequantized sub-band
    /// sample per band (§4.4 "Per sample-step").
    fn run_sample_step(
        &mut self,
        gru_a_condition: &[f32],
        gru_b_condition: &[f32],
        gru_c_condition: &[f32],
    ) -> [f32; N_BANDS] {
        let mut gru_a_input = gru_a_condition.to_vec();
        for band in 0..N_BANDS {
            Embedding::new(&self.embed_coarse).accumulate(band, self.last_coarse[band], &mut gru_a_input);
            Embedding::new(&self.embed_fine).accumulate(band, self.last_fine[band], &mut gru_a_input);
        }
        let state_a = self.gru_a.step(&gru_a_input).to_vec();

        let mut gru_b_input = gru_b_condition.to_vec();
        self.gru_b_dense_state.accumulate_preactivation(&state_a, &mut gru_b_input);
        let state_b = self.gru_b.step(&gru_b_input).to_vec();

        let coarse_logits = self.coarse_head.compute_logits(&state_b);
        let mut coarse = [0usize; N_BANDS];
        for band in 0..N_BANDS {
            let mut band_logits = coarse_logits[band * SQRT_QUANTIZE..(band + 1) * SQRT_QUANTIZE].to_vec();
            coarse[band] = voc_dsp::sample_from_pdf_mwdlp(&mut band_logits, &mut self.rng);
        }
        if self.dlpc {
            for band in 0..N_BANDS {
                self.coarse_head.record(band, coarse[band], &coarse_logits);
            }
        }

        let mut gru_c_input = gru_c_condition.to_vec();
        for band in 0..N_BANDS {
            Embedding::new(&self.embed_coarse_for_fine).accumulate(band, coarse[band], &mut gru_c_input);
        }
        self.gru_c_dense_state.accumulate_preactivation(&state_b, &mut gru_c_input);
        let state_c = self.gru_c.step(&gru_c_input).to_vec();

        let fine_logits = self.fine_head.compute_logits(&state_c);
        let mut fine = [0usize; N_BANDS];
        for band in 0..N_BANDS {
            let mut band_logits = fine_logits[band * SQRT_QUANTIZE..(band + 1) * SQRT_QUANTIZE].to_vec();
            fine[band] = voc_dsp::sample_from_pdf_mwdlp(&mut band_logits, &mut self.rng);
        }
        if self.dlpc {
            for band in 0..N_BANDS {
                self.fine_head.record(band, fine[band], &fine_logits);
            }
        }

        let mut pcm = [0.0f32; N_BANDS];
        for band in 0..N_BANDS {
            let idx = coarse[band] * SQRT_QUANTIZE + fine[band];
            pcm[band] = self.mu_law_table[idx] * N_BANDS as f32;
            self.last_coarse[band] = coarse[band];
            self.last_fine[band] = fine[band];
        }
        pcm
    }

    /// Push this sample-step's sub-band values through the PQMF ring and
    /// gate waveform emission on the phase (§4.4 "waveform emission").
    fn emit_sample_step(&mut self, pcm_band: [f32; N_BANDS], pcm_out: &mut [i16]) -> usize {
        let ring_outputs = self.pqmf.step(&pcm_band);
        self.sample_count += N_BANDS as u64;
        log::trace!("sample_count = {}", self.sample_count);

        if self.sample_count < PQMF_DELAY as u64 {
            return 0;
        }

        let mut n = 0;
        if !self.first_flag {
            log::debug!("PQMF delay crossed at sample_count = {}, starting emission", self.sample_count);
            for r in self.pqmf.synth_zero_pad_left(voc_core::constants::FIRST_N_OUTPUT) {
                pcm_out[n] = voc_dsp::scale_to_i16(self.deemph.apply(r));
                n += 1;
            }
            self.first_flag = true;
        }
        for r in ring_outputs {
            pcm_out[n] = voc_dsp::scale_to_i16(self.deemph.apply(r));
            n += 1;
        }
        n
    }

    /// Final drain: replicate the last seen feature for `FEATURE_CONV_DELAY`
    /// more calls, then synthesize the trailing `PQMF_DELAY` zero-pad-right
    /// burst (§4.4 flush phase).
    pub(crate) fn flush(&mut self, pcm_out: &mut [i16]) -> usize {
        if self.sample_count < PQMF_DELAY as u64 {
            log::warn!(
                "flush called before PQMF delay was crossed (sample_count = {}); emitting nothing",
                self.sample_count
            );
            return 0;
        }
        log::debug!("flushing: {} replay frames + PQMF tail", FEATURE_CONV_DELAY);
        let last_feature = self.last_feature.clone();
        let mut n = 0;
        for _ in 0..FEATURE_CONV_DELAY {
            n += self.process_frame(&last_feature, &mut pcm_out[n..]);
        }
        for r in self.pqmf.synth_zero_pad_right(PQMF_DELAY) {
            pcm_out[n] = voc_dsp::scale_to_i16(self.deemph.apply(r));
            n += 1;
        }
        n
    }

    pub fn hidden_width(&self) -> usize {
        RNN_MAIN_NEURONS
    }
}
