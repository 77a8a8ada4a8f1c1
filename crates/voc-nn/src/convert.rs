//! CycleVAE feature-conversion subgraph (§4.3).
//!
//! Per frame: two encoders (mel-spec, excitation) feed a speaker encoder,
//! whose time-varying code conditions an excitation decoder and a mel-spec
//! decoder, whose concatenated output is refined once more by a post-net
//! that emits a Laplace residual correction. `melsp_in` is expected already
//! normalized by the converter's `melsp_stats` — normalization is the
//! caller's job since the same stats are also used to denormalize the final
//! converted mel-spec before it is handed to the waveform generator.

use rand_chacha::ChaCha8Rng;

use voc_core::constants::{CAP_DIM, FEATURE_VC_CONV_DELAY};
use voc_core::ConverterWeights;
use voc_dsp::activations;

use crate::conv1d::CausalConv1d;
use crate::dense::Dense;
use crate::sparse_gru::SparseFrameGru;

/// One frame's worth of converted acoustic features.
#[derive(Debug, Clone)]
pub struct ConvertedFrame {
    pub uvf0: f32,
    pub f0: f32,
    pub uvcap: f32,
    pub cap: [f32; CAP_DIM],
    /// Still in the converter's normalized mel-spec domain; the caller
    /// denormalizes with the same `melsp_stats` used on the way in.
    pub melsp_cv: Vec<f32>,
}

pub struct ConverterNet {
    enc_melsp_conv: CausalConv1d,
    enc_excit_conv: CausalConv1d,
    enc_melsp_gru: SparseFrameGru,
    enc_excit_gru: SparseFrameGru,
    enc_melsp_dense: Dense,
    enc_excit_dense: Dense,
    spk_gru: SparseFrameGru,
    spk_dense: Dense,
    dec_excit_conv: CausalConv1d,
    dec_excit_gru: SparseFrameGru,
    dec_excit_dense: Dense,
    dec_melsp_conv: CausalConv1d,
    dec_melsp_gru: SparseFrameGru,
    dec_melsp_dense: Dense,
    post_conv: CausalConv1d,
    post_gru: SparseFrameGru,
    post_dense: Dense,
    frame_count: u64,
}

impl ConverterNet {
    pub fn new(weights: ConverterWeights) -> Self {
        Self {
            enc_melsp_conv: CausalConv1d::new(weights.enc_melsp_conv),
            enc_excit_conv: CausalConv1d::new(weights.enc_excit_conv),
            enc_melsp_gru: SparseFrameGru::new(weights.enc_melsp_gru),
            enc_excit_gru: SparseFrameGru::new(weights.enc_excit_gru),
            enc_melsp_dense: Dense::new(weights.enc_melsp_dense),
            enc_excit_dense: Dense::new(weights.enc_excit_dense),
            spk_gru: SparseFrameGru::new(weights.spk_gru),
            spk_dense: Dense::new(weights.spk_dense),
            dec_excit_conv: CausalConv1d::new(weights.dec_excit_conv),
            dec_excit_gru: SparseFrameGru::new(weights.dec_excit_gru),
            dec_excit_dense: Dense::new(weights.dec_excit_dense),
            dec_melsp_conv: CausalConv1d::new(weights.dec_melsp_conv),
            dec_melsp_gru: SparseFrameGru::new(weights.dec_melsp_gru),
            dec_melsp_dense: Dense::new(weights.dec_melsp_dense),
            post_conv: CausalConv1d::new(weights.post_conv),
            post_gru: SparseFrameGru::new(weights.post_gru),
            post_dense: Dense::new(weights.post_dense),
            frame_count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.enc_melsp_conv.reset();
        self.enc_excit_conv.reset();
        self.enc_melsp_gru.reset();
        self.enc_excit_gru.reset();
        self.spk_gru.reset();
        self.dec_excit_conv.reset();
        self.dec_excit_gru.reset();
        self.dec_melsp_conv.reset();
        self.dec_melsp_gru.reset();
        self.post_conv.reset();
        self.post_gru.reset();
        self.frame_count = 0;
    }

    /// Run one frame through the full subgraph. `melsp_in` must already be
    /// normalized; `spk_code` is the target speaker's one-hot-or-soft code.
    ///
    /// Returns `None` for the first `FEATURE_VC_CONV_DELAY` calls (conv
    /// memories still warming up) — nothing should be fed downstream yet,
    /// even though every layer's state has already advanced.
    pub fn forward(
        &mut self,
        melsp_in: &[f32],
        spk_code: &[f32],
        uvf0_stats: &voc_core::NormStats,
        uvcap_stats: &voc_core::NormStats,
        rng: &mut ChaCha8Rng,
    ) -> Option<ConvertedFrame> {
        // 1-2: parallel encoders.
        if self.frame_count == 0 {
            self.enc_melsp_conv.prime_replicate(melsp_in);
            self.enc_excit_conv.prime_replicate(melsp_in);
        }
        let enc_melsp_in = self.enc_melsp_conv.forward_alloc(melsp_in);
        let enc_excit_in = self.enc_excit_conv.forward_alloc(melsp_in);
        let melsp_state = self.enc_melsp_gru.step(&enc_melsp_in).to_vec();
        let excit_state = self.enc_excit_gru.step(&enc_excit_in).to_vec();
        let lat_melsp = self.enc_melsp_dense.forward_alloc(&melsp_state);
        let lat_excit = self.enc_excit_dense.forward_alloc(&excit_state);

        // 3: speaker encoder.
        let spk_input: Vec<f32> = spk_code
            .iter()
            .chain(lat_excit.iter())
            .chain(lat_melsp.iter())
            .copied()
            .collect();
        let spk_state = self.spk_gru.step(&spk_input).to_vec();
        let time_varying_spk_code = self.spk_dense.forward_alloc(&spk_state);
        let spk_code_aux: Vec<f32> = spk_code
            .iter()
            .chain(time_varying_spk_code.iter())
            .copied()
            .collect();

        // 4: excitation decoder.
        let dec_excit_input: Vec<f32> =
            spk_code_aux.iter().chain(lat_excit.iter()).copied().collect();
        if self.frame_count == 0 {
            self.dec_excit_conv.prime_replicate(&dec_excit_input);
        }
        let dec_excit_conv_out = self.dec_excit_conv.forward_alloc(&dec_excit_input);
        let excit_state = self.dec_excit_gru.step(&dec_excit_conv_out).to_vec();
        let mut excit_raw = self.dec_excit_dense.forward_alloc(&excit_state);
        debug_assert_eq!(excit_raw.len(), 3 + CAP_DIM);

        activations::sigmoid(&mut excit_raw[0..1]);
        uvf0_stats.normalize_in_place(&mut excit_raw[0..1]);
        let uvf0 = excit_raw[0];
        activations::tanh_shrink(&mut excit_raw[1..2]);
        let f0 = excit_raw[1];
        activations::sigmoid(&mut excit_raw[2..3]);
        uvcap_stats.normalize_in_place(&mut excit_raw[2..3]);
        let uvcap = excit_raw[2];
        activations::tanh_shrink(&mut excit_raw[3..3 + CAP_DIM]);
        let mut cap = [0.0f32; CAP_DIM];
        cap.copy_from_slice(&excit_raw[3..3 + CAP_DIM]);

        // 5: mel-spec decoder.
        let dec_melsp_input: Vec<f32> = spk_code_aux
            .iter()
            .chain([uvf0, f0].iter())
            .chain(lat_excit.iter())
            .chain(lat_melsp.iter())
            .copied()
            .collect();
        if self.frame_count == 0 {
            self.dec_melsp_conv.prime_replicate(&dec_melsp_input);
        }
        let dec_melsp_conv_out = self.dec_melsp_conv.forward_alloc(&dec_melsp_input);
        let melsp_dec_state = self.dec_melsp_gru.step(&dec_melsp_conv_out).to_vec();
        let mut melsp_cv = self.dec_melsp_dense.forward_alloc(&melsp_dec_state);

        // 6: post-net Laplace-residual correction.
        let post_input: Vec<f32> = spk_code_aux
            .iter()
            .chain([uvf0, f0, uvcap].iter())
            .chain(cap.iter())
            .chain(melsp_cv.iter())
            .copied()
            .collect();
        if self.frame_count == 0 {
            self.post_conv.prime_replicate(&post_input);
        }
        let post_conv_out = self.post_conv.forward_alloc(&post_input);
        let post_state = self.post_gru.step(&post_conv_out).to_vec();
        let mut loc_scale = self.post_dense.forward_alloc(&post_state);
        let melsp_dim = melsp_cv.len();
        debug_assert_eq!(loc_scale.len(), 2 * melsp_dim);
        activations::tanh_shrink(&mut loc_scale[0..melsp_dim]);
        activations::sigmoid(&mut loc_scale[melsp_dim..2 * melsp_dim]);
        let (loc, scale) = loc_scale.split_at(melsp_dim);
        let mut residual = loc.to_vec();
        voc_dsp::sample_laplace_residual(&mut residual, scale, rng);
        for (m, r) in melsp_cv.iter_mut().zip(residual.iter()) {
            *m += r;
        }

        let was_warmup = self.frame_count < FEATURE_VC_CONV_DELAY as u64;
        self.frame_count += 1;
        if was_warmup {
            return None;
        }

        Some(ConvertedFrame {
            uvf0,
            f0,
            uvcap,
            cap,
            melsp_cv,
        })
    }
}
