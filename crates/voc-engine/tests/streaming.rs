//! End-to-end streaming properties (§8), checked against a randomly
//! initialized but structurally valid weight table (no trained weights ship
//! with this crate).

use std::sync::Arc;

use voc_core::constants::{
    FEATURES_DIM, FEATURE_CONV_DELAY, FEATURE_VC_CONV_DELAY, N_BANDS, N_SAMPLE_BANDS, N_SPK, PQMF_DELAY,
};
use voc_core::{ConverterConfig, VocoderConfig, WeightTable};
use voc_engine::{ConversionEngine, VocoderEngine};

const BUF: usize = 4096;

fn engine(seed: u64) -> (VocoderEngine, WeightTable) {
    let table = WeightTable::random_for_testing(seed).unwrap();
    let engine = VocoderEngine::new(Arc::new(table.clone()), VocoderConfig { seed, ..Default::default() }).unwrap();
    (engine, table)
}

fn feed_silent_frames(engine: &mut VocoderEngine, n: usize) -> usize {
    let feature = vec![0.0f32; FEATURES_DIM];
    let mut buf = vec![0i16; BUF];
    let mut total = 0;
    for _ in 0..n {
        total += engine.synthesize(&feature, &mut buf, false);
    }
    total
}

/// Non-warmup frames needed before the PQMF delay is first crossed.
/// `sample_count` advances by `N_BANDS` per sample-step, so a full frame
/// advances it by `N_SAMPLE_BANDS * N_BANDS`.
fn frames_to_first_emission() -> usize {
    (PQMF_DELAY + (N_SAMPLE_BANDS * N_BANDS) - 1) / (N_SAMPLE_BANDS * N_BANDS)
}

#[test]
fn warmup_frames_produce_no_output() {
    let (mut engine, _) = engine(1);
    // FEATURE_CONV_DELAY warmup frames plus every non-warmup frame before
    // the PQMF delay is crossed.
    let silent = FEATURE_CONV_DELAY + frames_to_first_emission() - 1;
    let total = feed_silent_frames(&mut engine, silent);
    assert_eq!(total, 0);
}

#[test]
fn first_crossing_frame_emits_fewer_than_a_full_frame_and_then_steady_state_is_full() {
    let (mut engine, _) = engine(2);
    let silent = FEATURE_CONV_DELAY + frames_to_first_emission() - 1;
    feed_silent_frames(&mut engine, silent);

    let feature = vec![0.0f32; FEATURES_DIM];
    let mut buf = vec![0i16; BUF];

    let first = engine.synthesize(&feature, &mut buf, false);
    assert!(first > 0);
    assert!(first <= N_SAMPLE_BANDS * N_BANDS);

    let steady = engine.synthesize(&feature, &mut buf, false);
    assert_eq!(steady, N_SAMPLE_BANDS * N_BANDS);
}

#[test]
fn flush_appends_a_pqmf_delay_tail_after_the_final_frame() {
    let (mut engine, _) = engine(3);
    let silent = FEATURE_CONV_DELAY + frames_to_first_emission();
    feed_silent_frames(&mut engine, silent);

    let feature = vec![0.0f32; FEATURES_DIM];
    let mut buf = vec![0i16; BUF];
    let without_flush = engine.synthesize(&feature, &mut buf, false);

    let mut buf2 = vec![0i16; BUF];
    let with_flush = engine.synthesize(&feature, &mut buf2, true);
    assert!(with_flush > without_flush);

    let flush_only = with_flush - without_flush;
    // FEATURE_CONV_DELAY replicated frames at full steady-state width, plus
    // the final zero-pad-right burst.
    assert_eq!(flush_only, FEATURE_CONV_DELAY * N_SAMPLE_BANDS * N_BANDS + PQMF_DELAY);
}

#[test]
fn determinism_same_seed_same_pcm() {
    let feature: Vec<f32> = (0..FEATURES_DIM).map(|i| (i as f32) * 0.001).collect();
    let n_frames = FEATURE_CONV_DELAY + frames_to_first_emission() + 3;

    let run = |seed: u64| {
        let (mut engine, _) = engine(seed);
        let mut out = Vec::new();
        let mut buf = vec![0i16; BUF];
        for i in 0..n_frames {
            let last = i + 1 == n_frames;
            let n = engine.synthesize(&feature, &mut buf, last);
            out.extend_from_slice(&buf[..n]);
        }
        out
    };

    assert_eq!(run(42), run(42));
}

#[test]
fn different_streams_do_not_share_state() {
    let feature: Vec<f32> = (0..FEATURES_DIM).map(|i| (i as f32) * 0.002).collect();
    let n_frames = FEATURE_CONV_DELAY + frames_to_first_emission() + 2;

    // Reference: one engine run alone, start to finish.
    let (mut solo, _) = engine(7);
    let mut solo_out = Vec::new();
    let mut buf = vec![0i16; BUF];
    for i in 0..n_frames {
        let n = solo.synthesize(&feature, &mut buf, i + 1 == n_frames);
        solo_out.extend_from_slice(&buf[..n]);
    }

    // Two engines interleaved should each reproduce the solo trace exactly.
    let (mut a, _) = engine(7);
    let (mut b, _) = engine(99);
    let mut a_out = Vec::new();
    let mut buf_a = vec![0i16; BUF];
    let mut buf_b = vec![0i16; BUF];
    for i in 0..n_frames {
        let last = i + 1 == n_frames;
        let n = a.synthesize(&feature, &mut buf_a, last);
        a_out.extend_from_slice(&buf_a[..n]);
        // b's activity must not perturb a's trace.
        let _ = b.synthesize(&feature, &mut buf_b, last);
    }

    assert_eq!(a_out, solo_out);
}

#[test]
fn replicate_pad_left_on_first_frame_matches_steady_weights() {
    // Constructing two engines from the same table and feeding a non-zero
    // first frame must not panic or diverge in length from an all-zero one;
    // this exercises the input conv's first-frame replicate-pad path.
    let table = WeightTable::random_for_testing(11).unwrap();
    let cfg = VocoderConfig { seed: 11, ..Default::default() };
    let mut zero_engine = VocoderEngine::new(Arc::new(table.clone()), cfg.clone()).unwrap();
    let mut nonzero_engine = VocoderEngine::new(Arc::new(table), cfg).unwrap();

    let zero_feature = vec![0.0f32; FEATURES_DIM];
    let nonzero_feature: Vec<f32> = (0..FEATURES_DIM).map(|i| (i as f32 - 40.0) * 0.01).collect();

    let mut buf_z = vec![0i16; BUF];
    let mut buf_n = vec![0i16; BUF];
    let silent = FEATURE_CONV_DELAY + frames_to_first_emission() - 1;
    for _ in 0..silent {
        zero_engine.synthesize(&zero_feature, &mut buf_z, false);
        nonzero_engine.synthesize(&nonzero_feature, &mut buf_n, false);
    }
    let nz = zero_engine.synthesize(&zero_feature, &mut buf_z, false);
    let nn = nonzero_engine.synthesize(&nonzero_feature, &mut buf_n, false);
    assert_eq!(nz, nn);
}

#[test]
fn conversion_engine_produces_the_same_sample_counts_as_vocoder_only() {
    let table = WeightTable::random_for_testing(5).unwrap();
    let converter_weights = Arc::new(table.converter.clone().unwrap());
    let vocoder_weights = Arc::new(table.vocoder.clone());

    let mut conversion = ConversionEngine::new(
        vocoder_weights,
        converter_weights,
        VocoderConfig { seed: 5, ..Default::default() },
        ConverterConfig { seed: 6 },
    )
    .unwrap();

    let feature = vec![0.0f32; FEATURES_DIM];
    let spk_code = [1.0f32, 0.0];
    // The converter withholds its first FEATURE_VC_CONV_DELAY frames entirely
    // (the vocoder's own frame_count doesn't even start advancing until
    // then), on top of the vocoder's own warm-up and pre-crossing frames.
    let silent = FEATURE_VC_CONV_DELAY + FEATURE_CONV_DELAY + frames_to_first_emission() - 1;
    let mut buf = vec![0i16; BUF];
    for _ in 0..silent {
        assert_eq!(conversion.synthesize(&feature, &spk_code, &mut buf, false), 0);
    }
    let first = conversion.synthesize(&feature, &spk_code, &mut buf, false);
    assert!(first > 0 && first <= N_SAMPLE_BANDS * N_BANDS);

    let steady = conversion.synthesize(&feature, &spk_code, &mut buf, false);
    assert_eq!(steady, N_SAMPLE_BANDS * N_BANDS);
}

#[test]
fn weight_shape_mismatch_is_rejected_at_construction() {
    let mut table = WeightTable::random_for_testing(1).unwrap();
    table.vocoder.feature_norm = voc_core::NormStats::identity(FEATURES_DIM - 1);
    let result = VocoderEngine::new(Arc::new(table), VocoderConfig::default());
    assert!(result.is_err());
}

#[test]
fn n_spk_matches_speaker_code_width() {
    // Sanity check that the fixture's assumed speaker code width agrees
    // with the compiled constant the engine signature is built against.
    assert_eq!(N_SPK, 2);
}
