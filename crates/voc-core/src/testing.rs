//! Deterministic random weight-table construction for tests (§8.1).
//!
//! No real trained weights ship with this crate, so the streaming
//! properties in the testable-properties section are checked against
//! structurally valid but randomly initialized weights instead. Every shape
//! constraint [`crate::weights`] validates is satisfied; only the *values*
//! are arbitrary.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::constants::*;
use crate::stats::NormStats;
use crate::weights::{
    Activation, ConvWeights, ConverterWeights, DenseWeights, DualFcWeights, EmbeddingTable,
    GruWeights, Matrix, SparseGruWeights, VocoderWeights, WeightTable,
};
use crate::VocResult;

/// Mel-spec / excitation latent width used internally by the randomly
/// constructed converter fixture, chosen so `N_SPK + 2*LAT_DIM ==
/// 3*CONVERTER_GRU_HIDDEN` (the speaker encoder's sparse-GRU input width).
const LAT_DIM: usize = 47;

/// Time-varying speaker code width produced by the speaker encoder.
const SPK_TV_DIM: usize = 6;

const SPK_AUX_DIM: usize = N_SPK + SPK_TV_DIM;

fn small_vec(rng: &mut ChaCha8Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-0.05..0.05)).collect()
}

fn dense_matrix(rng: &mut ChaCha8Rng, rows: usize, cols: usize) -> Matrix {
    Matrix::dense(small_vec(rng, rows * cols), rows, cols).expect("shape is self-consistent")
}

fn random_dense(rng: &mut ChaCha8Rng, in_dim: usize, out_dim: usize, activation: Activation) -> DenseWeights {
    DenseWeights::new(dense_matrix(rng, out_dim, in_dim), small_vec(rng, out_dim), activation)
        .expect("shape is self-consistent")
}

fn random_conv(rng: &mut ChaCha8Rng, nb_inputs: usize, kernel_size: usize, nb_neurons: usize) -> ConvWeights {
    let w = dense_matrix(rng, nb_neurons, nb_inputs * kernel_size);
    ConvWeights::new(w, small_vec(rng, nb_neurons), nb_inputs, kernel_size).expect("shape is self-consistent")
}

fn random_gru(rng: &mut ChaCha8Rng, hidden: usize, activation: Activation) -> GruWeights {
    let w = dense_matrix(rng, 3 * hidden, hidden);
    GruWeights::new(w, small_vec(rng, 3 * hidden), activation, hidden).expect("shape is self-consistent")
}

/// Build a fully-populated (every 16-row block present) sparse frame-GRU,
/// functionally equivalent to a dense recurrent GRU plus a diagonal term.
fn random_sparse_gru(rng: &mut ChaCha8Rng, hidden: usize, activation: Activation) -> SparseGruWeights {
    debug_assert_eq!(hidden % 16, 0);
    let num_blocks = hidden / 16;
    let w = dense_matrix(rng, 3 * hidden, hidden);
    let block_indices = vec![(0..num_blocks).collect::<Vec<_>>(); 3];
    SparseGruWeights::new(
        w,
        small_vec(rng, 3 * hidden),
        small_vec(rng, 3 * hidden),
        block_indices,
        activation,
        hidden,
    )
    .expect("shape is self-consistent")
}

fn random_embedding(rng: &mut ChaCha8Rng, bands: usize, codebook_size: usize, hidden: usize) -> EmbeddingTable {
    EmbeddingTable::new(small_vec(rng, bands * codebook_size * hidden), bands, codebook_size, hidden)
        .expect("shape is self-consistent")
}

fn random_dual_fc(rng: &mut ChaCha8Rng, in_dim: usize, bands: usize) -> DualFcWeights {
    let per_band = 2 * DLPC_ORDER + MID_OUT;
    let out_dim = bands * per_band;
    let channel1 = random_dense(rng, in_dim, out_dim, Activation::Linear);
    let channel2 = random_dense(rng, in_dim, out_dim, Activation::Linear);
    let logits_fc = random_dense(rng, MID_OUT, SQRT_QUANTIZE, Activation::Linear);
    DualFcWeights {
        channel1,
        channel2,
        fusion1: small_vec(rng, out_dim),
        fusion2: small_vec(rng, out_dim),
        logits_fc,
        bands,
    }
}

fn random_stats(rng: &mut ChaCha8Rng, dim: usize) -> NormStats {
    let mean = small_vec(rng, dim);
    let std = vec![1.0; dim];
    NormStats::new(mean, std).expect("std is positive by construction")
}

impl VocoderWeights {
    /// Build a structurally valid, randomly initialized vocoder weight set.
    pub fn random_for_testing(seed: u64) -> VocResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shared = RNN_MAIN_NEURONS;

        let input_conv = random_conv(&mut rng, FEATURES_DIM, FEATURE_CONV_KERNEL, shared);
        let input_dense = random_dense(&mut rng, shared, shared, Activation::Tanh);

        let gru_a_dense_feature = random_dense(&mut rng, shared, 3 * RNN_MAIN_NEURONS, Activation::Linear);
        let gru_b_dense_feature = random_dense(&mut rng, shared, 3 * RNN_SUB_NEURONS, Activation::Linear);
        let gru_c_dense_feature = random_dense(&mut rng, shared, 3 * RNN_SUB_NEURONS, Activation::Linear);

        let gru_a = random_sparse_gru(&mut rng, RNN_MAIN_NEURONS, Activation::Tanh);
        let gru_b = random_gru(&mut rng, RNN_SUB_NEURONS, Activation::Tanh);
        let gru_c = random_gru(&mut rng, RNN_SUB_NEURONS, Activation::Tanh);

        let gru_b_dense_state = random_dense(&mut rng, RNN_MAIN_NEURONS, 3 * RNN_SUB_NEURONS, Activation::Linear);
        let gru_c_dense_state = random_dense(&mut rng, RNN_SUB_NEURONS, 3 * RNN_SUB_NEURONS, Activation::Linear);

        let embed_coarse = random_embedding(&mut rng, N_BANDS, SQRT_QUANTIZE, 3 * RNN_MAIN_NEURONS);
        let embed_fine = random_embedding(&mut rng, N_BANDS, SQRT_QUANTIZE, 3 * RNN_MAIN_NEURONS);
        let embed_coarse_for_fine = random_embedding(&mut rng, N_BANDS, SQRT_QUANTIZE, 3 * RNN_SUB_NEURONS);

        let coarse_head = random_dual_fc(&mut rng, RNN_SUB_NEURONS, N_BANDS);
        let fine_head = random_dual_fc(&mut rng, RNN_SUB_NEURONS, N_BANDS);

        let feature_norm = random_stats(&mut rng, FEATURES_DIM);
        let pqmf_synth_filter = small_vec(&mut rng, PQMF_TAPS);

        Ok(Self {
            input_conv,
            input_dense,
            gru_a_dense_feature,
            gru_b_dense_feature,
            gru_c_dense_feature,
            gru_a,
            gru_b,
            gru_c,
            gru_b_dense_state,
            gru_c_dense_state,
            embed_coarse,
            embed_fine,
            embed_coarse_for_fine,
            coarse_head,
            fine_head,
            feature_norm,
            pqmf_synth_filter,
        })
    }
}

impl ConverterWeights {
    /// Build a structurally valid, randomly initialized converter weight
    /// set, consistent with the same `seed + 1` convention
    /// [`WeightTable::random_for_testing`] uses to keep the two halves
    /// independent but reproducible.
    pub fn random_for_testing(seed: u64) -> VocResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let h = CONVERTER_GRU_HIDDEN;

        let enc_melsp_conv = random_conv(&mut rng, MELSP_DIM, FEATURE_VC_CONV_KERNEL, 3 * h);
        let enc_excit_conv = random_conv(&mut rng, MELSP_DIM, FEATURE_VC_CONV_KERNEL, 3 * h);
        let enc_melsp_gru = random_sparse_gru(&mut rng, h, Activation::Tanh);
        let enc_excit_gru = random_sparse_gru(&mut rng, h, Activation::Tanh);
        let enc_melsp_dense = random_dense(&mut rng, h, LAT_DIM, Activation::Linear);
        let enc_excit_dense = random_dense(&mut rng, h, LAT_DIM, Activation::Linear);

        let spk_gru = random_sparse_gru(&mut rng, h, Activation::Tanh);
        let spk_dense = random_dense(&mut rng, h, SPK_TV_DIM, Activation::Linear);

        let dec_excit_conv = random_conv(&mut rng, SPK_AUX_DIM + LAT_DIM, FEATURE_VC_CONV_KERNEL, 3 * h);
        let dec_excit_gru = random_sparse_gru(&mut rng, h, Activation::Tanh);
        let dec_excit_dense = random_dense(&mut rng, h, 3 + CAP_DIM, Activation::Linear);

        let dec_melsp_nb_inputs = SPK_AUX_DIM + 2 + LAT_DIM + LAT_DIM;
        let dec_melsp_conv = random_conv(&mut rng, dec_melsp_nb_inputs, FEATURE_VC_CONV_KERNEL, 3 * h);
        let dec_melsp_gru = random_sparse_gru(&mut rng, h, Activation::Tanh);
        let dec_melsp_dense = random_dense(&mut rng, h, MELSP_DIM, Activation::Linear);

        let post_nb_inputs = SPK_AUX_DIM + 3 + CAP_DIM + MELSP_DIM;
        let post_conv = random_conv(&mut rng, post_nb_inputs, FEATURE_VC_CONV_KERNEL, 3 * h);
        let post_gru = random_sparse_gru(&mut rng, h, Activation::Tanh);
        let post_dense = random_dense(&mut rng, h, 2 * MELSP_DIM, Activation::Linear);

        let melsp_stats = random_stats(&mut rng, MELSP_DIM);
        let uvf0_stats = random_stats(&mut rng, 1);
        let uvcap_stats = random_stats(&mut rng, 1);

        Ok(Self {
            enc_melsp_conv,
            enc_excit_conv,
            enc_melsp_gru,
            enc_excit_gru,
            enc_melsp_dense,
            enc_excit_dense,
            spk_gru,
            spk_dense,
            dec_excit_conv,
            dec_excit_gru,
            dec_excit_dense,
            dec_melsp_conv,
            dec_melsp_gru,
            dec_melsp_dense,
            post_conv,
            post_gru,
            post_dense,
            melsp_stats,
            uvf0_stats,
            uvcap_stats,
        })
    }
}

impl WeightTable {
    /// Build a complete, structurally valid random weight table (vocoder +
    /// converter) for tests that need both halves wired together.
    pub fn random_for_testing(seed: u64) -> VocResult<Self> {
        Ok(Self {
            vocoder: VocoderWeights::random_for_testing(seed)?,
            converter: Some(ConverterWeights::random_for_testing(seed.wrapping_add(1))?),
        })
    }
}
