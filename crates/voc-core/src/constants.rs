//! Compile-time model constants.
//!
//! These mirror the generated header that ships with the reference training
//! export. No runtime topology reconfiguration is supported (by design) so
//! every dimension a layer primitive needs is a `const` here rather than a
//! runtime-configurable field.

/// Number of PQMF sub-bands.
pub const N_BANDS: usize = 10;

/// Per-half (coarse or fine) codebook size: `sqrt(1024)`.
pub const SQRT_QUANTIZE: usize = 32;

/// Full 10-bit quantization resolution.
pub const QUANTIZE: usize = SQRT_QUANTIZE * SQRT_QUANTIZE;

/// Data-driven linear-prediction history depth (number of previous samples
/// retained per band).
pub const DLPC_ORDER: usize = 6;

/// PQMF synthesis prototype filter order. Taps = `(PQMF_ORDER + 1) * N_BANDS`.
pub const PQMF_ORDER: usize = 7;

/// Total PQMF synthesis filter length.
pub const PQMF_TAPS: usize = (PQMF_ORDER + 1) * N_BANDS;

/// Group delay of the synthesis filterbank, in samples.
pub const PQMF_DELAY: usize = (PQMF_ORDER * N_BANDS) / 2;

/// Extra samples drained from the zero-left-padded ring the first time the
/// delay is crossed.
pub const FIRST_N_OUTPUT: usize = PQMF_DELAY - N_BANDS;

/// Log-mel feature width consumed by the vocoder.
pub const FEATURES_DIM: usize = 80;

/// Mel-spec width used by the feature converter (mirrors [`FEATURES_DIM`]).
pub const MELSP_DIM: usize = 80;

/// Vocoder input-conv kernel size.
pub const FEATURE_CONV_KERNEL: usize = 7;

/// Vocoder conv warm-up frame count.
pub const FEATURE_CONV_DELAY: usize = FEATURE_CONV_KERNEL - 1;

/// Converter (CycleVAE) conv kernel size.
pub const FEATURE_VC_CONV_KERNEL: usize = 7;

/// Converter conv warm-up frame count.
pub const FEATURE_VC_CONV_DELAY: usize = FEATURE_VC_CONV_KERNEL - 1;

/// Sample-steps produced per input frame; one full multiband row.
pub const N_SAMPLE_BANDS: usize = N_BANDS;

/// Width of the main sparse-gated frame-GRU.
pub const RNN_MAIN_NEURONS: usize = 384;

/// Width of the coarse/fine sub-GRUs (GRU-B / GRU-C).
pub const RNN_SUB_NEURONS: usize = 32;

/// Width of every sparse frame-GRU inside the feature converter (encoders,
/// speaker, decoders, post-net). Distinct from [`RNN_MAIN_NEURONS`], which is
/// only the vocoder's main GRU.
pub const CONVERTER_GRU_HIDDEN: usize = 32;

/// Mid-logit width per channel per band in the dual-FC mixture head.
pub const MID_OUT: usize = 32;

/// Speaker one-hot/soft-code width.
pub const N_SPK: usize = 2;

/// Spectral-capacity feature width in the converter.
pub const CAP_DIM: usize = 4;

/// Embedding contribution width before the gate fan-out (one of z/r/h).
pub const EMBED_HIDDEN: usize = RNN_MAIN_NEURONS;

/// Neutral 10-bit code used to initialize coarse/fine sample history.
pub const INIT_LAST_SAMPLE: usize = QUANTIZE / 2;

/// Output PCM sample rate, Hz.
pub const SAMPLING_FREQUENCY: u32 = 24_000;

/// Pre-emphasis / de-emphasis coefficient.
pub const PREEMPH: f32 = 0.85;

/// De-emphasis/PQMF output clamp, matching the reference's `0.999969482421875`
/// (`32767.0 / 32768.0`).
pub const CLAMP_MAX: f32 = 0.999_969_5;

/// De-emphasis/PQMF output clamp lower bound.
pub const CLAMP_MIN: f32 = -1.0;

/// Largest number of samples a single `synthesize` call can emit (the "first
/// emission" frame).
pub const MAX_N_OUTPUT: usize = N_SAMPLE_BANDS * N_BANDS + FIRST_N_OUTPUT;

/// Default Gaussian sampler temperature (§9 design note — preserved as the
/// reference default, exposed as configuration).
pub const DEFAULT_GAUSS_TEMPERATURE: f32 = 0.25;
