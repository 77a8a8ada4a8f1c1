//! Per-stream configuration. No field here is mutable post-construction
//! (Non-goal: dynamic reconfiguration of model topology at runtime).

use crate::constants::DEFAULT_GAUSS_TEMPERATURE;

/// Configuration for a [`VocoderEngine`](../../voc_engine/struct.VocoderEngine.html) instance.
#[derive(Debug, Clone)]
pub struct VocoderConfig {
    /// Per-stream RNG seed. Two engines constructed with the same seed and
    /// fed the same features produce byte-identical PCM (§8 determinism).
    pub seed: u64,
    /// Temperature multiplier for the Gaussian sampler used by the feature
    /// converter's post-net residual (§9 open question; default preserved
    /// from the reference).
    pub gauss_temperature: f32,
    /// When `false`, the mixture head skips the data-driven linear-prediction
    /// correction (the `_nodlpc` engine variant in §6).
    pub dlpc: bool,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            gauss_temperature: DEFAULT_GAUSS_TEMPERATURE,
            dlpc: true,
        }
    }
}

/// Configuration for a [`ConversionEngine`](../../voc_engine/struct.ConversionEngine.html)
/// front-end. Wraps a [`VocoderConfig`] plus converter-specific knobs.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// RNG seed for the post-net Laplace residual sampler. Kept separate from
    /// [`VocoderConfig::seed`] so enabling/disabling the converter doesn't
    /// perturb the vocoder's own draw sequence.
    pub seed: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self { seed: 1 }
    }
}
