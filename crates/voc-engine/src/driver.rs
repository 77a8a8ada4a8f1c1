//! Public engine types: `VocoderEngine` (vocoder only) and `ConversionEngine`
//! (CycleVAE front-end feeding the same vocoder) (§6).

use std::sync::Arc;

use rand_chacha::ChaCha8Rng;

use voc_core::constants::{FEATURES_DIM, N_SPK};
use voc_core::{ConverterConfig, ConverterWeights, VocError, VocoderConfig, VocoderWeights, WeightTable};
use voc_nn::ConverterNet;

use crate::state::VocoderState;

/// Validate a [`WeightTable`]'s vocoder half against compile-time model
/// constants. Matrix/table shapes are already checked by their own
/// constructors at weight-load time; this only re-asserts the handful of
/// cross-struct width agreements the engine itself relies on.
fn validate_vocoder(weights: &VocoderWeights) -> Result<(), VocError> {
    let got = weights.feature_norm.n_dim();
    if got != FEATURES_DIM {
        log::error!("vocoder feature_norm width {} != compiled FEATURES_DIM {}", got, FEATURES_DIM);
        return Err(VocError::StatsDimMismatch {
            expected: FEATURES_DIM,
            got,
        });
    }
    Ok(())
}

fn validate_converter(weights: &ConverterWeights) -> Result<(), VocError> {
    let got = weights.melsp_stats.n_dim();
    if got != voc_core::constants::MELSP_DIM {
        log::error!(
            "converter melsp_stats width {} != compiled MELSP_DIM {}",
            got,
            voc_core::constants::MELSP_DIM
        );
        return Err(VocError::StatsDimMismatch {
            expected: voc_core::constants::MELSP_DIM,
            got,
        });
    }
    Ok(())
}

/// Owns one streaming vocoder instance: feed it normalized-domain acoustic
/// feature frames, get back PCM.
pub struct VocoderEngine {
    state: VocoderState,
}

impl VocoderEngine {
    pub fn new(weights: Arc<WeightTable>, config: VocoderConfig) -> Result<Self, VocError> {
        validate_vocoder(&weights.vocoder)?;
        Ok(Self {
            state: VocoderState::new(&weights.vocoder, &config),
        })
    }

    /// Feed one `FEATURES_DIM`-wide raw feature frame; on `flag_last_frame`,
    /// also run the flush phase (§4.5) before returning. `pcm_out` must be
    /// sized at least [`voc_core::constants::MAX_N_OUTPUT`] plus, on the
    /// final call, the trailing `PQMF_DELAY + FEATURE_CONV_DELAY*N_BANDS`
    /// flush burst.
    pub fn synthesize(&mut self, features: &[f32], pcm_out: &mut [i16], flag_last_frame: bool) -> usize {
        debug_assert_eq!(features.len(), FEATURES_DIM);
        let mut n = self.state.process_frame(features, pcm_out);
        if flag_last_frame {
            n += self.state.flush(&mut pcm_out[n..]);
        }
        n
    }
}

/// Owns one CycleVAE voice-conversion front-end plus the vocoder it feeds.
pub struct ConversionEngine {
    converter: ConverterNet,
    state: VocoderState,
    converter_weights: Arc<ConverterWeights>,
    rng: ChaCha8Rng,
}

impl ConversionEngine {
    pub fn new(
        vocoder_weights: Arc<VocoderWeights>,
        converter_weights: Arc<ConverterWeights>,
        vocoder_config: VocoderConfig,
        converter_config: ConverterConfig,
    ) -> Result<Self, VocError> {
        validate_vocoder(&vocoder_weights)?;
        validate_converter(&converter_weights)?;
        Ok(Self {
            converter: ConverterNet::new((*converter_weights).clone()),
            state: VocoderState::new(&vocoder_weights, &vocoder_config),
            converter_weights,
            rng: voc_dsp::rng_from_seed(converter_config.seed),
        })
    }

    /// Feed one raw `FEATURES_DIM` feature frame plus a target speaker code;
    /// runs the conversion front-end, then the same per-frame generation
    /// [`VocoderEngine::synthesize`] does.
    pub fn synthesize(
        &mut self,
        features: &[f32],
        spk_code: &[f32; N_SPK],
        pcm_out: &mut [i16],
        flag_last_frame: bool,
    ) -> usize {
        debug_assert_eq!(features.len(), FEATURES_DIM);

        let mut melsp_in = features.to_vec();
        self.converter_weights.melsp_stats.normalize_in_place(&mut melsp_in);

        let converted = self.converter.forward(
            &melsp_in,
            spk_code,
            &self.converter_weights.uvf0_stats,
            &self.converter_weights.uvcap_stats,
            &mut self.rng,
        );

        let Some(converted) = converted else {
            log::trace!("converter still warming up, withholding frame from vocoder");
            let mut n = 0;
            if flag_last_frame {
                n += self.state.flush(&mut pcm_out[n..]);
            }
            return n;
        };

        let mut raw_feature = converted.melsp_cv;
        self.converter_weights.melsp_stats.denormalize_in_place(&mut raw_feature);

        let mut n = self.state.process_frame(&raw_feature, pcm_out);
        if flag_last_frame {
            n += self.state.flush(&mut pcm_out[n..]);
        }
        n
    }
}
