use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use voc_core::constants::{
    FEATURE_CONV_DELAY, MAX_N_OUTPUT, N_BANDS, N_SAMPLE_BANDS, N_SPK, PQMF_DELAY,
};
use voc_core::{ConverterConfig, ConverterWeights, VocoderConfig, VocoderWeights, WeightTable};
use voc_engine::{ConversionEngine, VocoderEngine};

use crate::cli::Cli;
use crate::io;

/// Flush-call buffer headroom: `FEATURE_CONV_DELAY` replayed steady frames
/// plus the trailing zero-pad-right burst, on top of one normal frame.
const FLUSH_HEADROOM: usize = FEATURE_CONV_DELAY * N_SAMPLE_BANDS * N_BANDS + PQMF_DELAY;

fn load_weight_table(path: &std::path::Path) -> Result<WeightTable> {
    let reader = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);
    serde_json::from_reader(reader).with_context(|| format!("parsing weight table {}", path.display()))
}

fn load_converter_weights(path: &std::path::Path) -> Result<ConverterWeights> {
    let reader = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);
    serde_json::from_reader(reader).with_context(|| format!("parsing converter weights {}", path.display()))
}

pub fn run(cli: &Cli) -> Result<()> {
    if !cli.binary && !cli.text {
        bail!(
            "reading features from a WAV file requires an external log-mel front-end \
             (STFT + mel-filterbank), which this engine does not implement; pass -b or -t \
             with a precomputed mel-spec file instead"
        );
    }

    let frames = if cli.binary {
        io::read_binary_features(&cli.infile)?
    } else {
        io::read_text_features(&cli.infile)?
    };
    if frames.is_empty() {
        bail!("{}: no feature frames found", cli.infile.display());
    }

    let table = load_weight_table(&cli.weights)?;
    let vocoder_config = VocoderConfig {
        seed: cli.seed,
        dlpc: !cli.nodlpc,
        ..Default::default()
    };

    let mut pcm = Vec::with_capacity(frames.len() * N_SAMPLE_BANDS * N_SAMPLE_BANDS + FLUSH_HEADROOM);
    let mut buf = vec![0i16; MAX_N_OUTPUT + FLUSH_HEADROOM];
    let mut fed_frames: Vec<Vec<f32>> = Vec::with_capacity(frames.len());

    if let Some(speaker) = &cli.speaker {
        if speaker.len() != N_SPK {
            bail!("--speaker needs exactly {} values, got {}", N_SPK, speaker.len());
        }
        let mut spk_code = [0.0f32; N_SPK];
        spk_code.copy_from_slice(speaker);

        let converter_path = cli
            .converter_weights
            .as_ref()
            .context("--speaker requires --converter-weights")?;
        let converter_weights = Arc::new(load_converter_weights(converter_path)?);
        let vocoder_weights = Arc::new(table.vocoder);

        let mut engine = ConversionEngine::new(
            vocoder_weights,
            converter_weights,
            vocoder_config,
            ConverterConfig { seed: cli.seed.wrapping_add(1) },
        )?;

        for (i, feature) in frames.iter().enumerate() {
            let last = i + 1 == frames.len();
            let n = engine.synthesize(feature, &spk_code, &mut buf, last);
            pcm.extend_from_slice(&buf[..n]);
            fed_frames.push(feature.clone());
        }
    } else {
        let mut engine = VocoderEngine::new(Arc::new(table), vocoder_config)?;

        for (i, feature) in frames.iter().enumerate() {
            let last = i + 1 == frames.len();
            let n = engine.synthesize(feature, &mut buf, last);
            pcm.extend_from_slice(&buf[..n]);
            fed_frames.push(feature.clone());
        }
    }

    io::write_wav(&cli.outfile, &pcm)?;

    if let Some(paths) = &cli.dump_melspec {
        let (bin_path, txt_path) = (&paths[0], &paths[1]);
        io::dump_melspec(bin_path, txt_path, &fed_frames)?;
    }

    log::info!(
        "{}: {} frames -> {} samples ({:.2}s)",
        cli.infile.display(),
        frames.len(),
        pcm.len(),
        pcm.len() as f32 / voc_core::constants::SAMPLING_FREQUENCY as f32,
    );

    Ok(())
}
