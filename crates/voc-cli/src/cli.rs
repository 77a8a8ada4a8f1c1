use std::path::PathBuf;

use clap::Parser;

/// Streaming MWDLP vocoder command-line front-end.
///
/// Feeds a stream of acoustic feature frames (log-mel-spectrogram) through
/// the vocoder engine and writes the resulting PCM to a WAV file. Optionally
/// runs a CycleVAE voice-conversion front-end first.
#[derive(Debug, Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = "Streaming MWDLP vocoder command-line front-end",
    long_about = None,
)]
pub struct Cli {
    /// Path to a JSON-encoded vocoder weight table.
    #[arg(long, value_name = "PATH")]
    pub weights: PathBuf,

    /// Input is a raw binary mel-spec (little-endian f32, FEATURES_DIM
    /// floats per frame) rather than a WAV file.
    #[arg(short = 'b')]
    pub binary: bool,

    /// Input is a whitespace-separated text mel-spec (FEATURES_DIM floats
    /// per line) rather than a WAV file.
    #[arg(short = 't')]
    pub text: bool,

    /// Additionally dump the input mel-spec: a binary path followed by a
    /// text path.
    #[arg(short = 'o', num_args = 2, value_names = ["BIN", "TXT"])]
    pub dump_melspec: Option<Vec<PathBuf>>,

    /// Target speaker code (comma-separated floats, one per speaker slot).
    /// When given, runs the CycleVAE front-end ahead of the vocoder.
    #[arg(long, value_delimiter = ',')]
    pub speaker: Option<Vec<f32>>,

    /// Converter weight table (JSON). Required alongside `--speaker`.
    #[arg(long, value_name = "PATH")]
    pub converter_weights: Option<PathBuf>,

    /// Disable the data-driven linear-prediction correction in the mixture
    /// head (the `_nodlpc` engine variant).
    #[arg(long)]
    pub nodlpc: bool,

    /// Per-stream RNG seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Input feature file.
    pub infile: PathBuf,

    /// Output WAV path.
    pub outfile: PathBuf,
}
