//! Feature-file and WAV I/O (§6 "external collaborators" — kept in the CLI
//! layer so the engine crate itself does none of it).

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use voc_core::constants::{FEATURES_DIM, SAMPLING_FREQUENCY};

/// Read a raw little-endian f32 mel-spec: `FEATURES_DIM` floats per frame,
/// frames concatenated with no header.
pub fn read_binary_features(path: &Path) -> Result<Vec<Vec<f32>>> {
    let mut raw = Vec::new();
    File::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .read_to_end(&mut raw)?;

    let frame_bytes = FEATURES_DIM * 4;
    if raw.len() % frame_bytes != 0 {
        bail!(
            "{}: {} bytes is not a multiple of {} ({} floats per frame)",
            path.display(),
            raw.len(),
            frame_bytes,
            FEATURES_DIM,
        );
    }

    Ok(raw
        .chunks_exact(frame_bytes)
        .map(|chunk| {
            chunk
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
        .collect())
}

/// Read a text mel-spec: one frame per line, `FEATURES_DIM`
/// whitespace-separated floats per line.
pub fn read_text_features(path: &Path) -> Result<Vec<Vec<f32>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut frames = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: Vec<f32> = line
            .split_whitespace()
            .map(|tok| tok.parse::<f32>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("{}:{}: non-numeric column", path.display(), i + 1))?;
        if frame.len() != FEATURES_DIM {
            bail!(
                "{}:{}: expected {} columns, got {}",
                path.display(),
                i + 1,
                FEATURES_DIM,
                frame.len(),
            );
        }
        frames.push(frame);
    }
    Ok(frames)
}

/// Write the produced PCM to a mono 16-bit WAV at the fixed sample rate.
pub fn write_wav(path: &Path, pcm: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLING_FREQUENCY as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for &s in pcm {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Dump the per-frame input mel-spec to both a binary and a text sink, for
/// `-o`.
pub fn dump_melspec(bin_path: &Path, txt_path: &Path, frames: &[Vec<f32>]) -> Result<()> {
    let mut bin = create_buf_writer(bin_path)?;
    for frame in frames {
        for &x in frame {
            bin.write_all(&x.to_le_bytes())?;
        }
    }
    bin.flush()?;

    let mut txt = create_buf_writer(txt_path)?;
    for frame in frames {
        let line: Vec<String> = frame.iter().map(|x| x.to_string()).collect();
        writeln!(txt, "{}", line.join(" "))?;
    }
    txt.flush()?;
    Ok(())
}

fn create_buf_writer(path: &Path) -> Result<std::io::BufWriter<File>> {
    Ok(std::io::BufWriter::new(
        File::create(path).with_context(|| format!("creating {}", path.display()))?,
    ))
}
