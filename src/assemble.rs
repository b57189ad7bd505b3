//! Concatenation of chunk WAV files into the final output.
//!
//! Every chunk is followed by [`SILENCE_GAP_MS`] of silence, the last one
//! included. The output takes its sample rate, channel count and sample
//! format from the first chunk; later chunks that differ are converted
//! (channel up/down-mix, linear resampling) rather than dropped.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{NarrateError, Result};

/// Pause inserted after each chunk.
pub const SILENCE_GAP_MS: u32 = 300;

/// The final audio file of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AssembledAudio {
    pub path: PathBuf,
    /// Interleaved sample count across all channels
    pub total_samples: usize,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AssembledAudio {
    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        let frames = self.total_samples / self.channels.max(1) as usize;
        frames as f64 / self.sample_rate as f64
    }
}

/// Concatenate `chunks` in order into `output`.
///
/// Fails with [`NarrateError::NoAudioToAssemble`] on an empty list before
/// touching the filesystem. The output is written next to its final location
/// and renamed into place, so a failure never leaves a partial file behind.
pub fn concatenate_chunks(chunks: &[PathBuf], output: &Path) -> Result<AssembledAudio> {
    let Some(first) = chunks.first() else {
        return Err(NarrateError::NoAudioToAssemble);
    };

    let spec = WavReader::open(first)?.spec();
    let gap = silence_len(&spec);
    let mut combined = Vec::new();
    for chunk in chunks {
        let samples = read_samples(chunk, &spec)?;
        log::debug!("Appending {} ({} samples)", chunk.display(), samples.len());
        combined.extend_from_slice(&samples);
        combined.resize(combined.len() + gap, 0.0);
    }

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".narrate-")
        .suffix(".wav")
        .tempfile_in(parent)?;
    // Dropping `staging` on an early return deletes the partial file.
    write_samples(staging.path(), &spec, &combined)?;
    staging
        .persist(output)
        .map_err(|e| NarrateError::Io(e.error))?;

    log::info!(
        "Assembled {} chunks into {} ({} samples)",
        chunks.len(),
        output.display(),
        combined.len()
    );
    Ok(AssembledAudio {
        path: output.to_path_buf(),
        total_samples: combined.len(),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Number of interleaved samples in one silence gap for `spec`.
fn silence_len(spec: &WavSpec) -> usize {
    let frames = spec.sample_rate as u64 * SILENCE_GAP_MS as u64 / 1000;
    frames as usize * spec.channels as usize
}

/// Decode `path` as f32 and convert it to the layout described by `target`.
fn read_samples(path: &Path, target: &WavSpec) -> Result<Vec<f32>> {
    let (spec, samples) = crate::read_wav_f32(path)?;

    if spec.sample_rate == target.sample_rate && spec.channels == target.channels {
        return Ok(samples);
    }
    log::warn!(
        "{} is {} Hz / {} ch, converting to {} Hz / {} ch",
        path.display(),
        spec.sample_rate,
        spec.channels,
        target.sample_rate,
        target.channels
    );
    let mono = downmix(&samples, spec.channels);
    let resampled = resample_linear(&mono, spec.sample_rate, target.sample_rate);
    Ok(upmix(&resampled, target.channels))
}

fn write_samples(path: &Path, spec: &WavSpec, samples: &[f32]) -> Result<()> {
    let mut writer = WavWriter::create(path, *spec)?;
    match spec.sample_format {
        SampleFormat::Float => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
        SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            let min = -max - 1.0;
            for &s in samples {
                writer.write_sample((s * (max + 1.0)).clamp(min, max) as i32)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn upmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
        .collect()
}

/// Simple linear interpolation resampling.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio).ceil() as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 * ratio;
        let idx0 = (src_idx.floor() as usize).min(samples.len() - 1);
        let idx1 = (idx0 + 1).min(samples.len() - 1);
        let frac = (src_idx - idx0 as f64) as f32;
        resampled.push(samples[idx0] * (1.0 - frac) + samples[idx1] * frac);
    }

    resampled
}
