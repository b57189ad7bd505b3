//! # narrate-rs
//!
//! Turn a text or Markdown document into one playable WAV file by driving a
//! text-to-speech engine in bounded chunks and stitching the chunk audio back
//! together in order.
//!
//! ## Pipeline
//!
//! 1. **Read**: decode the input, trying UTF-8, UTF-16, Latin-1 and ASCII in turn.
//! 2. **Normalise**: strip Markdown syntax so only spoken content remains.
//! 3. **Synthesize**: pull chunks lazily from a [`ChunkSource`].
//! 4. **Materialise**: write every chunk to `chunk_NNNN.wav` in a scratch directory.
//! 5. **Assemble**: concatenate the chunks with a 300 ms pause after each one.
//!
//! The scratch directory is removed on every exit path unless retention was
//! requested.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use narrate_rs::{engines::espeak::EspeakSource, NarrationOptions, Narrator};
//!
//! let mut narrator = Narrator::new(EspeakSource::new(), NarrationOptions::default());
//! let report = narrator.narrate_file(Path::new("README.md"), Path::new("README.wav"))?;
//! println!("{} chunks, {:.1}s", report.chunk_count, report.output.duration_secs());
//! # Ok::<(), narrate_rs::NarrateError>(())
//! ```

pub mod assemble;
pub mod engines;
pub mod error;
pub mod markdown;
pub mod materialize;
pub mod pipeline;
pub mod reader;
pub mod scratch;

pub use assemble::{concatenate_chunks, AssembledAudio, SILENCE_GAP_MS};
pub use error::{NarrateError, Result};
pub use markdown::clean_markdown;
pub use materialize::{AudioChunk, NoProgress, ProgressSink};
pub use pipeline::{NarrationOptions, NarrationOptionsBuilder, NarrationReport, Narrator};
pub use reader::{read_stream, read_text_file, Document, Encoding, Origin};
pub use scratch::ScratchArea;

use std::path::Path;

/// One result pulled from a [`ChunkSource`].
///
/// `samples` is `None` when the engine produced nothing for the span of text
/// it consumed; such results are skipped during materialisation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    /// Mono f32 audio samples, or `None` for an empty chunk
    pub samples: Option<Vec<f32>>,
    /// Sample rate of the audio
    pub sample_rate: u32,
    /// Number of source-text characters consumed for this chunk
    pub graphemes: usize,
}

impl ChunkResult {
    /// Write the audio to a mono 32-bit float WAV file.
    ///
    /// A chunk without samples writes an empty (header-only) file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in self.samples.as_deref().unwrap_or(&[]) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        let len = self.samples.as_ref().map_or(0, Vec::len);
        len as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file into interleaved f32 samples in `[-1.0, 1.0]`.
///
/// Integer PCM is scaled by its bit depth.
pub(crate) fn read_wav_f32(path: &Path) -> Result<(hound::WavSpec, Vec<f32>)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    Ok((spec, samples))
}

/// Voice, speed and language for a synthesis request.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SynthesisParams {
    /// Voice name (e.g. `"af_heart"`, `"bm_george"`).
    pub voice: String,
    /// Speech speed multiplier, default 1.0.
    pub speed: f32,
    /// Single-letter language code (`a` = American English, `b` = British English, ...).
    pub lang: String,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            voice: "af_heart".to_string(),
            speed: 1.0,
            lang: "a".to_string(),
        }
    }
}

/// A text-to-speech engine seen as a producer of ordered audio chunks.
///
/// Each call to [`chunks`](ChunkSource::chunks) starts a fresh sequence. The
/// returned iterator is lazy: the engine does the work for a chunk only when
/// it is pulled, and the sequence cannot be rewound.
pub trait ChunkSource {
    /// Lazy sequence of chunk results for one request.
    type Chunks: Iterator<Item = Result<ChunkResult>>;

    /// Start synthesizing `text` with the given parameters.
    fn chunks(&mut self, text: &str, params: &SynthesisParams) -> Result<Self::Chunks>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_wav_f32_scales_integer_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcm.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for v in [0i16, 16384, -16384, i16::MIN] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let (read_spec, samples) = read_wav_f32(&path).unwrap();
        assert_eq!(read_spec, spec);
        assert_eq!(samples, vec![0.0, 0.5, -0.5, -1.0]);
    }

    #[test]
    fn write_wav_stores_mono_float_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.wav");
        let chunk = ChunkResult {
            samples: Some(vec![0.0, 0.5, -0.5]),
            sample_rate: 24000,
            graphemes: 5,
        };
        chunk.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn duration_of_empty_chunk_is_zero() {
        let chunk = ChunkResult {
            samples: None,
            sample_rate: 24000,
            graphemes: 0,
        };
        assert_eq!(chunk.duration_secs(), 0.0);
    }

    #[test]
    fn default_params_match_cli_defaults() {
        let params = SynthesisParams::default();
        assert_eq!(params.voice, "af_heart");
        assert_eq!(params.speed, 1.0);
        assert_eq!(params.lang, "a");
    }
}
