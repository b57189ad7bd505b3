//! Streams chunk results from a [`ChunkSource`](crate::ChunkSource) to disk.

use std::path::PathBuf;

use crate::error::{NarrateError, Result};
use crate::scratch::ScratchArea;
use crate::ChunkResult;

/// One chunk of audio persisted to the scratch area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// 0-based position in the output, contiguous across the run
    pub index: usize,
    pub path: PathBuf,
    pub sample_rate: u32,
    /// Characters of source text behind this chunk
    pub graphemes: usize,
}

/// Observer for per-chunk progress. Purely informational.
pub trait ProgressSink {
    fn on_chunk(&mut self, index: usize, total: Option<usize>, graphemes: usize);
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, Option<usize>, usize),
{
    fn on_chunk(&mut self, index: usize, total: Option<usize>, graphemes: usize) {
        self(index, total, graphemes)
    }
}

/// Progress sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_chunk(&mut self, _index: usize, _total: Option<usize>, _graphemes: usize) {}
}

/// Pull every result from `chunks`, writing each one that carries audio to
/// the next numbered file in `scratch`.
///
/// Results without samples are skipped and do not advance the index. Fails
/// with [`NarrateError::NoAudioGenerated`] when nothing had audio.
pub fn materialize_chunks<I, P>(
    chunks: I,
    scratch: &mut ScratchArea,
    total: Option<usize>,
    progress: &mut P,
) -> Result<Vec<AudioChunk>>
where
    I: IntoIterator<Item = Result<ChunkResult>>,
    P: ProgressSink + ?Sized,
{
    let mut written = Vec::new();

    for result in chunks {
        let result = result?;
        match &result.samples {
            Some(samples) if !samples.is_empty() => {}
            _ => {
                log::warn!(
                    "Skipping empty chunk ({} chars of source text)",
                    result.graphemes
                );
                continue;
            }
        }

        let index = written.len();
        let path = scratch.chunk_path(index);
        result.write_wav(&path)?;
        scratch.track(path.clone());
        log::debug!("Wrote {} ({:.2}s)", path.display(), result.duration_secs());

        progress.on_chunk(index, total, result.graphemes);
        written.push(AudioChunk {
            index,
            path,
            sample_rate: result.sample_rate,
            graphemes: result.graphemes,
        });
    }

    if written.is_empty() {
        return Err(NarrateError::NoAudioGenerated);
    }
    Ok(written)
}
