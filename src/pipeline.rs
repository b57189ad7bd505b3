//! End-to-end narration. A document is normalised to text, synthesized into
//! chunk files and assembled into one WAV.

use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::assemble::{concatenate_chunks, AssembledAudio};
use crate::error::{NarrateError, Result};
use crate::markdown::clean_markdown;
use crate::materialize::{materialize_chunks, NoProgress, ProgressSink};
use crate::reader::Document;
use crate::scratch::{ScratchArea, DEFAULT_PREFIX};
use crate::{ChunkSource, SynthesisParams};

/// Settings for one narration run.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct NarrationOptions {
    /// Voice, speed and language handed to the chunk source.
    pub params: SynthesisParams,
    /// Force (`Some(true)`) or suppress (`Some(false)`) Markdown cleaning.
    /// `None` trusts the document's own flag.
    #[builder(setter(into, strip_option))]
    pub markdown: Option<bool>,
    /// Leave the scratch directory on disk and report its path.
    pub keep_scratch: bool,
    /// Run the chunk source once up front to learn the chunk total for
    /// progress reporting.
    pub count_chunks: bool,
    #[builder(setter(into))]
    pub scratch_prefix: String,
}

impl Default for NarrationOptions {
    fn default() -> Self {
        Self {
            params: SynthesisParams::default(),
            markdown: None,
            keep_scratch: false,
            count_chunks: false,
            scratch_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NarrationReport {
    pub output: AssembledAudio,
    pub chunk_count: usize,
    /// Characters of normalised text sent to the engine
    pub characters: usize,
    pub params: SynthesisParams,
    /// Retained scratch directory, when retention was requested
    pub scratch_dir: Option<PathBuf>,
}

/// Drives a [`ChunkSource`] over whole documents.
pub struct Narrator<S> {
    source: S,
    options: NarrationOptions,
}

impl<S: ChunkSource> Narrator<S> {
    pub fn new(source: S, options: NarrationOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &NarrationOptions {
        &self.options
    }

    /// Narrate the file at `input` into `output`.
    pub fn narrate_file(&mut self, input: &Path, output: &Path) -> Result<NarrationReport> {
        let document = Document::from_path(input)?;
        self.narrate_document(&document, output, &mut NoProgress)
    }

    /// Narrate an already-read document, reporting per-chunk progress.
    pub fn narrate_document<P>(
        &mut self,
        document: &Document,
        output: &Path,
        progress: &mut P,
    ) -> Result<NarrationReport>
    where
        P: ProgressSink + ?Sized,
    {
        let text = self.prepare_text(document)?;
        let characters = text.chars().count();
        log::info!("Text length: {characters} characters");

        let total = if self.options.count_chunks {
            Some(self.count_chunks(&text)?)
        } else {
            None
        };

        let mut scratch = ScratchArea::new(&self.options.scratch_prefix)?;
        let outcome = self.synthesize_into(&text, &mut scratch, total, output, progress);

        // Release runs on every path, success or not.
        let scratch_dir = if self.options.keep_scratch {
            Some(scratch.retain())
        } else {
            scratch.release();
            None
        };

        let (assembled, chunk_count) = match (outcome, scratch_dir.clone()) {
            (Ok(done), _) => done,
            (Err(e), Some(scratch_dir)) => {
                log::warn!("Run failed; temporary files kept in: {}", scratch_dir.display());
                return Err(NarrateError::ScratchRetained {
                    source: Box::new(e),
                    scratch_dir,
                });
            }
            (Err(e), None) => return Err(e),
        };
        log::info!("Audio saved to: {}", assembled.path.display());
        Ok(NarrationReport {
            output: assembled,
            chunk_count,
            characters,
            params: self.options.params.clone(),
            scratch_dir,
        })
    }

    /// Decoded text, Markdown-cleaned when requested, rejected when blank.
    pub fn prepare_text(&self, document: &Document) -> Result<String> {
        let markdown = self.options.markdown.unwrap_or(document.is_markdown);
        let text = if markdown {
            log::info!("Cleaning markdown formatting");
            clean_markdown(&document.text)
        } else {
            document.text.clone()
        };
        if text.trim().is_empty() {
            return Err(NarrateError::EmptyNormalizedText);
        }
        Ok(text)
    }

    /// Count the chunks with audio that a fresh sequence produces for `text`.
    fn count_chunks(&mut self, text: &str) -> Result<usize> {
        let mut count = 0;
        for result in self.source.chunks(text, &self.options.params)? {
            if result?.samples.is_some_and(|s| !s.is_empty()) {
                count += 1;
            }
        }
        log::debug!("Counting pass found {count} chunks");
        Ok(count)
    }

    fn synthesize_into<P>(
        &mut self,
        text: &str,
        scratch: &mut ScratchArea,
        total: Option<usize>,
        output: &Path,
        progress: &mut P,
    ) -> Result<(AssembledAudio, usize)>
    where
        P: ProgressSink + ?Sized,
    {
        log::info!("Generating audio chunks");
        let chunks = self.source.chunks(text, &self.options.params)?;
        let written = materialize_chunks(chunks, scratch, total, progress)?;
        if let Some(expected) = total.filter(|&t| t != written.len()) {
            log::warn!(
                "Counted {expected} chunks but generated {}; progress totals were off",
                written.len()
            );
        }

        log::info!("Concatenating {} audio chunks", written.len());
        let paths: Vec<PathBuf> = written.iter().map(|c| c.path.clone()).collect();
        let assembled = concatenate_chunks(&paths, output)?;
        Ok((assembled, written.len()))
    }
}

/// `input` with its extension replaced by `.wav`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("wav")
}
