//! espeak-ng as a chunk source.
//!
//! Text is split into sentence-aligned chunks of bounded length and each
//! chunk is synthesized by a separate `espeak-ng -w` run when it is pulled
//! from the iterator.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Language Codes
//!
//! | Code | Language | espeak-ng voice |
//! |---|---|---|
//! | `a` | American English | `en-us` |
//! | `b` | British English | `en-gb` |
//! | `e` | Spanish | `es` |
//! | `f` | French | `fr-fr` |
//! | `h` | Hindi | `hi` |
//! | `i` | Italian | `it` |
//! | `j` | Japanese | `ja` |
//! | `p` | Brazilian Portuguese | `pt-br` |
//! | `z` | Mandarin Chinese | `cmn` |
//!
//! Any longer code is passed to espeak-ng unchanged. The second letter of the
//! voice id picks a female (`af_heart`) or male (`am_adam`) variant.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{NarrateError, Result};
use crate::{ChunkResult, ChunkSource, SynthesisParams};

/// Default upper bound on characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 400;

/// espeak-ng speaking rate at speed 1.0, in words per minute.
const BASE_WPM: f32 = 175.0;
const MIN_WPM: f32 = 80.0;
const MAX_WPM: f32 = 450.0;

/// Location of the espeak-ng binary and its data directory.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    /// Binary to run. `None` looks up `espeak-ng` on PATH.
    pub bin_path: Option<PathBuf>,
    /// Directory passed as `ESPEAK_DATA_PATH`. `None` keeps the system default.
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn program(&self) -> &Path {
        self.bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("espeak-ng"))
    }
}

/// Chunk source backed by the espeak-ng command-line synthesizer.
#[derive(Debug, Clone)]
pub struct EspeakSource {
    espeak: EspeakConfig,
    max_chars: usize,
}

impl Default for EspeakSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakSource {
    /// Use `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self {
            espeak: EspeakConfig::default(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Use explicit espeak-ng binary and data paths. Either may be `None`.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            espeak: EspeakConfig {
                bin_path,
                data_path,
            },
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Change the per-chunk character limit.
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }
}

impl ChunkSource for EspeakSource {
    type Chunks = EspeakChunks;

    fn chunks(&mut self, text: &str, params: &SynthesisParams) -> Result<Self::Chunks> {
        let pending: VecDeque<String> = chunk_text(text, self.max_chars).into();
        let voice = espeak_voice(&params.lang, &params.voice);
        let wpm = words_per_minute(params.speed);
        log::debug!(
            "espeak-ng: {} chunks, voice={voice}, rate={wpm} wpm",
            pending.len()
        );
        Ok(EspeakChunks {
            pending,
            voice,
            wpm,
            espeak: self.espeak.clone(),
        })
    }
}

/// Lazy sequence of espeak-ng chunks. Each `next()` runs one synthesis.
pub struct EspeakChunks {
    pending: VecDeque<String>,
    voice: String,
    wpm: u32,
    espeak: EspeakConfig,
}

impl Iterator for EspeakChunks {
    type Item = Result<ChunkResult>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.pending.pop_front()?;
        Some(self.synthesize(&text))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pending.len(), Some(self.pending.len()))
    }
}

impl EspeakChunks {
    fn synthesize(&self, text: &str) -> Result<ChunkResult> {
        let wav = tempfile::Builder::new()
            .prefix("espeak-")
            .suffix(".wav")
            .tempfile()?;
        run_espeak(&self.espeak, text, &self.voice, self.wpm, wav.path())?;

        let (spec, samples) = crate::read_wav_f32(wav.path())?;

        Ok(ChunkResult {
            samples: (!samples.is_empty()).then_some(samples),
            sample_rate: spec.sample_rate,
            graphemes: text.chars().count(),
        })
    }
}

fn run_espeak(config: &EspeakConfig, text: &str, voice: &str, wpm: u32, out: &Path) -> Result<()> {
    let program = config.program();
    let rate = wpm.to_string();
    let mut command = Command::new(program);
    command
        .args(["--stdin", "-v", voice, "-s", rate.as_str(), "-w"])
        .arg(out)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    if let Some(data) = &config.data_path {
        command.env("ESPEAK_DATA_PATH", data);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NarrateError::EngineNotFound {
                program: program.display().to_string(),
            }
        } else {
            NarrateError::Io(e)
        }
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        // espeak-ng reads stdin line by line; the last line needs its terminator.
        stdin.write_all(stdin_payload(text).as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(NarrateError::EngineFailed(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }
    Ok(())
}

fn stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// espeak-ng voice name for a language code and voice id.
pub fn espeak_voice(lang: &str, voice: &str) -> String {
    let language = match lang {
        "a" => "en-us",
        "b" => "en-gb",
        "e" => "es",
        "f" => "fr-fr",
        "h" => "hi",
        "i" => "it",
        "j" => "ja",
        "p" => "pt-br",
        "z" => "cmn",
        other if other.len() > 1 => other,
        other => {
            log::warn!("Unknown language code {other:?}, using en-us");
            "en-us"
        }
    };
    match voice.chars().nth(1) {
        Some('f') => format!("{language}+f3"),
        Some('m') => format!("{language}+m3"),
        _ => language.to_string(),
    }
}

fn words_per_minute(speed: f32) -> u32 {
    (BASE_WPM * speed).clamp(MIN_WPM, MAX_WPM).round() as u32
}

/// Split text into chunks of at most `max_chars` characters, breaking after
/// sentence punctuation where possible and at word boundaries otherwise.
///
/// A single word longer than `max_chars` becomes its own oversized chunk.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split_inclusive(['.', '!', '?']) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        for piece in wrap_words(sentence, max_chars) {
            if !current.is_empty() && char_len(&current) + 1 + char_len(&piece) > max_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn wrap_words(sentence: &str, max_chars: usize) -> Vec<String> {
    if char_len(sentence) <= max_chars {
        return vec![sentence.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in sentence.split_whitespace() {
        if !current.is_empty() && char_len(&current) + 1 + char_len(word) > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_short_sentences_together() {
        let chunks = chunk_text("Hello. World! How are you?", 400);
        assert_eq!(chunks, vec!["Hello. World! How are you?"]);
    }

    #[test]
    fn splits_at_sentence_boundaries_when_full() {
        let chunks = chunk_text("One two. Three four. Five six.", 12);
        assert_eq!(chunks, vec!["One two.", "Three four.", "Five six."]);
    }

    #[test]
    fn wraps_long_sentences_at_words() {
        let long = "word ".repeat(200);
        let chunks = chunk_text(long.trim(), 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "{chunk:?}");
        }
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, long.trim());
    }

    #[test]
    fn keeps_trailing_text_without_punctuation() {
        assert_eq!(chunk_text("Done. And then", 400), vec!["Done. And then"]);
        assert!(chunk_text("   \n ", 400).is_empty());
    }

    #[test]
    fn maps_language_codes_and_voice_gender() {
        assert_eq!(espeak_voice("a", "af_heart"), "en-us+f3");
        assert_eq!(espeak_voice("b", "bm_george"), "en-gb+m3");
        assert_eq!(espeak_voice("z", "z"), "cmn");
        assert_eq!(espeak_voice("de", "x"), "de");
        assert_eq!(espeak_voice("?", ""), "en-us");
    }

    #[test]
    fn speed_scales_words_per_minute() {
        assert_eq!(words_per_minute(1.0), 175);
        assert_eq!(words_per_minute(2.0), 350);
        assert_eq!(words_per_minute(0.1), 80);
        assert_eq!(words_per_minute(10.0), 450);
    }

    #[test]
    fn appends_trailing_newline_for_stdin() {
        assert_eq!(stdin_payload("America"), "America\n");
        assert_eq!(stdin_payload("America\n"), "America\n");
    }

    #[test]
    fn missing_binary_is_reported() {
        let mut source =
            EspeakSource::with_espeak(Some(PathBuf::from("/nonexistent/espeak-ng")), None);
        let mut chunks = source
            .chunks("Hello.", &SynthesisParams::default())
            .unwrap();
        let err = chunks.next().unwrap().unwrap_err();
        assert!(matches!(err, NarrateError::EngineNotFound { .. }));
    }

    #[test]
    fn synthesizes_one_chunk_per_segment() {
        // Skip when espeak-ng is unavailable in the execution environment.
        if Command::new("espeak-ng").arg("--version").output().is_err() {
            return;
        }

        let mut source = EspeakSource::new().max_chars(20);
        let chunks: Vec<ChunkResult> = source
            .chunks("First sentence. Second sentence.", &SynthesisParams::default())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.samples.is_some()));
        assert_eq!(chunks[0].graphemes, "First sentence.".len());
    }
}
