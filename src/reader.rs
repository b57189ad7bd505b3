//! Document ingestion with encoding fallback.
//!
//! Candidate encodings are tried in a fixed order: UTF-8, UTF-16, Latin-1,
//! ASCII. Only a decode failure moves on to the next candidate; any I/O
//! error (including a missing file) is returned straight away.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::error::{NarrateError, Result};

/// Text encodings tried when decoding a document, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16,
    Latin1,
    Ascii,
}

impl Encoding {
    pub const CANDIDATES: [Encoding; 4] = [
        Encoding::Utf8,
        Encoding::Utf16,
        Encoding::Latin1,
        Encoding::Ascii,
    ];

    /// Decode `bytes`, returning `None` when they are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Encoding::Utf16 => decode_utf16(bytes),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16 => "utf-16",
            Encoding::Latin1 => "latin-1",
            Encoding::Ascii => "ascii",
        }
    }
}

/// UTF-16 with an optional byte-order mark; little-endian when there is none.
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };
    if body.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Path(PathBuf),
    Stream,
}

impl Origin {
    fn display_path(&self) -> PathBuf {
        match self {
            Origin::Path(path) => path.clone(),
            Origin::Stream => PathBuf::from("<stdin>"),
        }
    }
}

/// A decoded input document.
#[derive(Debug, Clone)]
pub struct Document {
    pub origin: Origin,
    pub raw: Vec<u8>,
    pub encoding: Encoding,
    pub text: String,
    pub is_markdown: bool,
}

impl Document {
    /// Read and decode the file at `path`.
    ///
    /// The Markdown flag is derived from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let (raw, encoding, text) = read_with_fallback(path)?;
        Ok(Self {
            origin: Origin::Path(path.to_path_buf()),
            raw,
            encoding,
            text,
            is_markdown: is_markdown_path(path),
        })
    }

    /// Read and decode everything from `reader`. Streams are treated as plain text.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let origin = Origin::Stream;
        let (encoding, text) =
            decode_first(&raw).ok_or_else(|| NarrateError::DecodingExhausted {
                path: origin.display_path(),
            })?;
        Ok(Self {
            origin,
            raw,
            encoding,
            text,
            is_markdown: false,
        })
    }

    /// Override the extension-derived Markdown flag.
    pub fn with_markdown(mut self, is_markdown: bool) -> Self {
        self.is_markdown = is_markdown;
        self
    }
}

/// Read a text file, trying each candidate encoding in turn.
pub fn read_text_file(path: &Path) -> Result<String> {
    read_with_fallback(path).map(|(_, _, text)| text)
}

/// Decode an arbitrary stream through the same encoding chain as files.
pub fn read_stream<R: Read>(reader: R) -> Result<String> {
    Document::from_reader(reader).map(|doc| doc.text)
}

/// True for `.md` and `.markdown` files, ignoring case.
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

fn read_with_fallback(path: &Path) -> Result<(Vec<u8>, Encoding, String)> {
    for encoding in Encoding::CANDIDATES {
        // Every attempt is a full re-read of the file.
        let raw = fs::read(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                NarrateError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                NarrateError::Io(e)
            }
        })?;
        match encoding.decode(&raw) {
            Some(text) => {
                log::debug!("Decoded {} as {}", path.display(), encoding.name());
                return Ok((raw, encoding, text));
            }
            None => log::debug!("{} is not valid {}", path.display(), encoding.name()),
        }
    }
    Err(NarrateError::DecodingExhausted {
        path: path.to_path_buf(),
    })
}

fn decode_first(raw: &[u8]) -> Option<(Encoding, String)> {
    Encoding::CANDIDATES
        .into_iter()
        .find_map(|encoding| encoding.decode(raw).map(|text| (encoding, text)))
}
