use std::path::PathBuf;

/// Errors raised while turning a document into audio.
#[derive(thiserror::Error, Debug)]
pub enum NarrateError {
    #[error("Input file '{}' not found.", path.display())]
    FileNotFound { path: PathBuf },
    #[error("Could not decode file {} with any supported encoding", path.display())]
    DecodingExhausted { path: PathBuf },
    #[error("Input file is empty or contains no readable text.")]
    EmptyNormalizedText,
    #[error("No audio was generated.")]
    NoAudioGenerated,
    #[error("No audio files to concatenate")]
    NoAudioToAssemble,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error(
        "TTS engine '{program}' not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EngineNotFound { program: String },
    #[error("TTS engine failed: {0}")]
    EngineFailed(String),
    #[error("Invalid options: {0}")]
    Options(String),
    /// A run failed after its scratch directory was kept on request.
    #[error("{source} (temporary files kept in: {})", scratch_dir.display())]
    ScratchRetained {
        #[source]
        source: Box<NarrateError>,
        scratch_dir: PathBuf,
    },
}

impl NarrateError {
    /// The kept scratch directory of a failed run, if there is one.
    pub fn scratch_dir(&self) -> Option<&std::path::Path> {
        match self {
            NarrateError::ScratchRetained { scratch_dir, .. } => Some(scratch_dir),
            _ => None,
        }
    }
}

impl From<crate::pipeline::NarrationOptionsBuilderError> for NarrateError {
    fn from(e: crate::pipeline::NarrationOptionsBuilderError) -> Self {
        NarrateError::Options(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NarrateError>;
