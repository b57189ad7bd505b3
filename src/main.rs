use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use narrate_rs::engines::espeak::{EspeakSource, DEFAULT_MAX_CHARS};
use narrate_rs::pipeline::default_output_path;
use narrate_rs::{
    Document, NarrateError, NarrationOptionsBuilder, NarrationReport, Narrator, SynthesisParams,
};

/// Convert text files to speech.
#[derive(Debug, Parser)]
#[command(name = "narrate", version)]
#[command(after_help = "Examples:
  narrate document.txt
  narrate README.md --voice af_bella --output my_audio.wav
  cat notes.txt | narrate - -o notes.wav")]
struct Cli {
    /// Input text file (.txt, .md, ...), or `-` to read standard input
    input: PathBuf,

    /// Output audio file path (default: input file name with .wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voice to use for TTS
    #[arg(short, long, default_value = "af_heart")]
    voice: String,

    /// Speech speed multiplier
    #[arg(short, long, default_value_t = 1.0)]
    speed: f32,

    /// Language code (a=American English, b=British English, etc.)
    #[arg(short, long, default_value = "a")]
    lang: String,

    /// Treat the input as Markdown regardless of its extension
    #[arg(long, conflicts_with = "plain")]
    markdown: bool,

    /// Never clean Markdown, even for .md files
    #[arg(long)]
    plain: bool,

    /// Keep temporary audio chunk files for debugging
    #[arg(long)]
    keep_temp: bool,

    /// Count chunks before generating so progress shows a total (synthesizes twice)
    #[arg(long)]
    progress: bool,

    /// Print a JSON run report on success
    #[arg(long)]
    json: bool,

    /// Maximum characters per synthesized chunk
    #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
    max_chars: usize,

    /// Path to the espeak-ng binary
    #[arg(long)]
    espeak_bin: Option<PathBuf>,

    /// espeak-ng data directory
    #[arg(long)]
    espeak_data: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&cli) {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => log::warn!("Could not serialise report: {e}"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Human-readable status goes to stdout unless a JSON report was asked for.
macro_rules! status {
    ($cli:expr, $($arg:tt)*) => {
        if !$cli.json {
            println!($($arg)*);
        }
    };
}

fn run(cli: &Cli) -> Result<NarrationReport, NarrateError> {
    let from_stdin = cli.input == Path::new("-");

    status!(cli, "Reading input...");
    let document = if from_stdin {
        Document::from_reader(std::io::stdin().lock())?
    } else {
        Document::from_path(&cli.input)?
    };

    let output = match &cli.output {
        Some(path) => path.clone(),
        None if from_stdin => PathBuf::from("output.wav"),
        None => default_output_path(&cli.input),
    };

    let mut builder = NarrationOptionsBuilder::default();
    builder
        .params(SynthesisParams {
            voice: cli.voice.clone(),
            speed: cli.speed,
            lang: cli.lang.clone(),
        })
        .keep_scratch(cli.keep_temp)
        .count_chunks(cli.progress);
    if cli.markdown || cli.plain {
        builder.markdown(cli.markdown);
    }
    let options = builder.build()?;

    let source = EspeakSource::with_espeak(cli.espeak_bin.clone(), cli.espeak_data.clone())
        .max_chars(cli.max_chars);
    let mut narrator = Narrator::new(source, options);

    status!(cli, "Generating audio chunks...");
    let mut progress = |index: usize, total: Option<usize>, graphemes: usize| {
        match total {
            Some(total) => status!(cli, "Generated chunk {}/{}: {} chars", index + 1, total, graphemes),
            None => status!(cli, "Generated chunk {}: {} chars", index + 1, graphemes),
        }
    };
    let report = narrator.narrate_document(&document, &output, &mut progress)?;

    status!(cli, "Generated {} audio chunks", report.chunk_count);
    status!(
        cli,
        "Audio saved to: {} ({:.1}s)",
        report.output.path.display(),
        report.output.duration_secs()
    );
    if let Some(dir) = &report.scratch_dir {
        status!(cli, "Temporary files kept in: {}", dir.display());
    }
    Ok(report)
}
