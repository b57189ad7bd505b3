//! Chunk sources backed by concrete speech synthesizers.
//!
//! # Available Engines
//!
//! - `espeak` - espeak-ng command-line synthesizer (binary must be installed)

pub mod espeak;
