//! drumless - Batch drum removal for music folders
//!
//! Walks a folder of audio files, separates each track into stems, remixes
//! every stem except the drums into a lossless "<name> - Drumless.flac" that
//! carries the original tags and artwork, and applies ReplayGain. Optionally
//! writes peak-normalised MP3 copies beside each output.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing, interactive prompts, runtime settings
//! - `discovery`: Recursive scan for supported audio files
//! - `separation`: Stem separation behind the [`separation::StemSeparator`] trait
//! - `engine`: ffmpeg and rsgain adapters behind a process runner seam
//! - `metadata`: Tag and artwork propagation
//! - `pipeline`: Sequential per-track orchestration and normalisation
//!
//! # Example
//!
//! ```no_run
//! use drumless::{config::Settings, pipeline};
//!
//! let settings = Settings::default();
//! let result = pipeline::run(&settings).expect("Processing failed");
//! println!("Created {} drumless tracks", result.successful);
//! ```

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod separation;
pub mod types;

// Re-export key types at crate root
pub use error::{DrumlessError, Result};
pub use types::{AlbumContext, AudioFormat, SeparationModel, StemLabel, StemSet, Track};
