//! External command-line tools
//!
//! Adapters build [`CommandRequest`]s and interpret [`CommandOutput`]s; the
//! [`CommandRunner`] seam decides whether a real process is spawned.

pub mod dependencies;
pub mod ffmpeg;
pub mod loudness;
pub mod runner;

pub use dependencies::check_dependencies;
pub use ffmpeg::AudioEngine;
pub use loudness::LoudnessTool;
pub use runner::{CommandOutput, CommandRequest, CommandRunner, SystemRunner};
