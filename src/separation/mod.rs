//! Stem separation

pub mod audio_separator;
pub mod traits;

pub use audio_separator::{AudioSeparatorCli, AUDIO_SEPARATOR_COMMAND};
pub use traits::StemSeparator;
