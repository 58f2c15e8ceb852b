//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// drumless - Remove drums from a folder of tracks
///
/// Separates every supported audio file under the folder into stems, remixes
/// everything except the drums into "<name> - Drumless.flac" with the original
/// tags and artwork, and applies ReplayGain. Questions not answered by flags
/// are asked interactively.
#[derive(Parser, Debug)]
#[command(name = "drumless")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Folder to process (searched recursively)
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Stem separation model file name (skips the model question)
    #[arg(long, value_name = "NAME", env = "DRUMLESS_MODEL")]
    pub model: Option<String>,

    /// Treat the folder as a compilation (skips the compilation question)
    #[arg(long, value_name = "BOOL")]
    pub compilation: Option<bool>,

    /// Also write normalised MP3s (skips the normalisation question)
    #[arg(long, value_name = "BOOL")]
    pub normalise: Option<bool>,

    /// Dry run - list tracks and planned outputs without processing
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (warnings only)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Hide the progress bar
    #[arg(long, default_value = "false")]
    pub no_progress: bool,
}

impl Cli {
    /// Log filter derived from the verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
