//! rsgain adapter
//!
//! Writes ReplayGain tags at a -23 LUFS target with peak clip protection.
//! The scanner does not write `REPLAYGAIN_REFERENCE_LOUDNESS` or
//! `REPLAYGAIN_ALGORITHM`; callers stamp those afterwards.

use super::runner::{CommandRequest, CommandRunner};
use crate::error::{DrumlessError, Result};
use crate::types::TARGET_LOUDNESS_LUFS;
use std::path::{Path, PathBuf};
use tracing::info;

/// rsgain executable name
pub const RSGAIN_COMMAND: &str = "rsgain";

/// ReplayGain scanner invoked in custom mode
pub struct LoudnessTool<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> LoudnessTool<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn request(&self) -> CommandRequest {
        CommandRequest::new(RSGAIN_COMMAND).args([
            "custom".to_string(),
            "--tagmode=i".to_string(),
            format!("--loudness={}", TARGET_LOUDNESS_LUFS),
            "--clip-mode=p".to_string(),
            "--max-peak=0".to_string(),
            "--true-peak".to_string(),
            "--id3v2-version=keep".to_string(),
        ])
    }

    fn run(&self, request: CommandRequest) -> Result<()> {
        let output = self
            .runner
            .run(&request)
            .map_err(|e| DrumlessError::LoudnessFailed {
                reason: e.to_string(),
            })?;

        if output.success {
            Ok(())
        } else {
            Err(DrumlessError::LoudnessFailed {
                reason: output.failure_summary(),
            })
        }
    }

    /// Scan one file as its own album
    pub fn apply_track(&self, path: &Path) -> Result<()> {
        info!("Applying ReplayGain (track mode) to {}", path.display());
        self.run(self.request().arg(path))
    }

    /// Scan files jointly so relative gain across the album is preserved
    pub fn apply_album(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        info!("Applying ReplayGain (album mode) to {} files", paths.len());
        self.run(self.request().arg("--album").args(paths))
    }
}
