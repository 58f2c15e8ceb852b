//! Unified error types for drumless
//!
//! Error strategy:
//! - Per-track errors (separation, peak detection, merge, remux): Recoverable,
//!   clean up scratch artifacts, skip the track and continue
//! - Best-effort errors (artwork, tags, loudness): Logged, output is kept
//! - System errors (missing tools, unreadable root): Fatal, abort the run
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Supported input formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "FLAC, WAV, M4A, MP4, MP3, ALAC";

/// Top-level error type for drumless operations
#[derive(Debug, Error)]
pub enum DrumlessError {
    // =========================================================================
    // Recoverable errors - clean up, skip track, continue batch
    // =========================================================================
    #[error("Stem separation failed for '{path}': {reason}\n  Tip: Check the model name is valid and the file plays in other apps")]
    SeparationFailed { path: PathBuf, reason: String },

    #[error("Could not detect peak level for '{path}'")]
    PeakUndetected { path: PathBuf },

    #[error("Failed to merge stems into '{path}': {reason}")]
    MergeFailed { path: PathBuf, reason: String },

    #[error("Failed to copy metadata into '{path}': {reason}")]
    RemuxFailed { path: PathBuf, reason: String },

    #[error("Failed to normalise and convert '{path}' to MP3: {reason}")]
    TranscodeFailed { path: PathBuf, reason: String },

    // =========================================================================
    // Best-effort errors - warn and keep the output
    // =========================================================================
    #[error("Metadata error for '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    Metadata { path: PathBuf, reason: String },

    #[error("No artwork found in '{0}'")]
    NoArtwork(PathBuf),

    #[error("ReplayGain scan failed: {reason}")]
    LoudnessFailed { reason: String },

    #[error("Failed to launch '{program}': {reason}")]
    CommandSpawn { program: String, reason: String },

    // =========================================================================
    // Fatal errors - abort entire run
    // =========================================================================
    #[error("'{tool}' not found in PATH.\n  Tip: {hint}")]
    MissingDependency { tool: String, hint: String },

    #[error("Cannot read input folder '{path}': {reason}")]
    RootUnreadable { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for drumless operations
pub type Result<T> = std::result::Result<T, DrumlessError>;

impl DrumlessError {
    /// Returns true if this error abandons one track but lets the run continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DrumlessError::SeparationFailed { .. }
                | DrumlessError::PeakUndetected { .. }
                | DrumlessError::MergeFailed { .. }
                | DrumlessError::RemuxFailed { .. }
                | DrumlessError::TranscodeFailed { .. }
                | DrumlessError::CommandSpawn { .. }
        )
    }

    /// Returns true if nothing can proceed after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DrumlessError::MissingDependency { .. }
                | DrumlessError::RootUnreadable { .. }
                | DrumlessError::ConfigError(_)
        )
    }

    /// Create a missing dependency error with an install hint
    pub fn missing_dependency(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        DrumlessError::MissingDependency {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Create a metadata error for a file
    pub fn metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DrumlessError::Metadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Attach the file whose tags were being read or written
    fn with_file_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn with_file_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| DrumlessError::Metadata {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
