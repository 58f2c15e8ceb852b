//! Separation trait abstraction
//!
//! The pipeline only needs "file + labels in, stem files out"; the model
//! behind it is swappable, and tests substitute a fake that writes canned
//! stems.

use crate::error::Result;
use crate::types::{StemLabel, StemSet};
use std::path::Path;

/// Stem separation backend
pub trait StemSeparator {
    /// Separate `input_path` into the requested stems
    ///
    /// # Arguments
    /// * `input_path` - Path to the source audio file
    /// * `output_dir` - Scratch directory to write stem files into
    /// * `labels` - Stems to request
    ///
    /// # Returns
    /// The stem files written for this track
    fn separate(&self, input_path: &Path, output_dir: &Path, labels: &[StemLabel])
        -> Result<StemSet>;

    /// Get the name of this separator (for logging)
    fn name(&self) -> &str;
}
