//! `audio-separator` command-line backend
//!
//! Runs the model once per track, asking for one WAV per label named after
//! the label (`vocals.wav`, `drums.wav`, ...), then collects whichever of
//! those files the model actually produced.

use super::traits::StemSeparator;
use crate::engine::runner::{CommandRequest, CommandRunner};
use crate::error::{DrumlessError, Result};
use crate::types::{SeparationModel, StemLabel, StemSet};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// audio-separator executable name
pub const AUDIO_SEPARATOR_COMMAND: &str = "audio-separator";

/// Separator backed by the `audio-separator` CLI
pub struct AudioSeparatorCli<'a> {
    runner: &'a dyn CommandRunner,
    model: SeparationModel,
}

impl<'a> AudioSeparatorCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, model: SeparationModel) -> Self {
        Self { runner, model }
    }

    /// Build the separation request for one input
    pub fn request(
        &self,
        input_path: &Path,
        output_dir: &Path,
        labels: &[StemLabel],
    ) -> Result<CommandRequest> {
        let names: BTreeMap<StemLabel, &str> =
            labels.iter().map(|l| (*l, l.file_stem())).collect();
        let names = serde_json::to_string(&names)
            .map_err(|e| DrumlessError::ConfigError(format!("stem name map: {}", e)))?;

        Ok(CommandRequest::new(AUDIO_SEPARATOR_COMMAND)
            .arg(input_path)
            .args(["--model_filename", self.model.filename()])
            .args(["--output_format", "WAV"])
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--custom_output_names")
            .arg(names))
    }
}

/// Collect `<label>.wav` files present in `output_dir`
pub fn collect_stems(output_dir: &Path, labels: &[StemLabel]) -> StemSet {
    let stems = labels
        .iter()
        .filter_map(|label| {
            let path = output_dir.join(format!("{}.wav", label.file_stem()));
            path.is_file().then_some((*label, path))
        })
        .collect();
    StemSet { stems }
}

impl StemSeparator for AudioSeparatorCli<'_> {
    fn separate(
        &self,
        input_path: &Path,
        output_dir: &Path,
        labels: &[StemLabel],
    ) -> Result<StemSet> {
        let failed = |reason: String| DrumlessError::SeparationFailed {
            path: input_path.to_path_buf(),
            reason,
        };

        let request = self.request(input_path, output_dir, labels)?;
        let output = self
            .runner
            .run(&request)
            .map_err(|e| failed(e.to_string()))?;
        if !output.success {
            return Err(failed(output.failure_summary()));
        }

        let stems = collect_stems(output_dir, labels);
        if stems.is_empty() {
            return Err(failed(format!(
                "no stems written to {}",
                output_dir.display()
            )));
        }

        debug!(
            "{} stems for {}: {:?}",
            stems.len(),
            input_path.display(),
            stems.stems.keys().collect::<Vec<_>>()
        );
        info!(
            "Separated {} with {}",
            input_path.file_name().unwrap_or_default().to_string_lossy(),
            self.model
        );
        Ok(stems)
    }

    fn name(&self) -> &str {
        self.model.filename()
    }
}
