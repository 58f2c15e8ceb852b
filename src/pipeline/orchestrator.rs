//! Pipeline orchestration
//!
//! Tracks are processed strictly one at a time: the separation scratch
//! directory and the per-directory staging file are shared paths, so a track
//! must start and finish with both absent. Stage failures abandon only the
//! current track.

use super::normalise;
use super::scratch::Scratch;
use crate::config::Settings;
use crate::discovery;
use crate::engine::ffmpeg::clip_protection_gain;
use crate::engine::{AudioEngine, CommandRunner, LoudnessTool, SystemRunner};
use crate::error::{DrumlessError, Result};
use crate::metadata;
use crate::separation::{AudioSeparatorCli, StemSeparator};
use crate::types::{AlbumContext, SeparationModel, StemLabel, Track, SEPARATED_DIR};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pipeline result summary
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub total_files: usize,
    pub successful: usize,
    pub skipped: usize,
    /// Drumless masters, in processing order
    pub outputs: Vec<PathBuf>,
    /// Normalised MP3 derivatives
    pub normalised: Vec<PathBuf>,
}

/// Per-track pipeline position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Separated,
    PeakDetected,
    Merged,
    Remuxed,
    Tagged,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovered => "discovered",
            Stage::Separated => "separated",
            Stage::PeakDetected => "peak detected",
            Stage::Merged => "merged",
            Stage::Remuxed => "remuxed",
            Stage::Tagged => "tagged",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A track abandoned after reaching `stage`
#[derive(Debug)]
pub struct TrackFailure {
    pub stage: Stage,
    pub error: DrumlessError,
}

/// Tracks one file's progress through the stages
struct TrackRun<'t> {
    track: &'t Track,
    stage: Stage,
}

impl<'t> TrackRun<'t> {
    fn new(track: &'t Track) -> Self {
        Self {
            track,
            stage: Stage::Discovered,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(
            "{}: {} -> {}",
            self.track.relative_path.display(),
            self.stage,
            next
        );
        self.stage = next;
    }

    fn fail(&self, error: DrumlessError) -> TrackFailure {
        TrackFailure {
            stage: self.stage,
            error,
        }
    }
}

/// Run the full pipeline with real external tools
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let runner = SystemRunner;
    let separator = AudioSeparatorCli::new(&runner, settings.model.clone());
    run_with(settings, &separator, &runner)
}

/// Run the pipeline with the given separator and command runner
pub fn run_with(
    settings: &Settings,
    separator: &dyn StemSeparator,
    runner: &dyn CommandRunner,
) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    info!("Scanning for audio files...");
    let tracks = discovery::scan(&settings.root)?;

    if tracks.is_empty() {
        return Ok(PipelineResult::default());
    }

    if settings.dry_run {
        return Ok(run_dry_run(&tracks, settings));
    }

    let pipeline = Pipeline::new(settings, separator, runner);
    let mut result = pipeline.process_all(&tracks);

    info!("Main processing complete");

    if settings.context.create_normalised && !result.outputs.is_empty() {
        result.normalised = normalise::process_normalisation(
            &result.outputs,
            settings.context.is_compilation,
            &pipeline.engine,
            &pipeline.loudness,
        );
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(result)
}

/// Dry run mode - show tracks and planned outputs without processing
fn run_dry_run(tracks: &[Track], settings: &Settings) -> PipelineResult {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    let mut by_directory: BTreeMap<PathBuf, Vec<&Track>> = BTreeMap::new();
    for track in tracks {
        by_directory
            .entry(track.relative_dir().to_path_buf())
            .or_default()
            .push(track);
    }

    for (dir, dir_tracks) in &by_directory {
        let shown = if dir.as_os_str().is_empty() {
            ".".to_string()
        } else {
            dir.display().to_string()
        };
        println!("{}/ ({} files)", shown, dir_tracks.len());
        for track in dir_tracks {
            println!(
                "  {} -> {}",
                track.relative_path.display(),
                track.output_relative_path().display()
            );
        }
        println!();
    }

    println!("Would process {} files with {}", tracks.len(), settings.model);
    if settings.context.is_compilation {
        println!("  Compilation: ReplayGain per track, album artist \"Various Artists\"");
    } else {
        println!("  Album: ReplayGain across all outputs");
    }
    if settings.context.create_normalised {
        println!("  Normalised MP3s in a \"Normalised\" folder beside each output");
    }
    println!();

    PipelineResult {
        total_files: tracks.len(),
        skipped: tracks.len(),
        ..Default::default()
    }
}

/// Collaborators for one run
pub(crate) struct Pipeline<'a> {
    root: PathBuf,
    scratch_dir: PathBuf,
    model: &'a SeparationModel,
    context: AlbumContext,
    show_progress: bool,
    separator: &'a dyn StemSeparator,
    pub(crate) engine: AudioEngine<'a>,
    pub(crate) loudness: LoudnessTool<'a>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(
        settings: &'a Settings,
        separator: &'a dyn StemSeparator,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            root: settings.root.clone(),
            scratch_dir: settings.root.join(SEPARATED_DIR),
            model: &settings.model,
            context: settings.context,
            show_progress: settings.show_progress,
            separator,
            engine: AudioEngine::new(runner),
            loudness: LoudnessTool::new(runner),
        }
    }

    /// Process every track, then apply album loudness for non-compilations
    fn process_all(&self, tracks: &[Track]) -> PipelineResult {
        // Held for the whole run: removes stale and final scratch output
        let run_scratch = Scratch::dir(&self.scratch_dir);
        run_scratch.remove();

        info!(
            "Processing {} files with {} ({})",
            tracks.len(),
            self.model,
            if self.context.is_compilation {
                "compilation"
            } else {
                "album"
            }
        );

        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(tracks.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut result = PipelineResult {
            total_files: tracks.len(),
            ..Default::default()
        };

        for track in tracks {
            if let Some(ref pb) = progress_bar {
                pb.set_message(track.file_stem());
            }

            match self.process_track(track) {
                Ok(output) => {
                    info!("Created {}", output.display());
                    result.outputs.push(output);
                    result.successful += 1;
                }
                Err(failure) => {
                    warn!(
                        "Skipping {} (stopped after {}): {}",
                        track.relative_path.display(),
                        failure.stage,
                        failure.error
                    );
                    result.skipped += 1;
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Separation complete");
        }

        if !self.context.is_compilation && !result.outputs.is_empty() {
            if let Err(e) = self.loudness.apply_album(&result.outputs) {
                warn!("{}", e);
            }
            stamp_reference_tags_all(&result.outputs);
        }

        drop(run_scratch);
        result
    }

    /// Take one track from Discovered to Done
    ///
    /// Both guards are dropped on every return path, so neither the scratch
    /// directory nor the staging file survives the call.
    fn process_track(&self, track: &Track) -> std::result::Result<PathBuf, TrackFailure> {
        let source = self.root.join(&track.relative_path);
        let output = self.root.join(track.output_relative_path());
        let mut run = TrackRun::new(track);

        info!("Processing: {}", track.relative_path.display());

        let scratch = Scratch::dir(&self.scratch_dir);
        let stems = self
            .separator
            .separate(&source, scratch.path(), &StemLabel::ALL)
            .map_err(|e| run.fail(e))?;
        debug!("{} stems from {}", stems.len(), self.separator.name());
        run.advance(Stage::Separated);

        let peak = self
            .engine
            .detect_mix_peak(scratch.path())
            .ok_or_else(|| {
                run.fail(DrumlessError::PeakUndetected {
                    path: source.clone(),
                })
            })?;
        run.advance(Stage::PeakDetected);

        let gain_db = clip_protection_gain(peak);
        match gain_db {
            Some(gain) => info!(
                "Peak detected at {}dB. Applying {}dB reduction to prevent clipping.",
                peak, gain
            ),
            None => info!("Peak at {}dB - no clipping protection needed.", peak),
        }

        let staging = Scratch::file(self.root.join(track.staging_relative_path()));
        self.engine
            .merge(scratch.path(), staging.path(), gain_db)
            .map_err(|e| run.fail(e))?;
        run.advance(Stage::Merged);

        let previous_output = output.exists();
        if let Err(e) = self.engine.remux_metadata(
            &source,
            staging.path(),
            &output,
            self.context.is_compilation,
        ) {
            // Only a master this run started writing is discarded
            if !previous_output {
                Scratch::file(&output).remove();
            }
            return Err(run.fail(e));
        }
        run.advance(Stage::Remuxed);

        if self.context.is_compilation {
            if let Err(e) = self.loudness.apply_track(&output) {
                warn!("{}", e);
            }
        }

        drop(staging);
        drop(scratch);

        self.tag_output(&source, &output);
        run.advance(Stage::Tagged);

        run.advance(Stage::Done);
        Ok(output)
    }

    /// Best-effort artwork copy and the fixed descriptive tag block
    fn tag_output(&self, source: &Path, output: &Path) {
        match metadata::copy_artwork(source, output) {
            Ok(count) => debug!("Copied {} pictures", count),
            Err(e) => warn!("Artwork not copied: {}", e),
        }

        // Written last so nothing from the remux overrides it
        if let Err(e) = metadata::set_tags(output, &metadata::drumless_tags(self.model)) {
            warn!("Error setting tags on {}: {}", output.display(), e);
        }
    }
}

/// Stamp reference loudness tags on every file, logging failures
pub(crate) fn stamp_reference_tags_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = metadata::stamp_reference_tags(path) {
            warn!(
                "Failed to add ReplayGain reference tags to {}: {}",
                path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_run_failure_records_last_stage() {
        let track = Track {
            relative_path: PathBuf::from("a.flac"),
            format: crate::types::AudioFormat::Flac,
            size_bytes: 0,
        };
        let mut run = TrackRun::new(&track);
        run.advance(Stage::Separated);
        let failure = run.fail(DrumlessError::PeakUndetected {
            path: PathBuf::from("a.flac"),
        });
        assert_eq!(failure.stage, Stage::Separated);
        assert!(failure.error.is_recoverable());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::PeakDetected.to_string(), "peak detected");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
