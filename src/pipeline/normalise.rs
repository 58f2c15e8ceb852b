//! Normalised MP3 derivatives
//!
//! Each drumless master gets a peak-normalised V0 MP3 in a `Normalised`
//! folder beside it, carrying the master's tags and artwork.

use super::orchestrator::stamp_reference_tags_all;
use crate::engine::ffmpeg::normalisation_gain;
use crate::engine::{AudioEngine, LoudnessTool};
use crate::error::{DrumlessError, Result};
use crate::metadata;
use crate::types::{NORMALISED_DIR, TARGET_PEAK_DB};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// `Normalised/<stem>.mp3` beside `master`
pub fn normalised_path(master: &Path) -> PathBuf {
    let dir = master
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(NORMALISED_DIR);
    let stem = master
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{}.mp3", stem))
}

/// Transcode `master` to `output` with its peak moved to the target ceiling
fn normalise_to_mp3(engine: &AudioEngine, master: &Path, output: &Path) -> Result<()> {
    let peak = engine
        .detect_file_peak(master)
        .ok_or_else(|| DrumlessError::PeakUndetected {
            path: master.to_path_buf(),
        })?;

    let gain = normalisation_gain(peak);
    info!(
        "  Current peak: {:.2}dB, Target: {:.2}dB, Adjustment: {:.2}dB",
        peak, TARGET_PEAK_DB, gain
    );

    engine.transcode_mp3(master, output, gain)
}

/// Build normalised MP3s for `masters`, then apply ReplayGain to them
///
/// Masters that are missing or fail to transcode are skipped. A failed tag
/// copy only warns; the MP3 is still kept and returned.
pub fn process_normalisation(
    masters: &[PathBuf],
    is_compilation: bool,
    engine: &AudioEngine,
    loudness: &LoudnessTool,
) -> Vec<PathBuf> {
    info!("=== Starting Normalisation Process ===");

    let mut created_dirs: HashSet<PathBuf> = HashSet::new();
    let mut normalised = Vec::new();

    for master in masters {
        if !master.exists() {
            warn!("Skipping missing file: {}", master.display());
            continue;
        }

        let output = normalised_path(master);
        if let Some(dir) = output.parent() {
            if !created_dirs.contains(dir) {
                if let Err(e) = fs::create_dir_all(dir) {
                    warn!("Cannot create {}: {}", dir.display(), e);
                    continue;
                }
                info!("Created '{}' folder in {}", NORMALISED_DIR, dir.display());
                created_dirs.insert(dir.to_path_buf());
            }
        }

        info!("Normalising: {}", master.display());
        if let Err(e) = normalise_to_mp3(engine, master, &output) {
            warn!("{}", e);
            continue;
        }

        if let Err(e) = metadata::copy_flac_tags_to_mp3(master, &output) {
            warn!("Failed to copy tags to {}: {}", output.display(), e);
        }

        normalised.push(output);
    }

    if !normalised.is_empty() {
        if is_compilation {
            for path in &normalised {
                if let Err(e) = loudness.apply_track(path) {
                    warn!("{}", e);
                }
            }
        } else if let Err(e) = loudness.apply_album(&normalised) {
            warn!("{}", e);
        }

        stamp_reference_tags_all(&normalised);
    }

    info!("Created {} normalised MP3 files", normalised.len());
    normalised
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalised_path_beside_master() {
        let master = PathBuf::from("/music/Album/Song - Drumless.flac");
        assert_eq!(
            normalised_path(&master),
            PathBuf::from("/music/Album/Normalised/Song - Drumless.mp3")
        );
    }

    #[test]
    fn test_normalised_path_keeps_inner_dots() {
        let master = PathBuf::from("/music/feat. Someone - Drumless.flac");
        assert_eq!(
            normalised_path(&master),
            PathBuf::from("/music/Normalised/feat. Someone - Drumless.mp3")
        );
    }
}
