//! File discovery and scanning

use crate::error::{DrumlessError, Result};
use crate::types::{AudioFormat, Track, NORMALISED_DIR, SEPARATED_DIR};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Lowercase extensions of every supported input container
pub fn supported_extensions() -> HashSet<String> {
    AudioFormat::ALL
        .iter()
        .map(|f| f.extension().to_string())
        .collect()
}

/// Scan the run root for supported audio files
pub fn scan(root: &Path) -> Result<Vec<Track>> {
    let paths = discover(root, &supported_extensions())?;

    let tracks: Vec<Track> = paths
        .into_iter()
        .filter_map(|relative| try_discover_track(root, relative))
        .collect();

    info!("Discovered {} audio files", tracks.len());

    if tracks.is_empty() {
        warn!("No supported audio files found in {}", root.display());
    }

    Ok(tracks)
}

/// Recursively list files under `root` whose extension is in `extensions`
///
/// Folders the tool generates itself (`separated`, `Normalised*`) are pruned
/// at every depth. Paths are relative to `root` and sorted case-insensitively
/// so repeated runs process tracks in the same order.
pub fn discover(root: &Path, extensions: &HashSet<String>) -> Result<Vec<PathBuf>> {
    // The root itself must be readable; anything below it is best-effort.
    std::fs::read_dir(root).map_err(|e| DrumlessError::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_generated_entry(entry));

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            debug!("Discovered: {}", relative.display());
            paths.push(relative.to_path_buf());
        }
    }

    paths.sort_by_key(|p| p.to_string_lossy().to_lowercase());
    Ok(paths)
}

/// Whether a directory name belongs to the tool's own output
pub fn is_generated_dir(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == SEPARATED_DIR || lower.starts_with(&NORMALISED_DIR.to_lowercase())
}

fn is_generated_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(is_generated_dir)
            .unwrap_or(false)
}

/// Build a Track if the relative path still points at a supported file
fn try_discover_track(root: &Path, relative_path: PathBuf) -> Option<Track> {
    let format = AudioFormat::from_path(&relative_path)?;
    let metadata = std::fs::metadata(root.join(&relative_path)).ok()?;

    Some(Track {
        relative_path,
        format,
        size_bytes: metadata.len(),
    })
}
