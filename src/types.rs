//! Core data types for drumless
//!
//! These types represent the domain model and flow through the pipeline.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// Fixed tag values
// =============================================================================

/// Integrated loudness target handed to the ReplayGain scanner
pub const TARGET_LOUDNESS_LUFS: i32 = -23;

/// Peak ceiling for merged stems and normalised MP3s (dBFS)
pub const TARGET_PEAK_DB: f64 = -0.1;

/// Value stamped into `REPLAYGAIN_REFERENCE_LOUDNESS`
pub const REFERENCE_LOUDNESS: &str = "-23 LUFS";

/// Value stamped into `REPLAYGAIN_ALGORITHM`
pub const LOUDNESS_ALGORITHM: &str = "ITU-R BS.1770";

/// Comment written to every drumless master; also the compilation album title
pub const DRUMLESS_COMMENT: &str = "Drumless (Lossless)";

/// Album artist forced onto compilation tracks
pub const COMPILATION_ALBUM_ARTIST: &str = "Various Artists";

/// Scratch directory the separator writes into, relative to the run root
pub const SEPARATED_DIR: &str = "separated";

/// Sibling folder holding normalised MP3 derivatives
pub const NORMALISED_DIR: &str = "Normalised";

/// Merged-audio staging file name, one per source directory
pub const STAGING_FILE: &str = "staging.flac";

/// Suffix appended to the source stem for the drumless master
pub const OUTPUT_SUFFIX: &str = " - Drumless";

// =============================================================================
// Supported formats
// =============================================================================

/// Input containers recognised by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AudioFormat {
    Flac,
    Wav,
    M4a,
    Mp4,
    Mp3,
    Alac,
}

impl AudioFormat {
    /// Every supported format, in the order they are listed to users
    pub const ALL: [AudioFormat; 6] = [
        AudioFormat::Flac,
        AudioFormat::Wav,
        AudioFormat::M4a,
        AudioFormat::Mp4,
        AudioFormat::Mp3,
        AudioFormat::Alac,
    ];

    /// Detect format from file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "flac" => Some(AudioFormat::Flac),
            "wav" => Some(AudioFormat::Wav),
            "m4a" => Some(AudioFormat::M4a),
            "mp4" => Some(AudioFormat::Mp4),
            "mp3" => Some(AudioFormat::Mp3),
            "alac" => Some(AudioFormat::Alac),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical lowercase extension
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Alac => "alac",
        }
    }

    /// Whether the container stores audio losslessly
    pub fn is_lossless(self) -> bool {
        matches!(self, AudioFormat::Flac | AudioFormat::Wav | AudioFormat::Alac)
    }

    /// MPEG-4 family containers carrying `covr` atoms
    pub fn is_mp4_family(self) -> bool {
        matches!(self, AudioFormat::M4a | AudioFormat::Mp4 | AudioFormat::Alac)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

// =============================================================================
// Tracks and stems
// =============================================================================

/// A discovered input file. Read-only once enumerated.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    /// Path relative to the run root
    pub relative_path: PathBuf,
    /// Container format derived from the extension
    pub format: AudioFormat,
    /// Size on disk at discovery time
    pub size_bytes: u64,
}

impl Track {
    /// Directory holding the track, relative to the run root
    pub fn relative_dir(&self) -> &Path {
        self.relative_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name without extension
    pub fn file_stem(&self) -> String {
        self.relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Relative path of the drumless master (`<stem> - Drumless.flac`)
    pub fn output_relative_path(&self) -> PathBuf {
        self.relative_dir()
            .join(format!("{}{}.flac", self.file_stem(), OUTPUT_SUFFIX))
    }

    /// Relative path of the staging artifact for this track's directory
    pub fn staging_relative_path(&self) -> PathBuf {
        self.relative_dir().join(STAGING_FILE)
    }
}

/// Stem labels requested from the separator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StemLabel {
    Vocals,
    Guitar,
    Piano,
    Drums,
    Bass,
    Other,
}

impl StemLabel {
    /// Full six-stem request, in the order the separator is asked for them
    pub const ALL: [StemLabel; 6] = [
        StemLabel::Vocals,
        StemLabel::Guitar,
        StemLabel::Piano,
        StemLabel::Drums,
        StemLabel::Bass,
        StemLabel::Other,
    ];

    /// Output file stem the separator is asked to use for this label
    pub fn file_stem(self) -> &'static str {
        match self {
            StemLabel::Vocals => "vocals",
            StemLabel::Guitar => "guitar",
            StemLabel::Piano => "piano",
            StemLabel::Drums => "drums",
            StemLabel::Bass => "bass",
            StemLabel::Other => "other",
        }
    }

    /// Label to output-name mapping, serialized as `{"Vocals": "vocals", ...}`
    pub fn output_names() -> BTreeMap<StemLabel, &'static str> {
        Self::ALL.iter().map(|l| (*l, l.file_stem())).collect()
    }
}

/// Separated stems for one track, keyed by label
#[derive(Debug, Clone, Default)]
pub struct StemSet {
    pub stems: BTreeMap<StemLabel, PathBuf>,
}

impl StemSet {
    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    pub fn get(&self, label: StemLabel) -> Option<&PathBuf> {
        self.stems.get(&label)
    }
}

// =============================================================================
// Run-scoped decisions
// =============================================================================

/// Stem separation model selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SeparationModel {
    HtDemucsFt,
    #[default]
    BsRoformerSw,
    Custom(String),
}

impl SeparationModel {
    /// Model file name passed to the separator
    pub fn filename(&self) -> &str {
        match self {
            SeparationModel::HtDemucsFt => "htdemucs_ft.yaml",
            SeparationModel::BsRoformerSw => "BS-Roformer-SW.ckpt",
            SeparationModel::Custom(name) => name,
        }
    }

    /// Build from a user-supplied name, recognising the presets
    pub fn from_name(name: &str) -> Self {
        match name {
            "htdemucs_ft.yaml" => SeparationModel::HtDemucsFt,
            "BS-Roformer-SW.ckpt" => SeparationModel::BsRoformerSw,
            other => SeparationModel::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for SeparationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filename())
    }
}

/// Decisions fixed once per invocation and applied to every track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlbumContext {
    /// Per-track loudness and forced "Various Artists" tagging
    pub is_compilation: bool,
    /// Produce normalised MP3 derivatives
    pub create_normalised: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_case_insensitive() {
        assert_eq!(AudioFormat::from_extension("FLAC"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::from_extension("M4a"), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_extension("ogg"), None);
    }

    #[test]
    fn test_output_path_is_always_flac() {
        let track = Track {
            relative_path: PathBuf::from("Album/B.wav"),
            format: AudioFormat::Wav,
            size_bytes: 0,
        };
        assert_eq!(
            track.output_relative_path(),
            PathBuf::from("Album/B - Drumless.flac")
        );
        assert_eq!(
            track.staging_relative_path(),
            PathBuf::from("Album/staging.flac")
        );
    }

    #[test]
    fn test_top_level_track_paths() {
        let track = Track {
            relative_path: PathBuf::from("A.flac"),
            format: AudioFormat::Flac,
            size_bytes: 0,
        };
        assert_eq!(track.relative_dir(), Path::new(""));
        assert_eq!(track.output_relative_path(), PathBuf::from("A - Drumless.flac"));
    }

    #[test]
    fn test_output_names_json() {
        let json = serde_json::to_string(&StemLabel::output_names()).unwrap();
        assert_eq!(
            json,
            r#"{"Vocals":"vocals","Guitar":"guitar","Piano":"piano","Drums":"drums","Bass":"bass","Other":"other"}"#
        );
    }

    #[test]
    fn test_model_presets() {
        assert_eq!(SeparationModel::default().filename(), "BS-Roformer-SW.ckpt");
        assert_eq!(
            SeparationModel::from_name("htdemucs_ft.yaml"),
            SeparationModel::HtDemucsFt
        );
        assert_eq!(
            SeparationModel::from_name("UVR-MDX-NET.onnx").filename(),
            "UVR-MDX-NET.onnx"
        );
    }
}
