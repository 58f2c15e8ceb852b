//! ffmpeg adapter
//!
//! Peak detection, stem mixing, metadata remuxing and MP3 transcoding. The
//! peak value is scraped from the `volumedetect` filter's diagnostic output.

use super::runner::{CommandOutput, CommandRequest, CommandRunner};
use crate::error::{DrumlessError, Result};
use crate::types::{AudioFormat, COMPILATION_ALBUM_ARTIST, DRUMLESS_COMMENT, TARGET_PEAK_DB};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// ffmpeg executable name
pub const FFMPEG_COMMAND: &str = "ffmpeg";

/// Stems whose file name contains this are left out of the mix
const EXCLUDED_STEM: &str = "drums";

/// FLAC compression level used for lossless mixdowns
const FLAC_COMPRESSION_LEVEL: &str = "8";

fn peak_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"max_volume:\s*([-\d.]+)").ok())
        .as_ref()
}

/// Extract the `max_volume` value (dB) from ffmpeg diagnostic text
pub fn parse_peak(text: &str) -> Option<f64> {
    let captures = peak_pattern()?.captures(text)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}

/// Clipping protection for a stem mix
///
/// Returns the gain that lands the mix peak at exactly -0.1 dB, or `None`
/// when the peak is already at or below the ceiling.
pub fn clip_protection_gain(peak_db: f64) -> Option<f64> {
    if peak_db > TARGET_PEAK_DB {
        Some(-(peak_db - TARGET_PEAK_DB))
    } else {
        None
    }
}

/// Linear gain that moves `peak_db` onto the -0.1 dB target (may be positive)
pub fn normalisation_gain(peak_db: f64) -> f64 {
    TARGET_PEAK_DB - peak_db
}

/// Sorted WAV stems in `stem_dir`, excluding any whose name contains "drums"
pub fn mix_inputs(stem_dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(stem_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list stems in {}: {}", stem_dir.display(), e);
            return Vec::new();
        }
    };

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .filter(|path| {
            !path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase().contains(EXCLUDED_STEM))
                .unwrap_or(false)
        })
        .collect();

    inputs.sort();
    inputs
}

fn amix_filter(inputs: usize) -> String {
    format!("amix=inputs={}:duration=longest:normalize=0", inputs)
}

/// Command-line audio engine backed by ffmpeg
pub struct AudioEngine<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> AudioEngine<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn request(&self) -> CommandRequest {
        CommandRequest::new(FFMPEG_COMMAND).args(["-hide_banner", "-nostdin"])
    }

    fn with_inputs(request: CommandRequest, inputs: &[PathBuf]) -> CommandRequest {
        inputs
            .iter()
            .fold(request, |req, input| req.arg("-i").arg(input))
    }

    fn run(&self, request: &CommandRequest) -> Result<CommandOutput> {
        self.runner.run(request)
    }

    fn run_for_peak(&self, request: &CommandRequest) -> Option<f64> {
        match self.run(request) {
            Ok(output) if output.success => {
                let peak = parse_peak(&output.combined());
                if peak.is_none() {
                    debug!("No max_volume in ffmpeg output");
                }
                peak
            }
            Ok(output) => {
                warn!("Peak detection failed: {}", output.failure_summary());
                None
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Peak (dB) of all non-drum stems mixed at unity gain, without writing output
    pub fn detect_mix_peak(&self, stem_dir: &Path) -> Option<f64> {
        let inputs = mix_inputs(stem_dir);
        if inputs.is_empty() {
            return None;
        }

        let filter = format!("{},volumedetect", amix_filter(inputs.len()));
        let request = Self::with_inputs(self.request(), &inputs)
            .args(["-filter_complex", filter.as_str(), "-f", "null", "-"]);

        self.run_for_peak(&request)
    }

    /// Peak (dB) of a single file
    pub fn detect_file_peak(&self, path: &Path) -> Option<f64> {
        let request = self
            .request()
            .arg("-i")
            .arg(path)
            .args(["-af", "volumedetect", "-f", "null", "-"]);

        self.run_for_peak(&request)
    }

    /// Mix all non-drum stems into `output`, optionally applying `gain_db`
    pub fn merge(&self, stem_dir: &Path, output: &Path, gain_db: Option<f64>) -> Result<()> {
        let merge_error = |reason: String| DrumlessError::MergeFailed {
            path: output.to_path_buf(),
            reason,
        };

        let inputs = mix_inputs(stem_dir);
        if inputs.is_empty() {
            return Err(merge_error(format!(
                "no non-drum stems in {}",
                stem_dir.display()
            )));
        }

        let mut filter = amix_filter(inputs.len());
        if let Some(gain) = gain_db {
            filter.push_str(&format!(",volume={}dB", gain));
        }

        let mut request = Self::with_inputs(self.request(), &inputs);
        let lossless = AudioFormat::from_path(output)
            .map(AudioFormat::is_lossless)
            .unwrap_or(false);
        if lossless {
            request = request.args(["-compression_level", FLAC_COMPRESSION_LEVEL]);
        }
        let request = request
            .args(["-filter_complex", filter.as_str(), "-y"])
            .arg(output);

        let result = self.run(&request).map_err(|e| merge_error(e.to_string()))?;
        if result.success {
            Ok(())
        } else {
            Err(merge_error(result.failure_summary()))
        }
    }

    /// Copy all metadata from `source` and only the audio of `audio_source`
    /// into `output`, without re-encoding
    ///
    /// Compilation runs always stamp compilation=1, the "Various Artists"
    /// album artist and the fixed album title, whatever the source says.
    pub fn remux_metadata(
        &self,
        source: &Path,
        audio_source: &Path,
        output: &Path,
        is_compilation: bool,
    ) -> Result<()> {
        let remux_error = |reason: String| DrumlessError::RemuxFailed {
            path: output.to_path_buf(),
            reason,
        };

        let mut request = self
            .request()
            .arg("-y")
            .arg("-i")
            .arg(source)
            .arg("-i")
            .arg(audio_source)
            .args([
                "-map_metadata",
                "0",
                "-map",
                "1:a",
                "-c",
                "copy",
                "-movflags",
                "use_metadata_tags",
                "-write_id3v2",
                "1",
            ]);

        if is_compilation {
            request = request
                .args(["-metadata", "compilation=1"])
                .arg("-metadata")
                .arg(format!("album_artist={}", COMPILATION_ALBUM_ARTIST))
                .arg("-metadata")
                .arg(format!("album={}", DRUMLESS_COMMENT));
        }

        let request = request.arg(output);
        let result = self.run(&request).map_err(|e| remux_error(e.to_string()))?;
        if result.success {
            Ok(())
        } else {
            Err(remux_error(result.failure_summary()))
        }
    }

    /// Encode `input` to VBR V0 MP3 with `gain_db` applied
    pub fn transcode_mp3(&self, input: &Path, output: &Path, gain_db: f64) -> Result<()> {
        let transcode_error = |reason: String| DrumlessError::TranscodeFailed {
            path: input.to_path_buf(),
            reason,
        };

        let request = self
            .request()
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-af")
            .arg(format!("volume={}dB", gain_db))
            .args(["-c:a", "libmp3lame", "-q:a", "0"])
            .arg(output);

        let result = self
            .run(&request)
            .map_err(|e| transcode_error(e.to_string()))?;
        if result.success {
            Ok(())
        } else {
            Err(transcode_error(result.failure_summary()))
        }
    }
}
