//! Startup checks for required external tools

use super::ffmpeg::FFMPEG_COMMAND;
use super::loudness::RSGAIN_COMMAND;
use crate::error::{DrumlessError, Result};
use crate::separation::AUDIO_SEPARATOR_COMMAND;
use std::path::PathBuf;
use tracing::debug;

/// An executable that must be on PATH before any track is processed
#[derive(Debug, Clone, Copy)]
pub struct RequiredTool {
    pub command: &'static str,
    pub hint: &'static str,
}

/// Tools the pipeline shells out to
pub const REQUIRED_TOOLS: [RequiredTool; 3] = [
    RequiredTool {
        command: FFMPEG_COMMAND,
        hint: "Install ffmpeg (e.g. `brew install ffmpeg` or `apt install ffmpeg`)",
    },
    RequiredTool {
        command: RSGAIN_COMMAND,
        hint: "Install rsgain from https://github.com/complexlogic/rsgain",
    },
    RequiredTool {
        command: AUDIO_SEPARATOR_COMMAND,
        hint: "Install it with: pip install audio-separator",
    },
];

/// Resolve every tool, failing on the first one that is missing
pub fn check_tools(tools: &[RequiredTool]) -> Result<Vec<PathBuf>> {
    tools
        .iter()
        .map(|tool| match which::which(tool.command) {
            Ok(path) => {
                debug!("Found {} at {}", tool.command, path.display());
                Ok(path)
            }
            Err(_) => Err(DrumlessError::missing_dependency(tool.command, tool.hint)),
        })
        .collect()
}

/// Check all tools the pipeline needs
pub fn check_dependencies() -> Result<()> {
    check_tools(&REQUIRED_TOOLS).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_tool_resolves() {
        let tools = [RequiredTool {
            command: "sh",
            hint: "",
        }];
        let paths = check_tools(&tools).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_missing_tool_is_fatal() {
        let tools = [
            RequiredTool {
                command: "sh",
                hint: "",
            },
            RequiredTool {
                command: "drumless-missing-tool-xyz",
                hint: "install it",
            },
        ];
        let err = check_tools(&tools).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("drumless-missing-tool-xyz"));
    }
}
