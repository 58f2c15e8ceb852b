//! Process runner abstraction
//!
//! Every external tool invocation is expressed as a [`CommandRequest`] and
//! answered with a [`CommandOutput`]. The adapters build requests and parse
//! responses; only [`SystemRunner`] actually spawns processes, so tests can
//! swap in a recording fake.

use crate::error::{DrumlessError, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// A single command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<OsString>,
}

impl CommandRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Arguments as lossy strings, for logging and assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Whether any argument equals `needle`
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Last argument (output path for most tool invocations)
    pub fn last_arg(&self) -> Option<&OsStr> {
        self.args.last().map(|a| a.as_os_str())
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given diagnostic stream
    pub fn ok(stderr: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// A failed run with the given diagnostic stream
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout followed by stderr, like a shell `2>&1`
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }

    /// Last non-empty line of stderr, for compact error messages
    pub fn failure_summary(&self) -> String {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| "command exited with an error".to_string())
    }
}

/// Executes command requests
///
/// Implementations run to completion synchronously; there is no timeout.
pub trait CommandRunner {
    /// Run the command. `Err` only when the process could not be launched;
    /// a non-zero exit is reported through `CommandOutput::success`.
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput> {
        debug!("Running: {}", request);

        let output = Command::new(&request.program)
            .args(&request.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| DrumlessError::CommandSpawn {
                program: request.program.clone(),
                reason: e.to_string(),
            })?;

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        trace!("{} exited with {}", request.program, output.status);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_and_display() {
        let request = CommandRequest::new("ffmpeg")
            .arg("-i")
            .arg("My Song.flac")
            .args(["-f", "null", "-"]);

        assert_eq!(request.to_string(), "ffmpeg -i \"My Song.flac\" -f null -");
        assert!(request.has_arg("null"));
        assert_eq!(request.last_arg(), Some(OsStr::new("-")));
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            success: true,
            stdout: "out".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[test]
    fn test_failure_summary_uses_last_line() {
        let output = CommandOutput::failed("banner\nInvalid data found\n\n");
        assert_eq!(output.failure_summary(), "Invalid data found");
        assert_eq!(
            CommandOutput::failed("").failure_summary(),
            "command exited with an error"
        );
    }

    #[test]
    fn test_system_runner_reports_spawn_failure() {
        let request = CommandRequest::new("drumless-no-such-tool-xyz");
        let err = SystemRunner.run(&request).unwrap_err();
        assert!(matches!(err, DrumlessError::CommandSpawn { .. }));
    }
}
