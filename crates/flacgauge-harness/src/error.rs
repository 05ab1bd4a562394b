//! Error types for the harness.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving the harness.
///
/// Per-case decode failures and checksum mismatches are *not* errors: they
/// are recorded in [`crate::validate::CaseReport`] and feed the verdict.
/// This enum covers the conditions that stop a phase or the whole run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A required external tool is not installed or not on PATH.
    #[error("Required tool '{name}' not found. Install it or pass an explicit path")]
    MissingTool { name: String },

    /// The corpus root or a category directory does not exist.
    #[error("Corpus directory not found: {path}")]
    CorpusNotFound { path: PathBuf },

    /// Failed to spawn an external process.
    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The build/flash step exited non-zero.
    #[error("Build/flash command exited with status {exit_code}")]
    BuildFailed { exit_code: i32 },

    /// No serial device could be discovered.
    #[error("No serial device found. Connect the target board or pass --port")]
    NoDevice,

    /// Opening or holding the telemetry transport failed.
    #[error("Transport fault: {0}")]
    Transport(#[from] crate::telemetry::TransportError),

    /// Observed pass/fail counts did not match the declared expectation.
    #[error(
        "Regression gate failed: expected {expected_passed} passed / {expected_failed} failed, \
         got {actual_passed} passed / {actual_failed} failed"
    )]
    RegressionGate {
        expected_passed: usize,
        expected_failed: usize,
        actual_passed: usize,
        actual_failed: usize,
    },

    /// Failed to write a report or baseline file.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Creates a missing-tool error.
    pub fn missing_tool(name: impl Into<String>) -> Self {
        Self::MissingTool { name: name.into() }
    }

    /// Creates a spawn-failed error.
    pub fn spawn_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarnessError::missing_tool("ffmpeg");
        assert!(err.to_string().contains("ffmpeg"));

        let err = HarnessError::RegressionGate {
            expected_passed: 73,
            expected_failed: 9,
            actual_passed: 72,
            actual_failed: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("73 passed / 9 failed"));
        assert!(msg.contains("72 passed / 10 failed"));
    }

    #[test]
    fn test_transport_fault_wraps() {
        let err = HarnessError::from(crate::telemetry::TransportError::Open(
            "/dev/ttyUSB0: permission denied".to_string(),
        ));
        assert!(err.to_string().contains("permission denied"));
    }
}
