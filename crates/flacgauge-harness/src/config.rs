//! Harness configuration.
//!
//! Everything the original workflow kept as module-level constants lives
//! here as an explicit structure built by the CLI and passed into the
//! pipeline, so runs and tests can be configured independently.

use std::path::PathBuf;
use std::time::Duration;

use crate::process::DEFAULT_COMMAND_TIMEOUT;

/// Expected validation counts declared by the operator.
///
/// The regression gate compares observed pass/fail counts against these
/// exactly; inconclusive cases (the intentionally faulty partition) are
/// not gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedCounts {
    pub passed: usize,
    pub failed: usize,
}

impl Default for ExpectedCounts {
    fn default() -> Self {
        // Known-good results for the decoder against the ietf-wg-cellar
        // flac-test-files corpus.
        Self {
            passed: 73,
            failed: 9,
        }
    }
}

/// Locations of the external tools the harness drives.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Decoder under test (`flac_to_wav <in> <out>`).
    pub decoder: PathBuf,
    /// Reference decoder.
    pub ffmpeg: String,
    /// Stream inspection tool for the bit-depth probe.
    pub ffprobe: String,
    /// Build/flash tool for the device benchmark.
    pub build_tool: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            decoder: PathBuf::from("./flac_to_wav"),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            build_tool: "pio".to_string(),
        }
    }
}

/// Full configuration for a harness session.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// External tool locations.
    pub tools: ToolPaths,
    /// Root directory holding the category partitions.
    pub corpus_root: PathBuf,
    /// Directory receiving decoded WAVs and reports.
    pub results_dir: PathBuf,
    /// Baseline record location.
    pub baseline_path: PathBuf,
    /// Declared expected validation counts.
    pub expected: ExpectedCounts,
    /// Hard timeout per external decode invocation.
    pub decode_timeout: Duration,
    /// Build environment name passed to the build tool.
    pub build_env: String,
    /// Serial baud rate for telemetry capture.
    pub baud: u32,
    /// Overall telemetry session timeout.
    pub capture_timeout: Duration,
    /// Explicit serial port, bypassing discovery.
    pub port: Option<String>,
    /// Whether to build and flash before capturing (vs monitor only).
    pub upload: bool,
    /// Whether to clean build artifacts before building.
    pub clean: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            corpus_root: PathBuf::from("flac-test-files"),
            results_dir: PathBuf::from("test_results"),
            baseline_path: PathBuf::from("baseline.json"),
            expected: ExpectedCounts::default(),
            decode_timeout: DEFAULT_COMMAND_TIMEOUT,
            build_env: "esp32s3".to_string(),
            baud: 115_200,
            capture_timeout: Duration::from_secs(180),
            port: None,
            upload: true,
            clean: true,
        }
    }
}

impl HarnessConfig {
    /// Sets the corpus root.
    pub fn corpus_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_root = path.into();
        self
    }

    /// Sets the results directory.
    pub fn results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_dir = path.into();
        self
    }

    /// Sets the declared expected counts.
    pub fn expected(mut self, passed: usize, failed: usize) -> Self {
        self.expected = ExpectedCounts { passed, failed };
        self
    }

    /// Sets the decoder under test.
    pub fn decoder(mut self, path: impl Into<PathBuf>) -> Self {
        self.tools.decoder = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expected_counts() {
        let expected = ExpectedCounts::default();
        assert_eq!(expected.passed, 73);
        assert_eq!(expected.failed, 9);
    }

    #[test]
    fn test_config_builder() {
        let config = HarnessConfig::default()
            .corpus_root("corpus")
            .expected(10, 2)
            .decoder("/usr/local/bin/flac_to_wav");
        assert_eq!(config.corpus_root, PathBuf::from("corpus"));
        assert_eq!(config.expected, ExpectedCounts { passed: 10, failed: 2 });
        assert_eq!(
            config.tools.decoder,
            PathBuf::from("/usr/local/bin/flac_to_wav")
        );
    }
}
