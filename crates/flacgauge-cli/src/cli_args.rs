//! Shared argument groups and their mapping onto the harness config.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use flacgauge_harness::HarnessConfig;

/// Options for the differential validation phase.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the decoder under test
    #[arg(long, default_value = "./flac_to_wav")]
    pub decoder: PathBuf,

    /// Corpus root holding the subset/uncommon/faulty partitions
    #[arg(long, default_value = "flac-test-files")]
    pub corpus: PathBuf,

    /// Directory receiving decoded WAVs and reports
    #[arg(long, default_value = "test_results")]
    pub results_dir: PathBuf,

    /// Declared expected pass count for the regression gate
    #[arg(long, default_value_t = 73)]
    pub expect_passed: usize,

    /// Declared expected fail count for the regression gate
    #[arg(long, default_value_t = 9)]
    pub expect_failed: usize,

    /// Reference decoder executable
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Stream inspection executable for the bit-depth probe
    #[arg(long, default_value = "ffprobe")]
    pub ffprobe: String,
}

/// Options for the device benchmark phase.
#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Build environment passed to the build tool
    #[arg(short, long, default_value = "esp32s3")]
    pub env: String,

    /// Serial baud rate
    #[arg(short, long, default_value_t = 115_200)]
    pub baud: u32,

    /// Overall telemetry timeout in seconds
    #[arg(short, long, default_value_t = 180)]
    pub timeout: u64,

    /// Serial port (bypasses discovery)
    #[arg(long)]
    pub port: Option<String>,

    /// Skip build/flash, just monitor
    #[arg(long)]
    pub no_upload: bool,

    /// Incremental build (skip cleaning build artifacts)
    #[arg(long)]
    pub no_clean: bool,

    /// Build/flash tool executable
    #[arg(long, default_value = "pio")]
    pub build_tool: String,

    /// Baseline record location
    #[arg(long, default_value = "baseline.json")]
    pub baseline: PathBuf,
}

impl Default for ValidateArgs {
    fn default() -> Self {
        Self {
            decoder: PathBuf::from("./flac_to_wav"),
            corpus: PathBuf::from("flac-test-files"),
            results_dir: PathBuf::from("test_results"),
            expect_passed: 73,
            expect_failed: 9,
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Default for BenchArgs {
    fn default() -> Self {
        Self {
            env: "esp32s3".to_string(),
            baud: 115_200,
            timeout: 180,
            port: None,
            no_upload: false,
            no_clean: false,
            build_tool: "pio".to_string(),
            baseline: PathBuf::from("baseline.json"),
        }
    }
}

/// Builds the harness config from both argument groups.
pub fn build_config(validate: &ValidateArgs, bench: &BenchArgs) -> HarnessConfig {
    let mut config = HarnessConfig::default()
        .corpus_root(&validate.corpus)
        .results_dir(&validate.results_dir)
        .expected(validate.expect_passed, validate.expect_failed)
        .decoder(&validate.decoder);
    config.tools.ffmpeg = validate.ffmpeg.clone();
    config.tools.ffprobe = validate.ffprobe.clone();
    config.tools.build_tool = bench.build_tool.clone();
    config.baseline_path = bench.baseline.clone();
    config.build_env = bench.env.clone();
    config.baud = bench.baud;
    config.capture_timeout = Duration::from_secs(bench.timeout);
    config.port = bench.port.clone();
    config.upload = !bench.no_upload;
    config.clean = !bench.no_clean;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_maps_all_fields() {
        let mut validate = ValidateArgs::default();
        validate.expect_passed = 10;
        validate.expect_failed = 2;
        let mut bench = BenchArgs::default();
        bench.no_clean = true;
        bench.no_upload = true;
        bench.timeout = 30;
        bench.port = Some("/dev/ttyUSB1".to_string());

        let config = build_config(&validate, &bench);
        assert_eq!(config.expected.passed, 10);
        assert_eq!(config.expected.failed, 2);
        assert!(!config.clean);
        assert!(!config.upload);
        assert_eq!(config.capture_timeout, Duration::from_secs(30));
        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB1"));
    }
}
