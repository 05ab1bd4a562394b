//! Stage pipeline: validate -> gate -> build/flash -> capture -> compare.
//!
//! Each stage returns a typed result the next stage consumes, so a failing
//! stage short-circuits at the call site instead of threading status flags
//! through nested conditionals.

use std::path::Path;
use std::time::Duration;

use crate::baseline::BaselineDelta;
use crate::config::{ExpectedCounts, HarnessConfig};
use crate::corpus::{self, Category, TestCase};
use crate::error::{HarnessError, HarnessResult};
use crate::metrics::{self, BenchMetrics};
use crate::process::{run_command, run_command_streaming};
use crate::telemetry::{
    find_device_port, CaptureStatus, MonitorConfig, SerialTransport, TelemetryMonitor,
    TelemetryRun,
};
use crate::validate::{CaseReport, DifferentialValidator, Verdict};

/// Per-verdict counts across all validated cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub inconclusive: usize,
}

impl ValidationCounts {
    pub fn record(&mut self, verdict: Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail => self.failed += 1,
            Verdict::Inconclusive => self.inconclusive += 1,
        }
    }

    pub fn from_reports(reports: &[CaseReport]) -> Self {
        let mut counts = Self::default();
        for report in reports {
            counts.record(report.verdict());
        }
        counts
    }
}

/// Everything the final verdict is computed from. Assembled once at the
/// end of a session, never mutated afterward.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub counts: ValidationCounts,
    /// Telemetry outcome, when the benchmark phase ran.
    pub telemetry: Option<CaptureStatus>,
    /// Extracted metrics, when the transcript contained all three figures.
    pub metrics: Option<BenchMetrics>,
    /// Delta against the stored baseline, when one existed.
    pub delta: Option<BaselineDelta>,
}

impl SessionSummary {
    /// Final session verdict. The regression gate already aborted the run
    /// on a validation failure, so this hinges on the benchmark having
    /// produced usable metrics.
    pub fn overall_pass(&self) -> bool {
        self.metrics.is_some()
    }
}

/// Validation phase: every corpus file through the differential validator.
pub struct ValidationPhase<'a> {
    config: &'a HarnessConfig,
}

impl<'a> ValidationPhase<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Checks the tools and corpus this phase needs, before any work.
    pub fn check_prerequisites(&self) -> HarnessResult<()> {
        corpus::check_corpus_root(&self.config.corpus_root)?;

        let decoder = &self.config.tools.decoder;
        if decoder.components().count() > 1 && !decoder.exists() {
            return Err(HarnessError::missing_tool(decoder.display().to_string()));
        }

        let probe = run_command(
            &self.config.tools.ffmpeg,
            &["-version"],
            Duration::from_secs(10),
        );
        match probe {
            Ok(out) if out.success => Ok(()),
            _ => Err(HarnessError::missing_tool(self.config.tools.ffmpeg.clone())),
        }
    }

    /// Discovers all cases across the fixed category partitions.
    pub fn discover(&self) -> Vec<TestCase> {
        Category::ALL
            .iter()
            .flat_map(|&category| corpus::scan_category(&self.config.corpus_root, category))
            .collect()
    }

    /// Validates every discovered case, invoking `observer` after each one
    /// with (index, total, report). Per-case failures accumulate; only a
    /// missing tool aborts.
    pub fn run(
        &self,
        mut observer: impl FnMut(usize, usize, &CaseReport),
    ) -> HarnessResult<Vec<CaseReport>> {
        let cases = self.discover();
        let validator = DifferentialValidator::new(self.config);
        let total = cases.len();

        let mut reports = Vec::with_capacity(total);
        for (i, case) in cases.iter().enumerate() {
            let report = validator.validate_case(case)?;
            observer(i + 1, total, &report);
            reports.push(report);
        }
        Ok(reports)
    }
}

/// Applies the operator-declared regression gate to observed counts.
///
/// An explicit count mismatch in either direction fails the gate; the
/// inconclusive bucket (the faulty partition) is not gated.
pub fn check_gate(counts: &ValidationCounts, expected: ExpectedCounts) -> HarnessResult<()> {
    if counts.passed == expected.passed && counts.failed == expected.failed {
        Ok(())
    } else {
        Err(HarnessError::RegressionGate {
            expected_passed: expected.passed,
            expected_failed: expected.failed,
            actual_passed: counts.passed,
            actual_failed: counts.failed,
        })
    }
}

/// Result of the benchmark phase.
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    pub run: TelemetryRun,
    pub metrics: Option<BenchMetrics>,
}

/// Benchmark phase: build/flash, then capture and extract metrics.
pub struct BenchPhase<'a> {
    config: &'a HarnessConfig,
}

impl<'a> BenchPhase<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Removes stale build artifacts. Best-effort.
    pub fn clean(&self) {
        let _ = std::fs::remove_dir_all(Path::new(".pio"));
        let _ = std::fs::remove_file(Path::new("sdkconfig"));
        let _ = std::fs::remove_file(Path::new(&format!("sdkconfig.{}", self.config.build_env)));
    }

    /// Builds and flashes the firmware via the external build tool.
    ///
    /// The tool's own output streams to the console; only the exit status
    /// matters here.
    pub fn build_and_upload(&self) -> HarnessResult<()> {
        let exit_code = run_command_streaming(
            &self.config.tools.build_tool,
            &["run", "-e", &self.config.build_env, "-t", "upload"],
        )?;
        if exit_code != 0 {
            return Err(HarnessError::BuildFailed { exit_code });
        }
        // Give the device a moment to reset after flashing.
        std::thread::sleep(Duration::from_secs(1));
        Ok(())
    }

    /// Opens the telemetry transport and captures one session.
    pub fn capture(&self) -> HarnessResult<TelemetryRun> {
        let port = match &self.config.port {
            Some(port) => port.clone(),
            None => find_device_port()?,
        };
        let mut transport = SerialTransport::open(&port, self.config.baud)?;
        let monitor = TelemetryMonitor::new(MonitorConfig {
            timeout: self.config.capture_timeout,
            ..MonitorConfig::default()
        });
        Ok(monitor.capture(&mut transport, &self.config.build_env))
    }

    /// Runs the whole phase: optional clean, optional build/flash, capture,
    /// metric extraction. Metric extraction failing is degraded, not fatal.
    pub fn run(&self) -> HarnessResult<BenchOutcome> {
        if self.config.clean {
            self.clean();
        }
        if self.config.upload {
            self.build_and_upload()?;
        }
        let run = self.capture()?;
        let metrics = metrics::extract_metrics(&run.transcript_text());
        Ok(BenchOutcome { run, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counts(passed: usize, failed: usize, inconclusive: usize) -> ValidationCounts {
        ValidationCounts {
            total: passed + failed + inconclusive,
            passed,
            failed,
            inconclusive,
        }
    }

    #[test]
    fn test_counts_record() {
        let mut c = ValidationCounts::default();
        c.record(Verdict::Pass);
        c.record(Verdict::Pass);
        c.record(Verdict::Fail);
        c.record(Verdict::Inconclusive);
        assert_eq!(c, counts(2, 1, 1));
    }

    #[test]
    fn test_summary_verdict_follows_metrics() {
        let mut summary = SessionSummary {
            counts: counts(73, 9, 0),
            telemetry: Some(CaptureStatus::Completed),
            metrics: Some(BenchMetrics {
                decode_time_ms: 512.30,
                rtf: 0.042,
                speed_x: 8.1,
            }),
            delta: None,
        };
        assert!(summary.overall_pass());

        summary.metrics = None;
        assert!(!summary.overall_pass());
    }

    #[test]
    fn test_gate_passes_on_exact_match() {
        let expected = ExpectedCounts {
            passed: 73,
            failed: 9,
        };
        assert!(check_gate(&counts(73, 9, 0), expected).is_ok());
        // Inconclusive cases are not gated.
        assert!(check_gate(&counts(73, 9, 14), expected).is_ok());
    }

    #[test]
    fn test_gate_fails_on_any_mismatch() {
        let expected = ExpectedCounts {
            passed: 74,
            failed: 8,
        };
        let err = check_gate(&counts(73, 9, 0), expected).unwrap_err();
        assert!(matches!(err, HarnessError::RegressionGate { .. }));

        // More passes than declared is still a gate failure.
        let expected = ExpectedCounts {
            passed: 73,
            failed: 9,
        };
        assert!(check_gate(&counts(74, 8, 0), expected).is_err());
    }
}
