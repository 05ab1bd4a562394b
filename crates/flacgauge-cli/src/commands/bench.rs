//! Benchmark command implementation.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use flacgauge_harness::{
    baseline, BaselineDelta, BaselineRecord, BaselineStore, BenchOutcome, BenchPhase,
    CaptureStatus, HarnessConfig,
};

use super::reporting;
use crate::cli_args::{self, BenchArgs, ValidateArgs};

/// Runs the benchmark phase and reports on the telemetry outcome.
///
/// Returns the outcome even on timeout, since a partial transcript is
/// still worth inspecting. Shared by `bench` and `run`.
pub(crate) fn run_phase(config: &HarnessConfig) -> Result<BenchOutcome> {
    println!("Environment: {}", config.build_env);
    if !config.clean {
        println!("(incremental build - no clean)");
    }
    println!();

    let outcome = BenchPhase::new(config).run()?;

    match outcome.run.status {
        CaptureStatus::Completed => {
            println!();
            println!("--- Benchmark finished ---");
        }
        CaptureStatus::TimedOutBeforeStart => {
            println!();
            println!(
                "{}",
                format!(
                    "Timeout after {} seconds - benchmark never started; device may need manual reset",
                    config.capture_timeout.as_secs()
                )
                .yellow()
            );
        }
        CaptureStatus::TimedOutAfterStart => {
            println!();
            println!(
                "{}",
                format!(
                    "Timeout after {} seconds mid-run - hang or severe regression",
                    config.capture_timeout.as_secs()
                )
                .yellow()
            );
        }
        CaptureStatus::TransportError => {
            println!();
            println!(
                "{}",
                format!(
                    "Transport fault: {}",
                    outcome.run.fault.as_deref().unwrap_or("unknown")
                )
                .red()
            );
        }
    }

    Ok(outcome)
}

/// Compares metrics against the stored baseline and optionally saves.
pub(crate) fn compare_and_save(
    config: &HarnessConfig,
    outcome: &BenchOutcome,
    save_baseline: bool,
) -> Result<Option<BaselineDelta>> {
    let metrics = match &outcome.metrics {
        Some(metrics) => metrics,
        None => return Ok(None),
    };

    let store = BaselineStore::new(&config.baseline_path);
    let delta = store.load().map(|prior| baseline::delta(metrics, &prior));

    if save_baseline {
        store.save(&BaselineRecord::from_metrics(metrics))?;
        println!(
            "Baseline saved: {:.2} ms ({:.1}x real-time)",
            metrics.decode_time_ms, metrics.speed_x
        );
    }

    Ok(delta)
}

/// Run the standalone `bench` command.
pub fn run(args: &BenchArgs, save_baseline: bool) -> Result<ExitCode> {
    let config = cli_args::build_config(&ValidateArgs::default(), args);

    let store = BaselineStore::new(&config.baseline_path);
    if let Some(prior) = store.load() {
        println!(
            "Baseline: {:.2} ms ({:.1}x real-time)",
            prior.decode_time_ms, prior.speed_x
        );
        println!();
    }

    reporting::banner("Device Benchmark");
    let outcome = run_phase(&config)?;
    let delta = compare_and_save(&config, &outcome, save_baseline)?;

    match &outcome.metrics {
        Some(metrics) => {
            reporting::result_pass("PASS", metrics, delta.as_ref());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            reporting::result_fail("Benchmark did not complete");
            Ok(ExitCode::from(1))
        }
    }
}
