//! Full pipeline command: validate, gate, benchmark, compare.

use std::process::ExitCode;

use anyhow::Result;
use flacgauge_harness::{BaselineStore, SessionSummary};

use super::{bench, reporting, validate};
use crate::cli_args::{self, BenchArgs, ValidateArgs};

/// Run the full pipeline.
///
/// Stage order: validation (unless skipped) -> regression gate ->
/// build/flash -> telemetry capture -> metric extraction -> baseline
/// compare. A gate failure skips the benchmark phase entirely.
pub fn run(
    validate_args: &ValidateArgs,
    bench_args: &BenchArgs,
    skip_validation: bool,
    validate_only: bool,
    save_baseline: bool,
) -> Result<ExitCode> {
    let config = cli_args::build_config(validate_args, bench_args);

    let store = BaselineStore::new(&config.baseline_path);
    if let Some(prior) = store.load() {
        println!(
            "Baseline: {:.2} ms ({:.1}x real-time)",
            prior.decode_time_ms, prior.speed_x
        );
        println!();
    }

    // Step 1: validation and the regression gate.
    let mut counts = Default::default();
    if !skip_validation {
        reporting::banner("STEP 1: Differential Validation");
        let (_, observed) = validate::run_phase(&config)?;
        counts = observed;

        if validate::apply_gate(&config, &counts).is_err() {
            reporting::result_plain(false, "Validation failed - decoder output is incorrect");
            return Ok(ExitCode::from(1));
        }

        if validate_only {
            reporting::result_plain(true, "Validation complete (--validate-only)");
            return Ok(ExitCode::SUCCESS);
        }
    }

    // Step 2: device benchmark.
    println!();
    reporting::banner("STEP 2: Device Benchmark");
    let outcome = bench::run_phase(&config)?;
    let delta = bench::compare_and_save(&config, &outcome, save_baseline)?;

    let summary = SessionSummary {
        counts,
        telemetry: Some(outcome.run.status),
        metrics: outcome.metrics,
        delta,
    };

    if summary.overall_pass() {
        let status = if skip_validation {
            "PASS (validation skipped)"
        } else {
            "PASS"
        };
        if let Some(metrics) = &summary.metrics {
            reporting::result_pass(status, metrics, summary.delta.as_ref());
        }
        Ok(ExitCode::SUCCESS)
    } else {
        reporting::result_fail("Benchmark did not complete");
        Ok(ExitCode::from(1))
    }
}
