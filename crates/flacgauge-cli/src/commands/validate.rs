//! Validation command implementation.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use flacgauge_harness::{
    check_gate, report, CaseReport, HarnessConfig, HarnessError, ValidationCounts,
    ValidationPhase,
};

use super::reporting;
use crate::cli_args::{self, BenchArgs, ValidateArgs};

/// Runs the validation phase with per-case progress output.
///
/// Shared by `validate` and `run`.
pub(crate) fn run_phase(config: &HarnessConfig) -> Result<(Vec<CaseReport>, ValidationCounts)> {
    let phase = ValidationPhase::new(config);
    phase.check_prerequisites()?;

    println!("Corpus: {}", config.corpus_root.display());
    println!("Decoder: {}", config.tools.decoder.display());
    println!();

    let reports = phase.run(|i, total, report| {
        println!(
            "  [{}/{}] {} ... {}",
            i,
            total,
            report.file_name,
            reporting::verdict_glyph(report.verdict())
        );
        if let Some(annotation) = &report.annotation {
            println!("        {}", annotation.dimmed());
        }
    })?;

    let counts = ValidationCounts::from_reports(&reports);
    let (text_path, json_path) = report::write_reports(&config.results_dir, &reports, &counts)?;

    println!();
    println!("{}", "-".repeat(40));
    println!(
        "Expected: {} passed, {} failed",
        config.expected.passed, config.expected.failed
    );
    println!(
        "Actual:   {} passed, {} failed ({} inconclusive)",
        counts.passed, counts.failed, counts.inconclusive
    );
    println!("{}", "-".repeat(40));
    println!("Report: {}", text_path.display());
    println!("JSON report: {}", json_path.display());

    Ok((reports, counts))
}

/// Applies the regression gate, printing the outcome.
pub(crate) fn apply_gate(config: &HarnessConfig, counts: &ValidationCounts) -> Result<(), HarnessError> {
    match check_gate(counts, config.expected) {
        Ok(()) => {
            println!("{}", "VALIDATION PASSED - decoder output is correct".green());
            Ok(())
        }
        Err(e) => {
            println!("{}", "VALIDATION FAILED".red().bold());
            println!("{}", e);
            Err(e)
        }
    }
}

/// Run the standalone `validate` command.
pub fn run(args: &ValidateArgs) -> Result<ExitCode> {
    // Bench args are irrelevant here; defaults are fine for config assembly.
    let config = cli_args::build_config(args, &BenchArgs::default());

    reporting::banner("Differential Validation");
    let (_, counts) = run_phase(&config)?;

    if apply_gate(&config, &counts).is_ok() {
        reporting::result_plain(true, "Validation complete");
        Ok(ExitCode::SUCCESS)
    } else {
        reporting::result_plain(false, "Validation failed - decoder output is incorrect");
        Ok(ExitCode::from(1))
    }
}
