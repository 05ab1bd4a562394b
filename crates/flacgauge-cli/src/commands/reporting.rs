//! Shared console output helpers for the command implementations.

use colored::Colorize;
use flacgauge_harness::{BaselineDelta, BenchMetrics, Verdict};

const RULE_WIDTH: usize = 60;

/// Prints a step banner.
pub fn banner(title: &str) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{}", title.bold());
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Prints the single machine-parseable verdict line for a failed run.
pub fn result_fail(reason: &str) {
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("RESULT: {} | {}", "FAIL".red().bold(), reason);
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Prints the single machine-parseable verdict line for a passing run.
///
/// `status` is `PASS` or `PASS (validation skipped)`.
pub fn result_pass(status: &str, metrics: &BenchMetrics, delta: Option<&BaselineDelta>) {
    let delta_str = match delta {
        Some(delta) => format!(" | {}", delta.describe()),
        None => String::new(),
    };
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!(
        "RESULT: {} | {:.2} ms | {:.1}x real-time{}",
        status.green().bold(),
        metrics.decode_time_ms,
        metrics.speed_x,
        delta_str
    );
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Prints a plain verdict line without metrics (validation-only runs).
pub fn result_plain(pass: bool, note: &str) {
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    let status = if pass {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("RESULT: {} | {}", status, note);
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Per-case progress glyph.
pub fn verdict_glyph(verdict: Verdict) -> colored::ColoredString {
    match verdict {
        Verdict::Pass => "PASS".green(),
        Verdict::Fail => "FAIL".red(),
        Verdict::Inconclusive => "----".yellow(),
    }
}
