//! Doctor command implementation
//!
//! Checks external tools, corpus layout, and serial device availability.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use flacgauge_harness::telemetry;

use crate::cli_args::{BenchArgs, ValidateArgs};

/// Run the doctor command
///
/// # Returns
/// Exit code: 0 if all required checks pass, 1 if any fail
pub fn run(validate: &ValidateArgs, bench: &BenchArgs) -> Result<ExitCode> {
    println!("{}", "flacgauge Doctor".cyan().bold());
    println!("{}", "================".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!(
        "  {} flacgauge v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("{}", "Tools:".bold());

    // Decoder under test: a concrete path, not resolved via PATH.
    if validate.decoder.exists() {
        println!(
            "  {} decoder under test ({})",
            "ok".green(),
            validate.decoder.display()
        );
    } else {
        println!(
            "  {} decoder under test not found at {}",
            "!!".red(),
            validate.decoder.display()
        );
        println!("     {}", "Build it first (host_examples/flac_to_wav).".dimmed());
        all_ok = false;
    }

    for (name, required) in [
        (validate.ffmpeg.as_str(), true),
        (validate.ffprobe.as_str(), true),
        (bench.build_tool.as_str(), false),
    ] {
        match which::which(name) {
            Ok(path) => {
                println!("  {} {} ({})", "ok".green(), name, path.display());
            }
            Err(_) if required => {
                println!("  {} {} not found in PATH", "!!".red(), name);
                all_ok = false;
            }
            Err(_) => {
                println!("  {} {} not found in PATH", "!!".yellow(), name);
                println!(
                    "     {}",
                    "Only needed for the device benchmark phase.".dimmed()
                );
            }
        }
    }

    println!();
    println!("{}", "Corpus:".bold());
    if validate.corpus.is_dir() {
        println!("  {} corpus root ({})", "ok".green(), validate.corpus.display());
        for category in flacgauge_harness::Category::ALL {
            let dir = validate.corpus.join(category.as_str());
            if dir.is_dir() {
                println!("  {} {}/", "ok".green(), category);
            } else {
                println!("  {} {}/ missing", "!!".yellow(), category);
            }
        }
    } else {
        println!(
            "  {} corpus root not found at {}",
            "!!".red(),
            validate.corpus.display()
        );
        println!(
            "     {}",
            "Clone https://github.com/ietf-wg-cellar/flac-test-files".dimmed()
        );
        all_ok = false;
    }

    println!();
    println!("{}", "Serial devices:".bold());
    match telemetry::find_device_port() {
        Ok(port) => {
            println!("  {} target device port: {}", "ok".green(), port);
        }
        Err(_) => {
            println!("  {} no serial device found", "!!".yellow());
            println!(
                "     {}",
                "Connect the target board before running the benchmark.".dimmed()
            );
        }
    }

    println!();
    if all_ok {
        println!("{} All required checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}
