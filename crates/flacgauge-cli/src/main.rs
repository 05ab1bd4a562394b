//! flacgauge - FLAC decoder correctness and performance regression harness.
//!
//! Validates a decoder under test against a reference decoder over a
//! categorized corpus, then drives the on-device benchmark and compares
//! measured performance against a stored baseline.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use flacgauge_cli::cli_args::{BenchArgs, ValidateArgs};
use flacgauge_cli::commands;

/// FLAC decoder regression harness
#[derive(Parser)]
#[command(name = "flacgauge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: validate correctness, then run the device benchmark
    Run {
        #[command(flatten)]
        validate: ValidateArgs,

        #[command(flatten)]
        bench: BenchArgs,

        /// Quick mode: skip validation, just benchmark
        #[arg(short, long)]
        quick: bool,

        /// Skip validation tests (same as --quick)
        #[arg(long)]
        skip_validation: bool,

        /// Only run validation, skip the benchmark
        #[arg(long)]
        validate_only: bool,

        /// Save the benchmark result as the new baseline
        #[arg(long)]
        save_baseline: bool,
    },

    /// Run the differential validation phase only
    Validate {
        #[command(flatten)]
        validate: ValidateArgs,
    },

    /// Run the device benchmark only
    Bench {
        #[command(flatten)]
        bench: BenchArgs,

        /// Save the benchmark result as the new baseline
        #[arg(long)]
        save_baseline: bool,
    },

    /// Inspect or clear the stored performance baseline
    Baseline {
        #[command(subcommand)]
        action: commands::baseline::BaselineAction,
    },

    /// Check external tools, corpus layout, and serial devices
    Doctor {
        #[command(flatten)]
        validate: ValidateArgs,

        #[command(flatten)]
        bench: BenchArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            validate,
            bench,
            quick,
            skip_validation,
            validate_only,
            save_baseline,
        } => commands::run::run(
            &validate,
            &bench,
            quick || skip_validation,
            validate_only,
            save_baseline,
        ),
        Commands::Validate { validate } => commands::validate::run(&validate),
        Commands::Bench {
            bench,
            save_baseline,
        } => commands::bench::run(&bench, save_baseline),
        Commands::Baseline { action } => commands::baseline::run(&action),
        Commands::Doctor { validate, bench } => commands::doctor::run(&validate, &bench),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
