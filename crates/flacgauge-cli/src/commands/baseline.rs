//! Baseline inspection command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use flacgauge_harness::BaselineStore;

#[derive(Debug, Subcommand)]
pub enum BaselineAction {
    /// Print the stored baseline record
    Show {
        /// Baseline record location
        #[arg(long, default_value = "baseline.json")]
        baseline: PathBuf,
    },
    /// Delete the stored baseline record
    Clear {
        /// Baseline record location
        #[arg(long, default_value = "baseline.json")]
        baseline: PathBuf,
    },
}

pub fn run(action: &BaselineAction) -> Result<ExitCode> {
    match action {
        BaselineAction::Show { baseline } => {
            let store = BaselineStore::new(baseline);
            match store.load() {
                Some(record) => {
                    println!("Baseline ({})", store.path().display());
                    println!("  decode time: {:.2} ms", record.decode_time_ms);
                    println!("  RTF:         {:.3}", record.rtf);
                    println!("  speed:       {:.1}x real-time", record.speed_x);
                    println!("  saved at:    {}", record.saved_at.to_rfc3339());
                }
                None => {
                    println!("{}", "No baseline saved".yellow());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        BaselineAction::Clear { baseline } => {
            match std::fs::remove_file(baseline) {
                Ok(()) => println!("Baseline cleared: {}", baseline.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    println!("{}", "No baseline to clear".yellow());
                }
                Err(e) => return Err(e.into()),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
