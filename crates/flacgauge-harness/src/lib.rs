//! FLAC decoder regression harness library.
//!
//! Two independent pipelines feed one verdict:
//!
//! - **Differential validation**: run the decoder under test and a reference
//!   decoder (ffmpeg) over a categorized corpus of FLAC files, verify the
//!   embedded MD5 signature where one exists, and fall back to byte-exact
//!   PCM comparison where it does not.
//! - **Device benchmark**: flash a firmware benchmark to a target board,
//!   capture its serial telemetry until a completion marker or timeout,
//!   extract performance metrics from the transcript, and compare them
//!   against a persisted baseline.
//!
//! The CLI crate wires these into commands; everything here is plain
//! synchronous library code with no global state.

pub mod baseline;
pub mod checksum;
pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod telemetry;
pub mod validate;
pub mod wav;

pub use baseline::{delta, BaselineDelta, BaselineRecord, BaselineStore, DeltaLabel};
pub use checksum::ChecksumReport;
pub use config::{ExpectedCounts, HarnessConfig, ToolPaths};
pub use corpus::{Category, TestCase};
pub use error::{HarnessError, HarnessResult};
pub use metrics::{extract_metrics, BenchMetrics};
pub use pipeline::{
    check_gate, BenchOutcome, BenchPhase, SessionSummary, ValidationCounts, ValidationPhase,
};
pub use telemetry::{
    CaptureStatus, MonitorConfig, SerialTransport, TelemetryMonitor, TelemetryRun, Transport,
    TransportError,
};
pub use validate::{CaseOutcome, CaseReport, DecodeAttempt, DifferentialValidator, Verdict};
pub use wav::WavError;
