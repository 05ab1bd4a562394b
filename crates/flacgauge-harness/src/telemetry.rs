//! Telemetry capture from the target device.
//!
//! The device streams line-buffered text over a serial link while running
//! the on-target benchmark. The monitor is a small state machine: idle
//! until `capture` is called, then awaiting-start until the start marker is
//! seen, then running until the completion marker, the overall deadline, or
//! a transport fault ends the session. The transcript keeps every line in
//! arrival order; markers are recognized as substrings, all other lines are
//! inert.
//!
//! The transport itself sits behind a trait so tests can script it; the
//! serial implementation wraps the `serialport` crate with a short read
//! timeout and an internal line buffer.

use std::io::Read;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::error::{HarnessError, HarnessResult};


/// Transport-level faults.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not open the transport at all.
    #[error("failed to open transport: {0}")]
    Open(String),

    /// The transport dropped mid-session.
    #[error("transport disconnected: {0}")]
    Disconnected(String),

    /// One line could not be decoded. Recoverable: the monitor logs and
    /// skips it without ending the session.
    #[error("malformed line: {0}")]
    MalformedLine(String),
}

/// A line-oriented telemetry source.
pub trait Transport {
    /// Waits up to the transport's own short poll window for a complete
    /// line. `Ok(None)` means no complete line arrived yet.
    fn poll_line(&mut self) -> Result<Option<String>, TransportError>;
}

/// Terminal state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Completion marker observed.
    Completed,
    /// Deadline hit after the start marker: hang or severe regression.
    TimedOutAfterStart,
    /// Deadline hit without ever seeing the start marker: upload or reset
    /// problem.
    TimedOutBeforeStart,
    /// The transport faulted mid-session.
    TransportError,
}

/// Frozen result of one capture session.
#[derive(Debug, Clone)]
pub struct TelemetryRun {
    /// Target environment identifier (build environment name).
    pub environment: String,
    /// All captured lines, in arrival order.
    pub transcript: Vec<String>,
    /// Start marker was observed.
    pub started: bool,
    /// Completion marker was observed.
    pub completed: bool,
    /// Wall-clock duration of the session.
    pub elapsed: Duration,
    pub status: CaptureStatus,
    /// Fault detail when `status` is `TransportError`.
    pub fault: Option<String>,
}

impl TelemetryRun {
    /// Full transcript as one string, for metric extraction.
    pub fn transcript_text(&self) -> String {
        self.transcript.join("\n")
    }
}

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Substring marking the start of the on-target run.
    pub start_marker: String,
    /// Substring marking completion; terminates the session from any state.
    pub complete_marker: String,
    /// Overall session deadline, measured from session start.
    pub timeout: Duration,
    /// Back-off delay between polls when no data is available.
    pub poll_interval: Duration,
    /// Echo captured lines to stdout as they arrive.
    pub echo: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            start_marker: "FLAC Decode Benchmark".to_string(),
            complete_marker: "Benchmark complete.".to_string(),
            timeout: Duration::from_secs(180),
            poll_interval: Duration::from_millis(10),
            echo: true,
        }
    }
}

/// Drives one capture session over a transport.
pub struct TelemetryMonitor {
    config: MonitorConfig,
}

impl TelemetryMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Captures telemetry until completion, deadline, or transport fault.
    ///
    /// The deadline is measured from session start and is not reset by
    /// activity. Malformed lines are logged and skipped; any other
    /// transport fault ends the session with `TransportError`. Exactly one
    /// session may drive a transport at a time; the exclusive borrow
    /// enforces that, and the transport is released on every exit path.
    pub fn capture(&self, transport: &mut dyn Transport, environment: &str) -> TelemetryRun {
        let start = Instant::now();
        let mut transcript = Vec::new();
        let mut started = false;
        let mut completed = false;
        let mut fault = None;

        let status = loop {
            if start.elapsed() >= self.config.timeout {
                break if started {
                    CaptureStatus::TimedOutAfterStart
                } else {
                    CaptureStatus::TimedOutBeforeStart
                };
            }

            match transport.poll_line() {
                Ok(Some(line)) => {
                    if self.config.echo {
                        println!("{}", line);
                    }
                    let hit_start = line.contains(&self.config.start_marker);
                    let hit_complete = line.contains(&self.config.complete_marker);
                    transcript.push(line);
                    if hit_start {
                        started = true;
                    }
                    if hit_complete {
                        completed = true;
                        break CaptureStatus::Completed;
                    }
                }
                Ok(None) => {
                    std::thread::sleep(self.config.poll_interval);
                }
                Err(TransportError::MalformedLine(detail)) => {
                    eprintln!("telemetry: skipping malformed line: {}", detail);
                }
                Err(e) => {
                    fault = Some(e.to_string());
                    break CaptureStatus::TransportError;
                }
            }
        };

        TelemetryRun {
            environment: environment.to_string(),
            transcript,
            started,
            completed,
            elapsed: start.elapsed(),
            status,
            fault,
        }
    }
}

/// Serial transport over a USB-serial bridge.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Opens `port_name` at `baud` with a short read timeout.
    pub fn open(port_name: &str, baud: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| TransportError::Open(format!("{}: {}", port_name, e)))?;
        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

    fn take_line(&mut self) -> Option<String> {
        take_line(&mut self.pending)
    }
}

/// Pops the next complete non-empty line off the buffer.
///
/// Strips the trailing `\r\n`/`\n`; blank lines are consumed and skipped,
/// they carry nothing and would only pad the transcript.
pub(crate) fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    while let Some(newline) = pending.iter().position(|&b| b == b'\n') {
        let mut raw: Vec<u8> = pending.drain(..=newline).collect();
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        if raw.is_empty() {
            continue;
        }
        return Some(String::from_utf8_lossy(&raw).into_owned());
    }
    None
}

impl Transport for SerialTransport {
    fn poll_line(&mut self) -> Result<Option<String>, TransportError> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let mut buf = [0u8; 256];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.pending.extend_from_slice(&buf[..n]);
                Ok(self.take_line())
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::Interrupted =>
            {
                Ok(None)
            }
            Err(e) => Err(TransportError::Disconnected(e.to_string())),
        }
    }
}

/// Substrings matched against a port's advertised description.
const BRIDGE_HINTS: [&str; 5] = ["cp210", "ch340", "ftdi", "usb", "uart"];

/// Substrings matched against the device path itself.
const DEVICE_HINTS: [&str; 4] = ["usbserial", "usbmodem", "ttyusb", "ttyacm"];

/// Picks the most plausible device port from `(name, description)` pairs.
///
/// Ports matching a known USB-serial bridge are preferred; otherwise the
/// first enumerated port wins.
pub(crate) fn pick_port(ports: &[(String, Option<String>)]) -> Option<String> {
    for (name, description) in ports {
        if let Some(description) = description {
            let description = description.to_lowercase();
            if BRIDGE_HINTS.iter().any(|h| description.contains(h)) {
                return Some(name.clone());
            }
        }
        let name_lower = name.to_lowercase();
        if DEVICE_HINTS.iter().any(|h| name_lower.contains(h)) {
            return Some(name.clone());
        }
    }
    ports.first().map(|(name, _)| name.clone())
}

/// Discovers the target device's serial port.
///
/// Failing to find any port is fatal and reported before any capture is
/// attempted.
pub fn find_device_port() -> HarnessResult<String> {
    let ports = serialport::available_ports()
        .map_err(|e| TransportError::Open(e.to_string()))?;
    let candidates: Vec<(String, Option<String>)> = ports
        .into_iter()
        .map(|info| {
            let description = match info.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    Some(format!(
                        "{} {}",
                        usb.manufacturer.unwrap_or_default(),
                        usb.product.unwrap_or_default()
                    ))
                }
                _ => None,
            };
            (info.port_name, description)
        })
        .collect();
    pick_port(&candidates).ok_or(HarnessError::NoDevice)
}
