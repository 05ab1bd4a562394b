//! External process invocation with a hard wall-clock timeout.
//!
//! Both decoders, ffprobe, and the build/flash tool are opaque command-line
//! programs. Each invocation blocks the calling thread until exit or until
//! the timeout expires; expiry kills the child and is reported as a failed
//! attempt, never a panic or harness error.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{HarnessError, HarnessResult};

/// Default per-invocation timeout for decode attempts.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum captured error text carried into reports.
const ERROR_TEXT_LIMIT: usize = 500;

/// Captured result of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// True when the process exited with status zero.
    pub success: bool,
    /// True when the process was killed after exceeding the timeout.
    pub timed_out: bool,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl CommandOutput {
    /// Combined error text, truncated for reporting.
    pub fn error_text(&self) -> String {
        let text = if self.timed_out {
            "command timed out".to_string()
        } else if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            self.stdout.trim().to_string()
        };
        truncate(&text, ERROR_TEXT_LIMIT)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        text.to_string()
    } else {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

/// Runs `program` with `args`, capturing stdout and stderr.
///
/// Each pipe is drained on its own thread from spawn time; a child that
/// writes more than the pipe capacity must never stall waiting for the
/// harness to read. The wait loop polls `try_wait` with a short sleep;
/// when `timeout` elapses the child is killed and reaped and the output
/// is marked `timed_out`. Spawn failure is the only hard error, since it
/// usually means the tool is missing.
pub fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> HarnessResult<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| HarnessError::spawn_failed(program, e))?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(HarnessError::spawn_failed(program, e)),
        }
    };

    // Killing the child closed its end of the pipes, so both readers hit
    // EOF and finish.
    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(match status {
        Some(status) => CommandOutput {
            success: status.success(),
            timed_out: false,
            stdout,
            stderr,
        },
        None => CommandOutput {
            success: false,
            timed_out: true,
            stdout,
            stderr,
        },
    })
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_string(&mut text);
        }
        text
    })
}

/// Runs a command without capturing output, inheriting the console.
///
/// Used for the build/flash step, whose progress output the operator wants
/// to see live. Returns the exit code.
pub fn run_command_streaming(program: &str, args: &[&str]) -> HarnessResult<i32> {
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| HarnessError::spawn_failed(program, e))?;
    Ok(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_status() {
        let out = run_command("sh", &["-c", "echo hello"], Duration::from_secs(5)).unwrap();
        assert!(out.success);
        assert!(!out.timed_out);
        assert!(out.stdout.contains("hello"));
    }

    #[test]
    fn test_nonzero_exit_is_failure_not_error() {
        let out = run_command("sh", &["-c", "echo oops 1>&2; exit 3"], Duration::from_secs(5))
            .unwrap();
        assert!(!out.success);
        assert!(out.error_text().contains("oops"));
    }

    #[test]
    fn test_output_beyond_pipe_capacity_does_not_stall() {
        // 1 MiB of stdout, far past the ~64 KiB pipe buffer. The child
        // must still exit cleanly well before the timeout.
        let out = run_command(
            "sh",
            &["-c", "head -c 1048576 /dev/zero | tr '\\0' 'x'; exit 0"],
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(out.success);
        assert!(!out.timed_out);
        assert_eq!(out.stdout.len(), 1_048_576);
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let out = run_command("sh", &["-c", "sleep 30"], Duration::from_millis(300)).unwrap();
        assert!(!out.success);
        assert!(out.timed_out);
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(out.error_text(), "command timed out");
    }

    #[test]
    fn test_missing_program_is_error() {
        let err = run_command(
            "definitely-not-a-real-tool-xyz",
            &[],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::SpawnFailed { .. }));
    }

    #[test]
    fn test_truncates_long_error_text() {
        let out = CommandOutput {
            success: false,
            timed_out: false,
            stdout: String::new(),
            stderr: "x".repeat(2000),
        };
        assert!(out.error_text().len() <= ERROR_TEXT_LIMIT + 3);
        assert!(out.error_text().ends_with("..."));
    }
}
