//! Parser for the decoder's MD5 verification text protocol.
//!
//! The decoder under test verifies decoded audio against the MD5 signature
//! embedded in the FLAC STREAMINFO block and reports the outcome on stdout:
//!
//! ```text
//! MD5 signature: 3d2e...
//! Expected MD5: 3d2e...
//! Computed MD5: 3d2e...
//! Result: PASS
//! ```
//!
//! Files without an embedded signature produce `Status: SKIPPED` instead,
//! which bypasses checksum verification entirely for that case.

/// Outcome of scanning decoder output for the MD5 verification block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumReport {
    /// A verification block was found with an explicit PASS/FAIL result.
    Verified {
        expected: String,
        computed: String,
        passed: bool,
    },
    /// The input carries no embedded signature; verification was skipped.
    Skipped,
    /// No verification block appeared in the output at all.
    Absent,
}

impl ChecksumReport {
    /// The authoritative match flag, when verification actually ran.
    pub fn matched(&self) -> Option<bool> {
        match self {
            ChecksumReport::Verified { passed, .. } => Some(*passed),
            ChecksumReport::Skipped | ChecksumReport::Absent => None,
        }
    }
}

/// Scans decoder stdout for the MD5 verification block.
///
/// `Status: SKIPPED` short-circuits: whatever else the output contains, the
/// input has no usable checksum. A PASS/FAIL line is authoritative even if
/// the expected/computed lines were garbled or missing.
pub fn parse_verification(stdout: &str) -> ChecksumReport {
    let mut expected = None;
    let mut computed = None;
    let mut passed = None;

    for line in stdout.lines() {
        if let Some(rest) = after_marker(line, "Expected MD5:") {
            expected = Some(rest.to_string());
        } else if let Some(rest) = after_marker(line, "Computed MD5:") {
            computed = Some(rest.to_string());
        } else if line.contains("Result: PASS") {
            passed = Some(true);
        } else if line.contains("Result: FAIL") {
            passed = Some(false);
        } else if line.contains("Status: SKIPPED") {
            return ChecksumReport::Skipped;
        }
    }

    match passed {
        Some(passed) => ChecksumReport::Verified {
            expected: expected.unwrap_or_default(),
            computed: computed.unwrap_or_default(),
            passed,
        },
        None => ChecksumReport::Absent,
    }
}

/// Extracts the informational `MD5 signature:` line, if present.
pub fn parse_signature(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| after_marker(line, "MD5 signature:").map(str::to_string))
}

fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|i| line[i + marker.len()..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_pass_block() {
        let out = "\
Decoding track...
MD5 signature: aabbccdd
Expected MD5: aabbccdd
Computed MD5: aabbccdd
Result: PASS
Done.
";
        assert_eq!(
            parse_verification(out),
            ChecksumReport::Verified {
                expected: "aabbccdd".to_string(),
                computed: "aabbccdd".to_string(),
                passed: true,
            }
        );
        assert_eq!(parse_signature(out), Some("aabbccdd".to_string()));
    }

    #[test]
    fn test_parses_fail_block() {
        let out = "Expected MD5: 1111\nComputed MD5: 2222\nResult: FAIL\n";
        let report = parse_verification(out);
        assert_eq!(report.matched(), Some(false));
        match report {
            ChecksumReport::Verified {
                expected, computed, ..
            } => {
                assert_eq!(expected, "1111");
                assert_eq!(computed, "2222");
            }
            other => panic!("unexpected report: {:?}", other),
        }
    }

    #[test]
    fn test_skipped_short_circuits() {
        // A stray PASS after SKIPPED must not resurrect verification.
        let out = "Status: SKIPPED\nResult: PASS\n";
        assert_eq!(parse_verification(out), ChecksumReport::Skipped);
        assert_eq!(parse_verification(out).matched(), None);
    }

    #[test]
    fn test_absent_when_no_block() {
        assert_eq!(parse_verification("decoded 1024 frames\n"), ChecksumReport::Absent);
        assert_eq!(parse_signature("decoded 1024 frames\n"), None);
    }

    #[test]
    fn test_pass_line_with_prefix_noise() {
        let out = "[12:00:01] Result: PASS\n";
        assert_eq!(parse_verification(out).matched(), Some(true));
    }
}
