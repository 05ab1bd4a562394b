//! Session report rendering.
//!
//! Writes a human-readable text report and a machine-readable JSON report
//! under the results directory after a validation phase.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::checksum::ChecksumReport;
use crate::corpus::Category;
use crate::error::{HarnessError, HarnessResult};
use crate::pipeline::ValidationCounts;
use crate::validate::{CaseReport, Verdict};

/// One case in the JSON report.
#[derive(Debug, Serialize)]
struct JsonCase {
    file: String,
    category: Category,
    our_status: &'static str,
    reference_status: &'static str,
    verdict: Verdict,
    result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    md5_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pcm_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    computed_md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    md5_signature: Option<String>,
}

#[derive(Debug, Serialize)]
struct JsonReport {
    timestamp: String,
    summary: ValidationCounts,
    results: Vec<JsonCase>,
}

fn status_str(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failed"
    }
}

fn json_case(report: &CaseReport) -> JsonCase {
    let (expected_md5, computed_md5) = match &report.checksum {
        ChecksumReport::Verified {
            expected, computed, ..
        } => (Some(expected.clone()), Some(computed.clone())),
        _ => (None, None),
    };
    JsonCase {
        file: report.file_name.clone(),
        category: report.category,
        our_status: status_str(report.decoder.success),
        reference_status: status_str(report.reference.success),
        verdict: report.verdict(),
        result: report.describe(),
        md5_match: report.checksum.matched(),
        pcm_match: report.pcm_match,
        expected_md5,
        computed_md5,
        md5_signature: report.signature.clone(),
    }
}

fn verdict_glyph(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "+",
        Verdict::Fail => "x",
        Verdict::Inconclusive => "?",
    }
}

fn render_text(reports: &[CaseReport], counts: &ValidationCounts) -> String {
    let mut lines = vec![
        "=".repeat(70),
        "FLAC Decoder Validation Report".to_string(),
        format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
        "=".repeat(70),
        String::new(),
        "SUMMARY".to_string(),
        "-".repeat(40),
        format!("Total files tested: {}", counts.total),
        format!("Passed (bit-perfect): {}", counts.passed),
        format!("Failed: {}", counts.failed),
        format!("Inconclusive/expected failures: {}", counts.inconclusive),
        String::new(),
    ];

    for category in Category::ALL {
        let in_category: Vec<&CaseReport> =
            reports.iter().filter(|r| r.category == category).collect();
        if in_category.is_empty() {
            continue;
        }

        lines.push(String::new());
        lines.push(format!(
            "{} FILES ({} files)",
            category.as_str().to_uppercase(),
            in_category.len()
        ));
        lines.push("-".repeat(40));

        for report in in_category {
            lines.push(format!(
                "{} {}: {}",
                verdict_glyph(report.verdict()),
                report.file_name,
                report.describe()
            ));

            if let ChecksumReport::Verified {
                expected,
                computed,
                passed: false,
            } = &report.checksum
            {
                lines.push(format!("    Expected MD5: {}", expected));
                lines.push(format!("    Computed MD5: {}", computed));
            }

            if let Some(pcm_match) = report.pcm_match {
                let status = if pcm_match { "matches" } else { "differs" };
                lines.push(format!("    reference comparison: {}", status));
            }

            if let Some(error) = &report.decoder.error {
                lines.push(format!("    decoder error: {}", error));
            }
            if report.outcome == crate::validate::CaseOutcome::ReferenceUnavailable {
                if let Some(error) = &report.reference.error {
                    let excerpt: String = error.chars().take(100).collect();
                    lines.push(format!("    reference error: {}", excerpt));
                }
            }
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Writes both report files, returning `(text_path, json_path)`.
pub fn write_reports(
    results_dir: &Path,
    reports: &[CaseReport],
    counts: &ValidationCounts,
) -> HarnessResult<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(results_dir)?;

    let text_path = results_dir.join("test_report.txt");
    std::fs::write(&text_path, render_text(reports, counts)).map_err(|e| {
        HarnessError::WriteFailed {
            path: text_path.clone(),
            source: e,
        }
    })?;

    let json = JsonReport {
        timestamp: Utc::now().to_rfc3339(),
        summary: *counts,
        results: reports.iter().map(json_case).collect(),
    };
    let json_path = results_dir.join("test_report.json");
    let content = serde_json::to_string_pretty(&json).map_err(|e| HarnessError::WriteFailed {
        path: json_path.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    std::fs::write(&json_path, content).map_err(|e| HarnessError::WriteFailed {
        path: json_path.clone(),
        source: e,
    })?;

    Ok((text_path, json_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{CaseOutcome, DecodeAttempt, DecodeTool};

    fn sample_report(verdict_outcome: CaseOutcome, category: Category) -> CaseReport {
        CaseReport {
            file_name: "sample.flac".to_string(),
            category,
            decoder: DecodeAttempt {
                tool: DecodeTool::UnderTest,
                success: true,
                error: None,
                output: "out/sample.wav".into(),
            },
            reference: DecodeAttempt {
                tool: DecodeTool::Reference,
                success: true,
                error: None,
                output: "ref/sample.wav".into(),
            },
            checksum: ChecksumReport::Verified {
                expected: "aa".to_string(),
                computed: "bb".to_string(),
                passed: matches!(verdict_outcome, CaseOutcome::ChecksumVerified),
            },
            signature: None,
            outcome: verdict_outcome,
            pcm_match: Some(true),
            annotation: None,
        }
    }

    #[test]
    fn test_text_report_sections() {
        let reports = vec![
            sample_report(CaseOutcome::ChecksumVerified, Category::Subset),
            sample_report(CaseOutcome::ChecksumMismatch, Category::Uncommon),
        ];
        let counts = ValidationCounts::from_reports(&reports);
        let text = render_text(&reports, &counts);

        assert!(text.contains("SUBSET FILES (1 files)"));
        assert!(text.contains("UNCOMMON FILES (1 files)"));
        assert!(text.contains("Total files tested: 2"));
        // MD5 detail only rendered for the mismatch.
        assert_eq!(text.matches("Expected MD5:").count(), 1);
    }

    #[test]
    fn test_write_reports_creates_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = vec![sample_report(CaseOutcome::ChecksumVerified, Category::Subset)];
        let counts = ValidationCounts::from_reports(&reports);

        let (text_path, json_path) =
            write_reports(tmp.path(), &reports, &counts).unwrap();
        assert!(text_path.exists());
        assert!(json_path.exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["summary"]["passed"], 1);
        assert_eq!(json["results"][0]["file"], "sample.flac");
        assert_eq!(json["results"][0]["verdict"], "pass");
    }
}
