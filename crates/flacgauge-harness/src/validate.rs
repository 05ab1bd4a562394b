//! Differential validation of the decoder under test against a reference.
//!
//! The embedded MD5 signature is the primary oracle: a PASS/FAIL reported
//! by the decoder under test is authoritative regardless of what the
//! reference decoder produced. Only files without a signature fall back to
//! byte-exact PCM comparison against the reference output. Whenever both
//! decoders succeed, the PCM comparison also runs as a secondary
//! cross-check whose disagreement is annotated but never overrides the
//! checksum verdict.

use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::{self, ChecksumReport};
use crate::config::HarnessConfig;
use crate::corpus::TestCase;
use crate::process::{run_command, CommandOutput};
use crate::wav::{self, WavError};


/// Final verdict for one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// Neither a pass nor a decoder defect: both tools rejected the input,
    /// or the harness could not complete the comparison.
    Inconclusive,
}

/// Which tool a decode attempt ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeTool {
    UnderTest,
    Reference,
}

/// One decode attempt by one tool.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecodeAttempt {
    pub tool: DecodeTool,
    pub success: bool,
    /// Truncated error text when the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Where the decoded WAV was written.
    pub output: PathBuf,
}

impl DecodeAttempt {
    fn from_output(tool: DecodeTool, output_path: PathBuf, out: &CommandOutput) -> Self {
        Self {
            tool,
            success: out.success,
            error: if out.success {
                None
            } else {
                Some(out.error_text())
            },
            output: output_path,
        }
    }
}

/// Byte-level comparison of the two extracted waveforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmComparison {
    pub identical: bool,
    pub ours: usize,
    pub reference: usize,
}

/// Classified outcome of one case.
///
/// A tagged union rather than a bundle of nullable flags: each variant is a
/// reachable state, and [`CaseOutcome::verdict`] derives the verdict from
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Embedded MD5 verified by the decoder under test.
    ChecksumVerified,
    /// Embedded MD5 mismatch reported by the decoder under test.
    ChecksumMismatch,
    /// No embedded MD5; waveforms are byte-identical.
    WaveformMatch,
    /// No embedded MD5; waveforms differ.
    WaveformMismatch { ours: usize, reference: usize },
    /// Both decoders rejected the input (expected on the faulty partition).
    BothDecodersFailed,
    /// The decoder under test failed on an input the reference handles.
    DecoderFailedAlone,
    /// No embedded MD5 and the reference decoder failed, so there is
    /// nothing to compare against.
    ReferenceUnavailable,
    /// A decode succeeded but its WAV output could not be parsed.
    ExtractionError,
}

impl CaseOutcome {
    /// Derives the verdict for this outcome.
    pub fn verdict(&self) -> Verdict {
        match self {
            CaseOutcome::ChecksumVerified | CaseOutcome::WaveformMatch => Verdict::Pass,
            CaseOutcome::ChecksumMismatch
            | CaseOutcome::WaveformMismatch { .. }
            | CaseOutcome::DecoderFailedAlone => Verdict::Fail,
            CaseOutcome::BothDecodersFailed
            | CaseOutcome::ReferenceUnavailable
            | CaseOutcome::ExtractionError => Verdict::Inconclusive,
        }
    }

    /// Human-readable classification for reports.
    pub fn describe(&self) -> String {
        match self {
            CaseOutcome::ChecksumVerified => "PASS - MD5 verified".to_string(),
            CaseOutcome::ChecksumMismatch => "FAIL - MD5 mismatch".to_string(),
            CaseOutcome::WaveformMatch => {
                "PASS - matches reference output (no MD5 in file)".to_string()
            }
            CaseOutcome::WaveformMismatch { ours, reference } => format!(
                "FAIL - PCM mismatch with reference (ours: {} bytes, reference: {} bytes)",
                ours, reference
            ),
            CaseOutcome::BothDecodersFailed => {
                "EXPECTED - both decoders rejected the input".to_string()
            }
            CaseOutcome::DecoderFailedAlone => {
                "FAIL - decoder failed on input the reference handles".to_string()
            }
            CaseOutcome::ReferenceUnavailable => {
                "UNKNOWN - no MD5 available and reference decoder failed".to_string()
            }
            CaseOutcome::ExtractionError => "ERROR - could not extract PCM data".to_string(),
        }
    }
}

/// Full detail for one validated case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub file_name: String,
    pub category: crate::corpus::Category,
    pub decoder: DecodeAttempt,
    pub reference: DecodeAttempt,
    pub checksum: ChecksumReport,
    /// Informational `MD5 signature:` line, when the decoder printed one.
    pub signature: Option<String>,
    pub outcome: CaseOutcome,
    /// Secondary cross-check result, when both decoders succeeded and both
    /// waveforms extracted.
    pub pcm_match: Option<bool>,
    /// Note appended when the cross-check disagrees with the checksum
    /// verdict. Never changes the verdict.
    pub annotation: Option<String>,
}

impl CaseReport {
    pub fn verdict(&self) -> Verdict {
        self.outcome.verdict()
    }

    /// Classification plus any cross-check annotation.
    pub fn describe(&self) -> String {
        match &self.annotation {
            Some(note) => format!("{} {}", self.outcome.describe(), note),
            None => self.outcome.describe(),
        }
    }
}

/// Classifies one case from the attempt results.
///
/// `compare` is invoked at most once, only on the no-checksum fallback path
/// where both decoders succeeded.
pub(crate) fn classify(
    decoder_ok: bool,
    reference_ok: bool,
    checksum: &ChecksumReport,
    compare: impl FnOnce() -> Result<PcmComparison, WavError>,
) -> CaseOutcome {
    if !decoder_ok {
        return if reference_ok {
            CaseOutcome::DecoderFailedAlone
        } else {
            CaseOutcome::BothDecodersFailed
        };
    }

    match checksum.matched() {
        Some(true) => CaseOutcome::ChecksumVerified,
        Some(false) => CaseOutcome::ChecksumMismatch,
        None => {
            if !reference_ok {
                return CaseOutcome::ReferenceUnavailable;
            }
            match compare() {
                Ok(cmp) if cmp.identical => CaseOutcome::WaveformMatch,
                Ok(cmp) => CaseOutcome::WaveformMismatch {
                    ours: cmp.ours,
                    reference: cmp.reference,
                },
                Err(_) => CaseOutcome::ExtractionError,
            }
        }
    }
}

/// Annotation for the secondary cross-check, when it ran.
pub(crate) fn cross_check_annotation(outcome: &CaseOutcome, pcm_match: bool) -> Option<String> {
    match (outcome.verdict(), pcm_match) {
        (Verdict::Pass, false) => Some("(WARNING: reference output differs)".to_string()),
        (Verdict::Fail, true) => {
            Some("(NOTE: reference output matches despite MD5 fail)".to_string())
        }
        (Verdict::Pass, true) => match outcome {
            // The waveform-compared variant already is the PCM comparison.
            CaseOutcome::WaveformMatch => None,
            _ => Some("+ matches reference".to_string()),
        },
        _ => None,
    }
}

/// Maps a probed bit depth to the reference codec name.
///
/// Out-of-range or unknown depths leave the choice to the reference tool.
pub(crate) fn codec_for_bit_depth(bit_depth: Option<u32>) -> Option<&'static str> {
    match bit_depth? {
        0..=8 => Some("pcm_u8"),
        9..=16 => Some("pcm_s16le"),
        17..=24 => Some("pcm_s24le"),
        25..=32 => Some("pcm_s32le"),
        _ => None,
    }
}

/// Runs both decoders on corpus files and classifies each outcome.
pub struct DifferentialValidator<'a> {
    config: &'a HarnessConfig,
}

impl<'a> DifferentialValidator<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Probes the input's bit depth. Best-effort: any failure is `None`.
    fn probe_bit_depth(&self, input: &Path) -> Option<u32> {
        let out = run_command(
            &self.config.tools.ffprobe,
            &[
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=bits_per_raw_sample",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                &input.to_string_lossy(),
            ],
            self.config.decode_timeout,
        )
        .ok()?;
        if !out.success {
            return None;
        }
        out.stdout.trim().parse().ok()
    }

    fn output_path(&self, case: &TestCase, tool_dir: &str) -> PathBuf {
        let stem = case
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.config
            .results_dir
            .join(case.category.as_str())
            .join(tool_dir)
            .join(format!("{}.wav", stem))
    }

    /// Validates a single corpus file.
    ///
    /// Per-case failures of any kind end up in the report, never as errors;
    /// only an unspawnable decoder surfaces as `Err`, since that means the
    /// tool itself is missing.
    pub fn validate_case(&self, case: &TestCase) -> crate::error::HarnessResult<CaseReport> {
        let bit_depth = self.probe_bit_depth(&case.path);

        let our_output = self.output_path(case, "decoder");
        let ref_output = self.output_path(case, "reference");
        for out in [&our_output, &ref_output] {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        // Decoder under test.
        let input = case.path.to_string_lossy().into_owned();
        let decoder_prog = self.config.tools.decoder.to_string_lossy().into_owned();
        let our_out_str = our_output.to_string_lossy().into_owned();
        let decoder_out = run_command(
            &decoder_prog,
            &[&input, &our_out_str],
            self.config.decode_timeout,
        )?;
        let decoder = DecodeAttempt::from_output(DecodeTool::UnderTest, our_output, &decoder_out);

        // Reference decoder, sample format matched to the probed depth.
        let mut ref_args: Vec<&str> = vec!["-i", input.as_ref()];
        let codec = codec_for_bit_depth(bit_depth);
        if let Some(codec) = codec {
            ref_args.extend_from_slice(&["-c:a", codec]);
        }
        let ref_out_str = ref_output.to_string_lossy().into_owned();
        ref_args.extend_from_slice(&["-f", "wav", "-y", &ref_out_str]);
        let reference_out = run_command(
            &self.config.tools.ffmpeg,
            &ref_args,
            self.config.decode_timeout,
        )?;
        let reference =
            DecodeAttempt::from_output(DecodeTool::Reference, ref_output, &reference_out);

        let checksum = if decoder.success {
            checksum::parse_verification(&decoder_out.stdout)
        } else {
            ChecksumReport::Absent
        };
        let signature = checksum::parse_signature(&decoder_out.stdout);

        let outcome = classify(decoder.success, reference.success, &checksum, || {
            let ours = wav::extract_pcm_file(&decoder.output)?;
            let theirs = wav::extract_pcm_file(&reference.output)?;
            Ok(PcmComparison {
                identical: ours == theirs,
                ours: ours.len(),
                reference: theirs.len(),
            })
        });

        // Secondary cross-check whenever both decodes succeeded and the
        // primary verdict came from the checksum. Extraction trouble here
        // just leaves the flag unset.
        let mut pcm_match = match outcome {
            CaseOutcome::WaveformMatch => Some(true),
            CaseOutcome::WaveformMismatch { .. } => Some(false),
            _ => None,
        };
        let mut annotation = None;
        if decoder.success && reference.success && checksum.matched().is_some() {
            if let (Ok(ours), Ok(theirs)) = (
                wav::extract_pcm_file(&decoder.output),
                wav::extract_pcm_file(&reference.output),
            ) {
                let matched = ours == theirs;
                pcm_match = Some(matched);
                annotation = cross_check_annotation(&outcome, matched);
            }
        }

        Ok(CaseReport {
            file_name: case.file_name(),
            category: case.category,
            decoder,
            reference,
            checksum,
            signature,
            outcome,
            pcm_match,
            annotation,
        })
    }
}
