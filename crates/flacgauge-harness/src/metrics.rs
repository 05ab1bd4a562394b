//! Performance metric extraction from the telemetry transcript.

use regex::Regex;

/// The three performance figures reported by the on-target benchmark.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BenchMetrics {
    /// Total decode time in milliseconds.
    pub decode_time_ms: f64,
    /// Real-time factor (decode time / audio duration).
    pub rtf: f64,
    /// Speed multiplier relative to real time.
    pub speed_x: f64,
}

/// Extracts metrics from a transcript.
///
/// All three fixed patterns must match or the result is `None`, which the
/// caller treats as a degraded outcome rather than an error. The first
/// match of each pattern wins.
pub fn extract_metrics(transcript: &str) -> Option<BenchMetrics> {
    let time_re = Regex::new(r"Total decode time:\s*([\d.]+)\s*ms").ok()?;
    let rtf_re = Regex::new(r"RTF:\s*([\d.]+)").ok()?;
    let speed_re = Regex::new(r"([\d.]+)x\)").ok()?;

    let decode_time_ms = capture_f64(&time_re, transcript)?;
    let rtf = capture_f64(&rtf_re, transcript)?;
    let speed_x = capture_f64(&speed_re, transcript)?;

    Some(BenchMetrics {
        decode_time_ms,
        rtf,
        speed_x,
    })
}

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_all_three_metrics() {
        let transcript = "\
=== FLAC Decode Benchmark ===
Decoding 16 tracks...
Total decode time: 512.30 ms
Audio duration: 12200.00 ms (RTF: 0.042, 8.1x)
Benchmark complete.
";
        let metrics = extract_metrics(transcript).unwrap();
        assert_eq!(metrics.decode_time_ms, 512.30);
        assert_eq!(metrics.rtf, 0.042);
        assert_eq!(metrics.speed_x, 8.1);
    }

    #[test]
    fn test_patterns_match_across_lines() {
        let transcript = "x Total decode time: 512.30 ms y\nz RTF: 0.042 w\nq 8.1x) r\n";
        let metrics = extract_metrics(transcript).unwrap();
        assert_eq!(
            metrics,
            BenchMetrics {
                decode_time_ms: 512.30,
                rtf: 0.042,
                speed_x: 8.1
            }
        );
    }

    #[test]
    fn test_missing_any_pattern_yields_none() {
        assert_eq!(extract_metrics(""), None);
        assert_eq!(
            extract_metrics("Total decode time: 512.30 ms\nRTF: 0.042\n"),
            None
        );
        assert_eq!(extract_metrics("RTF: 0.042\n8.1x)\n"), None);
    }

    #[test]
    fn test_unparseable_number_yields_none() {
        // The time pattern requires digits right after the marker.
        assert_eq!(
            extract_metrics("Total decode time: abc ms\nRTF: 0.042\n8.1x)\n"),
            None
        );
    }
}
