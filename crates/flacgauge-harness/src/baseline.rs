//! Baseline persistence and comparison.
//!
//! A single JSON record holds the last accepted benchmark result. Saving
//! replaces it wholesale; no history is kept. A missing or unreadable
//! record is simply "no baseline"; first runs and corrupt files behave
//! identically and are never fatal.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::metrics::BenchMetrics;

fn default_schema_version() -> u32 {
    1
}

/// Persisted benchmark baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    /// Schema version for future compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub decode_time_ms: f64,
    pub rtf: f64,
    pub speed_x: f64,
    pub saved_at: DateTime<Utc>,
}

impl BaselineRecord {
    /// Creates a record from current metrics with a fresh timestamp.
    pub fn from_metrics(metrics: &BenchMetrics) -> Self {
        Self {
            schema_version: 1,
            decode_time_ms: metrics.decode_time_ms,
            rtf: metrics.rtf,
            speed_x: metrics.speed_x,
            saved_at: Utc::now(),
        }
    }
}

/// Qualitative direction of a baseline delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaLabel {
    Faster,
    Regression,
    Unchanged,
}

/// Signed comparison of a current result against the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineDelta {
    /// `current.decode_time_ms - baseline.decode_time_ms`.
    pub delta_ms: f64,
    pub label: DeltaLabel,
}

impl BaselineDelta {
    /// Phrase used in the verdict line.
    pub fn describe(&self) -> String {
        match self.label {
            DeltaLabel::Faster => format!("{:.2} ms FASTER than baseline", self.delta_ms.abs()),
            DeltaLabel::Regression => {
                format!("{:.2} ms SLOWER than baseline (REGRESSION)", self.delta_ms)
            }
            DeltaLabel::Unchanged => "same as baseline".to_string(),
        }
    }
}

/// Computes the signed delta of `current` against `baseline`.
pub fn delta(current: &BenchMetrics, baseline: &BaselineRecord) -> BaselineDelta {
    let delta_ms = current.decode_time_ms - baseline.decode_time_ms;
    let label = if delta_ms < 0.0 {
        DeltaLabel::Faster
    } else if delta_ms > 0.0 {
        DeltaLabel::Regression
    } else {
        DeltaLabel::Unchanged
    };
    BaselineDelta { delta_ms, label }
}

/// Loads and saves the baseline record at a fixed path.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted record, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<BaselineRecord> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Atomically replaces the persisted record.
    ///
    /// Writes to a temp file in the same directory, then renames over the
    /// target, so a crash mid-write cannot leave a torn record.
    pub fn save(&self, record: &BaselineRecord) -> HarnessResult<()> {
        let json = serde_json::to_string_pretty(record).map_err(|e| {
            HarnessError::WriteFailed {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());

        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir),
            None => tempfile::NamedTempFile::new_in("."),
        }
        .map_err(|e| HarnessError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })?;

        tmp.write_all(json.as_bytes())
            .map_err(|e| HarnessError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })?;
        tmp.persist(&self.path)
            .map_err(|e| HarnessError::WriteFailed {
                path: self.path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metrics(decode_time_ms: f64) -> BenchMetrics {
        BenchMetrics {
            decode_time_ms,
            rtf: 0.042,
            speed_x: 8.1,
        }
    }

    #[test]
    fn test_load_without_save_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));

        let record = BaselineRecord::from_metrics(&metrics(512.30));
        store.save(&record).unwrap();
        assert_eq!(store.load(), Some(record));
    }

    #[test]
    fn test_save_replaces_prior_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));

        store
            .save(&BaselineRecord::from_metrics(&metrics(600.0)))
            .unwrap();
        let second = BaselineRecord::from_metrics(&metrics(512.30));
        store.save(&second).unwrap();
        assert_eq!(store.load(), Some(second));
    }

    #[test]
    fn test_corrupt_record_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("baseline.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(BaselineStore::new(&path).load(), None);
    }

    #[test]
    fn test_delta_signs() {
        let baseline = BaselineRecord::from_metrics(&metrics(500.0));

        let d = delta(&metrics(480.0), &baseline);
        assert_eq!(d.label, DeltaLabel::Faster);
        assert!(d.delta_ms < 0.0);
        assert!(d.describe().contains("FASTER"));

        let d = delta(&metrics(520.0), &baseline);
        assert_eq!(d.label, DeltaLabel::Regression);
        assert!(d.delta_ms > 0.0);
        assert!(d.describe().contains("REGRESSION"));

        let d = delta(&metrics(500.0), &baseline);
        assert_eq!(d.label, DeltaLabel::Unchanged);
        assert_eq!(d.describe(), "same as baseline");
    }
}
