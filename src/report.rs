//! Per-file outcomes and batch reporting.
//!
//! Every discovered file produces exactly one [`TransformResult`], created
//! once and never mutated. Results are aggregated into a [`BatchReport`]
//! in discovery order, together with summary counts. Reports are produced
//! once per invocation and are not persisted; the JSON report mode
//! serializes them to stdout.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Outcome of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// The transform succeeded and the destination file was written.
    Converted,

    /// The file was left alone: unsupported format, or the destination
    /// already exists under the skip policy.
    Skipped {
        /// Why the file was skipped.
        reason: String,
    },

    /// The transform failed; nothing was left at the destination.
    Failed {
        /// Human-readable cause.
        cause: String,
    },
}

/// Result of processing one discovered file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    /// Source file path.
    pub source: PathBuf,

    /// Computed destination path, if the operation writes output.
    pub destination: Option<PathBuf>,

    /// What happened.
    pub outcome: Outcome,
}

impl TransformResult {
    /// Record a successful conversion.
    pub fn converted(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination: Some(destination),
            outcome: Outcome::Converted,
        }
    }

    /// Record a skipped file.
    pub fn skipped(source: PathBuf, destination: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source,
            destination,
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    /// Record a failed file.
    pub fn failed(source: PathBuf, destination: Option<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            source,
            destination,
            outcome: Outcome::Failed {
                cause: cause.into(),
            },
        }
    }

    /// Classify a per-file error into an outcome.
    ///
    /// Unsupported formats are recorded as skipped (they are not
    /// failures); everything else is a failure with the error message as
    /// the cause.
    pub fn from_error(source: PathBuf, destination: Option<PathBuf>, err: &Error) -> Self {
        match err {
            Error::UnsupportedFormat { .. } => {
                Self::skipped(source, destination, "unsupported format")
            }
            other => Self::failed(source, destination, other.to_string()),
        }
    }

    /// Whether this result is a success.
    pub fn is_converted(&self) -> bool {
        matches!(self.outcome, Outcome::Converted)
    }

    /// Whether this result is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

/// Aggregated outcome of one batch invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Per-file results, in discovery order.
    pub results: Vec<TransformResult>,

    /// Number of files converted.
    pub converted: usize,

    /// Number of files skipped.
    pub skipped: usize,

    /// Number of files that failed.
    pub failed: usize,

    /// Wall-clock time for the batch.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl BatchReport {
    /// Build a report from ordered results.
    pub fn from_results(results: Vec<TransformResult>, elapsed: Duration) -> Self {
        let converted = results.iter().filter(|r| r.is_converted()).count();
        let failed = results.iter().filter(|r| r.is_failed()).count();
        let skipped = results.len() - converted - failed;

        Self {
            results,
            converted,
            skipped,
            failed,
            elapsed,
        }
    }

    /// Total number of files processed.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Whether every file either converted or was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} converted, {} skipped, {} failed ({} file(s) in {:.2}s)",
            self.converted,
            self.skipped,
            self.failed,
            self.total(),
            self.elapsed.as_secs_f64()
        )
    }

    /// Iterate over the failed entries.
    pub fn failures(&self) -> impl Iterator<Item = &TransformResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(name: &str) -> TransformResult {
        TransformResult::converted(PathBuf::from(name), PathBuf::from("out").join(name))
    }

    #[test]
    fn test_report_counts() {
        let results = vec![
            converted("a.png"),
            TransformResult::skipped(PathBuf::from("b.png"), None, "destination exists"),
            TransformResult::failed(PathBuf::from("c.png"), None, "truncated"),
            converted("d.png"),
        ];

        let report = BatchReport::from_results(results, Duration::from_millis(120));
        assert_eq!(report.total(), 4);
        assert_eq!(report.converted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_report_counts_sum_to_total() {
        let results = vec![
            converted("a.png"),
            TransformResult::skipped(PathBuf::from("b.png"), None, "unsupported format"),
        ];
        let report = BatchReport::from_results(results, Duration::ZERO);
        assert_eq!(
            report.total(),
            report.converted + report.skipped + report.failed
        );
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = BatchReport::from_results(Vec::new(), Duration::ZERO);
        assert_eq!(report.total(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_from_error_unsupported_is_skipped() {
        let err = Error::unsupported("doc.xyz");
        let result = TransformResult::from_error(PathBuf::from("doc.xyz"), None, &err);
        assert!(matches!(result.outcome, Outcome::Skipped { .. }));
    }

    #[test]
    fn test_from_error_decode_is_failed() {
        let err = Error::decode("bad.png", "not a PNG");
        let result = TransformResult::from_error(PathBuf::from("bad.png"), None, &err);
        assert!(result.is_failed());
        if let Outcome::Failed { cause } = &result.outcome {
            assert!(cause.contains("not a PNG"));
        }
    }

    #[test]
    fn test_failures_iterator() {
        let results = vec![
            converted("a.png"),
            TransformResult::failed(PathBuf::from("b.png"), None, "x"),
            TransformResult::failed(PathBuf::from("c.png"), None, "y"),
        ];
        let report = BatchReport::from_results(results, Duration::ZERO);
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let report = BatchReport::from_results(vec![converted("a.png")], Duration::from_secs(1));
        let summary = report.summary();
        assert!(summary.contains("1 converted"));
        assert!(summary.contains("0 failed"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = BatchReport::from_results(
            vec![TransformResult::skipped(
                PathBuf::from("a.png"),
                None,
                "destination exists",
            )],
            Duration::from_millis(50),
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"skipped\""));
        assert!(json.contains("destination exists"));
    }
}
