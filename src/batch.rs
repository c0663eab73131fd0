//! Parallel batch analysis
//!
//! Each recording is analysed independently on a rayon pool. A failing
//! recording becomes a failure entry; the rest of the batch still runs.

use crate::adapter::RecordingAdapter;
use crate::calculator::MetricsCalculator;
use crate::error::AnalysisError;
use crate::report::{ReportEncoder, SessionReport};
use crate::signal::mean;
use crate::types::MetricValue;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Failure code for inputs that could not be read
pub const IO_ERROR_CODE: &str = "IO_ERROR";

/// A named recording document awaiting analysis
///
/// `content` holds the read error instead of the document when the source
/// could not be read, so the failure is reported alongside the other entries.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub name: String,
    pub content: Result<String, String>,
}

impl BatchInput {
    pub fn new(name: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Ok(json.into()),
        }
    }

    /// An input whose source could not be read
    pub fn unreadable(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            content: Err(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Success { report: Box<SessionReport> },
    Failure { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn report(&self) -> Option<&SessionReport> {
        match &self.outcome {
            BatchOutcome::Success { report } => Some(report.as_ref()),
            BatchOutcome::Failure { .. } => None,
        }
    }
}

/// Batch results, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub mean_overall_score: MetricValue,
    pub entries: Vec<BatchEntry>,
}

/// Analyse recordings in parallel
///
/// `jobs` bounds the pool size; `None` uses one thread per logical CPU.
///
/// # Errors
/// `InvalidConfig` only when the thread pool cannot be built. Per-recording
/// errors are reported as failure entries.
pub fn analyze_batch(
    inputs: &[BatchInput],
    calculator: &MetricsCalculator,
    jobs: Option<usize>,
) -> Result<BatchSummary, AnalysisError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
        .map_err(|e| AnalysisError::InvalidConfig(format!("thread pool: {e}")))?;

    info!(
        "Analyzing {} recordings on {} threads",
        inputs.len(),
        pool.current_num_threads()
    );

    let encoder = ReportEncoder::new();
    let entries: Vec<BatchEntry> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| BatchEntry {
                name: input.name.clone(),
                outcome: analyze_one(input, calculator, &encoder),
            })
            .collect()
    });

    let scores: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.report())
        .map(|r| r.metrics.performance.overall)
        .collect();
    let succeeded = scores.len();
    let failed = entries.len() - succeeded;

    info!("Batch complete: {succeeded} succeeded, {failed} failed");

    Ok(BatchSummary {
        total: entries.len(),
        succeeded,
        failed,
        mean_overall_score: MetricValue::from(mean(&scores)),
        entries,
    })
}

fn analyze_one(input: &BatchInput, calculator: &MetricsCalculator, encoder: &ReportEncoder) -> BatchOutcome {
    let json = match &input.content {
        Ok(json) => json,
        Err(message) => {
            warn!("{}: {}", input.name, message);
            return BatchOutcome::Failure {
                code: IO_ERROR_CODE.to_string(),
                message: message.clone(),
            };
        }
    };
    let result = RecordingAdapter::parse_recording(json).and_then(|recording| {
        let analysis = calculator.calculate_recording(&recording)?;
        Ok(encoder.encode_recording(&recording, &analysis))
    });
    match result {
        Ok(report) => BatchOutcome::Success {
            report: Box::new(report),
        },
        Err(e) => {
            warn!("{}: {}", input.name, e);
            BatchOutcome::Failure {
                code: e.code().to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Recording;
    use crate::geometry::Quaternion;
    use crate::types::Sample;

    fn recording_json(name: &str, n: i64) -> String {
        let samples = (0..n)
            .map(|i| Sample::new(i * 33_333_333, Quaternion::from_euler_deg(0.1 * i as f64, 0.0, 0.0)))
            .collect();
        serde_json::to_string(&Recording::new(name, samples)).unwrap()
    }

    fn input(name: &str, json: String) -> BatchInput {
        BatchInput::new(name, json)
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let inputs = vec![
            input("a", recording_json("a", 60)),
            input("broken", "{not json".to_string()),
            input("short", recording_json("short", 1)),
            input("b", recording_json("b", 90)),
        ];
        let summary = analyze_batch(&inputs, &MetricsCalculator::with_defaults(), Some(2)).unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 2);
        let names: Vec<&str> = summary.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "broken", "short", "b"]);
        assert!(matches!(
            &summary.entries[1].outcome,
            BatchOutcome::Failure { code, .. } if code == "JSON_ERROR"
        ));
        assert!(matches!(
            &summary.entries[2].outcome,
            BatchOutcome::Failure { code, .. } if code == "INSUFFICIENT_DATA"
        ));
        assert!(summary.mean_overall_score.is_available());
    }

    #[test]
    fn test_unreadable_input_is_a_failure_entry() {
        let inputs = vec![
            input("a", recording_json("a", 60)),
            BatchInput::unreadable("b_bad", "stream did not contain valid UTF-8"),
            input("c", recording_json("c", 60)),
        ];
        let summary = analyze_batch(&inputs, &MetricsCalculator::with_defaults(), Some(2)).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            summary.entries[1].outcome,
            BatchOutcome::Failure {
                code: "IO_ERROR".to_string(),
                message: "stream did not contain valid UTF-8".to_string(),
            }
        );
        assert!(summary.entries[2].report().is_some());
    }

    #[test]
    fn test_empty_batch() {
        let summary = analyze_batch(&[], &MetricsCalculator::with_defaults(), None).unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mean_overall_score, MetricValue::Unavailable);
    }

    #[test]
    fn test_batch_matches_sequential_analysis() {
        let json = recording_json("same", 120);
        let calculator = MetricsCalculator::with_defaults();
        let summary = analyze_batch(&[input("same", json.clone())], &calculator, Some(1)).unwrap();
        let recording = RecordingAdapter::parse_recording(&json).unwrap();
        let expected = calculator.calculate_recording(&recording).unwrap();
        let report = summary.entries[0].report().unwrap();
        assert_eq!(report.metrics.performance, expected.performance);
    }
}
