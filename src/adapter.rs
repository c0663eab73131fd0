//! Recording input adapter
//!
//! Parses recordings produced by the frame extractor: either a single JSON
//! document carrying head-pose samples plus optional hand and gaze streams, or
//! newline-delimited head-pose samples.

use crate::config::MetricsConfig;
use crate::error::AnalysisError;
use crate::geometry::is_finite_vec3;
use crate::session::Session;
use crate::types::{GazeSample, HandSample, Sample};
use serde::{Deserialize, Serialize};

/// One extracted recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub session_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub samples: Vec<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_tracking: Option<Vec<HandSample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_gaze: Option<Vec<GazeSample>>,
}

impl Recording {
    /// Recording with head-pose samples only
    pub fn new(session_name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            session_name: session_name.into(),
            device_id: None,
            samples,
            hand_tracking: None,
            eye_gaze: None,
        }
    }
}

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Analysis will be rejected
    Fatal,
    /// Analysis proceeds; the affected data is dropped or flagged
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationProblem {
    /// Index of the offending sample, if the problem is sample-specific
    pub index: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

/// Result of checking a recording without computing metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub session_name: String,
    pub total_samples: usize,
    pub heart_rate_samples: usize,
    pub hand_frames: usize,
    pub gaze_samples: usize,
    pub problems: Vec<ValidationProblem>,
    /// Error the calculator would return, if any
    pub fatal_error: Option<String>,
    pub fatal_code: Option<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.fatal_error.is_none()
    }
}

/// Adapter for extractor recordings
pub struct RecordingAdapter;

impl RecordingAdapter {
    /// Parse a JSON recording document
    pub fn parse_recording(json: &str) -> Result<Recording, AnalysisError> {
        let recording: Recording = serde_json::from_str(json)?;
        Ok(recording)
    }

    /// Parse NDJSON (one head-pose sample per line)
    pub fn parse_ndjson_samples(ndjson: &str) -> Result<Vec<Sample>, AnalysisError> {
        let mut samples = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Sample>(trimmed) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    return Err(AnalysisError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(samples)
    }

    /// Check a recording and list every problem found
    ///
    /// Sample-level findings are collected exhaustively; `fatal_error` carries
    /// the first error session construction would raise.
    pub fn validate(recording: &Recording, config: &MetricsConfig) -> ValidationReport {
        let mut problems = Vec::new();
        let stress = &config.stress;
        let mut heart_rate_samples = 0;

        for (i, sample) in recording.samples.iter().enumerate() {
            if sample.orientation.to_unit().is_none() {
                problems.push(fatal(i, "malformed orientation quaternion"));
            }
            if let Some(position) = &sample.position_m {
                if !is_finite_vec3(position) {
                    problems.push(fatal(i, "non-finite position"));
                }
            }
            if i > 0 {
                let prev = recording.samples[i - 1].timestamp_ns;
                if sample.timestamp_ns < prev {
                    problems.push(fatal(
                        i,
                        &format!("timestamp {} ns precedes previous {} ns", sample.timestamp_ns, prev),
                    ));
                } else if sample.timestamp_ns == prev {
                    problems.push(warning(i, "duplicate timestamp"));
                }
            }
            if let Some(bpm) = sample.heart_rate_bpm {
                if bpm.is_finite() && bpm >= stress.hr_min_plausible && bpm <= stress.hr_max_plausible {
                    heart_rate_samples += 1;
                } else {
                    problems.push(warning(
                        i,
                        &format!("heart rate {bpm} bpm outside plausible range"),
                    ));
                }
            }
        }

        if heart_rate_samples == 0 {
            problems.push(ValidationProblem {
                index: None,
                severity: Severity::Warning,
                message: "no usable heart-rate readings; stress metrics will be unavailable"
                    .to_string(),
            });
        }

        let (fatal_error, fatal_code) = match Session::new(recording.samples.clone(), config) {
            Ok(_) => (None, None),
            Err(e) => (Some(e.to_string()), Some(e.code().to_string())),
        };

        ValidationReport {
            session_name: recording.session_name.clone(),
            total_samples: recording.samples.len(),
            heart_rate_samples,
            hand_frames: recording.hand_tracking.as_ref().map_or(0, Vec::len),
            gaze_samples: recording.eye_gaze.as_ref().map_or(0, Vec::len),
            problems,
            fatal_error,
            fatal_code,
        }
    }
}

fn fatal(index: usize, message: &str) -> ValidationProblem {
    ValidationProblem {
        index: Some(index),
        severity: Severity::Fatal,
        message: message.to_string(),
    }
}

fn warning(index: usize, message: &str) -> ValidationProblem {
    ValidationProblem {
        index: Some(index),
        severity: Severity::Warning,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING_JSON: &str = r#"{
        "session_name": "suturing-01",
        "device_id": "aria-7",
        "samples": [
            {"timestamp_ns": 0, "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}, "heart_rate_bpm": 72.0},
            {"timestamp_ns": 33333333, "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}, "position_m": [0.0, 1.6, 0.0]},
            {"timestamp_ns": 66666666, "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}}
        ],
        "eye_gaze": [
            {"timestamp_ns": 0, "yaw_rad": 0.1, "pitch_rad": -0.1, "depth_m": 0.5}
        ]
    }"#;

    #[test]
    fn test_parse_recording() {
        let recording = RecordingAdapter::parse_recording(RECORDING_JSON).unwrap();
        assert_eq!(recording.session_name, "suturing-01");
        assert_eq!(recording.device_id.as_deref(), Some("aria-7"));
        assert_eq!(recording.samples.len(), 3);
        assert_eq!(recording.samples[0].heart_rate_bpm, Some(72.0));
        assert_eq!(recording.samples[1].position_m, Some([0.0, 1.6, 0.0]));
        assert!(recording.hand_tracking.is_none());
        assert_eq!(recording.eye_gaze.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_parse_recording_rejects_bad_json() {
        let err = RecordingAdapter::parse_recording("{\"samples\": [").unwrap_err();
        assert_eq!(err.code(), "JSON_ERROR");
    }

    #[test]
    fn test_parse_ndjson_samples() {
        let ndjson = r#"{"timestamp_ns": 0, "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}}

{"timestamp_ns": 10, "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}, "heart_rate_bpm": 80.0}
"#;
        let samples = RecordingAdapter::parse_ndjson_samples(ndjson).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].heart_rate_bpm, Some(80.0));
    }

    #[test]
    fn test_ndjson_error_reports_line_number() {
        let ndjson = "{\"timestamp_ns\": 0, \"orientation\": {\"w\": 1.0, \"x\": 0.0, \"y\": 0.0, \"z\": 0.0}}\nnot json\n";
        match RecordingAdapter::parse_ndjson_samples(ndjson) {
            Err(AnalysisError::ParseError(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_clean_recording() {
        let recording = RecordingAdapter::parse_recording(RECORDING_JSON).unwrap();
        let report = RecordingAdapter::validate(&recording, &MetricsConfig::default());
        assert!(report.is_valid());
        assert_eq!(report.total_samples, 3);
        assert_eq!(report.heart_rate_samples, 1);
        assert_eq!(report.gaze_samples, 1);
        assert!(report.problems.is_empty());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        use crate::geometry::Quaternion;
        let recording = Recording::new(
            "broken",
            vec![
                Sample::new(0, Quaternion::IDENTITY).with_heart_rate(300.0),
                Sample::new(20, Quaternion::new(0.0, 0.0, 0.0, 0.0)),
                Sample::new(10, Quaternion::IDENTITY),
            ],
        );
        let report = RecordingAdapter::validate(&recording, &MetricsConfig::default());
        assert!(!report.is_valid());
        assert_eq!(report.fatal_code.as_deref(), Some("INVALID_SESSION"));
        let indexed: Vec<(Option<usize>, Severity)> =
            report.problems.iter().map(|p| (p.index, p.severity)).collect();
        assert_eq!(
            indexed,
            vec![
                (Some(0), Severity::Warning),
                (Some(1), Severity::Fatal),
                (Some(2), Severity::Fatal),
                (None, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_validate_empty_recording() {
        let report = RecordingAdapter::validate(&Recording::new("empty", Vec::new()), &MetricsConfig::default());
        assert_eq!(report.fatal_code.as_deref(), Some("INSUFFICIENT_DATA"));
    }
}
