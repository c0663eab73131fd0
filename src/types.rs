//! Core types for the Aria Metrics pipeline
//!
//! This module defines the data that flows through the calculator: input samples,
//! the per-category metric groups, and the composite performance score.

use crate::geometry::{Quaternion, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One head-pose observation extracted from a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Capture timestamp (device clock, nanoseconds)
    pub timestamp_ns: i64,
    /// Head orientation
    pub orientation: Quaternion,
    /// Head position estimate (metres), when the extractor provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_m: Option<Vec3>,
    /// Heart rate reading (bpm), when a physiological stream is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate_bpm: Option<f64>,
}

impl Sample {
    pub fn new(timestamp_ns: i64, orientation: Quaternion) -> Self {
        Self {
            timestamp_ns,
            orientation,
            position_m: None,
            heart_rate_bpm: None,
        }
    }

    pub fn with_position(mut self, position_m: Vec3) -> Self {
        self.position_m = Some(position_m);
        self
    }

    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate_bpm = Some(bpm);
        self
    }
}

/// Wrist landmark frame from hand tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandSample {
    pub timestamp_ns: i64,
    /// Wrist position (metres); `None` when tracking was lost
    #[serde(default)]
    pub wrist_m: Option<Vec3>,
    /// Tracker confidence (0-1)
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Eye gaze direction sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub timestamp_ns: i64,
    pub yaw_rad: f64,
    pub pitch_rad: f64,
    /// Estimated depth of the gaze point (metres)
    #[serde(default)]
    pub depth_m: Option<f64>,
}

/// A scalar metric that may be unavailable because its input signal is missing.
///
/// Serializes as a JSON number, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum MetricValue {
    Available(f64),
    Unavailable,
}

impl MetricValue {
    /// Wrap a computed value; non-finite results are treated as unavailable
    pub fn available(value: f64) -> Self {
        if value.is_finite() {
            MetricValue::Available(value)
        } else {
            MetricValue::Unavailable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Available(v) => Some(*v),
            MetricValue::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, MetricValue::Available(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            MetricValue::Available(v) => MetricValue::available(f(v)),
            MetricValue::Unavailable => MetricValue::Unavailable,
        }
    }

    /// Format with a fixed number of decimals, or "N/A"
    pub fn display(&self, decimals: usize) -> String {
        match self {
            MetricValue::Available(v) => format!("{v:.decimals$}"),
            MetricValue::Unavailable => "N/A".to_string(),
        }
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => MetricValue::available(v),
            None => MetricValue::Unavailable,
        }
    }
}

impl From<MetricValue> for Option<f64> {
    fn from(value: MetricValue) -> Self {
        value.value()
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Available(v) => write!(f, "{v}"),
            MetricValue::Unavailable => write!(f, "N/A"),
        }
    }
}

/// One point of a chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Seconds since the first sample of the session
    pub t_s: f64,
    pub value: f64,
}

/// Head motion and tremor metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionMetrics {
    /// Head stability score (0-10, higher = steadier)
    pub head_stability: f64,
    /// Frame-to-frame orientation variance (deg²)
    pub orientation_variance_deg2: f64,
    /// Mean high-frequency angular jitter (deg/s)
    pub avg_tremor_deg_s: f64,
    /// Cumulative head rotation (degrees)
    pub head_rotation_total_deg: f64,
    /// Cumulative head displacement (metres)
    pub head_translation_total_m: MetricValue,
    /// Rolling tremor magnitude (deg/s)
    pub tremor_over_time: Vec<SeriesPoint>,
    /// Head angular speed (deg/s)
    pub motion_over_time: Vec<SeriesPoint>,
}

/// Frame-to-frame visual stability metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityMetrics {
    /// Visual stability score (0-10)
    pub visual_stability: f64,
    /// Share of time with the head held still, scaled to 0-10
    pub focus_score: f64,
    /// Standard deviation of head angular speed (deg/s)
    pub frame_jitter_deg_s: f64,
    /// Steps excluded as duplicate timestamps or dropped-frame gaps
    pub dropped_steps: u32,
}

/// Heart-rate derived stress metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressMetrics {
    pub avg_heart_rate_bpm: MetricValue,
    pub peak_heart_rate_bpm: MetricValue,
    /// Standard deviation of heart rate (bpm)
    pub heart_rate_variability_bpm: MetricValue,
    /// Peak smoothed stress level (0-10)
    pub peak_stress: MetricValue,
    /// Pearson correlation between heart rate and head angular speed
    pub stress_performance_correlation: MetricValue,
    /// Smoothed stress level (0-10)
    pub stress_over_time: Vec<SeriesPoint>,
}

impl StressMetrics {
    pub fn unavailable() -> Self {
        Self {
            avg_heart_rate_bpm: MetricValue::Unavailable,
            peak_heart_rate_bpm: MetricValue::Unavailable,
            heart_rate_variability_bpm: MetricValue::Unavailable,
            peak_stress: MetricValue::Unavailable,
            stress_performance_correlation: MetricValue::Unavailable,
            stress_over_time: Vec::new(),
        }
    }
}

/// Wrist-trajectory metrics from hand tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandMetrics {
    pub valid_frames: usize,
    pub path_length_m: f64,
    pub avg_speed_m_s: f64,
    pub velocity_variance: f64,
    /// Smoothness score (0-10)
    pub smoothness_score: f64,
    pub hand_tremor: f64,
    pub workspace_volume_m3: f64,
    /// Straight-line distance over path length (0-1)
    pub efficiency: f64,
    pub task_duration_s: f64,
    pub avg_confidence: MetricValue,
}

/// Eye-gaze metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeMetrics {
    /// Gaze stability score (0-10)
    pub gaze_stability: f64,
    pub avg_gaze_depth_m: MetricValue,
    /// `1 / (1 + std(depth))`
    pub gaze_focus_consistency: MetricValue,
    pub avg_gaze_shift_rad: f64,
    pub saccades_per_second: f64,
}

/// Data-quality flags raised while building or analysing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    MissingHeartRate,
    MissingPosition,
    InvalidHeartRateReadings,
    DuplicateTimestamps,
    DroppedFrames,
    ShortSession,
}

/// Session-level facts the report needs alongside the metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub sample_count: usize,
    pub duration_s: f64,
    pub nominal_rate_hz: f64,
    pub heart_rate_samples: usize,
    pub quality_flags: Vec<QualityFlag>,
}

/// Everything computed for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub summary: SessionSummary,
    pub motion: MotionMetrics,
    pub stability: StabilityMetrics,
    pub stress: StressMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<HandMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze: Option<GazeMetrics>,
}

/// Coarse rating band of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceRating {
    pub fn from_score(overall: f64) -> Self {
        if overall >= 80.0 {
            PerformanceRating::Excellent
        } else if overall >= 60.0 {
            PerformanceRating::Good
        } else if overall >= 40.0 {
            PerformanceRating::Fair
        } else {
            PerformanceRating::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceRating::Excellent => "Excellent",
            PerformanceRating::Good => "Good",
            PerformanceRating::Fair => "Fair",
            PerformanceRating::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Weights actually applied after dropping unavailable sub-scores (sum to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveWeights {
    pub technical: f64,
    pub stress: f64,
    pub consistency: f64,
}

/// Weighted composite over the metric set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    /// Composite score (0-100)
    pub overall: f64,
    /// Mean of head and visual stability (0-10)
    pub technical_skill: f64,
    /// Inverse of peak stress (0-10)
    pub stress_management: MetricValue,
    /// Penalised by tremor and jitter (0-10)
    pub consistency: f64,
    pub rating: PerformanceRating,
    pub weights_used: EffectiveWeights,
}

/// Output of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub metrics: MetricSet,
    pub performance: PerformanceScore,
}
