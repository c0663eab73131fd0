//! Session report encoding
//!
//! Wraps a [`SessionAnalysis`] with producer and provenance metadata, chart
//! series, and short coaching insights, and renders it as JSON or text.

use crate::adapter::Recording;
use crate::error::AnalysisError;
use crate::types::{
    GazeMetrics, HandMetrics, MetricValue, PerformanceScore, SeriesPoint, SessionAnalysis,
    SessionSummary, StabilityMetrics,
};
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

const HEAD_STABILITY_STRENGTH: f64 = 7.0;
const HEAD_STABILITY_WEAKNESS: f64 = 5.0;
const TREMOR_LOW_DEG_S: f64 = 0.5;
const TREMOR_HIGH_DEG_S: f64 = 2.0;
const STRESS_LOW: f64 = 5.0;
const STRESS_HIGH: f64 = 7.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub session_name: String,
    pub device_id: Option<String>,
    pub computed_at_utc: String,
}

/// Scalar head-motion metrics (series live under [`ReportSeries`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionScalars {
    pub head_stability: f64,
    pub orientation_variance_deg2: f64,
    pub avg_tremor_deg_s: f64,
    pub head_rotation_total_deg: f64,
    pub head_translation_total_m: MetricValue,
}

/// Scalar stress metrics (series live under [`ReportSeries`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScalars {
    pub avg_heart_rate_bpm: MetricValue,
    pub peak_heart_rate_bpm: MetricValue,
    pub heart_rate_variability_bpm: MetricValue,
    pub peak_stress: MetricValue,
    pub stress_performance_correlation: MetricValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub motion: MotionScalars,
    pub stability: StabilityMetrics,
    pub stress: StressScalars,
    pub performance: PerformanceScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<HandMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye: Option<GazeMetrics>,
}

/// Downsampled time series for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSeries {
    pub tremor_over_time: Vec<SeriesPoint>,
    pub motion_over_time: Vec<SeriesPoint>,
    pub stress_over_time: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub rating: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Serializable report for one analysed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub summary: SessionSummary,
    pub metrics: ReportMetrics,
    pub series: ReportSeries,
    pub insights: Insights,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(
        &self,
        session_name: &str,
        device_id: Option<&str>,
        analysis: &SessionAnalysis,
    ) -> SessionReport {
        let metrics = &analysis.metrics;
        let motion = &metrics.motion;
        let stress = &metrics.stress;

        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                session_name: session_name.to_string(),
                device_id: device_id.map(str::to_string),
                computed_at_utc: Utc::now().to_rfc3339(),
            },
            summary: metrics.summary.clone(),
            metrics: ReportMetrics {
                motion: MotionScalars {
                    head_stability: motion.head_stability,
                    orientation_variance_deg2: motion.orientation_variance_deg2,
                    avg_tremor_deg_s: motion.avg_tremor_deg_s,
                    head_rotation_total_deg: motion.head_rotation_total_deg,
                    head_translation_total_m: motion.head_translation_total_m,
                },
                stability: metrics.stability.clone(),
                stress: StressScalars {
                    avg_heart_rate_bpm: stress.avg_heart_rate_bpm,
                    peak_heart_rate_bpm: stress.peak_heart_rate_bpm,
                    heart_rate_variability_bpm: stress.heart_rate_variability_bpm,
                    peak_stress: stress.peak_stress,
                    stress_performance_correlation: stress.stress_performance_correlation,
                },
                performance: analysis.performance.clone(),
                hand: metrics.hand.clone(),
                eye: metrics.gaze.clone(),
            },
            series: ReportSeries {
                tremor_over_time: motion.tremor_over_time.clone(),
                motion_over_time: motion.motion_over_time.clone(),
                stress_over_time: stress.stress_over_time.clone(),
            },
            insights: build_insights(analysis),
        }
    }

    /// Encode using the recording's name and device
    pub fn encode_recording(&self, recording: &Recording, analysis: &SessionAnalysis) -> SessionReport {
        self.encode(&recording.session_name, recording.device_id.as_deref(), analysis)
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        session_name: &str,
        device_id: Option<&str>,
        analysis: &SessionAnalysis,
    ) -> Result<String, AnalysisError> {
        let report = self.encode(session_name, device_id, analysis);
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}

fn build_insights(analysis: &SessionAnalysis) -> Insights {
    let motion = &analysis.metrics.motion;
    let peak_stress = analysis.metrics.stress.peak_stress;
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    if motion.head_stability >= HEAD_STABILITY_STRENGTH {
        strengths.push("Excellent head stability".to_string());
    } else if motion.head_stability < HEAD_STABILITY_WEAKNESS {
        improvements.push("Work on maintaining steady head position".to_string());
    }

    if motion.avg_tremor_deg_s < TREMOR_LOW_DEG_S {
        strengths.push("Minimal tremor".to_string());
    } else if motion.avg_tremor_deg_s > TREMOR_HIGH_DEG_S {
        improvements.push("Practice steadiness exercises to reduce tremor".to_string());
    }

    // No insight either way without a heart-rate stream
    if let Some(stress) = peak_stress.value() {
        if stress < STRESS_LOW {
            strengths.push("Good stress management".to_string());
        } else if stress > STRESS_HIGH {
            improvements.push("Develop stress management techniques".to_string());
        }
    }

    Insights {
        rating: analysis.performance.rating.label().to_string(),
        strengths,
        improvements,
    }
}

/// Plain-text summary of a report
pub fn render_text(report: &SessionReport) -> String {
    let m = &report.metrics;
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "Session Report: {}", report.provenance.session_name);
    let _ = writeln!(out, "==============================");
    let _ = writeln!(
        out,
        "Samples: {} | Duration: {:.1}s | Rate: {:.1} Hz",
        report.summary.sample_count, report.summary.duration_s, report.summary.nominal_rate_hz
    );
    if !report.summary.quality_flags.is_empty() {
        let flags: Vec<String> = report
            .summary
            .quality_flags
            .iter()
            .map(|f| format!("{f:?}"))
            .collect();
        let _ = writeln!(out, "Quality flags: {}", flags.join(", "));
    }

    let _ = writeln!(out, "\nOverall: {:.1}/100 ({})", m.performance.overall, report.insights.rating);
    let _ = writeln!(out, "  Technical skill:   {:.2}/10", m.performance.technical_skill);
    let _ = writeln!(out, "  Stress management: {}", m.performance.stress_management.display(2));
    let _ = writeln!(out, "  Consistency:       {:.2}/10", m.performance.consistency);

    let _ = writeln!(out, "\nMotion");
    let _ = writeln!(out, "  Head stability:    {:.2}/10", m.motion.head_stability);
    let _ = writeln!(out, "  Avg tremor:        {:.3} deg/s", m.motion.avg_tremor_deg_s);
    let _ = writeln!(out, "  Total rotation:    {:.1} deg", m.motion.head_rotation_total_deg);
    let _ = writeln!(out, "  Total translation: {} m", m.motion.head_translation_total_m.display(3));

    let _ = writeln!(out, "\nStability");
    let _ = writeln!(out, "  Visual stability:  {:.2}/10", m.stability.visual_stability);
    let _ = writeln!(out, "  Focus:             {:.2}/10", m.stability.focus_score);

    let _ = writeln!(out, "\nStress");
    let _ = writeln!(out, "  Avg heart rate:    {} bpm", m.stress.avg_heart_rate_bpm.display(1));
    let _ = writeln!(out, "  Peak stress:       {}", m.stress.peak_stress.display(2));

    if let Some(hand) = &m.hand {
        let _ = writeln!(out, "\nHand");
        let _ = writeln!(out, "  Smoothness:        {:.2}/10", hand.smoothness_score);
        let _ = writeln!(out, "  Efficiency:        {:.2}", hand.efficiency);
    }
    if let Some(eye) = &m.eye {
        let _ = writeln!(out, "\nEye gaze");
        let _ = writeln!(out, "  Gaze stability:    {:.2}/10", eye.gaze_stability);
        let _ = writeln!(out, "  Saccades:          {:.2}/s", eye.saccades_per_second);
    }

    let _ = writeln!(out, "\nStrengths:");
    if report.insights.strengths.is_empty() {
        let _ = writeln!(out, "  - Continue building core skills");
    }
    for s in &report.insights.strengths {
        let _ = writeln!(out, "  - {s}");
    }
    let _ = writeln!(out, "Areas for improvement:");
    if report.insights.improvements.is_empty() {
        let _ = writeln!(out, "  - Maintain current performance level");
    }
    for s in &report.insights.improvements {
        let _ = writeln!(out, "  - {s}");
    }
    out
}
