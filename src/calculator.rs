//! Metrics calculator
//!
//! Public entry point of the library. A calculator holds a validated
//! configuration and nothing else, so one instance can be shared across
//! threads and reused for any number of sessions.

use crate::adapter::Recording;
use crate::config::MetricsConfig;
use crate::error::AnalysisError;
use crate::motion::MotionAnalyzer;
use crate::performance::PerformanceScorer;
use crate::session::Session;
use crate::stability::StabilityAnalyzer;
use crate::stress::{HeartRateCoverage, StressAnalyzer};
use crate::tracking::{GazeAnalyzer, HandAnalyzer};
use crate::types::{
    MetricSet, MotionMetrics, PerformanceScore, Sample, SessionAnalysis, SessionSummary,
    StabilityMetrics, StressMetrics,
};
use log::debug;

/// Computes session metrics from a fixed configuration
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    /// Create a calculator, rejecting invalid configuration
    pub fn new(config: MetricsConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: MetricsConfig::default(),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Validate samples into a session using this calculator's configuration
    pub fn build_session(&self, samples: Vec<Sample>) -> Result<Session, AnalysisError> {
        Session::new(samples, &self.config)
    }

    pub fn compute_motion_metrics(&self, session: &Session) -> Result<MotionMetrics, AnalysisError> {
        MotionAnalyzer::analyze(session, &self.config)
    }

    pub fn compute_stability_metrics(&self, session: &Session) -> StabilityMetrics {
        StabilityAnalyzer::analyze(session, &self.config)
    }

    pub fn compute_stress_metrics(&self, session: &Session) -> StressMetrics {
        StressAnalyzer::analyze(session, &self.config).0
    }

    pub fn compute_performance_score(&self, metrics: &MetricSet) -> PerformanceScore {
        PerformanceScorer::score(metrics, &self.config)
    }

    /// Run every head-pose analysis on a session and score it
    pub fn calculate(&self, session: &Session) -> Result<SessionAnalysis, AnalysisError> {
        let metrics = self.compute_metric_set(session)?;
        let performance = self.compute_performance_score(&metrics);
        Ok(SessionAnalysis {
            metrics,
            performance,
        })
    }

    /// Build the session from a recording, then add hand and gaze metrics when
    /// those streams are present
    pub fn calculate_recording(&self, recording: &Recording) -> Result<SessionAnalysis, AnalysisError> {
        debug!("Analyzing recording '{}'", recording.session_name);
        let session = self.build_session(recording.samples.clone())?;
        let mut metrics = self.compute_metric_set(&session)?;

        metrics.hand = recording
            .hand_tracking
            .as_deref()
            .and_then(|frames| HandAnalyzer::analyze(frames, &self.config.tracking));
        metrics.gaze = recording
            .eye_gaze
            .as_deref()
            .and_then(|samples| GazeAnalyzer::analyze(samples, &self.config.tracking));

        let performance = self.compute_performance_score(&metrics);
        Ok(SessionAnalysis {
            metrics,
            performance,
        })
    }

    fn compute_metric_set(&self, session: &Session) -> Result<MetricSet, AnalysisError> {
        let motion = self.compute_motion_metrics(session)?;
        let stability = self.compute_stability_metrics(session);
        let (stress, coverage) = StressAnalyzer::analyze(session, &self.config);

        Ok(MetricSet {
            summary: summarize(session, &coverage),
            motion,
            stability,
            stress,
            hand: None,
            gaze: None,
        })
    }
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn summarize(session: &Session, coverage: &HeartRateCoverage) -> SessionSummary {
    let mut quality_flags = session.quality_flags().to_vec();
    quality_flags.extend(coverage.quality_flags());
    SessionSummary {
        sample_count: session.len(),
        duration_s: session.duration_s(),
        nominal_rate_hz: session.nominal_rate_hz(),
        heart_rate_samples: coverage.usable,
        quality_flags,
    }
}
