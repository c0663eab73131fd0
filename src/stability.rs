//! Visual stability and focus metrics
//!
//! Works on head angular speed between consecutive frames. Duplicate-timestamp
//! steps and dropped-frame gaps are excluded rather than treated as jumps.

use crate::config::MetricsConfig;
use crate::session::Session;
use crate::signal::std_dev;
use crate::types::StabilityMetrics;
use log::debug;

/// Analyzer for frame-to-frame stability
pub struct StabilityAnalyzer;

impl StabilityAnalyzer {
    pub fn analyze(session: &Session, config: &MetricsConfig) -> StabilityMetrics {
        let mut speeds = Vec::new();
        let mut durations = Vec::new();
        for step in session.valid_steps() {
            if let Some(speed) = step.angular_speed_deg_s() {
                speeds.push(speed);
                durations.push(step.dt_s);
            }
        }
        let dropped_steps = session.dropped_steps() as u32;

        if speeds.is_empty() {
            return StabilityMetrics {
                visual_stability: 10.0,
                focus_score: 0.0,
                frame_jitter_deg_s: 0.0,
                dropped_steps,
            };
        }

        let frame_jitter_deg_s = std_dev(&speeds).unwrap_or(0.0);
        let visual_stability =
            compute_visual_stability(frame_jitter_deg_s, config.visual_jitter_scale);
        let focus_score =
            compute_focus_score(&speeds, &durations, config.fixation_speed_deg_s);

        debug!(
            "Stability: visual {:.2}/10, focus {:.2}/10, jitter {:.3} deg/s, {} dropped steps",
            visual_stability, focus_score, frame_jitter_deg_s, dropped_steps
        );

        StabilityMetrics {
            visual_stability,
            focus_score,
            frame_jitter_deg_s,
            dropped_steps,
        }
    }
}

/// Visual stability score (0-10)
///
/// Formula: `10 / (1 + frame_jitter / scale)`
fn compute_visual_stability(frame_jitter: f64, scale: f64) -> f64 {
    (10.0 / (1.0 + frame_jitter / scale)).clamp(0.0, 10.0)
}

/// Focus score (0-10): share of time the head moves slower than the fixation
/// threshold
fn compute_focus_score(speeds: &[f64], durations: &[f64], threshold_deg_s: f64) -> f64 {
    let total: f64 = durations.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let fixated: f64 = speeds
        .iter()
        .zip(durations)
        .filter(|(speed, _)| **speed < threshold_deg_s)
        .map(|(_, dt)| dt)
        .sum();
    (10.0 * fixated / total).clamp(0.0, 10.0)
}
