//! Head motion and tremor metrics
//!
//! Head stability is an inverse measure of frame-to-frame orientation variance.
//! Tremor is the high-frequency part of head angular velocity, isolated per
//! axis with a Butterworth high-pass filter.

use crate::config::MetricsConfig;
use crate::error::AnalysisError;
use crate::session::{Session, Step};
use crate::signal::{downsample, mean, rolling_mean_abs, HighPass};
use crate::types::{MetricValue, MotionMetrics, SeriesPoint};
use log::debug;

/// Analyzer for head motion metrics
pub struct MotionAnalyzer;

impl MotionAnalyzer {
    /// Compute motion metrics for a session
    ///
    /// # Errors
    /// `InsufficientData` when the session is shorter than `config.min_samples`.
    pub fn analyze(session: &Session, config: &MetricsConfig) -> Result<MotionMetrics, AnalysisError> {
        if session.len() < config.min_samples {
            return Err(AnalysisError::InsufficientData {
                required: config.min_samples,
                actual: session.len(),
            });
        }

        let valid: Vec<&Step> = session.valid_steps().collect();

        let orientation_variance_deg2 = compute_orientation_variance(&valid);
        let head_stability =
            compute_head_stability(orientation_variance_deg2, config.stability_scale_factor);

        let times: Vec<f64> = valid.iter().map(|s| s.t_s).collect();
        let speeds: Vec<f64> = valid
            .iter()
            .filter_map(|s| s.angular_speed_deg_s())
            .collect();

        let tremor = if valid.len() >= config.tremor_min_steps {
            HighPass::new(config.tremor_cutoff_hz, session.nominal_rate_hz())
                .map(|filter| compute_tremor(&valid, &filter))
        } else {
            None
        };
        let avg_tremor_deg_s = tremor.as_deref().and_then(mean).unwrap_or(0.0);

        let head_rotation_total_deg = session.steps().iter().map(|s| s.angle_deg).sum();
        let head_translation_total_m = compute_translation_total(session.steps());

        let motion_over_time = downsample(
            to_series(&times, &speeds),
            config.max_series_points,
        );
        let tremor_over_time = match &tremor {
            Some(magnitudes) => downsample(
                to_series(&times, &rolling_mean_abs(magnitudes, config.tremor_window)),
                config.max_series_points,
            ),
            None => Vec::new(),
        };

        debug!(
            "Motion: stability {:.2}/10, variance {:.4} deg², tremor {:.4} deg/s",
            head_stability, orientation_variance_deg2, avg_tremor_deg_s
        );

        Ok(MotionMetrics {
            head_stability,
            orientation_variance_deg2,
            avg_tremor_deg_s,
            head_rotation_total_deg,
            head_translation_total_m,
            tremor_over_time,
            motion_over_time,
        })
    }
}

/// Frame-to-frame orientation variance (deg²)
///
/// Formula: `mean |r_i - r̄|²` over per-step rotation vectors `r_i`.
/// A steady pan has constant `r_i` and zero variance; jitter does not.
fn compute_orientation_variance(steps: &[&Step]) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let n = steps.len() as f64;
    let mut centroid = [0.0; 3];
    for step in steps {
        for (c, r) in centroid.iter_mut().zip(step.rotation_deg) {
            *c += r / n;
        }
    }
    steps
        .iter()
        .map(|s| {
            s.rotation_deg
                .iter()
                .zip(centroid)
                .map(|(r, c)| (r - c).powi(2))
                .sum::<f64>()
        })
        .sum::<f64>()
        / n
}

/// Per-step tremor magnitude (deg/s)
///
/// Formula: `|HP(ω)_i|` where `ω_i = r_i / dt_i` is the signed angular velocity
/// and `HP` filters each axis independently. Back-and-forth jitter keeps its
/// sign changes, so it survives the filter while a steady turn does not.
fn compute_tremor(steps: &[&Step], filter: &HighPass) -> Vec<f64> {
    let axes: Vec<Vec<f64>> = (0..3)
        .map(|axis| {
            let velocity: Vec<f64> = steps
                .iter()
                .map(|s| s.rotation_deg[axis] / s.dt_s)
                .collect();
            filter.filter(&velocity)
        })
        .collect();
    (0..steps.len())
        .map(|i| axes.iter().map(|a| a[i].powi(2)).sum::<f64>().sqrt())
        .collect()
}

/// Head stability score (0-10)
///
/// Formula: `10 / (1 + variance / scale)`, non-increasing in the variance.
fn compute_head_stability(variance_deg2: f64, scale: f64) -> f64 {
    (10.0 / (1.0 + variance_deg2 / scale)).clamp(0.0, 10.0)
}

/// Cumulative displacement over steps where both ends carry a position
fn compute_translation_total(steps: &[Step]) -> MetricValue {
    let mut total = 0.0;
    let mut any = false;
    for translation in steps.iter().filter_map(|s| s.translation_m) {
        total += translation;
        any = true;
    }
    if any {
        MetricValue::available(total)
    } else {
        MetricValue::Unavailable
    }
}

fn to_series(times: &[f64], values: &[f64]) -> Vec<SeriesPoint> {
    times
        .iter()
        .zip(values)
        .map(|(&t_s, &value)| SeriesPoint { t_s, value })
        .collect()
}
