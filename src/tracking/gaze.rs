//! Eye-gaze stability and saccade metrics

use crate::config::TrackingConfig;
use crate::session::elapsed_s;
use crate::signal::{mean, std_dev, variance};
use crate::types::{GazeMetrics, GazeSample, MetricValue};
use log::debug;

/// Analyzer for eye-gaze direction samples
pub struct GazeAnalyzer;

impl GazeAnalyzer {
    /// Compute gaze metrics, or `None` when no usable sample remains
    pub fn analyze(samples: &[GazeSample], config: &TrackingConfig) -> Option<GazeMetrics> {
        let gaze = valid_samples(samples);
        if gaze.is_empty() {
            return None;
        }

        let yaws: Vec<f64> = gaze.iter().map(|g| g.yaw_rad).collect();
        let pitches: Vec<f64> = gaze.iter().map(|g| g.pitch_rad).collect();
        let gaze_stability = compute_gaze_stability(&yaws, &pitches, config.gaze_variance_scale);

        let depths: Vec<f64> = gaze
            .iter()
            .filter_map(|g| g.depth_m)
            .filter(|d| d.is_finite())
            .collect();
        let avg_gaze_depth_m = MetricValue::from(mean(&depths));
        let gaze_focus_consistency = MetricValue::from(std_dev(&depths).map(|s| 1.0 / (1.0 + s)));

        let (avg_gaze_shift_rad, saccades_per_second) =
            compute_shifts(&gaze, config.saccade_threshold_rad);

        debug!(
            "Gaze: stability {:.2}/10, {:.2} saccades/s over {} samples",
            gaze_stability,
            saccades_per_second,
            gaze.len()
        );

        Some(GazeMetrics {
            gaze_stability,
            avg_gaze_depth_m,
            gaze_focus_consistency,
            avg_gaze_shift_rad,
            saccades_per_second,
        })
    }
}

fn valid_samples(samples: &[GazeSample]) -> Vec<&GazeSample> {
    let mut out: Vec<&GazeSample> = Vec::with_capacity(samples.len());
    for sample in samples {
        if !sample.yaw_rad.is_finite() || !sample.pitch_rad.is_finite() {
            continue;
        }
        if out.last().is_some_and(|prev| sample.timestamp_ns <= prev.timestamp_ns) {
            continue;
        }
        out.push(sample);
    }
    out
}

/// Gaze stability (0-10)
///
/// Formula: `10 / (1 + ((var(yaw) + var(pitch)) / 2) / scale)`
fn compute_gaze_stability(yaws: &[f64], pitches: &[f64], scale: f64) -> f64 {
    let var_yaw = variance(yaws).unwrap_or(0.0);
    let var_pitch = variance(pitches).unwrap_or(0.0);
    let avg = (var_yaw + var_pitch) / 2.0;
    (10.0 / (1.0 + avg / scale)).clamp(0.0, 10.0)
}

/// Mean angular shift per step and saccade rate
///
/// A step is a saccade when either axis moves more than `threshold_rad`.
/// The rate uses real elapsed time, not the sample count.
fn compute_shifts(gaze: &[&GazeSample], threshold_rad: f64) -> (f64, f64) {
    if gaze.len() < 2 {
        return (0.0, 0.0);
    }
    let mut d_yaw = Vec::with_capacity(gaze.len() - 1);
    let mut d_pitch = Vec::with_capacity(gaze.len() - 1);
    let mut saccades = 0usize;
    for pair in gaze.windows(2) {
        let dy = (pair[1].yaw_rad - pair[0].yaw_rad).abs();
        let dp = (pair[1].pitch_rad - pair[0].pitch_rad).abs();
        if dy > threshold_rad || dp > threshold_rad {
            saccades += 1;
        }
        d_yaw.push(dy);
        d_pitch.push(dp);
    }
    let shift = (mean(&d_yaw).unwrap_or(0.0) + mean(&d_pitch).unwrap_or(0.0)) / 2.0;

    let span_s = elapsed_s(gaze[0].timestamp_ns, gaze[gaze.len() - 1].timestamp_ns);
    let rate = if span_s > 0.0 {
        saccades as f64 / span_s
    } else {
        0.0
    };
    (shift, rate)
}
