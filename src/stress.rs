//! Heart-rate derived stress metrics
//!
//! Stress is only computed from real heart-rate readings. A session without a
//! usable physiological stream yields `MetricValue::Unavailable` everywhere;
//! nothing is estimated from motion.

use crate::config::{MetricsConfig, StressConfig};
use crate::session::{Session, StepKind};
use crate::signal::{downsample, mean, pearson, std_dev};
use crate::types::{MetricValue, QualityFlag, SeriesPoint, StressMetrics};
use log::{debug, warn};

/// How many heart-rate readings a session offered, and how many were usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartRateCoverage {
    pub usable: usize,
    pub rejected: usize,
}

impl HeartRateCoverage {
    pub fn quality_flags(&self) -> Vec<QualityFlag> {
        let mut flags = Vec::new();
        if self.usable == 0 {
            flags.push(QualityFlag::MissingHeartRate);
        }
        if self.rejected > 0 {
            flags.push(QualityFlag::InvalidHeartRateReadings);
        }
        flags
    }
}

struct Reading {
    index: usize,
    t_s: f64,
    bpm: f64,
}

/// Analyzer for heart-rate stress indicators
pub struct StressAnalyzer;

impl StressAnalyzer {
    pub fn analyze(session: &Session, config: &MetricsConfig) -> (StressMetrics, HeartRateCoverage) {
        let stress_config = &config.stress;
        let mut coverage = HeartRateCoverage::default();
        let mut readings = Vec::new();

        for (index, sample) in session.samples().iter().enumerate() {
            let Some(bpm) = sample.heart_rate_bpm else {
                continue;
            };
            if bpm.is_finite()
                && bpm >= stress_config.hr_min_plausible
                && bpm <= stress_config.hr_max_plausible
            {
                readings.push(Reading {
                    index,
                    t_s: session.time_of(index),
                    bpm,
                });
                coverage.usable += 1;
            } else {
                coverage.rejected += 1;
            }
        }

        if coverage.rejected > 0 {
            warn!(
                "Dropped {} heart-rate readings outside {}-{} bpm",
                coverage.rejected, stress_config.hr_min_plausible, stress_config.hr_max_plausible
            );
        }

        if readings.is_empty() {
            debug!("Stress: no heart-rate stream, metrics unavailable");
            return (StressMetrics::unavailable(), coverage);
        }

        let bpms: Vec<f64> = readings.iter().map(|r| r.bpm).collect();
        let avg_heart_rate_bpm = MetricValue::from(mean(&bpms));
        let peak_heart_rate_bpm = MetricValue::from(bpms.iter().copied().reduce(f64::max));
        let heart_rate_variability_bpm = if bpms.len() >= 2 {
            MetricValue::from(std_dev(&bpms))
        } else {
            MetricValue::Unavailable
        };

        let smoothed = smooth_stress(&readings, stress_config);
        let peak_stress = MetricValue::from(smoothed.iter().copied().reduce(f64::max));

        let stress_over_time = downsample(
            readings
                .iter()
                .zip(&smoothed)
                .map(|(r, &value)| SeriesPoint { t_s: r.t_s, value })
                .collect(),
            config.max_series_points,
        );

        let stress_performance_correlation = correlate_with_motion(session, &readings);

        debug!(
            "Stress: avg HR {}, peak stress {}, {} readings",
            avg_heart_rate_bpm.display(1),
            peak_stress.display(2),
            readings.len()
        );

        (
            StressMetrics {
                avg_heart_rate_bpm,
                peak_heart_rate_bpm,
                heart_rate_variability_bpm,
                peak_stress,
                stress_performance_correlation,
                stress_over_time,
            },
            coverage,
        )
    }
}

/// Instantaneous stress level (0-10)
///
/// Formula: `10 * (hr - resting_hr) / hr_reserve`, clamped
fn instantaneous_stress(bpm: f64, config: &StressConfig) -> f64 {
    (10.0 * (bpm - config.resting_hr_bpm) / config.hr_reserve_bpm).clamp(0.0, 10.0)
}

/// Trailing mean of instantaneous stress over `window_s` seconds
fn smooth_stress(readings: &[Reading], config: &StressConfig) -> Vec<f64> {
    let levels: Vec<f64> = readings
        .iter()
        .map(|r| instantaneous_stress(r.bpm, config))
        .collect();

    let mut out = Vec::with_capacity(levels.len());
    let mut start = 0;
    let mut sum = 0.0;
    for (i, reading) in readings.iter().enumerate() {
        sum += levels[i];
        while reading.t_s - readings[start].t_s >= config.window_s && start < i {
            sum -= levels[start];
            start += 1;
        }
        out.push(sum / (i - start + 1) as f64);
    }
    out
}

/// Pearson correlation between heart rate and head angular speed at the same frame
fn correlate_with_motion(session: &Session, readings: &[Reading]) -> MetricValue {
    let steps = session.steps();
    let mut hr = Vec::new();
    let mut speed = Vec::new();
    for reading in readings {
        // Step `index - 1` ends at this sample
        let Some(step) = reading.index.checked_sub(1).and_then(|i| steps.get(i)) else {
            continue;
        };
        if step.kind != StepKind::Valid {
            continue;
        }
        if let Some(s) = step.angular_speed_deg_s() {
            hr.push(reading.bpm);
            speed.push(s);
        }
    }
    MetricValue::from(pearson(&hr, &speed))
}
