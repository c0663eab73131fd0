//! Wrist trajectory metrics

use crate::config::TrackingConfig;
use crate::geometry::{distance, is_finite_vec3, Vec3};
use crate::session::elapsed_s;
use crate::signal::{mean, variance, HighPass};
use crate::types::{HandMetrics, HandSample, MetricValue};
use log::debug;

struct WristFrame {
    timestamp_ns: i64,
    wrist: Vec3,
    confidence: Option<f64>,
}

/// Analyzer for hand-tracking wrist landmarks
pub struct HandAnalyzer;

impl HandAnalyzer {
    /// Compute hand metrics, or `None` with fewer than
    /// `hand_min_valid_frames` usable frames
    pub fn analyze(samples: &[HandSample], config: &TrackingConfig) -> Option<HandMetrics> {
        let frames = valid_frames(samples);
        if frames.len() < config.hand_min_valid_frames.max(2) {
            debug!(
                "Hand tracking: {} valid frames, need {}",
                frames.len(),
                config.hand_min_valid_frames
            );
            return None;
        }

        let mut distances = Vec::with_capacity(frames.len() - 1);
        let mut velocities = Vec::with_capacity(frames.len() - 1);
        for pair in frames.windows(2) {
            let d = distance(&pair[0].wrist, &pair[1].wrist);
            let dt = elapsed_s(pair[0].timestamp_ns, pair[1].timestamp_ns);
            distances.push(d);
            velocities.push(d / dt);
        }

        let path_length_m: f64 = distances.iter().sum();
        let avg_speed_m_s = mean(&velocities).unwrap_or(0.0);
        let velocity_variance = variance(&velocities).unwrap_or(0.0);
        let smoothness_score =
            (10.0 / (1.0 + velocity_variance / config.smoothness_scale)).clamp(0.0, 10.0);

        let first = &frames[0];
        let last = &frames[frames.len() - 1];
        let task_duration_s = elapsed_s(first.timestamp_ns, last.timestamp_ns);

        let hand_tremor = if velocities.len() >= config.hand_tremor_min_frames {
            let rate = velocities.len() as f64 / task_duration_s;
            HighPass::new(config.hand_tremor_cutoff_hz, rate)
                .and_then(|f| mean(&f.filter(&velocities).iter().map(|v| v.abs()).collect::<Vec<_>>()))
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let efficiency = if path_length_m > 0.0 {
            (distance(&first.wrist, &last.wrist) / path_length_m).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let confidences: Vec<f64> = frames
            .iter()
            .filter_map(|f| f.confidence)
            .filter(|c| c.is_finite())
            .collect();

        Some(HandMetrics {
            valid_frames: frames.len(),
            path_length_m,
            avg_speed_m_s,
            velocity_variance,
            smoothness_score,
            hand_tremor,
            workspace_volume_m3: bounding_box_volume(&frames),
            efficiency,
            task_duration_s,
            avg_confidence: MetricValue::from(mean(&confidences)),
        })
    }
}

/// Keep frames with a tracked, finite, non-origin wrist and a strictly
/// increasing timestamp
fn valid_frames(samples: &[HandSample]) -> Vec<WristFrame> {
    let mut frames: Vec<WristFrame> = Vec::with_capacity(samples.len());
    for sample in samples {
        let Some(wrist) = sample.wrist_m else {
            continue;
        };
        // The tracker reports lost hands at the origin
        if !is_finite_vec3(&wrist) || wrist == [0.0, 0.0, 0.0] {
            continue;
        }
        if let Some(prev) = frames.last() {
            if sample.timestamp_ns <= prev.timestamp_ns {
                continue;
            }
        }
        frames.push(WristFrame {
            timestamp_ns: sample.timestamp_ns,
            wrist,
            confidence: sample.confidence,
        });
    }
    frames
}

fn bounding_box_volume(frames: &[WristFrame]) -> f64 {
    (0..3)
        .map(|axis| {
            let (lo, hi) = frames.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
                (lo.min(f.wrist[axis]), hi.max(f.wrist[axis]))
            });
            hi - lo
        })
        .product()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_NS: i64 = 100_000_000;

    fn frame(i: i64, wrist: Option<Vec3>) -> HandSample {
        HandSample {
            timestamp_ns: i * FRAME_NS,
            wrist_m: wrist,
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_straight_line_motion() {
        let samples: Vec<HandSample> = (0..11)
            .map(|i| frame(i, Some([0.1 + 0.01 * i as f64, 0.2, 0.3])))
            .collect();
        let metrics = HandAnalyzer::analyze(&samples, &TrackingConfig::default()).unwrap();

        assert_eq!(metrics.valid_frames, 11);
        assert!((metrics.path_length_m - 0.1).abs() < 1e-9);
        assert!((metrics.avg_speed_m_s - 0.1).abs() < 1e-9);
        assert!(metrics.velocity_variance < 1e-12);
        assert!((metrics.smoothness_score - 10.0).abs() < 1e-6);
        assert!((metrics.efficiency - 1.0).abs() < 1e-9);
        assert!((metrics.task_duration_s - 1.0).abs() < 1e-12);
        // Motion along one axis spans no volume
        assert_eq!(metrics.workspace_volume_m3, 0.0);
        // Fewer than 100 frames: tremor not estimated
        assert_eq!(metrics.hand_tremor, 0.0);
        assert!((metrics.avg_confidence.value().unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_lost_frames_are_dropped() {
        let mut samples: Vec<HandSample> = (0..14)
            .map(|i| frame(i, Some([0.1, 0.1 * i as f64 + 0.1, 0.2])))
            .collect();
        samples[3].wrist_m = None;
        samples[5].wrist_m = Some([0.0, 0.0, 0.0]);
        samples[7].wrist_m = Some([f64::NAN, 0.0, 0.0]);
        let metrics = HandAnalyzer::analyze(&samples, &TrackingConfig::default()).unwrap();
        assert_eq!(metrics.valid_frames, 11);
    }

    #[test]
    fn test_task_duration_wider_than_i64() {
        let step_ns = i64::MAX / 8;
        let samples: Vec<HandSample> = (0..11)
            .map(|i| HandSample {
                timestamp_ns: i64::MIN / 2 + i * step_ns,
                wrist_m: Some([0.1 + 0.01 * i as f64, 0.2, 0.3]),
                confidence: None,
            })
            .collect();
        let metrics = HandAnalyzer::analyze(&samples, &TrackingConfig::default()).unwrap();
        let expected = 10.0 * step_ns as f64 / 1e9;
        assert!((metrics.task_duration_s - expected).abs() / expected < 1e-9);
        assert!(metrics.avg_speed_m_s > 0.0);
    }

    #[test]
    fn test_too_few_frames_is_none() {
        let samples: Vec<HandSample> = (0..5).map(|i| frame(i, Some([0.1, 0.1, 0.1]))).collect();
        assert!(HandAnalyzer::analyze(&samples, &TrackingConfig::default()).is_none());
        assert!(HandAnalyzer::analyze(&[], &TrackingConfig::default()).is_none());
    }

    #[test]
    fn test_back_and_forth_is_inefficient() {
        let samples: Vec<HandSample> = (0..20)
            .map(|i| {
                let x = if i % 2 == 0 { 0.1 } else { 0.2 };
                frame(i, Some([x, 0.1 + 0.001 * i as f64, 0.1 + 0.002 * i as f64]))
            })
            .collect();
        let metrics = HandAnalyzer::analyze(&samples, &TrackingConfig::default()).unwrap();
        assert!(metrics.efficiency < 0.1);
        assert!((metrics.workspace_volume_m3 - 0.1 * 0.019 * 0.038).abs() < 1e-9);
    }
}
