//! End-to-end tests over the public API

use aria_metrics::types::QualityFlag;
use aria_metrics::{
    analyze_batch, AnalysisError, BatchInput, MetricValue, MetricsCalculator, MetricsConfig,
    PerformanceRating, Quaternion, Recording, RecordingAdapter, ReportEncoder, Sample,
};
use pretty_assertions::assert_eq;

const FRAME_30HZ_NS: i64 = 33_333_333;

fn jitter_session(n: usize, amplitude_deg: f64) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let yaw = if i % 2 == 0 { amplitude_deg } else { -amplitude_deg };
            Sample::new(i as i64 * FRAME_30HZ_NS, Quaternion::from_euler_deg(yaw, 0.0, 0.0))
        })
        .collect()
}

fn realistic_session(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let t = i as f64 / 30.0;
            let yaw = 5.0 * (0.4 * t).sin() + 0.2 * (9.0 * t).sin();
            let pitch = -10.0 + 2.0 * (0.25 * t).cos();
            Sample::new(
                i as i64 * FRAME_30HZ_NS,
                Quaternion::from_euler_deg(yaw, pitch, 0.0),
            )
            .with_position([0.01 * (0.5 * t).sin(), 1.6, 0.0])
            .with_heart_rate(80.0 + 15.0 * (0.1 * t).sin())
        })
        .collect()
}

#[test]
fn head_stability_separates_still_and_jittery_sessions_at_30hz() {
    let calculator = MetricsCalculator::with_defaults();

    let still = calculator.build_session(jitter_session(100, 0.01)).unwrap();
    let jittery = calculator.build_session(jitter_session(100, 2.0)).unwrap();

    let still = calculator.compute_motion_metrics(&still).unwrap();
    let jittery = calculator.compute_motion_metrics(&jittery).unwrap();

    assert!(still.head_stability > 8.0, "still: {}", still.head_stability);
    assert!(jittery.head_stability < 3.0, "jittery: {}", jittery.head_stability);
}

#[test]
fn head_stability_is_monotonic_in_jitter() {
    let calculator = MetricsCalculator::with_defaults();
    let scores: Vec<f64> = [0.0, 0.05, 0.2, 0.5, 1.0, 2.0, 5.0]
        .iter()
        .map(|&a| {
            let session = calculator.build_session(jitter_session(100, a)).unwrap();
            calculator.compute_motion_metrics(&session).unwrap().head_stability
        })
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[1] <= pair[0], "{scores:?}");
    }
}

#[test]
fn structural_errors_are_reported_by_kind() {
    let calculator = MetricsCalculator::with_defaults();

    assert!(matches!(
        calculator.build_session(Vec::new()),
        Err(AnalysisError::InsufficientData { actual: 0, .. })
    ));
    assert!(matches!(
        calculator.build_session(jitter_session(1, 0.0)),
        Err(AnalysisError::InsufficientData { actual: 1, .. })
    ));

    let out_of_order = vec![
        Sample::new(2_000_000, Quaternion::IDENTITY),
        Sample::new(1_000_000, Quaternion::IDENTITY),
        Sample::new(3_000_000, Quaternion::IDENTITY),
    ];
    assert!(matches!(
        calculator.build_session(out_of_order),
        Err(AnalysisError::InvalidSession(_))
    ));
}

#[test]
fn full_session_metrics_stay_in_range() {
    let calculator = MetricsCalculator::with_defaults();
    let session = calculator.build_session(realistic_session(600)).unwrap();
    let analysis = calculator.calculate(&session).unwrap();
    let m = &analysis.metrics;

    for score in [
        m.motion.head_stability,
        m.stability.visual_stability,
        m.stability.focus_score,
        analysis.performance.technical_skill,
        analysis.performance.consistency,
    ] {
        assert!((0.0..=10.0).contains(&score));
    }
    let peak = m.stress.peak_stress.value().unwrap();
    assert!((0.0..=10.0).contains(&peak));
    let r = m.stress.stress_performance_correlation.value().unwrap();
    assert!((-1.0..=1.0).contains(&r));
    assert!(m.motion.head_translation_total_m.is_available());
    assert!((0.0..=100.0).contains(&analysis.performance.overall));
    assert!(m.summary.quality_flags.is_empty());
    assert!(m.motion.motion_over_time.len() <= calculator.config().max_series_points);
}

#[test]
fn missing_heart_rate_falls_back_to_unavailable_stress() {
    let calculator = MetricsCalculator::with_defaults();
    let samples: Vec<Sample> = realistic_session(300)
        .into_iter()
        .map(|mut s| {
            s.heart_rate_bpm = None;
            s
        })
        .collect();
    let recording = Recording::new("no-hr", samples);
    let analysis = calculator.calculate_recording(&recording).unwrap();

    assert_eq!(analysis.metrics.stress.peak_stress, MetricValue::Unavailable);
    assert_eq!(analysis.metrics.stress.avg_heart_rate_bpm, MetricValue::Unavailable);
    assert!(analysis.metrics.stress.stress_over_time.is_empty());
    assert!(analysis
        .metrics
        .summary
        .quality_flags
        .contains(&QualityFlag::MissingHeartRate));
    assert_eq!(analysis.performance.stress_management, MetricValue::Unavailable);

    let w = analysis.performance.weights_used;
    assert_eq!(w.stress, 0.0);
    assert!((w.technical + w.consistency - 1.0).abs() < 1e-12);

    let json = ReportEncoder::new()
        .encode_to_json("no-hr", None, &analysis)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["metrics"]["stress"]["avg_heart_rate_bpm"].is_null());
}

#[test]
fn analysis_is_idempotent_through_json() {
    let calculator = MetricsCalculator::with_defaults();
    let json = serde_json::to_string(&Recording::new("repeat", realistic_session(200))).unwrap();

    let first = calculator
        .calculate_recording(&RecordingAdapter::parse_recording(&json).unwrap())
        .unwrap();
    let second = calculator
        .calculate_recording(&RecordingAdapter::parse_recording(&json).unwrap())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn still_calm_session_rates_excellent() {
    let calculator = MetricsCalculator::with_defaults();
    let samples = (0..300)
        .map(|i| Sample::new(i * FRAME_30HZ_NS, Quaternion::IDENTITY).with_heart_rate(65.0))
        .collect();
    let session = calculator.build_session(samples).unwrap();
    let analysis = calculator.calculate(&session).unwrap();
    assert_eq!(analysis.performance.rating, PerformanceRating::Excellent);
}

#[test]
fn partial_config_overrides_keep_defaults() {
    let config = MetricsConfig::from_json(r#"{"stress": {"resting_hr_bpm": 70.0}}"#).unwrap();
    assert_eq!(config.stress.resting_hr_bpm, 70.0);
    assert_eq!(config.stress.hr_reserve_bpm, MetricsConfig::default().stress.hr_reserve_bpm);
    assert_eq!(config.min_samples, MetricsConfig::default().min_samples);

    let invalid = MetricsConfig::from_json(r#"{"stability_scale_factor": 0.0}"#);
    assert!(matches!(invalid, Err(AnalysisError::InvalidConfig(_))));
}

#[test]
fn batch_continues_past_failures() {
    let good = serde_json::to_string(&Recording::new("good", realistic_session(120))).unwrap();
    let inputs = vec![
        BatchInput::new("good", good),
        BatchInput::new("empty", r#"{"session_name": "empty", "samples": []}"#),
    ];
    let summary = analyze_batch(&inputs, &MetricsCalculator::with_defaults(), Some(2)).unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.entries[0].name, "good");
    assert!(summary.entries[0].report().is_some());
    assert!(summary.entries[1].report().is_none());
}
