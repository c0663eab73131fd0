//! Scoring configuration
//!
//! Every threshold and weight the calculator uses lives here. A config is passed
//! into [`crate::calculator::MetricsCalculator`] explicitly; nothing is read from
//! ambient state. All sections deserialize with defaults, so a JSON file only
//! needs the keys it overrides.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Minimum number of samples needed for frame-to-frame variance
pub const DEFAULT_MIN_SAMPLES: usize = 2;

/// Orientation variance (deg²) at which head stability drops to 5/10
pub const DEFAULT_STABILITY_SCALE_FACTOR: f64 = 1.0;

/// Angular-speed jitter (deg/s) at which visual stability drops to 5/10
pub const DEFAULT_VISUAL_JITTER_SCALE: f64 = 5.0;

/// Head speed below which a step counts as fixated
pub const DEFAULT_FIXATION_SPEED_DEG_S: f64 = 10.0;

/// A step longer than this multiple of the median step is a dropped-frame gap
pub const DEFAULT_GAP_FACTOR: f64 = 3.0;

/// High-pass cut-off isolating tremor from voluntary head motion
pub const DEFAULT_TREMOR_CUTOFF_HZ: f64 = 3.0;

/// Valid steps needed before the tremor filter output is meaningful
pub const DEFAULT_TREMOR_MIN_STEPS: usize = 8;

/// Rolling window (steps) for the tremor-over-time series
pub const DEFAULT_TREMOR_WINDOW: usize = 10;

/// Upper bound on points per chart series
pub const DEFAULT_MAX_SERIES_POINTS: usize = 300;

/// Full analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Sessions with fewer samples fail with `InsufficientData`
    pub min_samples: usize,
    /// Orientation variance scale (deg²) for head stability
    pub stability_scale_factor: f64,
    /// Frame jitter scale (deg/s) for visual stability
    pub visual_jitter_scale: f64,
    /// Fixation threshold (deg/s) for the focus score
    pub fixation_speed_deg_s: f64,
    /// Gap detection factor relative to the median step duration
    pub gap_factor: f64,
    /// Tremor high-pass cut-off (Hz)
    pub tremor_cutoff_hz: f64,
    /// Minimum valid steps for tremor estimation
    pub tremor_min_steps: usize,
    /// Rolling window for tremor-over-time
    pub tremor_window: usize,
    /// Maximum points kept per time series
    pub max_series_points: usize,
    pub stress: StressConfig,
    pub composite_weights: CompositeWeights,
    pub consistency: ConsistencyConfig,
    pub tracking: TrackingConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_SAMPLES,
            stability_scale_factor: DEFAULT_STABILITY_SCALE_FACTOR,
            visual_jitter_scale: DEFAULT_VISUAL_JITTER_SCALE,
            fixation_speed_deg_s: DEFAULT_FIXATION_SPEED_DEG_S,
            gap_factor: DEFAULT_GAP_FACTOR,
            tremor_cutoff_hz: DEFAULT_TREMOR_CUTOFF_HZ,
            tremor_min_steps: DEFAULT_TREMOR_MIN_STEPS,
            tremor_window: DEFAULT_TREMOR_WINDOW,
            max_series_points: DEFAULT_MAX_SERIES_POINTS,
            stress: StressConfig::default(),
            composite_weights: CompositeWeights::default(),
            consistency: ConsistencyConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

/// Heart-rate based stress estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Heart rate treated as zero stress (bpm)
    pub resting_hr_bpm: f64,
    /// Elevation above resting that maps to stress 10 (bpm)
    pub hr_reserve_bpm: f64,
    /// Trailing smoothing window (seconds)
    pub window_s: f64,
    /// Readings outside [min, max] are dropped as sensor artefacts
    pub hr_min_plausible: f64,
    pub hr_max_plausible: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            resting_hr_bpm: 60.0,
            hr_reserve_bpm: 60.0,
            window_s: 5.0,
            hr_min_plausible: 25.0,
            hr_max_plausible: 250.0,
        }
    }
}

/// Weights of the 0-100 composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub technical: f64,
    pub stress: f64,
    pub consistency: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            stress: 0.3,
            consistency: 0.3,
        }
    }
}

/// Penalty scales for the consistency sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Tremor (deg/s) costing one consistency point
    pub tremor_penalty_scale: f64,
    /// Frame jitter (deg/s) costing one consistency point
    pub jitter_penalty_scale: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            tremor_penalty_scale: 2.0,
            jitter_penalty_scale: 10.0,
        }
    }
}

/// Hand-tracking and eye-gaze thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Valid wrist frames required for hand metrics
    pub hand_min_valid_frames: usize,
    /// Wrist velocity variance ((m/s)²) at which smoothness drops to 5/10
    pub smoothness_scale: f64,
    /// Frames required before hand tremor is estimated
    pub hand_tremor_min_frames: usize,
    /// High-pass cut-off for hand tremor (Hz)
    pub hand_tremor_cutoff_hz: f64,
    /// Mean gaze-angle variance (rad²) at which gaze stability drops to 5/10
    pub gaze_variance_scale: f64,
    /// Gaze step (rad) counted as a saccade
    pub saccade_threshold_rad: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            hand_min_valid_frames: 10,
            smoothness_scale: 0.001,
            hand_tremor_min_frames: 100,
            hand_tremor_cutoff_hz: 2.0,
            gaze_variance_scale: 0.01,
            saccade_threshold_rad: 0.1,
        }
    }
}

impl MetricsConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: MetricsConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(self).map_err(AnalysisError::JsonError)
    }

    /// Reject configurations that would make scores undefined
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_samples < DEFAULT_MIN_SAMPLES {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_samples must be at least {}, got {}",
                DEFAULT_MIN_SAMPLES, self.min_samples
            )));
        }

        let positive = [
            ("stability_scale_factor", self.stability_scale_factor),
            ("visual_jitter_scale", self.visual_jitter_scale),
            ("fixation_speed_deg_s", self.fixation_speed_deg_s),
            ("tremor_cutoff_hz", self.tremor_cutoff_hz),
            ("stress.resting_hr_bpm", self.stress.resting_hr_bpm),
            ("stress.hr_reserve_bpm", self.stress.hr_reserve_bpm),
            ("stress.window_s", self.stress.window_s),
            ("consistency.tremor_penalty_scale", self.consistency.tremor_penalty_scale),
            ("consistency.jitter_penalty_scale", self.consistency.jitter_penalty_scale),
            ("tracking.smoothness_scale", self.tracking.smoothness_scale),
            ("tracking.hand_tremor_cutoff_hz", self.tracking.hand_tremor_cutoff_hz),
            ("tracking.gaze_variance_scale", self.tracking.gaze_variance_scale),
            ("tracking.saccade_threshold_rad", self.tracking.saccade_threshold_rad),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if !(self.gap_factor.is_finite() && self.gap_factor > 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "gap_factor must be greater than 1, got {}",
                self.gap_factor
            )));
        }

        let (hr_min, hr_max) = (self.stress.hr_min_plausible, self.stress.hr_max_plausible);
        if !(hr_min.is_finite() && hr_max.is_finite() && hr_min < hr_max) {
            return Err(AnalysisError::InvalidConfig(format!(
                "stress.hr_min_plausible must be below stress.hr_max_plausible, got {hr_min}..{hr_max}"
            )));
        }

        if self.tremor_min_steps == 0 || self.tremor_window == 0 || self.max_series_points == 0 {
            return Err(AnalysisError::InvalidConfig(
                "tremor_min_steps, tremor_window and max_series_points must be non-zero".to_string(),
            ));
        }

        let w = &self.composite_weights;
        for (name, value) in [
            ("technical", w.technical),
            ("stress", w.stress),
            ("consistency", w.consistency),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "composite_weights.{name} must be non-negative, got {value}"
                )));
            }
        }
        // Stress may be unavailable, so the remaining weights must still carry a score
        if w.technical + w.consistency <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "composite_weights.technical + composite_weights.consistency must be positive"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MetricsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MetricsConfig::from_json(
            r#"{ "min_samples": 30, "composite_weights": { "stress": 0.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.min_samples, 30);
        assert_eq!(config.composite_weights.stress, 0.0);
        assert_eq!(config.composite_weights.technical, 0.4);
        assert_eq!(config.stress, StressConfig::default());
    }

    #[test]
    fn test_rejects_min_samples_below_two() {
        let result = MetricsConfig::from_json(r#"{ "min_samples": 1 }"#);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let config = MetricsConfig {
            stability_scale_factor: 0.0,
            ..MetricsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_weights_without_fallback() {
        let config = MetricsConfig {
            composite_weights: CompositeWeights {
                technical: 0.0,
                stress: 1.0,
                consistency: 0.0,
            },
            ..MetricsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_heart_rate_settings() {
        let with_stress = |stress: StressConfig| MetricsConfig {
            stress,
            ..MetricsConfig::default()
        };
        let defaults = StressConfig::default();
        for stress in [
            StressConfig { hr_min_plausible: f64::NAN, ..defaults.clone() },
            StressConfig { hr_max_plausible: f64::NAN, ..defaults.clone() },
            StressConfig { hr_max_plausible: f64::INFINITY, ..defaults.clone() },
            StressConfig { resting_hr_bpm: f64::NAN, ..defaults.clone() },
            StressConfig { hr_min_plausible: 200.0, hr_max_plausible: 100.0, ..defaults.clone() },
        ] {
            assert!(
                matches!(with_stress(stress.clone()).validate(), Err(AnalysisError::InvalidConfig(_))),
                "{stress:?}"
            );
        }
    }

    #[test]
    fn test_rejects_zero_tremor_min_steps() {
        let result = MetricsConfig::from_json(r#"{ "tremor_min_steps": 0 }"#);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
        assert!(MetricsConfig::from_json(r#"{ "tremor_min_steps": 1 }"#).is_ok());
    }

    #[test]
    fn test_json_round_trip_preserves_config() {
        let config = MetricsConfig::default();
        let parsed = MetricsConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
