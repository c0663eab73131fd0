//! Session construction and validation
//!
//! A [`Session`] is the only way samples reach the calculator. Construction
//! rejects structurally broken input and precomputes the frame-to-frame steps
//! every metric module works from.

use crate::config::MetricsConfig;
use crate::error::AnalysisError;
use crate::geometry::{distance, is_finite_vec3, relative_rotation};
use crate::signal::median;
use crate::types::{QualityFlag, Sample};
use log::{debug, warn};

const NANOS_PER_SEC: f64 = 1e9;

/// Seconds between two nanosecond timestamps
///
/// Widened to `i128` so spans larger than `i64::MAX` ns cannot overflow.
pub(crate) fn elapsed_s(from_ns: i64, to_ns: i64) -> f64 {
    (i128::from(to_ns) - i128::from(from_ns)) as f64 / NANOS_PER_SEC
}

/// How a step between two consecutive samples is treated by rate-based metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Valid,
    /// Both samples share a timestamp; no rate can be computed
    Duplicate,
    /// Longer than `gap_factor` × median step, frames were dropped in between
    Gap,
}

/// Motion between sample `index - 1` and sample `index`
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Index of the later sample
    pub index: usize,
    /// Seconds from session start to the later sample
    pub t_s: f64,
    pub dt_s: f64,
    /// Rotation vector (axis * angle) in degrees
    pub rotation_deg: [f64; 3],
    /// Rotation angle in degrees
    pub angle_deg: f64,
    /// Head displacement when both samples carry a position
    pub translation_m: Option<f64>,
    pub kind: StepKind,
}

impl Step {
    /// Angular speed in deg/s, only for valid steps
    pub fn angular_speed_deg_s(&self) -> Option<f64> {
        match self.kind {
            StepKind::Valid => Some(self.angle_deg / self.dt_s),
            StepKind::Duplicate | StepKind::Gap => None,
        }
    }
}

/// One recording's validated, time-ordered samples
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    samples: Vec<Sample>,
    steps: Vec<Step>,
    duration_s: f64,
    flags: Vec<QualityFlag>,
}

impl Session {
    /// Validate samples and build a session.
    ///
    /// # Errors
    /// - `InsufficientData` with fewer than `config.min_samples` samples
    /// - `InvalidSession` for decreasing timestamps, malformed orientation or
    ///   position, or a zero time span
    pub fn new(samples: Vec<Sample>, config: &MetricsConfig) -> Result<Self, AnalysisError> {
        if samples.len() < config.min_samples {
            return Err(AnalysisError::InsufficientData {
                required: config.min_samples,
                actual: samples.len(),
            });
        }

        let mut orientations = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            let unit = sample.orientation.to_unit().ok_or_else(|| {
                AnalysisError::InvalidSession(format!(
                    "sample {i} has a malformed orientation quaternion"
                ))
            })?;
            orientations.push(unit);

            if let Some(position) = &sample.position_m {
                if !is_finite_vec3(position) {
                    return Err(AnalysisError::InvalidSession(format!(
                        "sample {i} has a non-finite position"
                    )));
                }
            }

            if i > 0 && sample.timestamp_ns < samples[i - 1].timestamp_ns {
                return Err(AnalysisError::InvalidSession(format!(
                    "timestamp of sample {} ({} ns) precedes sample {} ({} ns)",
                    i,
                    sample.timestamp_ns,
                    i - 1,
                    samples[i - 1].timestamp_ns
                )));
            }
        }

        let start_ns = samples[0].timestamp_ns;
        let end_ns = samples[samples.len() - 1].timestamp_ns;
        if end_ns <= start_ns {
            return Err(AnalysisError::InvalidSession(
                "all samples share a single timestamp".to_string(),
            ));
        }
        let duration_s = elapsed_s(start_ns, end_ns);

        let dts: Vec<f64> = samples
            .windows(2)
            .map(|pair| elapsed_s(pair[0].timestamp_ns, pair[1].timestamp_ns))
            .collect();
        let positive_dts: Vec<f64> = dts.iter().copied().filter(|dt| *dt > 0.0).collect();
        // Non-empty: the span is positive, so at least one step advances
        let median_dt = median(&positive_dts).unwrap_or(duration_s);
        let gap_threshold = config.gap_factor * median_dt;

        let steps: Vec<Step> = samples
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let dt_s = dts[i];
                let rotation = relative_rotation(&orientations[i], &orientations[i + 1]);
                let kind = if dt_s <= 0.0 {
                    StepKind::Duplicate
                } else if dt_s > gap_threshold {
                    StepKind::Gap
                } else {
                    StepKind::Valid
                };
                Step {
                    index: i + 1,
                    t_s: elapsed_s(start_ns, pair[1].timestamp_ns),
                    dt_s,
                    rotation_deg: [
                        rotation.x.to_degrees(),
                        rotation.y.to_degrees(),
                        rotation.z.to_degrees(),
                    ],
                    angle_deg: rotation.norm().to_degrees(),
                    translation_m: match (&pair[0].position_m, &pair[1].position_m) {
                        (Some(a), Some(b)) => Some(distance(a, b)),
                        _ => None,
                    },
                    kind,
                }
            })
            .collect();

        let duplicates = steps.iter().filter(|s| s.kind == StepKind::Duplicate).count();
        let gaps = steps.iter().filter(|s| s.kind == StepKind::Gap).count();
        let valid = steps.len() - duplicates - gaps;
        let positions = samples.iter().filter(|s| s.position_m.is_some()).count();

        let mut flags = Vec::new();
        if duplicates > 0 {
            warn!("{duplicates} steps share a timestamp and are excluded from rate metrics");
            flags.push(QualityFlag::DuplicateTimestamps);
        }
        if gaps > 0 {
            warn!(
                "{gaps} steps exceed {:.4}s (dropped frames) and are excluded from jitter metrics",
                gap_threshold
            );
            flags.push(QualityFlag::DroppedFrames);
        }
        if positions < 2 {
            flags.push(QualityFlag::MissingPosition);
        }
        if valid < config.tremor_min_steps {
            flags.push(QualityFlag::ShortSession);
        }

        debug!(
            "Built session: {} samples, {:.2}s, {} valid steps",
            samples.len(),
            duration_s,
            valid
        );

        Ok(Self {
            samples,
            steps,
            duration_s,
            flags,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a session holds at least `min_samples` samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Average sample rate over the whole session
    pub fn nominal_rate_hz(&self) -> f64 {
        (self.samples.len() - 1) as f64 / self.duration_s
    }

    /// Seconds from session start to sample `index`
    pub fn time_of(&self, index: usize) -> f64 {
        elapsed_s(self.samples[0].timestamp_ns, self.samples[index].timestamp_ns)
    }

    pub fn quality_flags(&self) -> &[QualityFlag] {
        &self.flags
    }

    /// Iterator over steps usable for rate-based metrics
    pub fn valid_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.kind == StepKind::Valid)
    }

    pub fn dropped_steps(&self) -> usize {
        self.steps.len() - self.valid_steps().count()
    }
}
