//! Numeric helpers shared by the metric modules
//!
//! Plain slice statistics plus a second-order Butterworth high-pass filter used
//! to separate tremor from voluntary motion.

use crate::types::SeriesPoint;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Highest usable cut-off as a fraction of the sample rate (just under Nyquist)
const MAX_CUTOFF_FRACTION: f64 = 0.45;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Pearson correlation coefficient.
///
/// `None` for mismatched lengths, fewer than three pairs, or a constant input.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 3 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

/// Trailing mean of |v| over up to `window` values ending at each index
pub fn rolling_mean_abs(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v.abs();
        if i >= window {
            sum -= values[i - window].abs();
        }
        let n = (i + 1).min(window);
        out.push(sum / n as f64);
    }
    out
}

/// Reduce a series to at most `max_points` by averaging consecutive chunks
pub fn downsample(points: Vec<SeriesPoint>, max_points: usize) -> Vec<SeriesPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points;
    }
    let chunk = points.len().div_ceil(max_points);
    points
        .chunks(chunk)
        .map(|c| {
            let n = c.len() as f64;
            SeriesPoint {
                t_s: c.iter().map(|p| p.t_s).sum::<f64>() / n,
                value: c.iter().map(|p| p.value).sum::<f64>() / n,
            }
        })
        .collect()
}

/// Second-order Butterworth high-pass filter (RBJ biquad, Q = 1/√2)
#[derive(Debug, Clone, Copy)]
pub struct HighPass {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl HighPass {
    /// Design a filter; the cut-off is clamped below Nyquist.
    ///
    /// Returns `None` when the sample rate or cut-off is not a positive number.
    pub fn new(cutoff_hz: f64, sample_rate_hz: f64) -> Option<Self> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0)
            || !(cutoff_hz.is_finite() && cutoff_hz > 0.0)
        {
            return None;
        }
        let cutoff = cutoff_hz.min(MAX_CUTOFF_FRACTION * sample_rate_hz);
        let w0 = 2.0 * PI * cutoff / sample_rate_hz;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        Some(Self {
            b0: (1.0 + cos_w0) / 2.0 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        })
    }

    /// Filter a whole series (transposed direct form II).
    ///
    /// The first value is subtracted before filtering so a non-zero starting
    /// level does not ring as a step.
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let Some(&first) = input.first() else {
            return Vec::new();
        };
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        input
            .iter()
            .map(|&raw| {
                let x = raw - first;
                let y = self.b0 * x + z1;
                z1 = self.b1 * x - self.a1 * y + z2;
                z2 = self.b2 * x - self.a2 * y;
                y
            })
            .collect()
    }
}
