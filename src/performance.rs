//! Composite performance score
//!
//! Combines technical skill, stress management, and consistency into a 0-100
//! score. Sub-scores that are unavailable are left out and the remaining
//! weights are renormalized.

use crate::config::{CompositeWeights, ConsistencyConfig, MetricsConfig};
use crate::types::{EffectiveWeights, MetricSet, MetricValue, PerformanceRating, PerformanceScore};
use log::debug;

/// Scorer for the composite performance rating
pub struct PerformanceScorer;

impl PerformanceScorer {
    pub fn score(metrics: &MetricSet, config: &MetricsConfig) -> PerformanceScore {
        let technical_skill = compute_technical_skill(
            metrics.motion.head_stability,
            metrics.stability.visual_stability,
        );
        let stress_management = metrics.stress.peak_stress.map(|s| (10.0 - s).clamp(0.0, 10.0));
        let consistency = compute_consistency(
            metrics.motion.avg_tremor_deg_s,
            metrics.stability.frame_jitter_deg_s,
            &config.consistency,
        );

        let weights_used = effective_weights(&config.composite_weights, stress_management);
        let overall = compute_overall(technical_skill, stress_management, consistency, &weights_used);
        let rating = PerformanceRating::from_score(overall);

        debug!(
            "Performance: overall {:.1}/100 ({}), technical {:.2}, stress {}, consistency {:.2}",
            overall,
            rating.label(),
            technical_skill,
            stress_management.display(2),
            consistency
        );

        PerformanceScore {
            overall,
            technical_skill,
            stress_management,
            consistency,
            rating,
            weights_used,
        }
    }
}

/// Technical skill (0-10): mean of head and visual stability
fn compute_technical_skill(head_stability: f64, visual_stability: f64) -> f64 {
    ((head_stability + visual_stability) / 2.0).clamp(0.0, 10.0)
}

/// Consistency (0-10)
///
/// Formula: `10 - tremor / tremor_penalty_scale - jitter / jitter_penalty_scale`
fn compute_consistency(tremor_deg_s: f64, jitter_deg_s: f64, config: &ConsistencyConfig) -> f64 {
    (10.0 - tremor_deg_s / config.tremor_penalty_scale - jitter_deg_s / config.jitter_penalty_scale)
        .clamp(0.0, 10.0)
}

/// Normalize the configured weights over the sub-scores that are available
fn effective_weights(weights: &CompositeWeights, stress: MetricValue) -> EffectiveWeights {
    let stress_weight = if stress.is_available() { weights.stress } else { 0.0 };
    // Config validation keeps technical + consistency positive
    let total = weights.technical + stress_weight + weights.consistency;
    EffectiveWeights {
        technical: weights.technical / total,
        stress: stress_weight / total,
        consistency: weights.consistency / total,
    }
}

/// Overall score (0-100)
///
/// Formula:
/// ```text
/// Overall = 10 * (w_t * technical + w_s * stress_management + w_c * consistency)
/// ```
/// with effective weights summing to 1.
fn compute_overall(
    technical: f64,
    stress_management: MetricValue,
    consistency: f64,
    weights: &EffectiveWeights,
) -> f64 {
    let stress_term = stress_management.value().unwrap_or(0.0) * weights.stress;
    let weighted = technical * weights.technical + stress_term + consistency * weights.consistency;
    (weighted * 10.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_when_all_available() {
        let w = effective_weights(&CompositeWeights::default(), MetricValue::Available(3.0));
        assert!((w.technical - 0.4).abs() < 1e-12);
        assert!((w.stress - 0.3).abs() < 1e-12);
        assert!((w.consistency - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_weights_renormalized_without_stress() {
        let w = effective_weights(&CompositeWeights::default(), MetricValue::Unavailable);
        assert_eq!(w.stress, 0.0);
        assert!((w.technical - 0.4 / 0.7).abs() < 1e-12);
        assert!((w.technical + w.consistency - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overall_weighting() {
        let weights = effective_weights(&CompositeWeights::default(), MetricValue::Available(5.0));
        let overall = compute_overall(10.0, MetricValue::Available(5.0), 0.0, &weights);
        // 10 * (0.4 * 10 + 0.3 * 5 + 0.3 * 0) = 55
        assert!((overall - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_session_without_stress_scores_100() {
        let weights = effective_weights(&CompositeWeights::default(), MetricValue::Unavailable);
        let overall = compute_overall(10.0, MetricValue::Unavailable, 10.0, &weights);
        assert!((overall - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_penalties() {
        let config = ConsistencyConfig::default();
        assert_eq!(compute_consistency(0.0, 0.0, &config), 10.0);
        // 2 deg/s tremor and 10 deg/s jitter each cost one point
        assert!((compute_consistency(2.0, 10.0, &config) - 8.0).abs() < 1e-12);
        assert_eq!(compute_consistency(100.0, 100.0, &config), 0.0);
    }
}
