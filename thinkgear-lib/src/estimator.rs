//! Attention estimate from band powers.
//!
//! When the headset reports a marginal signal its own attention value is
//! unreliable, so attention is recomputed from the engagement index
//! `beta / (alpha + theta)` mapped through a logistic curve.

use serde::Serialize;

use crate::constants::{ESTIMATE_CENTER, ESTIMATE_EPSILON, ESTIMATE_SLOPE, SIGNAL_NO_CONTACT};
use crate::packet::EegPower;

/// Parameters of the logistic transfer function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatorParams {
    /// Steepness of the logistic curve
    pub slope: f32,
    /// Engagement index that maps to 50
    pub center: f32,
    /// Added to the denominator of the engagement index
    pub epsilon: f32,
    /// Quality strictly above this forces the estimate to 0
    pub quality_gate: u8,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            slope: ESTIMATE_SLOPE,
            center: ESTIMATE_CENTER,
            epsilon: ESTIMATE_EPSILON,
            quality_gate: SIGNAL_NO_CONTACT,
        }
    }
}

/// Engagement index of a power block, or `None` when all bands are zero
pub fn engagement_index(power: &EegPower, epsilon: f32) -> Option<f32> {
    let alpha = u64::from(power.low_alpha()) + u64::from(power.high_alpha());
    let beta = u64::from(power.low_beta()) + u64::from(power.high_beta());
    let gamma = u64::from(power.low_gamma()) + u64::from(power.mid_gamma());
    let theta = u64::from(power.theta());
    let total = u64::from(power.delta()) + theta + alpha + beta + gamma;
    if total == 0 {
        return None;
    }

    let total = total as f32;
    let alpha_frac = alpha as f32 / total;
    let beta_frac = beta as f32 / total;
    let theta_frac = theta as f32 / total;
    Some(beta_frac / (alpha_frac + theta_frac + epsilon))
}

/// Map an engagement index onto 0..=100
pub fn logistic(ei: f32, params: &EstimatorParams) -> f32 {
    100.0 / (1.0 + (-params.slope * (ei - params.center)).exp())
}

/// Estimated attention (0..=100) for a power block at the given signal quality.
pub fn approximate_attention(power: &EegPower, quality: u8, params: &EstimatorParams) -> u8 {
    let Some(ei) = engagement_index(power, params.epsilon) else {
        return 0;
    };
    let mut att = logistic(ei, params);
    if quality > params.quality_gate {
        att = 0.0;
    }
    (att.clamp(0.0, 100.0) + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(delta: u32, theta: u32, alpha: u32, beta: u32, gamma: u32) -> EegPower {
        EegPower::new([delta, theta, alpha, 0, beta, 0, gamma, 0])
    }

    #[test]
    fn test_all_zero_power_is_zero() {
        let params = EstimatorParams::default();
        assert_eq!(approximate_attention(&EegPower::default(), 0, &params), 0);
        assert_eq!(approximate_attention(&EegPower::default(), 30, &params), 0);
    }

    #[test]
    fn test_center_maps_to_fifty() {
        // beta = 0.5 * (alpha + theta) puts the index on the curve center
        let p = power(0, 100, 100, 100, 0);
        let ei = engagement_index(&p, 0.0).unwrap();
        assert!((ei - 0.5).abs() < 1e-6);
        assert_eq!(approximate_attention(&p, 10, &EstimatorParams::default()), 50);
    }

    #[test]
    fn test_known_points() {
        let params = EstimatorParams::default();
        // ei = 1.0 -> 100 / (1 + e^-3) = 95.26
        assert_eq!(approximate_attention(&power(0, 50, 50, 100, 0), 10, &params), 95);
        // ei = 0 -> 100 / (1 + e^3) = 4.74
        assert_eq!(approximate_attention(&power(10, 50, 50, 0, 10), 10, &params), 5);
    }

    #[test]
    fn test_beta_only_saturates() {
        // alpha and theta absent: index blows up to beta / epsilon
        let p = power(0, 0, 0, 1000, 0);
        assert_eq!(approximate_attention(&p, 1, &EstimatorParams::default()), 100);
    }

    #[test]
    fn test_quality_gate() {
        let params = EstimatorParams::default();
        let p = power(0, 50, 50, 100, 0);
        assert_eq!(approximate_attention(&p, 55, &params), 95);
        assert_eq!(approximate_attention(&p, 56, &params), 0);
    }

    #[test]
    fn test_full_scale_bands_do_not_overflow() {
        let p = EegPower::new([0xFF_FFFF; 8]);
        let att = approximate_attention(&p, 1, &EstimatorParams::default());
        // ei = (2/8) / (3/8) -> 100 / (1 + e^-1) = 73.1
        assert_eq!(att, 73);
    }

    #[test]
    fn test_custom_params() {
        let params = EstimatorParams {
            slope: 1.0,
            center: 0.0,
            ..EstimatorParams::default()
        };
        // ei = 0 at center 0 -> 50
        assert_eq!(approximate_attention(&power(10, 50, 50, 0, 10), 10, &params), 50);
    }
}
