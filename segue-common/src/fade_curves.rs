//! Fade curve shapes for transition synthesis
//!
//! A fade curve maps normalized position through a fade window to a gain
//! multiplier. The planner applies these to stem slices when compositing
//! crossfade and vocal-crossover windows.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Fade curve types
///
/// Each shape has a different perceptual quality:
/// - Linear: constant rate of change
/// - Exponential: slow start, fast finish (fade-in flavored)
/// - Logarithmic: fast start, slow finish (fade-out flavored)
/// - SCurve: smooth acceleration and deceleration
/// - EqualPower: constant perceived loudness across a crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    Linear,

    /// v(t) = t²
    Exponential,

    /// v(t) = sqrt(t) rising, (1-t)² falling
    Logarithmic,

    /// v(t) = 0.5 × (1 - cos(π t))
    SCurve,

    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Gain multiplier for a fade-in at normalized position `t`
    ///
    /// `t` is clamped to [0.0, 1.0]; returns 0.0 at the window start and
    /// 1.0 at the window end.
    pub fn gain_in(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Gain multiplier for a fade-out at normalized position `t`
    ///
    /// Returns 1.0 at the window start and 0.0 at the window end.
    pub fn gain_out(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential | FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 + (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// All curve variants, for validation and sweeps
    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl Default for FadeCurve {
    /// Linear: amplitude-linear ramps, the shape the transition
    /// compositor was tuned against
    fn default() -> Self {
        FadeCurve::Linear
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::EqualPower => "equal_power",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_in_bounds() {
        for curve in FadeCurve::all_variants() {
            assert!(curve.gain_in(0.0).abs() < 0.01, "{curve} at 0.0");
            assert!((curve.gain_in(1.0) - 1.0).abs() < 0.01, "{curve} at 1.0");
        }
    }

    #[test]
    fn test_gain_out_bounds() {
        for curve in FadeCurve::all_variants() {
            assert!((curve.gain_out(0.0) - 1.0).abs() < 0.01, "{curve} at 0.0");
            assert!(curve.gain_out(1.0).abs() < 0.01, "{curve} at 1.0");
        }
    }

    #[test]
    fn test_position_clamped() {
        for curve in FadeCurve::all_variants() {
            assert_eq!(curve.gain_in(-0.5), curve.gain_in(0.0));
            assert_eq!(curve.gain_in(1.5), curve.gain_in(1.0));
            assert_eq!(curve.gain_out(-0.5), curve.gain_out(0.0));
            assert_eq!(curve.gain_out(1.5), curve.gain_out(1.0));
        }
    }

    #[test]
    fn test_equal_power_sums_to_unity_power() {
        let curve = FadeCurve::EqualPower;
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let power = curve.gain_in(t).powi(2) + curve.gain_out(t).powi(2);
            assert!((power - 1.0).abs() < 1e-5, "power {power} at t={t}");
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FadeCurve::EqualPower).unwrap();
        assert_eq!(json, "\"equal_power\"");

        let curve: FadeCurve = serde_json::from_str("\"s_curve\"").unwrap();
        assert_eq!(curve, FadeCurve::SCurve);
    }

    #[test]
    fn test_default_is_linear() {
        assert_eq!(FadeCurve::default(), FadeCurve::Linear);
    }
}
