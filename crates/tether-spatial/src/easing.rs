//! Easing curves for timed trajectories.
//!
//! A curve maps a progress fraction onto an eased fraction.  Input outside
//! `[0, 1]` is clamped first, so callers may feed raw ratios such as
//! `distance_covered / journey_length` that overshoot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingCurve {
    Linear,
    /// Slow start and slow finish (cubic Hermite with flat tangents).
    #[default]
    EaseInOut,
    /// Slow start.
    EaseIn,
    /// Slow finish.
    EaseOut,
}

impl EasingCurve {
    pub fn evaluate(self, t: f32) -> f32 {
        // NaN clamps to NaN; treat it as "no progress".
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            EasingCurve::Linear => t,
            EasingCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
            EasingCurve::EaseIn => t * t,
            EasingCurve::EaseOut => t * (2.0 - t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EasingCurve; 4] = [
        EasingCurve::Linear,
        EasingCurve::EaseInOut,
        EasingCurve::EaseIn,
        EasingCurve::EaseOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for curve in ALL {
            assert_eq!(curve.evaluate(0.0), 0.0, "{curve:?}");
            assert_eq!(curve.evaluate(1.0), 1.0, "{curve:?}");
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        for curve in ALL {
            assert_eq!(curve.evaluate(-3.0), 0.0);
            assert_eq!(curve.evaluate(7.5), 1.0);
            assert_eq!(curve.evaluate(f32::NAN), 0.0);
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for curve in ALL {
            let mut prev = 0.0;
            for i in 1..=100 {
                let v = curve.evaluate(i as f32 / 100.0);
                assert!(v >= prev, "{curve:?} decreased at step {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_about_midpoint() {
        let c = EasingCurve::EaseInOut;
        assert!((c.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!((c.evaluate(0.25) + c.evaluate(0.75) - 1.0).abs() < 1e-6);
        assert!(c.evaluate(0.1) < 0.1, "should start slower than linear");
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&EasingCurve::EaseInOut).unwrap();
        assert_eq!(json, "\"ease_in_out\"");
    }
}
