//! Rate-based pose smoothing.
//!
//! Each call moves a pose a fraction `rate * dt` of the remaining way toward
//! its target (clamped to `[0, 1]`), so a constant target is approached
//! exponentially and a rate of `1 / dt` or more snaps in a single step.
//!
//! # Example
//!
//! ```rust
//! use tether_spatial::smoothing::PoseSmoother;
//! use tether_spatial::transform::Vec3;
//!
//! let smoother = PoseSmoother::new(10.0, 10.0);
//! let p = smoother.position(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0), 0.05);
//! assert!((p.x - 0.5).abs() < 1e-6);
//! ```

use crate::transform::{Pose, Quaternion, Vec3};

/// Smooths position and rotation toward a target at independent rates
/// (units: fraction per second).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSmoother {
    pub position_rate: f32,
    pub rotation_rate: f32,
}

impl PoseSmoother {
    pub fn new(position_rate: f32, rotation_rate: f32) -> Self {
        Self {
            position_rate,
            rotation_rate,
        }
    }

    /// Same rate for both position and rotation.
    pub fn uniform(rate: f32) -> Self {
        Self::new(rate, rate)
    }

    /// Interpolation factor for one step: `rate * dt`, clamped to `[0, 1]`.
    /// A non-positive or non-finite `dt` yields `0` (no movement).
    pub fn factor(rate: f32, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        (rate * dt).clamp(0.0, 1.0)
    }

    pub fn position(&self, current: Vec3, target: Vec3, dt: f32) -> Vec3 {
        current.lerp(target, Self::factor(self.position_rate, dt))
    }

    pub fn rotation(&self, current: Quaternion, target: Quaternion, dt: f32) -> Quaternion {
        current.slerp(target, Self::factor(self.rotation_rate, dt))
    }

    /// Smooth both components of `current` toward `target`.
    pub fn pose(&self, current: Pose, target: Pose, dt: f32) -> Pose {
        Pose::new(
            self.position(current.position, target.position, dt),
            self.rotation(current.rotation, target.rotation, dt),
        )
    }
}
