//! Rigid-body math: vectors, rotations and poses.
//!
//! Axis convention: `+X` is right, `+Y` is up, `+Z` is forward.  A pose's
//! local axes are obtained by rotating those world axes by the pose's
//! rotation, so a viewpoint with the identity rotation looks down `+Z`.
//!
//! # Example
//!
//! ```rust
//! use tether_spatial::transform::{Pose, Quaternion, Vec3};
//!
//! // Observer at the origin, turned 90° to the right.
//! let view = Pose::new(Vec3::zero(), Quaternion::from_euler_degrees(0.0, 90.0, 0.0));
//!
//! // One metre "in front" of the observer is now world +X.
//! let ahead = view.offset(Vec3::new(0.0, 0.0, 1.0));
//! assert!((ahead.x - 1.0).abs() < 1e-5);
//! assert!(ahead.z.abs() < 1e-5);
//! ```

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    /// Create a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::zero()
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation with `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self + (other - self) * t
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// True when every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1); see [`normalize`][Self::normalize].
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` about `axis` (need not be normalised).
    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Rotation from Euler angles in degrees.
    ///
    /// Applied as roll about Z first, then pitch about X, then yaw about Y,
    /// so positive pitch tips the forward axis downward and positive yaw turns
    /// it toward `+X`.
    pub fn from_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> Self {
        let qx = Self::from_axis_angle(Vec3::RIGHT, pitch.to_radians());
        let qy = Self::from_axis_angle(Vec3::UP, yaw.to_radians());
        let qz = Self::from_axis_angle(Vec3::FORWARD, roll.to_radians());
        qy.mul(qx).mul(qz)
    }

    /// Hamilton product: compose two rotations (`rhs` applied first).
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Rescale to unit length.  A degenerate quaternion becomes the identity.
    pub fn normalize(self) -> Self {
        let len = self.dot(self).sqrt();
        if len <= f32::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / len, self.x / len, self.y / len, self.z / len)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // Express v as a pure quaternion.
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Angle in radians between two orientations.
    pub fn angle_to(self, other: Self) -> f32 {
        let d = self.dot(other).abs().min(1.0);
        2.0 * d.acos()
    }

    /// Spherical interpolation along the shortest arc, `t` clamped to
    /// `[0, 1]`.
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut cos = self.dot(other);
        let mut end = other;
        if cos < 0.0 {
            cos = -cos;
            end = Self::new(-other.w, -other.x, -other.y, -other.z);
        }

        // Nearly parallel: sin(theta) -> 0, fall back to normalised lerp.
        if cos > 0.9995 {
            return Self::new(
                self.w + (end.w - self.w) * t,
                self.x + (end.x - self.x) * t,
                self.y + (end.y - self.y) * t,
                self.z + (end.z - self.z) * t,
            )
            .normalize();
        }

        let theta = cos.acos();
        let sin = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin;
        let b = (t * theta).sin() / sin;
        Self::new(
            a * self.w + b * end.w,
            a * self.x + b * end.x,
            a * self.y + b * end.y,
            a * self.z + b * end.z,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// Position plus orientation of an object or observer in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    /// A pose at `position` with the identity rotation.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quaternion::identity())
    }

    pub fn identity() -> Self {
        Self::at(Vec3::zero())
    }

    /// World direction of this pose's local `+Z`.
    pub fn forward(&self) -> Vec3 {
        self.rotation.rotate(Vec3::FORWARD)
    }

    /// World direction of this pose's local `+X`.
    pub fn right(&self) -> Vec3 {
        self.rotation.rotate(Vec3::RIGHT)
    }

    /// World direction of this pose's local `+Y`.
    pub fn up(&self) -> Vec3 {
        self.rotation.rotate(Vec3::UP)
    }

    /// World position of a pose-relative offset:
    /// `position + right*x + up*y + forward*z`.
    pub fn offset(&self, local: Vec3) -> Vec3 {
        self.position + self.right() * local.x + self.up() * local.y + self.forward() * local.z
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    // ── Vec3 ────────────────────────────────────────────────────────────────

    #[test]
    fn vec3_lerp_clamps_t() {
        let a = Vec3::zero();
        let b = Vec3::new(10.0, 0.0, 0.0);
        assert!(close(a.lerp(b, 0.5), Vec3::new(5.0, 0.0, 0.0)));
        assert!(close(a.lerp(b, 2.0), b));
        assert!(close(a.lerp(b, -1.0), a));
    }

    #[test]
    fn vec3_normalized_zero_is_zero() {
        assert_eq!(Vec3::zero().normalized(), Vec3::zero());
        let n = Vec3::new(3.0, 4.0, 0.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn vec3_cross_follows_axis_convention() {
        // up × forward = right
        assert!(close(Vec3::UP.cross(Vec3::FORWARD), Vec3::RIGHT));
    }

    // ── Quaternion ──────────────────────────────────────────────────────────

    #[test]
    fn quaternion_identity_rotate_is_noop() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(close(Quaternion::identity().rotate(v), v));
    }

    #[test]
    fn quaternion_90deg_yaw_turns_forward_to_right() {
        let q = Quaternion::from_axis_angle(Vec3::UP, FRAC_PI_2);
        assert!(close(q.rotate(Vec3::FORWARD), Vec3::RIGHT));
        // Same thing through the Euler constructor.
        let e = Quaternion::from_euler_degrees(0.0, 90.0, 0.0);
        assert!(close(e.rotate(Vec3::FORWARD), Vec3::RIGHT));
    }

    #[test]
    fn positive_pitch_looks_down() {
        let q = Quaternion::from_euler_degrees(30.0, 0.0, 0.0);
        let f = q.rotate(Vec3::FORWARD);
        assert!(f.y < 0.0, "forward should dip below the horizon, got {f:?}");
    }

    #[test]
    fn quaternion_conjugate_is_inverse() {
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let prod = q.mul(q.conjugate());
        assert!((prod.w - 1.0).abs() < 1e-5);
        assert!(prod.x.abs() < 1e-5);
        assert!(prod.y.abs() < 1e-5);
        assert!(prod.z.abs() < 1e-5);
    }

    #[test]
    fn slerp_hits_endpoints_and_midpoint() {
        let a = Quaternion::identity();
        let b = Quaternion::from_axis_angle(Vec3::UP, FRAC_PI_2);
        assert!(a.slerp(b, 0.0).angle_to(a) < 1e-2);
        assert!(a.slerp(b, 1.0).angle_to(b) < 1e-2);
        let mid = a.slerp(b, 0.5);
        assert!((mid.angle_to(a) - FRAC_PI_2 * 0.5).abs() < 1e-3);
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let a = Quaternion::identity();
        let b = Quaternion::from_axis_angle(Vec3::UP, FRAC_PI_2);
        let neg_b = Quaternion::new(-b.w, -b.x, -b.y, -b.z);
        // q and -q are the same rotation; the midpoint must be 45° either way.
        let mid = a.slerp(neg_b, 0.5);
        assert!((mid.angle_to(a) - FRAC_PI_2 * 0.5).abs() < 1e-3);
    }

    #[test]
    fn normalize_degenerate_is_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize();
        assert_eq!(q, Quaternion::identity());
    }

    // ── Pose ────────────────────────────────────────────────────────────────

    #[test]
    fn pose_axes_for_identity() {
        let p = Pose::identity();
        assert!(close(p.forward(), Vec3::FORWARD));
        assert!(close(p.right(), Vec3::RIGHT));
        assert!(close(p.up(), Vec3::UP));
    }

    #[test]
    fn pose_offset_is_camera_relative() {
        let view = Pose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::from_euler_degrees(0.0, 90.0, 0.0),
        );
        // Turned right: local forward is +X, local right is -Z.
        let p = view.offset(Vec3::new(0.5, -0.3, 1.0));
        assert!(close(p, Vec3::new(2.0, 1.7, 2.5)), "got {p:?}");
    }
}
