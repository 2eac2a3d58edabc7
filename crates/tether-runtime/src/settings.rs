//! Tuning parameters for carriers and tethers.
//!
//! Every field has a serde default, so a partial TOML or JSON document only
//! needs to mention the values it changes.

use serde::{Deserialize, Serialize};
use tether_spatial::easing::EasingCurve;
use tether_spatial::transform::Vec3;
use tether_types::TetherError;

// ────────────────────────────────────────────────────────────────────────────
// Carry controller
// ────────────────────────────────────────────────────────────────────────────

/// Per-carrier pickup and hold tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrySettings {
    /// Maximum pickup ray length.
    #[serde(default = "default_pickup_range")]
    pub pickup_range: f32,

    /// Distance in front of the viewpoint at which objects are held.
    #[serde(default = "default_hold_distance")]
    pub hold_distance: f32,

    /// Camera-relative offset; `x` is right, `y` is up.  `z` is unused, the
    /// forward component comes from `hold_distance`.
    #[serde(default = "default_carry_hold_offset")]
    pub hold_offset: Vec3,

    /// Position smoothing rate for non-tether objects (fraction per second).
    #[serde(default = "default_pickup_smoothing")]
    pub pickup_smoothing: f32,

    /// Rotation smoothing rate for non-tether objects.
    #[serde(default = "default_rotation_smoothing")]
    pub rotation_smoothing: f32,

    /// Upward impulse applied on drop.
    #[serde(default = "default_drop_upward_force")]
    pub drop_upward_force: f32,

    /// Radius of the overlap sphere that vetoes a hold position.
    #[serde(default = "default_hold_probe_radius")]
    pub hold_probe_radius: f32,
}

fn default_pickup_range() -> f32 {
    10.0
}
fn default_hold_distance() -> f32 {
    1.0
}
fn default_carry_hold_offset() -> Vec3 {
    Vec3::new(0.8, -0.3, 1.0)
}
fn default_pickup_smoothing() -> f32 {
    25.0
}
fn default_rotation_smoothing() -> f32 {
    15.0
}
fn default_drop_upward_force() -> f32 {
    0.1
}
fn default_hold_probe_radius() -> f32 {
    0.1
}

impl Default for CarrySettings {
    fn default() -> Self {
        Self {
            pickup_range: default_pickup_range(),
            hold_distance: default_hold_distance(),
            hold_offset: default_carry_hold_offset(),
            pickup_smoothing: default_pickup_smoothing(),
            rotation_smoothing: default_rotation_smoothing(),
            drop_upward_force: default_drop_upward_force(),
            hold_probe_radius: default_hold_probe_radius(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tether
// ────────────────────────────────────────────────────────────────────────────

/// Per-object draw-back, throw and recall tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetherSettings {
    /// Seconds the secondary action must be held before a throw is armed.
    #[serde(default = "default_draw_back_delay")]
    pub draw_back_delay: f32,

    /// Backward pull of the hold position at full draw.
    #[serde(default = "default_draw_back_distance")]
    pub draw_back_distance: f32,

    #[serde(default = "default_throw_force")]
    pub throw_force: f32,

    #[serde(default = "default_throw_upward_force")]
    pub throw_upward_force: f32,

    /// Spin about the object's local right axis at launch.
    #[serde(default = "default_throw_torque")]
    pub throw_torque: f32,

    /// Camera-relative hold offset (right, up, forward).
    #[serde(default = "default_tether_hold_offset")]
    pub hold_offset: Vec3,

    /// Hold orientation relative to the viewpoint, Euler degrees
    /// (pitch, yaw, roll).
    #[serde(default = "default_hold_rotation_deg")]
    pub hold_rotation_deg: Vec3,

    /// Smoothing rate while held.
    #[serde(default = "default_smooth_speed")]
    pub smooth_speed: f32,

    /// Units per second used to turn elapsed time into journey progress.
    #[serde(default = "default_recall_speed")]
    pub recall_speed: f32,

    /// Recall completes once the object is this close to the hold point.
    #[serde(default = "default_min_distance_to_pickup")]
    pub min_distance_to_pickup: f32,

    #[serde(default)]
    pub recall_curve: EasingCurve,
}

fn default_draw_back_delay() -> f32 {
    0.25
}
fn default_draw_back_distance() -> f32 {
    1.5
}
fn default_throw_force() -> f32 {
    30.0
}
fn default_throw_upward_force() -> f32 {
    2.0
}
fn default_throw_torque() -> f32 {
    10.0
}
fn default_tether_hold_offset() -> Vec3 {
    Vec3::new(0.5, -0.3, 0.8)
}
fn default_hold_rotation_deg() -> Vec3 {
    Vec3::new(0.0, 270.0, 0.0)
}
fn default_smooth_speed() -> f32 {
    15.0
}
fn default_recall_speed() -> f32 {
    30.0
}
fn default_min_distance_to_pickup() -> f32 {
    1.0
}

impl Default for TetherSettings {
    fn default() -> Self {
        Self {
            draw_back_delay: default_draw_back_delay(),
            draw_back_distance: default_draw_back_distance(),
            throw_force: default_throw_force(),
            throw_upward_force: default_throw_upward_force(),
            throw_torque: default_throw_torque(),
            hold_offset: default_tether_hold_offset(),
            hold_rotation_deg: default_hold_rotation_deg(),
            smooth_speed: default_smooth_speed(),
            recall_speed: default_recall_speed(),
            min_distance_to_pickup: default_min_distance_to_pickup(),
            recall_curve: EasingCurve::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

/// Everything a [`Session`][crate::session::Session] needs besides its
/// injected collaborators.
///
/// `tether` is the template copied into every tether spawned without
/// explicit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub carry: CarrySettings,

    #[serde(default)]
    pub tether: TetherSettings,

    /// Run the invariant verifier after every tick.
    #[serde(default = "default_verify_invariants")]
    pub verify_invariants: bool,
}

fn default_verify_invariants() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            carry: CarrySettings::default(),
            tether: TetherSettings::default(),
            verify_invariants: default_verify_invariants(),
        }
    }
}

impl SessionConfig {
    /// Reject tunings that would stall or blow up the state machines.
    ///
    /// # Errors
    ///
    /// [`TetherError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TetherError> {
        self.carry.validate()?;
        self.tether.validate()
    }
}

impl CarrySettings {
    pub fn validate(&self) -> Result<(), TetherError> {
        positive("carry.pickup_range", self.pickup_range)?;
        positive("carry.hold_probe_radius", self.hold_probe_radius)?;
        non_negative("carry.hold_distance", self.hold_distance)?;
        non_negative("carry.pickup_smoothing", self.pickup_smoothing)?;
        non_negative("carry.rotation_smoothing", self.rotation_smoothing)?;
        finite("carry.drop_upward_force", self.drop_upward_force)?;
        finite_vec("carry.hold_offset", self.hold_offset)
    }
}

impl TetherSettings {
    pub fn validate(&self) -> Result<(), TetherError> {
        positive("tether.recall_speed", self.recall_speed)?;
        positive("tether.min_distance_to_pickup", self.min_distance_to_pickup)?;
        non_negative("tether.draw_back_delay", self.draw_back_delay)?;
        non_negative("tether.smooth_speed", self.smooth_speed)?;
        finite("tether.draw_back_distance", self.draw_back_distance)?;
        finite("tether.throw_force", self.throw_force)?;
        finite("tether.throw_upward_force", self.throw_upward_force)?;
        finite("tether.throw_torque", self.throw_torque)?;
        finite_vec("tether.hold_offset", self.hold_offset)?;
        finite_vec("tether.hold_rotation_deg", self.hold_rotation_deg)
    }
}

fn finite(field: &str, value: f32) -> Result<(), TetherError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TetherError::InvalidConfig(format!("{field} must be finite, got {value}")))
    }
}

fn finite_vec(field: &str, value: Vec3) -> Result<(), TetherError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TetherError::InvalidConfig(format!("{field} must be finite")))
    }
}

fn positive(field: &str, value: f32) -> Result<(), TetherError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TetherError::InvalidConfig(format!("{field} must be > 0, got {value}")))
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), TetherError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(TetherError::InvalidConfig(format!("{field} must be >= 0, got {value}")))
    }
}
