//! In-process physics backend for headless tests and the CLI sandbox.
//!
//! [`SimPhysics`] records every command it receives and integrates simple
//! ballistic motion (semi-implicit Euler, uniform gravity, optional flat
//! floor) so that thrown objects visibly fly and land without a real engine.
//!
//! # Example
//!
//! ```rust
//! use tether_physics::{PhysicsBackend, SimPhysics};
//! use tether_spatial::transform::{Pose, Vec3};
//! use tether_types::ObjectId;
//!
//! let mut physics = SimPhysics::new().with_gravity(-10.0).with_floor(0.0);
//! let id = ObjectId::new();
//! let mut pose = Pose::at(Vec3::new(0.0, 10.0, 0.0));
//!
//! physics.integrate(id, &mut pose, 0.5);
//! assert!((pose.position.y - 7.5).abs() < 1e-5);
//! ```

use std::collections::HashMap;

use tether_spatial::transform::{Pose, Quaternion, Vec3};
use tether_types::ObjectId;
use tracing::{debug, trace};

use crate::backend::PhysicsBackend;

/// Earth gravity along `-Y`, m/s².
pub const DEFAULT_GRAVITY: f32 = -9.81;

// ────────────────────────────────────────────────────────────────────────────
// Body record
// ────────────────────────────────────────────────────────────────────────────

/// State kept for one simulated rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBody {
    pub kinematic: bool,
    pub gravity_enabled: bool,
    pub continuous_collision: bool,
    pub linear_velocity: Vec3,
    /// Axis × rad/s.
    pub angular_velocity: Vec3,
    /// Every linear impulse received, in order.
    pub impulses: Vec<Vec3>,
    /// Every torque impulse received, in order.
    pub torques: Vec<Vec3>,
}

impl Default for SimBody {
    fn default() -> Self {
        Self {
            kinematic: false,
            gravity_enabled: true,
            continuous_collision: false,
            linear_velocity: Vec3::zero(),
            angular_velocity: Vec3::zero(),
            impulses: Vec::new(),
            torques: Vec::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimPhysics
// ────────────────────────────────────────────────────────────────────────────

/// Headless [`PhysicsBackend`].  Bodies are registered lazily on first
/// command; every body has the same mass.
#[derive(Debug)]
pub struct SimPhysics {
    bodies: HashMap<ObjectId, SimBody>,
    gravity: f32,
    mass: f32,
    floor: Option<f32>,
}

impl Default for SimPhysics {
    fn default() -> Self {
        Self {
            bodies: HashMap::new(),
            gravity: DEFAULT_GRAVITY,
            mass: 1.0,
            floor: None,
        }
    }
}

impl SimPhysics {
    /// Create a backend with Earth gravity, unit mass and no floor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertical acceleration applied to gravity-enabled bodies.
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Mass shared by every body.  Non-positive values are ignored.
    pub fn with_mass(mut self, mass: f32) -> Self {
        if mass > 0.0 {
            self.mass = mass;
        }
        self
    }

    /// Bodies never sink below this height; landing stops them dead.
    pub fn with_floor(mut self, height: f32) -> Self {
        self.floor = Some(height);
        self
    }

    pub fn body(&self, id: ObjectId) -> Option<&SimBody> {
        self.bodies.get(&id)
    }

    /// Linear impulses received by `id`, oldest first.
    pub fn impulses(&self, id: ObjectId) -> &[Vec3] {
        self.bodies
            .get(&id)
            .map(|b| b.impulses.as_slice())
            .unwrap_or(&[])
    }

    pub fn torques(&self, id: ObjectId) -> &[Vec3] {
        self.bodies
            .get(&id)
            .map(|b| b.torques.as_slice())
            .unwrap_or(&[])
    }

    /// Number of bodies the backend currently tracks.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn body_mut(&mut self, id: ObjectId) -> &mut SimBody {
        self.bodies.entry(id).or_default()
    }
}

impl PhysicsBackend for SimPhysics {
    fn set_kinematic(&mut self, id: ObjectId, kinematic: bool) {
        let body = self.body_mut(id);
        body.kinematic = kinematic;
        if kinematic {
            body.linear_velocity = Vec3::zero();
            body.angular_velocity = Vec3::zero();
        }
    }

    fn set_gravity_enabled(&mut self, id: ObjectId, enabled: bool) {
        self.body_mut(id).gravity_enabled = enabled;
    }

    fn set_continuous_collision(&mut self, id: ObjectId, enabled: bool) {
        self.body_mut(id).continuous_collision = enabled;
    }

    fn apply_impulse(&mut self, id: ObjectId, impulse: Vec3) {
        let inv_mass = 1.0 / self.mass;
        let body = self.body_mut(id);
        body.impulses.push(impulse);
        // Kinematic bodies ignore forces.
        if !body.kinematic {
            body.linear_velocity = body.linear_velocity + impulse * inv_mass;
        }
    }

    fn apply_torque_impulse(&mut self, id: ObjectId, torque: Vec3) {
        let inv_mass = 1.0 / self.mass;
        let body = self.body_mut(id);
        body.torques.push(torque);
        if !body.kinematic {
            body.angular_velocity = body.angular_velocity + torque * inv_mass;
        }
    }

    fn integrate(&mut self, id: ObjectId, pose: &mut Pose, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let gravity = self.gravity;
        let floor = self.floor;
        let body = self.body_mut(id);
        if body.kinematic {
            return;
        }

        if body.gravity_enabled {
            body.linear_velocity.y += gravity * dt;
        }
        pose.position = pose.position + body.linear_velocity * dt;

        let spin = body.angular_velocity.length();
        if spin > f32::EPSILON {
            let step = Quaternion::from_axis_angle(body.angular_velocity, spin * dt);
            pose.rotation = step.mul(pose.rotation).normalize();
        }

        if let Some(height) = floor {
            if pose.position.y < height {
                trace!(object = %id, "body landed");
                pose.position.y = height;
                body.linear_velocity = Vec3::zero();
                body.angular_velocity = Vec3::zero();
            }
        }
    }

    fn forget(&mut self, id: ObjectId) {
        if self.bodies.remove(&id).is_some() {
            debug!(object = %id, "body removed from simulation");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_register_lazily_with_defaults() {
        let mut physics = SimPhysics::new();
        let id = ObjectId::new();
        assert!(physics.body(id).is_none());

        physics.set_continuous_collision(id, true);
        let body = physics.body(id).unwrap();
        assert!(!body.kinematic);
        assert!(body.gravity_enabled);
        assert!(body.continuous_collision);
    }

    #[test]
    fn mode_switches_are_recorded() {
        let mut physics = SimPhysics::new();
        let id = ObjectId::new();
        physics.set_kinematic(id, true);
        physics.set_gravity_enabled(id, false);
        let body = physics.body(id).unwrap();
        assert!(body.kinematic);
        assert!(!body.gravity_enabled);
    }

    #[test]
    fn impulse_changes_velocity_only_when_simulated() {
        let mut physics = SimPhysics::new().with_mass(2.0);
        let id = ObjectId::new();

        physics.set_kinematic(id, true);
        physics.apply_impulse(id, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(physics.body(id).unwrap().linear_velocity, Vec3::zero());

        physics.set_kinematic(id, false);
        physics.apply_impulse(id, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(
            physics.body(id).unwrap().linear_velocity,
            Vec3::new(0.0, 0.0, 2.0)
        );
        assert_eq!(physics.impulses(id).len(), 2);
    }

    #[test]
    fn becoming_kinematic_stops_motion() {
        let mut physics = SimPhysics::new();
        let id = ObjectId::new();
        physics.apply_impulse(id, Vec3::new(1.0, 0.0, 0.0));
        physics.apply_torque_impulse(id, Vec3::new(1.0, 0.0, 0.0));
        physics.set_kinematic(id, true);
        let body = physics.body(id).unwrap();
        assert_eq!(body.linear_velocity, Vec3::zero());
        assert_eq!(body.angular_velocity, Vec3::zero());
        assert_eq!(physics.torques(id).len(), 1);
    }

    #[test]
    fn ballistic_step_is_semi_implicit_euler() {
        let mut physics = SimPhysics::new().with_gravity(-10.0);
        let id = ObjectId::new();
        physics.apply_impulse(id, Vec3::new(0.0, 0.0, 4.0));

        let mut pose = Pose::at(Vec3::new(0.0, 10.0, 0.0));
        physics.integrate(id, &mut pose, 0.5);

        assert!((pose.position.z - 2.0).abs() < 1e-5);
        assert!((pose.position.y - 7.5).abs() < 1e-5);
        assert!((physics.body(id).unwrap().linear_velocity.y + 5.0).abs() < 1e-5);
    }

    #[test]
    fn gravity_disabled_keeps_height() {
        let mut physics = SimPhysics::new();
        let id = ObjectId::new();
        physics.set_gravity_enabled(id, false);
        let mut pose = Pose::at(Vec3::new(0.0, 3.0, 0.0));
        physics.integrate(id, &mut pose, 1.0);
        assert_eq!(pose.position, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn kinematic_bodies_are_not_integrated() {
        let mut physics = SimPhysics::new();
        let id = ObjectId::new();
        physics.set_kinematic(id, true);
        let mut pose = Pose::at(Vec3::new(0.0, 3.0, 0.0));
        physics.integrate(id, &mut pose, 1.0);
        assert_eq!(pose.position, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn floor_stops_falling_bodies() {
        let mut physics = SimPhysics::new().with_gravity(-10.0).with_floor(0.0);
        let id = ObjectId::new();
        physics.apply_impulse(id, Vec3::new(1.0, 0.0, 0.0));
        let mut pose = Pose::at(Vec3::new(0.0, 0.5, 0.0));

        for _ in 0..10 {
            physics.integrate(id, &mut pose, 0.1);
        }

        assert_eq!(pose.position.y, 0.0);
        assert_eq!(physics.body(id).unwrap().linear_velocity, Vec3::zero());
    }

    #[test]
    fn torque_spins_the_body() {
        let mut physics = SimPhysics::new().with_gravity(0.0);
        let id = ObjectId::new();
        physics.apply_torque_impulse(id, Vec3::new(0.0, std::f32::consts::PI, 0.0));
        let mut pose = Pose::identity();
        physics.integrate(id, &mut pose, 0.5);
        // Half a second at π rad/s about +Y: a quarter turn.
        let expected = Quaternion::from_axis_angle(Vec3::UP, std::f32::consts::FRAC_PI_2);
        assert!(pose.rotation.angle_to(expected) < 1e-2);
    }

    #[test]
    fn forget_drops_the_body() {
        let mut physics = SimPhysics::new();
        let id = ObjectId::new();
        physics.set_kinematic(id, true);
        assert_eq!(physics.body_count(), 1);
        physics.forget(id);
        assert_eq!(physics.body_count(), 0);
        assert!(physics.impulses(id).is_empty());
    }
}
