//! Ownership / physics adapter.
//!
//! A borrowed facade over one object and the physics backend.  It keeps the
//! object's own record of its physical mode in step with the commands sent to
//! the engine, so the carry controller and tether never speak engine
//! vocabulary directly.  It holds no state beyond its two borrows.

use tether_physics::PhysicsBackend;
use tether_spatial::transform::Vec3;
use tether_types::{Layer, NodeId, ObjectId, PhysicalMode};
use tracing::debug;

use crate::object::CarriableObject;

pub struct ObjectAdapter<'a> {
    id: ObjectId,
    object: &'a mut CarriableObject,
    physics: &'a mut dyn PhysicsBackend,
}

impl<'a> ObjectAdapter<'a> {
    pub fn new(
        id: ObjectId,
        object: &'a mut CarriableObject,
        physics: &'a mut dyn PhysicsBackend,
    ) -> Self {
        Self {
            id,
            object,
            physics,
        }
    }

    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.object.physical_mode = if kinematic {
            PhysicalMode::Kinematic
        } else {
            PhysicalMode::Simulated
        };
        self.physics.set_kinematic(self.id, kinematic);
        debug!(object = %self.id, kinematic, "physical mode");
    }

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.object.gravity_enabled = enabled;
        self.physics.set_gravity_enabled(self.id, enabled);
    }

    pub fn set_continuous_collision(&mut self, enabled: bool) {
        self.physics.set_continuous_collision(self.id, enabled);
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.physics.apply_impulse(self.id, impulse);
        debug!(object = %self.id, x = impulse.x, y = impulse.y, z = impulse.z, "impulse");
    }

    pub fn apply_torque_impulse(&mut self, torque: Vec3) {
        self.physics.apply_torque_impulse(self.id, torque);
    }

    /// Move the object under `parent`, returning the parent it had before.
    pub fn reparent(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.object.parent, parent)
    }

    /// Collision layer read by external filtering.
    pub fn set_classification(&mut self, layer: Layer) {
        self.object.layer = layer;
    }
}
