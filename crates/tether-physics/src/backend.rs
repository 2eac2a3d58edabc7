//! Generic `PhysicsBackend` trait for whatever engine owns the rigid bodies.
//!
//! Drivers implement this trait and are injected into the session.  The
//! interaction core only ever talks to the trait, so an engine can be swapped
//! without touching carry or tether logic.
//!
//! Every call is a command, not a query: the core keeps its own record of
//! each object's physical mode and never reads it back from the engine.

use tether_spatial::transform::{Pose, Vec3};
use tether_types::ObjectId;

/// Rigid-body commands issued by the ownership adapter.
///
/// Bodies are addressed by [`ObjectId`].  A backend that has never heard of
/// an id should treat the first command as registering it.
pub trait PhysicsBackend {
    /// Switch a body between kinematic (pose driven directly) and simulated.
    fn set_kinematic(&mut self, id: ObjectId, kinematic: bool);

    fn set_gravity_enabled(&mut self, id: ObjectId, enabled: bool);

    /// Enable continuous (swept) collision detection.  Backends without the
    /// concept may ignore it.
    fn set_continuous_collision(&mut self, _id: ObjectId, _enabled: bool) {}

    /// Instantaneous change of linear momentum.
    fn apply_impulse(&mut self, id: ObjectId, impulse: Vec3);

    /// Instantaneous change of angular momentum (world-space axis × magnitude).
    fn apply_torque_impulse(&mut self, id: ObjectId, torque: Vec3);

    /// Advance a simulated body by `dt`, writing its new pose.  Backends that
    /// integrate on their own schedule leave this as a no-op.
    fn integrate(&mut self, _id: ObjectId, _pose: &mut Pose, _dt: f32) {}

    /// The body has been despawned; release anything kept for it.
    fn forget(&mut self, _id: ObjectId) {}
}
