//! The sandbox scene the REPL drives.
//!
//! A walled yard with a floor, a crate that can be carried, a barrel that
//! cannot, and a tethered spear.  The camera stands at eye height at the
//! origin looking down `+Z`.

use tether_physics::SimPhysics;
use tether_runtime::object::CarriableObject;
use tether_runtime::session::{Session, SessionBuilder};
use tether_spatial::query::{Aabb, ColliderWorld};
use tether_spatial::transform::{Pose, Quaternion, Vec3};
use tether_spatial::viewpoint::SharedViewpoint;
use tether_types::TetherError;

use crate::config::Config;

pub type SandboxSession = Session<SimPhysics, ColliderWorld>;

/// Height of the camera above the floor.
pub const EYE_HEIGHT: f32 = 1.6;

/// Free bodies come to rest with their centre this far above the floor.
const REST_HEIGHT: f32 = 0.5;

/// Build the sandbox session.  The returned viewpoint drives the primary
/// carrier's camera.
pub fn build(cfg: &Config) -> Result<(SandboxSession, SharedViewpoint), TetherError> {
    let camera = SharedViewpoint::new(Pose::new(
        Vec3::new(0.0, EYE_HEIGHT, 0.0),
        Quaternion::identity(),
    ));

    let mut world = ColliderWorld::new();
    world.add_static(Aabb::new(Vec3::new(-20.0, -1.0, -20.0), Vec3::new(20.0, 0.0, 20.0)));
    world.add_static(Aabb::new(Vec3::new(-20.0, 0.0, 20.0), Vec3::new(20.0, 4.0, 20.5)));

    let mut session = SessionBuilder::new(cfg.session.clone())
        .physics(SimPhysics::new().with_floor(REST_HEIGHT))
        .spatial_query(world)
        .viewpoint(camera.clone())
        .build()?;

    let crate_at = Vec3::new(0.0, REST_HEIGHT, 4.0);
    let crate_id = session.spawn(CarriableObject::new("crate", Pose::at(crate_at)).pickupable())?;
    session
        .query_mut()
        .attach(crate_id, crate_at, Vec3::new(0.4, 0.4, 0.4));

    let barrel_at = Vec3::new(-2.0, REST_HEIGHT, 5.0);
    let barrel_id = session.spawn(CarriableObject::new("barrel", Pose::at(barrel_at)))?;
    session
        .query_mut()
        .attach(barrel_id, barrel_at, Vec3::new(0.5, 0.5, 0.5));

    let spear_at = Vec3::new(1.5, REST_HEIGHT, 3.0);
    let spear_id = session.spawn_tethered(
        CarriableObject::new("spear", Pose::at(spear_at))
            .pickupable()
            .with_scale(Vec3::new(0.1, 0.1, 1.5)),
    )?;
    session
        .query_mut()
        .attach(spear_id, spear_at, Vec3::new(0.15, 0.15, 0.75));

    Ok((session, camera))
}
