//! Carry controller: pickup, hold and drop for a single carrier.
//!
//! A [`CarryController`] holds at most one object.  Every tick it computes a
//! camera-relative hold position, asks the spatial query provider whether a
//! small sphere there overlaps solid geometry, and smooths the object toward
//! the newest position that did not.  Tethered objects follow the tether's
//! own hold pose; everything else also turns to face the viewpoint.
//!
//! Failed preconditions (picking up while holding, dropping while empty,
//! a ray that misses) are silent no-ops reported as `false`.
//!
//! # Example
//!
//! ```rust
//! use tether_physics::SimPhysics;
//! use tether_runtime::carry::{CarryController, Stage};
//! use tether_runtime::journal::Journal;
//! use tether_runtime::object::{CarriableObject, Scene};
//! use tether_runtime::settings::CarrySettings;
//! use tether_spatial::query::ColliderWorld;
//! use tether_spatial::transform::{Pose, Vec3};
//! use tether_types::{CarrierId, PhysicalMode};
//!
//! let mut scene = Scene::new();
//! let mut physics = SimPhysics::new();
//! let mut world = ColliderWorld::new();
//! let mut journal = Journal::new();
//!
//! let cube = scene.spawn(CarriableObject::new("cube", Pose::at(Vec3::new(0.0, 0.0, 5.0))).pickupable());
//! world.attach(cube, Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.5, 0.5, 0.5));
//!
//! let mut carrier = CarryController::new(CarrierId::new(), CarrySettings::default());
//! let mut stage = Stage { scene: &mut scene, physics: &mut physics, query: &world, journal: &mut journal };
//!
//! assert!(carrier.try_pick_up(&Pose::identity(), &mut stage));
//! assert_eq!(carrier.held(), Some(cube));
//! assert_eq!(scene.get(cube).unwrap().physical_mode(), PhysicalMode::Kinematic);
//! ```

use tether_physics::PhysicsBackend;
use tether_spatial::query::SpatialQuery;
use tether_spatial::smoothing::PoseSmoother;
use tether_spatial::transform::{Pose, Vec3};
use tether_types::{CarrierId, InteractionPayload, Layer, ObjectId, ObjectTag};
use tracing::{debug, trace, warn};

use crate::adapter::ObjectAdapter;
use crate::journal::Journal;
use crate::object::{CarriableObject, Scene};
use crate::settings::CarrySettings;

const SOURCE: &str = "tether-runtime::carry";

/// Mutable world context threaded through every carry and tether operation.
pub struct Stage<'a> {
    pub scene: &'a mut Scene,
    pub physics: &'a mut dyn PhysicsBackend,
    pub query: &'a dyn SpatialQuery,
    pub journal: &'a mut Journal,
}

// ────────────────────────────────────────────────────────────────────────────
// CarryController
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CarryController {
    id: CarrierId,
    settings: CarrySettings,
    held: Option<ObjectId>,
    last_valid_hold_position: Vec3,
    last_thrown: Option<ObjectId>,
}

impl CarryController {
    pub fn new(id: CarrierId, settings: CarrySettings) -> Self {
        Self {
            id,
            settings,
            held: None,
            last_valid_hold_position: Vec3::zero(),
            last_thrown: None,
        }
    }

    pub fn id(&self) -> CarrierId {
        self.id
    }

    pub fn settings(&self) -> &CarrySettings {
        &self.settings
    }

    pub fn held(&self) -> Option<ObjectId> {
        self.held
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    /// Fallback used while the hold position is obstructed.
    pub fn last_valid_hold_position(&self) -> Vec3 {
        self.last_valid_hold_position
    }

    /// Most recently thrown tethered object, kept only for recall lookup.
    pub fn last_thrown(&self) -> Option<ObjectId> {
        self.last_thrown
    }

    pub fn set_last_thrown(&mut self, object: ObjectId) {
        self.last_thrown = Some(object);
    }

    /// `view.pos + forward * hold_distance + right * offset.x + up * offset.y`
    pub fn hold_candidate(&self, view: &Pose) -> Vec3 {
        view.position
            + view.forward() * self.settings.hold_distance
            + view.right() * self.settings.hold_offset.x
            + view.up() * self.settings.hold_offset.y
    }

    fn candidate_for(&self, object: &CarriableObject, view: &Pose) -> Vec3 {
        match object.tether() {
            Some(tether) => tether.hold_target(view).position,
            None => self.hold_candidate(view),
        }
    }

    // ── pickup ──────────────────────────────────────────────────────────────

    /// Cast the pickup ray along the view axis and take the first object it
    /// hits if that object is tagged for pickup.
    pub fn try_pick_up(&mut self, view: &Pose, stage: &mut Stage<'_>) -> bool {
        if let Some(held) = self.held {
            debug!(carrier = %self.id, held = %held, "pickup ignored, already holding");
            return false;
        }
        let Some(hit) = stage
            .query
            .raycast(view.position, view.forward(), self.settings.pickup_range)
        else {
            debug!(carrier = %self.id, "pickup ray missed");
            return false;
        };
        let Some(id) = hit.object else {
            debug!(carrier = %self.id, distance = hit.distance, "pickup ray hit scenery");
            return false;
        };
        let Some(obj) = stage.scene.get(id) else {
            warn!(object = %id, "pickup ray hit an object missing from the scene");
            return false;
        };
        if obj.tag() != ObjectTag::Pickup {
            debug!(object = %id, "pickup ray hit an object not tagged for pickup");
            return false;
        }
        if obj.holder().is_some() || obj.tether().is_some_and(|t| t.is_recalling()) {
            debug!(object = %id, "pickup ignored, object is spoken for");
            return false;
        }
        self.attach(id, view, stage, false)
    }

    /// Take `object` without casting a ray.  Used to hand back a recalled
    /// tether; still refused while holding or while another carrier holds
    /// the object.  A recall in flight is ended.
    pub fn force_pickup(&mut self, object: ObjectId, view: &Pose, stage: &mut Stage<'_>) -> bool {
        if let Some(held) = self.held {
            debug!(carrier = %self.id, held = %held, "forced pickup refused, already holding");
            return false;
        }
        let Some(obj) = stage.scene.get(object) else {
            debug!(object = %object, "forced pickup of unknown object");
            return false;
        };
        if let Some(holder) = obj.holder() {
            debug!(object = %object, holder = %holder, "forced pickup refused, held elsewhere");
            return false;
        }
        self.attach(object, view, stage, true)
    }

    fn attach(&mut self, id: ObjectId, view: &Pose, stage: &mut Stage<'_>, forced: bool) -> bool {
        let Some(obj) = stage.scene.get_mut(id) else {
            return false;
        };

        let mut body = ObjectAdapter::new(id, obj, &mut *stage.physics);
        body.set_kinematic(true);
        body.set_gravity_enabled(false);
        body.set_continuous_collision(true);
        let previous_parent = body.reparent(None);
        body.set_classification(Layer::Interactable);

        obj.original_parent = previous_parent;
        obj.original_scale = obj.scale;
        obj.holder = Some(self.id);
        match obj.tether.as_mut() {
            Some(tether) => {
                if tether.is_recalling() {
                    tether.finish_recall();
                }
                tether.set_being_held(true);
            }
            None => obj.pose.rotation = view.rotation,
        }

        self.last_valid_hold_position = self.candidate_for(obj, view);
        self.held = Some(id);
        stage.journal.record(
            SOURCE,
            InteractionPayload::PickedUp {
                carrier: self.id,
                object: id,
                forced,
            },
        );
        true
    }

    // ── drop ────────────────────────────────────────────────────────────────

    /// Release the held object back to the simulation under its original
    /// parent, with a small upward nudge.
    pub fn drop_object(&mut self, stage: &mut Stage<'_>) -> bool {
        let Some(id) = self.held else {
            debug!(carrier = %self.id, "drop ignored, nothing held");
            return false;
        };
        let Some(obj) = stage.scene.get_mut(id) else {
            warn!(object = %id, "held object vanished, clearing hold");
            self.release_hold();
            return false;
        };

        if obj.tether().is_some_and(|t| !t.was_thrown()) {
            self.last_thrown = None;
        }

        let restore_parent = obj.original_parent;
        let mut body = ObjectAdapter::new(id, obj, &mut *stage.physics);
        body.set_kinematic(false);
        body.set_gravity_enabled(true);
        body.set_continuous_collision(true);
        body.set_classification(Layer::Default);
        body.reparent(restore_parent);
        body.apply_impulse(Vec3::UP * self.settings.drop_upward_force);

        obj.scale = obj.original_scale;
        obj.holder = None;
        if let Some(tether) = obj.tether.as_mut() {
            tether.set_being_held(false);
        }

        self.release_hold();
        stage.journal.record(
            SOURCE,
            InteractionPayload::Dropped {
                carrier: self.id,
                object: id,
            },
        );
        true
    }

    fn release_hold(&mut self) {
        self.held = None;
        self.last_valid_hold_position = Vec3::zero();
    }

    /// Forget every handle to `object`.  Called when it is despawned.
    pub(crate) fn forget(&mut self, object: ObjectId) {
        if self.held == Some(object) {
            self.release_hold();
        }
        if self.last_thrown == Some(object) {
            self.last_thrown = None;
        }
    }

    // ── per-tick hold ───────────────────────────────────────────────────────

    /// Move the held object one tick toward its hold pose.
    pub fn update(&mut self, view: &Pose, dt: f32, stage: &mut Stage<'_>) {
        let Some(id) = self.held else {
            return;
        };
        let Some(obj) = stage.scene.get(id) else {
            warn!(object = %id, "held object vanished, clearing hold");
            self.release_hold();
            return;
        };

        let candidate = self.candidate_for(obj, view);
        let blocked = stage
            .query
            .overlap_sphere(candidate, self.settings.hold_probe_radius)
            .iter()
            .any(|o| !o.is_trigger && o.object != Some(id));
        let accepted = if blocked {
            trace!(object = %id, "hold position obstructed, using fallback");
            self.last_valid_hold_position
        } else {
            self.last_valid_hold_position = candidate;
            candidate
        };

        let Some(obj) = stage.scene.get_mut(id) else {
            return;
        };
        let (smoother, rotation) = match obj.tether() {
            Some(tether) => (
                PoseSmoother::uniform(tether.settings().smooth_speed),
                tether.hold_target(view).rotation,
            ),
            None => (
                PoseSmoother::new(self.settings.pickup_smoothing, self.settings.rotation_smoothing),
                view.rotation,
            ),
        };
        obj.pose = smoother.pose(obj.pose, Pose::new(accepted, rotation), dt);
        obj.scale = obj.original_scale;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tether_physics::SimPhysics;
    use tether_spatial::query::{Aabb, ColliderWorld};
    use tether_spatial::transform::Quaternion;
    use tether_types::{NodeId, PhysicalMode};

    use crate::settings::TetherSettings;

    struct World {
        scene: Scene,
        physics: SimPhysics,
        query: ColliderWorld,
        journal: Journal,
    }

    impl World {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                physics: SimPhysics::new(),
                query: ColliderWorld::new(),
                journal: Journal::new(),
            }
        }

        fn spawn_box(&mut self, object: CarriableObject) -> ObjectId {
            let center = object.pose.position;
            let id = self.scene.spawn(object);
            self.query.attach(id, center, Vec3::new(0.25, 0.25, 0.25));
            id
        }

        fn stage(&mut self) -> Stage<'_> {
            Stage {
                scene: &mut self.scene,
                physics: &mut self.physics,
                query: &self.query,
                journal: &mut self.journal,
            }
        }
    }

    fn carrier() -> CarryController {
        CarryController::new(CarrierId::new(), CarrySettings::default())
    }

    fn cube_at(z: f32) -> CarriableObject {
        CarriableObject::new("cube", Pose::at(Vec3::new(0.0, 0.0, z))).pickupable()
    }

    #[test]
    fn pickup_scenario_facing_forward() {
        let mut world = World::new();
        let shelf = NodeId::new();
        let cube = world.spawn_box(cube_at(5.0).with_parent(shelf));
        let mut c = carrier();

        assert!(c.try_pick_up(&Pose::identity(), &mut world.stage()));

        let obj = world.scene.get(cube).unwrap();
        assert_eq!(c.held(), Some(cube));
        assert_eq!(obj.physical_mode(), PhysicalMode::Kinematic);
        assert!(!obj.gravity_enabled());
        assert_eq!(obj.parent(), None);
        assert_eq!(obj.original_parent(), Some(shelf));
        assert_eq!(obj.layer(), Layer::Interactable);
        assert_eq!(obj.holder(), Some(c.id()));
        assert!(world.physics.body(cube).unwrap().continuous_collision);
        assert_eq!(
            c.last_valid_hold_position(),
            c.hold_candidate(&Pose::identity())
        );
    }

    #[test]
    fn pickup_out_of_range_or_untagged_is_a_no_op() {
        let mut world = World::new();
        world.spawn_box(cube_at(15.0));
        let mut c = carrier();
        assert!(!c.try_pick_up(&Pose::identity(), &mut world.stage()));

        let mut world = World::new();
        let rock = world.spawn_box(CarriableObject::new("rock", Pose::at(Vec3::new(0.0, 0.0, 3.0))));
        assert!(!c.try_pick_up(&Pose::identity(), &mut world.stage()));
        assert_eq!(world.scene.get(rock).unwrap().physical_mode(), PhysicalMode::Simulated);
        assert!(world.journal.pending().is_empty());
    }

    #[test]
    fn scenery_blocks_the_pickup_ray() {
        let mut world = World::new();
        world.spawn_box(cube_at(5.0));
        world
            .query
            .add_static(Aabb::new(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 2.5)));
        let mut c = carrier();
        assert!(!c.try_pick_up(&Pose::identity(), &mut world.stage()));
    }

    #[test]
    fn pickup_while_holding_is_a_strict_no_op() {
        let mut world = World::new();
        let first = world.spawn_box(cube_at(5.0));
        let second = world.spawn_box(
            CarriableObject::new("other", Pose::at(Vec3::new(3.0, 0.0, 0.0))).pickupable(),
        );
        let mut c = carrier();
        assert!(c.try_pick_up(&Pose::identity(), &mut world.stage()));
        world.journal.drain();

        let before = c.clone();
        let other_before = world.scene.get(second).unwrap().clone();
        assert!(!c.try_pick_up(&Pose::identity(), &mut world.stage()));
        assert!(!c.force_pickup(second, &Pose::identity(), &mut world.stage()));

        assert_eq!(c.held(), Some(first));
        assert_eq!(c.last_valid_hold_position(), before.last_valid_hold_position());
        let other = world.scene.get(second).unwrap();
        assert_eq!(other.physical_mode(), other_before.physical_mode());
        assert_eq!(other.holder(), None);
        assert!(world.physics.body(second).is_none(), "no physics commands issued");
        assert!(world.journal.pending().is_empty());
    }

    #[test]
    fn drop_while_empty_is_a_strict_no_op() {
        let mut world = World::new();
        let mut c = carrier();
        assert!(!c.drop_object(&mut world.stage()));
        assert!(world.journal.pending().is_empty());
        assert_eq!(world.physics.body_count(), 0);
    }

    #[test]
    fn pickup_then_drop_restores_parent_and_scale() {
        let mut world = World::new();
        let shelf = NodeId::new();
        let cube = world.spawn_box(
            cube_at(5.0)
                .with_parent(shelf)
                .with_scale(Vec3::new(0.5, 2.0, 0.5)),
        );
        let mut c = carrier();
        c.try_pick_up(&Pose::identity(), &mut world.stage());
        world.scene.get_mut(cube).unwrap().scale = Vec3::new(9.0, 9.0, 9.0);
        assert!(c.drop_object(&mut world.stage()));

        let obj = world.scene.get(cube).unwrap();
        assert_eq!(obj.parent(), Some(shelf));
        assert_eq!(obj.scale, Vec3::new(0.5, 2.0, 0.5));
        assert_eq!(obj.physical_mode(), PhysicalMode::Simulated);
        assert!(obj.gravity_enabled());
        assert_eq!(obj.layer(), Layer::Default);
        assert_eq!(obj.holder(), None);
        assert_eq!(c.held(), None);
        assert_eq!(c.last_valid_hold_position(), Vec3::zero());
        assert_eq!(world.physics.impulses(cube), &[Vec3::new(0.0, 0.1, 0.0)]);
    }

    #[test]
    fn non_tether_pickup_snaps_to_view_rotation() {
        let mut world = World::new();
        let view = Pose::new(Vec3::zero(), Quaternion::from_euler_degrees(0.0, 90.0, 0.0));
        let cube = world.spawn_box(
            CarriableObject::new("cube", Pose::at(Vec3::new(4.0, 0.0, 0.0))).pickupable(),
        );
        let mut c = carrier();
        assert!(c.try_pick_up(&view, &mut world.stage()));
        assert_eq!(world.scene.get(cube).unwrap().pose.rotation, view.rotation);
    }

    #[test]
    fn update_smooths_toward_hold_position() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0));
        let mut c = carrier();
        let view = Pose::identity();
        c.try_pick_up(&view, &mut world.stage());

        let target = c.hold_candidate(&view);
        let mut last = world.scene.get(cube).unwrap().pose.position.distance(target);
        for _ in 0..30 {
            c.update(&view, 1.0 / 60.0, &mut world.stage());
            let d = world.scene.get(cube).unwrap().pose.position.distance(target);
            assert!(d <= last + 1e-5);
            last = d;
        }
        assert!(last < 0.01, "should converge, still {last} away");
    }

    #[test]
    fn update_reapplies_recorded_scale() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0).with_scale(Vec3::new(2.0, 2.0, 2.0)));
        let mut c = carrier();
        c.try_pick_up(&Pose::identity(), &mut world.stage());
        world.scene.get_mut(cube).unwrap().scale = Vec3::ONE;
        c.update(&Pose::identity(), 1.0 / 60.0, &mut world.stage());
        assert_eq!(world.scene.get(cube).unwrap().scale, Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn obstructed_hold_position_uses_fallback() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0));
        let mut c = carrier();
        let view = Pose::identity();
        c.try_pick_up(&view, &mut world.stage());
        for _ in 0..10 {
            c.update(&view, 1.0 / 60.0, &mut world.stage());
        }
        let fallback = c.last_valid_hold_position();

        // Turn right into a wall: the new candidate is inside it.
        let turned = Pose::new(Vec3::zero(), Quaternion::from_euler_degrees(0.0, 90.0, 0.0));
        let blocked = c.hold_candidate(&turned);
        let wall = Aabb::from_center(blocked, Vec3::new(0.3, 1.0, 1.0));
        world.query.add_static(wall);

        for _ in 0..60 {
            c.update(&turned, 1.0 / 60.0, &mut world.stage());
            assert_eq!(c.last_valid_hold_position(), fallback);
            let p = world.scene.get(cube).unwrap().pose.position;
            assert!(!wall.contains_point(p), "held object entered the wall at {p:?}");
        }
        let p = world.scene.get(cube).unwrap().pose.position;
        assert!(p.distance(fallback) < 0.01);
    }

    #[test]
    fn triggers_and_own_collider_do_not_obstruct() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0));
        let mut c = carrier();
        let view = Pose::identity();
        c.try_pick_up(&view, &mut world.stage());
        let candidate = c.hold_candidate(&view);
        world
            .query
            .add_trigger(Aabb::from_center(candidate, Vec3::ONE), None);
        // Move the held object's own collider onto the candidate too.
        world.query.attach(cube, candidate, Vec3::ONE);

        let moved = Pose::at(Vec3::new(0.0, 0.0, 0.05));
        c.update(&moved, 1.0 / 60.0, &mut world.stage());
        assert_eq!(c.last_valid_hold_position(), c.hold_candidate(&moved));
    }

    #[test]
    fn dropping_an_unthrown_tether_clears_last_thrown() {
        let mut world = World::new();
        let spear = world.spawn_box(cube_at(5.0).with_tether(TetherSettings::default()));
        let crate_id = world.spawn_box(
            CarriableObject::new("crate", Pose::at(Vec3::new(3.0, 0.0, 0.0))).pickupable(),
        );
        let mut c = carrier();

        // A plain object leaves the recorded throw alone.
        c.set_last_thrown(spear);
        assert!(c.force_pickup(crate_id, &Pose::identity(), &mut world.stage()));
        c.drop_object(&mut world.stage());
        assert_eq!(c.last_thrown(), Some(spear));

        // An unthrown tether clears it.
        c.try_pick_up(&Pose::identity(), &mut world.stage());
        assert_eq!(c.held(), Some(spear));
        c.drop_object(&mut world.stage());
        assert_eq!(c.last_thrown(), None);
    }

    #[test]
    fn tether_pickup_marks_tether_held_and_keeps_rotation() {
        let mut world = World::new();
        let start = Quaternion::from_euler_degrees(10.0, 20.0, 30.0);
        let spear = world.spawn_box(
            CarriableObject::new("spear", Pose::new(Vec3::new(0.0, 0.0, 5.0), start))
                .pickupable()
                .with_tether(TetherSettings::default()),
        );
        let mut c = carrier();
        c.try_pick_up(&Pose::identity(), &mut world.stage());

        let obj = world.scene.get(spear).unwrap();
        assert!(obj.tether().unwrap().is_held());
        assert_eq!(obj.pose.rotation, start);
        assert_eq!(
            c.last_valid_hold_position(),
            obj.tether().unwrap().hold_target(&Pose::identity()).position
        );
    }

    #[test]
    fn object_held_elsewhere_cannot_be_taken() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0));
        let mut a = carrier();
        let mut b = carrier();
        assert!(a.try_pick_up(&Pose::identity(), &mut world.stage()));
        assert!(!b.force_pickup(cube, &Pose::identity(), &mut world.stage()));
        assert_eq!(world.scene.get(cube).unwrap().holder(), Some(a.id()));
    }

    #[test]
    fn forget_clears_stale_handles() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0));
        let mut c = carrier();
        c.try_pick_up(&Pose::identity(), &mut world.stage());
        c.set_last_thrown(cube);
        c.forget(cube);
        assert_eq!(c.held(), None);
        assert_eq!(c.last_thrown(), None);
    }

    #[test]
    fn vanished_held_object_is_released_on_update() {
        let mut world = World::new();
        let cube = world.spawn_box(cube_at(5.0));
        let mut c = carrier();
        c.try_pick_up(&Pose::identity(), &mut world.stage());
        world.scene.despawn(cube);
        c.update(&Pose::identity(), 1.0 / 60.0, &mut world.stage());
        assert_eq!(c.held(), None);
    }
}
