//! [`Session`] – the frame-stepped driver that owns a scene and its carriers.
//!
//! A session is assembled with [`SessionBuilder`], which refuses to build
//! without a physics backend, a spatial query provider and a viewpoint for
//! the primary carrier.  Every call to [`Session::tick`] runs, in order:
//!
//! 1. **Input** – queued [`InputEvent`]s are applied to their carriers.
//! 2. **Draw-back** – draw timers advance; armed throws are journalled.
//! 3. **Hold** – every carrier moves its held object toward the hold pose.
//! 4. **Recall** – recalls in flight advance and hand objects back.
//! 5. **Physics** – simulated bodies are integrated by the backend.
//! 6. **Sync** – the spatial query provider learns every object's position.
//! 7. **Verify** – the [`InvariantVerifier`] runs when enabled.
//!
//! Because recall runs after hold, an object handed back by a recall is
//! first moved by its new holder on the following tick.
//!
//! # Example
//!
//! ```rust
//! use tether_physics::SimPhysics;
//! use tether_runtime::object::CarriableObject;
//! use tether_runtime::session::SessionBuilder;
//! use tether_runtime::settings::SessionConfig;
//! use tether_spatial::query::ColliderWorld;
//! use tether_spatial::transform::{Pose, Vec3};
//! use tether_types::InputEvent;
//!
//! let mut session = SessionBuilder::new(SessionConfig::default())
//!     .physics(SimPhysics::new().with_floor(0.0))
//!     .spatial_query(ColliderWorld::new())
//!     .viewpoint(Pose::identity())
//!     .build()
//!     .unwrap();
//!
//! let cube = session
//!     .spawn(CarriableObject::new("cube", Pose::at(Vec3::new(0.0, 0.0, 5.0))).pickupable())
//!     .unwrap();
//! session.query_mut().attach(cube, Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.5, 0.5, 0.5));
//!
//! let player = session.primary_carrier();
//! session.queue_input(player, InputEvent::PickupPressed).unwrap();
//! session.tick(1.0 / 60.0).unwrap();
//! assert_eq!(session.controller(player).unwrap().held(), Some(cube));
//! ```

use std::collections::VecDeque;

use tether_physics::PhysicsBackend;
use tether_spatial::query::SpatialQuery;
use tether_spatial::transform::Pose;
use tether_spatial::viewpoint::ViewpointSource;
use tether_types::{
    CarrierId, InputEvent, InteractionEvent, InteractionPayload, ObjectId, PhysicalMode,
    TetherError,
};
use tracing::{debug, debug_span, error, info, warn};

use crate::adapter::ObjectAdapter;
use crate::carry::{CarryController, Stage};
use crate::journal::{self, Journal};
use crate::object::{CarriableObject, Scene};
use crate::settings::{CarrySettings, SessionConfig};
use crate::tether;
use crate::verifier::{InvariantVerifier, WorldView};

const SOURCE: &str = "tether-runtime::session";

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects a session's collaborators.  Every one of them is required.
pub struct SessionBuilder<P, Q> {
    config: SessionConfig,
    physics: Option<P>,
    query: Option<Q>,
    viewpoint: Option<Box<dyn ViewpointSource>>,
    journal_capacity: usize,
}

impl<P: PhysicsBackend, Q: SpatialQuery> SessionBuilder<P, Q> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            physics: None,
            query: None,
            viewpoint: None,
            journal_capacity: journal::DEFAULT_CAPACITY,
        }
    }

    pub fn physics(mut self, physics: P) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn spatial_query(mut self, query: Q) -> Self {
        self.query = Some(query);
        self
    }

    /// Viewpoint of the primary carrier.
    pub fn viewpoint(mut self, viewpoint: impl ViewpointSource + 'static) -> Self {
        self.viewpoint = Some(Box::new(viewpoint));
        self
    }

    /// Most undrained events the session keeps; older ones are evicted.
    pub fn journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }

    /// Check preconditions and assemble the session.
    ///
    /// # Errors
    ///
    /// [`TetherError::MissingSpatialQuery`], [`TetherError::MissingPhysicsBackend`]
    /// or [`TetherError::MissingViewpoint`] when a collaborator was never
    /// supplied; [`TetherError::InvalidConfig`] when the configuration does
    /// not validate.
    pub fn build(self) -> Result<Session<P, Q>, TetherError> {
        let query = self.query.ok_or(TetherError::MissingSpatialQuery)?;
        let physics = self.physics.ok_or(TetherError::MissingPhysicsBackend)?;
        let viewpoint = self.viewpoint.ok_or(TetherError::MissingViewpoint)?;
        self.config.validate()?;

        let primary = CarrierId::new();
        let controller = CarryController::new(primary, self.config.carry.clone());
        let verifier = InvariantVerifier::with_default_rules();
        info!(carrier = %primary, rules = verifier.rule_count(), "session ready");

        Ok(Session {
            config: self.config,
            scene: Scene::new(),
            physics,
            query,
            carriers: vec![Carrier {
                controller,
                viewpoint,
            }],
            primary,
            inputs: Vec::new(),
            journal: Journal::with_capacity(self.journal_capacity),
            verifier,
            ticks: 0,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

struct Carrier {
    controller: CarryController,
    viewpoint: Box<dyn ViewpointSource>,
}

pub struct Session<P: PhysicsBackend, Q: SpatialQuery> {
    config: SessionConfig,
    scene: Scene,
    physics: P,
    query: Q,
    carriers: Vec<Carrier>,
    primary: CarrierId,
    inputs: Vec<(CarrierId, InputEvent)>,
    journal: Journal,
    verifier: InvariantVerifier,
    ticks: u64,
}

impl<P: PhysicsBackend, Q: SpatialQuery> Session<P, Q> {
    // ── carriers ────────────────────────────────────────────────────────────

    /// The carrier created by [`SessionBuilder::build`].
    pub fn primary_carrier(&self) -> CarrierId {
        self.primary
    }

    /// Add a carrier that uses the session's carry settings.
    pub fn add_carrier(&mut self, viewpoint: impl ViewpointSource + 'static) -> CarrierId {
        let settings = self.config.carry.clone();
        self.add_carrier_with(viewpoint, settings)
    }

    pub fn add_carrier_with(
        &mut self,
        viewpoint: impl ViewpointSource + 'static,
        settings: CarrySettings,
    ) -> CarrierId {
        let id = CarrierId::new();
        self.carriers.push(Carrier {
            controller: CarryController::new(id, settings),
            viewpoint: Box::new(viewpoint),
        });
        debug!(carrier = %id, "carrier added");
        id
    }

    /// Remove a carrier.  Its held object is dropped and any recall flying
    /// toward it is aborted.  Queued inputs for it are discarded on the next
    /// tick.
    pub fn remove_carrier(&mut self, id: CarrierId) -> Result<(), TetherError> {
        let index = self.carrier_index(id)?;
        {
            let (carriers, mut stage) = self.parts();
            carriers[index].controller.drop_object(&mut stage);
        }

        let bound: Vec<ObjectId> = self
            .scene
            .iter()
            .filter(|(_, obj)| {
                obj.tether()
                    .is_some_and(|t| t.is_recalling() && t.recall_carrier() == Some(id))
            })
            .map(|(obj_id, _)| obj_id)
            .collect();
        for object in bound {
            let (_, mut stage) = self.parts();
            tether::abort_recall(object, "carrier removed", &mut stage);
        }

        self.carriers.remove(index);
        debug!(carrier = %id, "carrier removed");
        Ok(())
    }

    // ── objects ─────────────────────────────────────────────────────────────

    /// Add an object to the scene and register its body with the backend.
    /// A hosted tether's settings are validated first.
    pub fn spawn(&mut self, object: CarriableObject) -> Result<ObjectId, TetherError> {
        if let Some(tether) = object.tether() {
            tether.settings().validate()?;
        }
        let id = self.scene.spawn(object);
        if let Some(obj) = self.scene.get_mut(id) {
            let kinematic = obj.is_kinematic();
            let gravity = obj.gravity_enabled();
            let mut body = ObjectAdapter::new(id, obj, &mut self.physics);
            body.set_kinematic(kinematic);
            body.set_gravity_enabled(gravity);
            debug!(object = %id, name = obj.name(), "object spawned");
        }
        Ok(id)
    }

    /// Spawn `object` with a tether built from the session's tether settings.
    pub fn spawn_tethered(&mut self, object: CarriableObject) -> Result<ObjectId, TetherError> {
        let settings = self.config.tether.clone();
        self.spawn(object.with_tether(settings))
    }

    /// Remove an object and null out every handle that points at it.
    pub fn despawn(&mut self, id: ObjectId) -> Result<CarriableObject, TetherError> {
        let object = self.scene.despawn(id).ok_or(TetherError::UnknownObject(id))?;
        for carrier in &mut self.carriers {
            carrier.controller.forget(id);
        }
        self.query.remove_owner(id);
        self.physics.forget(id);
        self.journal
            .record(SOURCE, InteractionPayload::Despawned { object: id });
        Ok(object)
    }

    // ── input ───────────────────────────────────────────────────────────────

    /// Queue an edge-triggered input for the next tick.
    pub fn queue_input(&mut self, carrier: CarrierId, event: InputEvent) -> Result<(), TetherError> {
        self.carrier_index(carrier)?;
        self.inputs.push((carrier, event));
        Ok(())
    }

    /// Apply an input immediately instead of waiting for the next tick.
    /// `Ok(false)` means the action was a no-op.
    pub fn apply(&mut self, carrier: CarrierId, event: InputEvent) -> Result<bool, TetherError> {
        let index = self.carrier_index(carrier)?;
        Ok(self.apply_input(index, event))
    }

    pub fn try_pick_up(&mut self, carrier: CarrierId) -> Result<bool, TetherError> {
        self.apply(carrier, InputEvent::PickupPressed)
    }

    pub fn drop_object(&mut self, carrier: CarrierId) -> Result<bool, TetherError> {
        self.apply(carrier, InputEvent::DropPressed)
    }

    /// Hand `object` to `carrier` without a pickup ray.
    pub fn force_pickup(&mut self, carrier: CarrierId, object: ObjectId) -> Result<bool, TetherError> {
        let index = self.carrier_index(carrier)?;
        if !self.scene.contains(object) {
            return Err(TetherError::UnknownObject(object));
        }
        let (carriers, mut stage) = self.parts();
        let carrier = &mut carriers[index];
        let view = carrier.viewpoint.view_pose();
        Ok(carrier.controller.force_pickup(object, &view, &mut stage))
    }

    /// Point `carrier`'s recall at `object`.
    pub fn set_last_thrown(&mut self, carrier: CarrierId, object: ObjectId) -> Result<(), TetherError> {
        let index = self.carrier_index(carrier)?;
        if !self.scene.contains(object) {
            return Err(TetherError::UnknownObject(object));
        }
        self.carriers[index].controller.set_last_thrown(object);
        Ok(())
    }

    // ── tick ────────────────────────────────────────────────────────────────

    /// Advance the world by `dt` seconds.
    ///
    /// # Errors
    ///
    /// [`TetherError::InvalidTimeStep`] for a negative or non-finite `dt`
    /// (nothing is advanced); [`TetherError::InvariantViolated`] when
    /// verification is enabled and a rule fails after the tick.
    pub fn tick(&mut self, dt: f32) -> Result<(), TetherError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(TetherError::InvalidTimeStep(dt));
        }
        self.ticks += 1;
        self.journal.set_tick(self.ticks);
        let _span = debug_span!("tick", n = self.ticks).entered();

        for (carrier, event) in std::mem::take(&mut self.inputs) {
            match self.carrier_index(carrier) {
                Ok(index) => {
                    self.apply_input(index, event);
                }
                Err(_) => warn!(carrier = %carrier, ?event, "input for a removed carrier dropped"),
            }
        }

        for (id, obj) in self.scene.iter_mut() {
            let armed = obj.tether_mut().is_some_and(|t| t.advance_draw_back(dt));
            if armed {
                self.journal
                    .record(SOURCE, InteractionPayload::ReadyToThrow { object: id });
            }
        }

        {
            let (carriers, mut stage) = self.parts();
            for carrier in carriers.iter_mut() {
                let view = carrier.viewpoint.view_pose();
                carrier.controller.update(&view, dt, &mut stage);
            }
        }

        self.advance_recalls(dt);

        for (id, obj) in self.scene.iter_mut() {
            if obj.physical_mode() == PhysicalMode::Simulated {
                self.physics.integrate(id, &mut obj.pose, dt);
            }
        }

        for (id, obj) in self.scene.iter() {
            self.query.sync_owner(id, obj.pose.position);
        }

        if self.config.verify_invariants {
            self.verify()?;
        }
        Ok(())
    }

    /// Run every invariant rule against the current world.
    pub fn verify(&self) -> Result<(), TetherError> {
        let world = WorldView {
            scene: &self.scene,
            carriers: self.carriers.iter().map(|c| &c.controller).collect(),
        };
        self.verifier
            .verify(&world)
            .inspect_err(|e| error!(error = %e, tick = self.ticks, "invariant violated"))
    }

    // ── accessors ───────────────────────────────────────────────────────────

    /// Take every journalled event recorded since the last drain.  At most
    /// the builder's journal capacity is kept; hosts should drain regularly.
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        self.journal.drain()
    }

    pub fn pending_events(&self) -> &VecDeque<InteractionEvent> {
        self.journal.pending()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn object(&self, id: ObjectId) -> Option<&CarriableObject> {
        self.scene.get(id)
    }

    /// Mutable access for the host, e.g. to move or rescale a free object.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut CarriableObject> {
        self.scene.get_mut(id)
    }

    pub fn controller(&self, carrier: CarrierId) -> Option<&CarryController> {
        self.carriers
            .iter()
            .map(|c| &c.controller)
            .find(|c| c.id() == carrier)
    }

    pub fn carriers(&self) -> impl Iterator<Item = &CarryController> {
        self.carriers.iter().map(|c| &c.controller)
    }

    /// Current pose of `carrier`'s viewpoint.
    pub fn view_pose(&self, carrier: CarrierId) -> Option<Pose> {
        self.carriers
            .iter()
            .find(|c| c.controller.id() == carrier)
            .map(|c| c.viewpoint.view_pose())
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn carrier_index(&self, id: CarrierId) -> Result<usize, TetherError> {
        self.carriers
            .iter()
            .position(|c| c.controller.id() == id)
            .ok_or(TetherError::UnknownCarrier(id))
    }

    /// Split the session into its carriers and a [`Stage`] over the rest.
    fn parts(&mut self) -> (&mut Vec<Carrier>, Stage<'_>) {
        (
            &mut self.carriers,
            Stage {
                scene: &mut self.scene,
                physics: &mut self.physics,
                query: &self.query,
                journal: &mut self.journal,
            },
        )
    }

    fn apply_input(&mut self, index: usize, event: InputEvent) -> bool {
        let (carriers, mut stage) = self.parts();
        let carrier = &mut carriers[index];
        let view = carrier.viewpoint.view_pose();
        let controller = &mut carrier.controller;
        let applied = match event {
            InputEvent::PickupPressed => controller.try_pick_up(&view, &mut stage),
            InputEvent::DropPressed => controller.drop_object(&mut stage),
            InputEvent::RecallPressed => tether::start_recall(controller, &mut stage),
            InputEvent::SecondaryPressed => tether::begin_draw_back(controller, &mut stage),
            InputEvent::SecondaryReleased => tether::release_draw_back(controller, &mut stage),
            InputEvent::ThrowPressed => tether::throw_held(controller, &view, &mut stage),
        };
        debug!(carrier = %controller.id(), ?event, applied, "input");
        applied
    }

    fn advance_recalls(&mut self, dt: f32) {
        let recalling: Vec<(ObjectId, Option<CarrierId>)> = self
            .scene
            .iter()
            .filter_map(|(id, obj)| {
                obj.tether()
                    .filter(|t| t.is_recalling())
                    .map(|t| (id, t.recall_carrier()))
            })
            .collect();

        for (id, carrier) in recalling {
            let index = carrier.and_then(|c| self.carrier_index(c).ok());
            let (carriers, mut stage) = self.parts();
            match index {
                Some(index) => {
                    let carrier = &mut carriers[index];
                    let view = carrier.viewpoint.view_pose();
                    tether::advance_recall(id, &mut carrier.controller, &view, dt, &mut stage);
                }
                None => tether::abort_recall(id, "carrier is gone", &mut stage),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
