//! Tether behaviour: draw-back, throw and magnetic recall.
//!
//! A [`Tether`] is an optional capability hosted by a
//! [`CarriableObject`][crate::object::CarriableObject].  It layers its own
//! phase machine on top of being carried:
//!
//! ```text
//!            secondary pressed              delay elapsed
//!   Idle ─────────────────────▶ DrawingBack ─────────────▶ ReadyToThrow
//!    ▲  ◀──── secondary released ────┴──────────────────────────┤
//!    │                                                          │ throw
//!    │ recall arrives (force pickup)                            ▼
//!   Recalling ◀──────────────── recall pressed ──────────────  Thrown
//! ```
//!
//! Being held is a flag, not a phase: `Idle` with `held == true` is the
//! "held-idle" state.  `was_thrown` outlives the flight: a thrown tether
//! picked up by hand and dropped again can still be recalled from `Idle`
//! until a recall lands.  While held the carry controller positions the object
//! using [`Tether::hold_target`]; while recalling the recall trajectory is
//! the only thing that moves it.
//!
//! The free functions ([`begin_draw_back`], [`throw_held`],
//! [`start_recall`], [`advance_recall`] and friends) orchestrate the
//! handoffs between a tether and the carry controller that holds (or last
//! threw) it.

use tether_spatial::transform::{Pose, Quaternion, Vec3};
use tether_types::{CarrierId, InteractionPayload, ObjectId};
use tracing::{debug, warn};

use crate::adapter::ObjectAdapter;
use crate::carry::{CarryController, Stage};
use crate::sequence::{DrawBack, RecallFlight, RecallProfile, TaskSlot, TaskStatus};
use crate::settings::TetherSettings;

const SOURCE: &str = "tether-runtime::tether";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TetherPhase {
    Idle,
    DrawingBack,
    ReadyToThrow,
    Thrown,
    Recalling,
}

impl std::fmt::Display for TetherPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TetherPhase::Idle => "idle",
            TetherPhase::DrawingBack => "drawing back",
            TetherPhase::ReadyToThrow => "ready to throw",
            TetherPhase::Thrown => "thrown",
            TetherPhase::Recalling => "recalling",
        };
        f.write_str(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tether state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Tether {
    settings: TetherSettings,
    phase: TetherPhase,
    held: bool,
    was_thrown: bool,
    rest_scale: Vec3,
    hold_rotation: Quaternion,
    draw_back: TaskSlot<DrawBack>,
    recall: TaskSlot<RecallFlight>,
    recall_carrier: Option<CarrierId>,
}

impl Tether {
    /// A free, idle tether.  `rest_scale` is re-applied when a recall lands.
    pub fn new(settings: TetherSettings, rest_scale: Vec3) -> Self {
        let r = settings.hold_rotation_deg;
        Self {
            hold_rotation: Quaternion::from_euler_degrees(r.x, r.y, r.z),
            settings,
            phase: TetherPhase::Idle,
            held: false,
            was_thrown: false,
            rest_scale,
            draw_back: TaskSlot::default(),
            recall: TaskSlot::default(),
            recall_carrier: None,
        }
    }

    pub fn settings(&self) -> &TetherSettings {
        &self.settings
    }

    pub fn phase(&self) -> TetherPhase {
        self.phase
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn was_thrown(&self) -> bool {
        self.was_thrown
    }

    pub fn is_drawing_back(&self) -> bool {
        matches!(self.phase, TetherPhase::DrawingBack | TetherPhase::ReadyToThrow)
    }

    pub fn is_ready_to_throw(&self) -> bool {
        self.phase == TetherPhase::ReadyToThrow
    }

    pub fn is_recalling(&self) -> bool {
        self.phase == TetherPhase::Recalling
    }

    /// Carrier a running recall is flying toward.
    pub fn recall_carrier(&self) -> Option<CarrierId> {
        self.recall_carrier
    }

    pub fn rest_scale(&self) -> Vec3 {
        self.rest_scale
    }

    /// Draw-back progress in `[0, 1]`; full once the throw is armed.
    pub fn draw_back_progress(&self) -> f32 {
        match self.phase {
            TetherPhase::DrawingBack => self.draw_back.get().map_or(0.0, DrawBack::progress),
            TetherPhase::ReadyToThrow => 1.0,
            _ => 0.0,
        }
    }

    // ── held-follow ─────────────────────────────────────────────────────────

    /// Pose the object should follow while held, pulled back along the
    /// view axis in proportion to draw-back progress.
    pub fn hold_target(&self, view: &Pose) -> Pose {
        let pull = self.settings.draw_back_distance * self.draw_back_progress();
        let target = self.recall_target(view);
        Pose::new(target.position - view.forward() * pull, target.rotation)
    }

    /// Camera-relative hold pose without any draw-back pull.
    pub fn recall_target(&self, view: &Pose) -> Pose {
        Pose::new(
            view.offset(self.settings.hold_offset),
            view.rotation.mul(self.hold_rotation),
        )
    }

    pub(crate) fn set_being_held(&mut self, held: bool) {
        self.held = held;
        if held {
            // A hand pickup ends the flight but keeps `was_thrown`, so a drop
            // still leaves the object recallable.
            self.phase = TetherPhase::Idle;
        } else {
            self.draw_back.cancel();
            if self.is_drawing_back() {
                self.phase = TetherPhase::Idle;
            }
        }
    }

    // ── draw-back ───────────────────────────────────────────────────────────

    /// Start (or restart) drawing back.  Refused unless held and not
    /// recalling.
    pub(crate) fn begin_draw_back(&mut self) -> bool {
        if !self.held || self.is_recalling() {
            return false;
        }
        self.draw_back.start(DrawBack::new(self.settings.draw_back_delay));
        self.phase = TetherPhase::DrawingBack;
        true
    }

    /// Release before or after the throw is armed.  Returns `false` when
    /// nothing was being drawn.
    pub(crate) fn cancel_draw_back(&mut self) -> bool {
        if !self.is_drawing_back() {
            return false;
        }
        self.draw_back.cancel();
        self.phase = TetherPhase::Idle;
        true
    }

    /// Advance a running draw-back.  Returns `true` on the tick the throw
    /// becomes armed.
    pub(crate) fn advance_draw_back(&mut self, dt: f32) -> bool {
        if self.phase != TetherPhase::DrawingBack {
            return false;
        }
        let Some(task) = self.draw_back.get_mut() else {
            return false;
        };
        if task.advance(dt) == TaskStatus::Done {
            self.draw_back.cancel();
            self.phase = TetherPhase::ReadyToThrow;
            return true;
        }
        false
    }

    // ── throw ───────────────────────────────────────────────────────────────

    fn arm_throw(&mut self) -> bool {
        if !self.held || !self.is_ready_to_throw() {
            return false;
        }
        self.was_thrown = true;
        true
    }

    fn launched(&mut self) {
        self.draw_back.cancel();
        self.held = false;
        self.phase = TetherPhase::Thrown;
    }

    // ── recall ──────────────────────────────────────────────────────────────

    /// Begin flying back from `from`.  Only an unheld tether that has been
    /// thrown since its last recall can be recalled; recalling again restarts
    /// the flight from `from`.
    pub(crate) fn begin_recall(&mut self, from: Pose, carrier: CarrierId) -> bool {
        if self.held || !self.was_thrown {
            return false;
        }
        self.recall.start(RecallFlight::new(from));
        self.recall_carrier = Some(carrier);
        self.phase = TetherPhase::Recalling;
        true
    }

    fn step_recall(&mut self, dt: f32, view: &Pose) -> Option<(Pose, TaskStatus)> {
        if !self.is_recalling() {
            return None;
        }
        let target = self.recall_target(view);
        let profile = RecallProfile {
            speed: self.settings.recall_speed,
            arrive_distance: self.settings.min_distance_to_pickup,
            curve: self.settings.recall_curve,
        };
        let flight = self.recall.get_mut()?;
        Some(flight.advance(dt, target, &profile))
    }

    /// The flight has landed; the object is about to be handed back.
    pub(crate) fn finish_recall(&mut self) {
        self.recall.cancel();
        self.recall_carrier = None;
        self.was_thrown = false;
        self.phase = TetherPhase::Idle;
    }

    /// The flight cannot be completed; fall back to a free thrown object that
    /// can be recalled again.
    pub(crate) fn abort_recall(&mut self) {
        self.recall.cancel();
        self.recall_carrier = None;
        self.was_thrown = true;
        self.phase = TetherPhase::Thrown;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration with the carry controller
// ────────────────────────────────────────────────────────────────────────────

/// Throw the tethered object `controller` is holding.
///
/// Requires an armed throw.  Marks the object thrown, records it as the
/// controller's last thrown object, drops it, then launches it along the
/// view axis with a little lift and spin about its own right axis.
pub fn throw_held(controller: &mut CarryController, view: &Pose, stage: &mut Stage<'_>) -> bool {
    let Some(id) = controller.held() else {
        return false;
    };
    let Some(tether) = stage.scene.get_mut(id).and_then(|o| o.tether_mut()) else {
        debug!(object = %id, "held object has no tether, ignoring throw");
        return false;
    };
    if !tether.arm_throw() {
        debug!(object = %id, phase = %tether.phase(), "throw not armed");
        return false;
    }
    let settings = tether.settings().clone();

    controller.set_last_thrown(id);
    controller.drop_object(stage);

    let Some(obj) = stage.scene.get_mut(id) else {
        return false;
    };
    let spin_axis = obj.pose.right();
    let mut body = ObjectAdapter::new(id, obj, &mut *stage.physics);
    body.set_kinematic(false);
    body.set_gravity_enabled(true);
    body.apply_impulse(view.forward() * settings.throw_force + Vec3::UP * settings.throw_upward_force);
    body.apply_torque_impulse(spin_axis * settings.throw_torque);

    if let Some(tether) = obj.tether_mut() {
        tether.launched();
    }
    stage.journal.record(
        SOURCE,
        InteractionPayload::Thrown {
            carrier: controller.id(),
            object: id,
        },
    );
    true
}

/// Start (or restart) drawing back the tethered object `controller` holds.
pub fn begin_draw_back(controller: &CarryController, stage: &mut Stage<'_>) -> bool {
    let Some(id) = controller.held() else {
        return false;
    };
    let Some(tether) = stage.scene.get_mut(id).and_then(|o| o.tether_mut()) else {
        return false;
    };
    if !tether.begin_draw_back() {
        return false;
    }
    stage
        .journal
        .record(SOURCE, InteractionPayload::DrawBackStarted { object: id });
    true
}

/// Secondary action released: abandon the draw, armed or not.
pub fn release_draw_back(controller: &CarryController, stage: &mut Stage<'_>) -> bool {
    let Some(id) = controller.held() else {
        return false;
    };
    let Some(tether) = stage.scene.get_mut(id).and_then(|o| o.tether_mut()) else {
        return false;
    };
    if !tether.cancel_draw_back() {
        return false;
    }
    stage
        .journal
        .record(SOURCE, InteractionPayload::DrawBackCancelled { object: id });
    true
}

/// Recall the controller's last thrown object.
///
/// Refused when there is no last thrown object, or when that object is held
/// or has not been thrown.  A carrier with full hands may still recall; the
/// flight is aborted on landing when the hand-off is refused.
pub fn start_recall(controller: &CarryController, stage: &mut Stage<'_>) -> bool {
    let Some(id) = controller.last_thrown() else {
        debug!(carrier = %controller.id(), "nothing to recall");
        return false;
    };
    let Some(obj) = stage.scene.get_mut(id) else {
        return false;
    };
    let from = obj.pose;
    let Some(tether) = obj.tether_mut() else {
        return false;
    };
    if !tether.begin_recall(from, controller.id()) {
        debug!(object = %id, phase = %tether.phase(), "recall refused");
        return false;
    }

    let mut body = ObjectAdapter::new(id, obj, &mut *stage.physics);
    body.set_kinematic(true);
    body.set_gravity_enabled(false);

    stage.journal.record(
        SOURCE,
        InteractionPayload::RecallStarted {
            carrier: controller.id(),
            object: id,
        },
    );
    true
}

/// Advance one recalling object by `dt`.  On arrival the object's rest scale
/// is restored and it is force-picked-up by `controller`; if that is refused
/// the recall is aborted and the object falls free.
///
/// Returns `true` on the tick the object is handed back.
pub fn advance_recall(
    id: ObjectId,
    controller: &mut CarryController,
    view: &Pose,
    dt: f32,
    stage: &mut Stage<'_>,
) -> bool {
    let Some(obj) = stage.scene.get_mut(id) else {
        return false;
    };
    let Some(tether) = obj.tether.as_mut() else {
        return false;
    };
    let Some((pose, status)) = tether.step_recall(dt, view) else {
        return false;
    };
    obj.pose = pose;
    if status == TaskStatus::Running {
        return false;
    }

    if let Some(tether) = obj.tether.as_mut() {
        tether.finish_recall();
        obj.scale = tether.rest_scale();
    }

    if controller.force_pickup(id, view, stage) {
        stage.journal.record(
            SOURCE,
            InteractionPayload::RecallCompleted {
                carrier: controller.id(),
                object: id,
            },
        );
        return true;
    }

    warn!(object = %id, carrier = %controller.id(), "recall landed but pickup was refused");
    abort_recall(id, "carrier refused the pickup", stage);
    false
}

/// Drop a recall in flight and hand the object back to the simulation.
pub fn abort_recall(id: ObjectId, reason: &str, stage: &mut Stage<'_>) {
    let Some(obj) = stage.scene.get_mut(id) else {
        return;
    };
    if let Some(tether) = obj.tether.as_mut() {
        tether.abort_recall();
    }
    let mut body = ObjectAdapter::new(id, obj, &mut *stage.physics);
    body.set_kinematic(false);
    body.set_gravity_enabled(true);
    stage.journal.record(
        SOURCE,
        InteractionPayload::RecallAborted {
            object: id,
            reason: reason.to_string(),
        },
    );
}
