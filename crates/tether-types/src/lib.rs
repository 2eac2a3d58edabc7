//! `tether-types` – shared vocabulary for the carry / throw / recall core.
//!
//! Every other crate in the workspace speaks in these types: stable handles
//! for objects, carriers and scene nodes, the classification enums that
//! external collision filtering reads, the discrete input events the session
//! consumes, the interaction journal, and the workspace-wide error type.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Handles
// ────────────────────────────────────────────────────────────────────────────

/// Non-owning handle to a carriable object.  Resolved through the scene
/// lookup; a handle whose object has been despawned simply resolves to
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Allocate a fresh random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{}", &self.0.simple().to_string()[..8])
    }
}

/// Handle to a carrier (an entity owning a carry controller, e.g. the player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CarrierId(pub Uuid);

impl CarrierId {
    /// Allocate a fresh random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CarrierId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "carrier-{}", &self.0.simple().to_string()[..8])
    }
}

/// Handle to a scene-graph node that can parent an object (a shelf, a
/// vehicle, a room).  Only used as a restore target on drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Allocate a fresh random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Classification
// ────────────────────────────────────────────────────────────────────────────

/// Static tag deciding whether a carrier's pickup ray may take an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectTag {
    /// Eligible for pickup.
    Pickup,
    /// Scenery; the pickup ray stops on it but never takes it.
    #[default]
    Untagged,
}

/// Collision layer written by the core and read by external collision
/// filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layer {
    /// Free object, collides with everything.
    #[default]
    Default,
    /// Currently held by a carrier.
    Interactable,
}

/// Whether an object's motion comes from the physics simulation or from
/// direct pose assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhysicalMode {
    #[default]
    Simulated,
    Kinematic,
}

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// Edge-triggered input events.  Each queued event is evaluated exactly once,
/// on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    PickupPressed,
    DropPressed,
    RecallPressed,
    SecondaryPressed,
    SecondaryReleased,
    ThrowPressed,
}

// ────────────────────────────────────────────────────────────────────────────
// Interaction journal
// ────────────────────────────────────────────────────────────────────────────

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Session tick on which the transition happened.
    pub tick: u64,
    /// e.g. `"tether-runtime::carry"`
    pub source: String,
    pub payload: InteractionPayload,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum InteractionPayload {
    PickedUp {
        carrier: CarrierId,
        object: ObjectId,
        forced: bool,
    },
    Dropped {
        carrier: CarrierId,
        object: ObjectId,
    },
    DrawBackStarted {
        object: ObjectId,
    },
    DrawBackCancelled {
        object: ObjectId,
    },
    ReadyToThrow {
        object: ObjectId,
    },
    Thrown {
        carrier: CarrierId,
        object: ObjectId,
    },
    RecallStarted {
        carrier: CarrierId,
        object: ObjectId,
    },
    RecallCompleted {
        carrier: CarrierId,
        object: ObjectId,
    },
    /// The recall could not hand the object back; it is free again.
    RecallAborted {
        object: ObjectId,
        reason: String,
    },
    Despawned {
        object: ObjectId,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.
///
/// Domain refusals (picking up while holding, dropping while empty, recalling
/// a held object) are *not* errors; they are reported as `Ok(false)`.  These
/// variants cover setup preconditions, bad handles and broken invariants.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TetherError {
    #[error("Session has no spatial query provider")]
    MissingSpatialQuery,

    #[error("Session has no physics backend")]
    MissingPhysicsBackend,

    #[error("Session has no viewpoint source")]
    MissingViewpoint,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f32),

    #[error("Unknown carrier: {0}")]
    UnknownCarrier(CarrierId),

    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    #[error("Invariant '{rule}' violated: {details}")]
    InvariantViolated { rule: String, details: String },
}
