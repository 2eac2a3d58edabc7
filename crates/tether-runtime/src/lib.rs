//! `tether-runtime` – the carry and tether interaction core.
//!
//! Decides who holds what, how a held object follows its carrier, and how a
//! tethered object is drawn back, thrown and recalled.  Physics and spatial
//! queries are injected; this crate never integrates motion or tests
//! geometry on its own.
//!
//! # Modules
//!
//! - [`session`] – [`Session`][session::Session] and
//!   [`SessionBuilder`][session::SessionBuilder]: the frame-stepped driver
//!   that owns the scene, the carriers and the tick order.
//! - [`carry`] – [`CarryController`][carry::CarryController]: pickup,
//!   obstruction-aware hold and drop for one carrier.
//! - [`tether`] – [`Tether`][tether::Tether]: the draw-back, throw and recall
//!   state machine attached to throwable objects.
//! - [`sequence`] – resumable draw-back and recall tasks advanced once per
//!   tick.
//! - [`object`] – [`CarriableObject`][object::CarriableObject] and the
//!   [`Scene`][object::Scene] that resolves object handles.
//! - [`adapter`] – [`ObjectAdapter`][adapter::ObjectAdapter]: every physics
//!   mode switch goes through here.
//! - [`verifier`] – [`InvariantVerifier`][verifier::InvariantVerifier]:
//!   ownership and physical-mode rules checked after each tick.
//! - [`journal`] – the interaction event log.
//! - [`settings`] – serde-backed tuning for carriers and tethers.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console and
//!   optional OTLP tracing output.

pub mod adapter;
pub mod carry;
pub mod journal;
pub mod object;
pub mod sequence;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod tether;
pub mod verifier;

pub use carry::{CarryController, Stage};
pub use journal::Journal;
pub use object::{CarriableObject, Scene};
pub use session::{Session, SessionBuilder};
pub use settings::{CarrySettings, SessionConfig, TetherSettings};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use tether::{Tether, TetherPhase};
pub use verifier::{InvariantVerifier, Rule, WorldView};
