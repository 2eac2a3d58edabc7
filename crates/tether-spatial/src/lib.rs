//! `tether-spatial` – geometry and environment queries.
//!
//! Everything the interaction core needs to reason about space, with no
//! knowledge of who holds what.
//!
//! # Modules
//!
//! - [`transform`] – [`Vec3`][transform::Vec3],
//!   [`Quaternion`][transform::Quaternion] and [`Pose`][transform::Pose]:
//!   the rigid-body math, including camera-relative offsets.
//! - [`smoothing`] – [`PoseSmoother`][smoothing::PoseSmoother]: rate-based
//!   interpolation of a pose toward a target.
//! - [`easing`] – [`EasingCurve`][easing::EasingCurve]: shapes the progress
//!   fraction of timed trajectories.
//! - [`query`] – the [`SpatialQuery`][query::SpatialQuery] capability
//!   (raycast + sphere overlap) and [`ColliderWorld`][query::ColliderWorld],
//!   an in-memory provider built from axis-aligned boxes.
//! - [`viewpoint`] – [`ViewpointSource`][viewpoint::ViewpointSource]: the
//!   read-only observer pose a carrier looks through.

pub mod easing;
pub mod query;
pub mod smoothing;
pub mod transform;
pub mod viewpoint;

pub use easing::EasingCurve;
pub use query::{Aabb, Collider, ColliderWorld, Overlap, RayHit, SpatialQuery};
pub use smoothing::PoseSmoother;
pub use transform::{Pose, Quaternion, Vec3};
pub use viewpoint::{SharedViewpoint, ViewpointSource};
