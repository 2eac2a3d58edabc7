//! Spatial Query & Collision Provider.
//!
//! The interaction core never inspects geometry directly.  It asks two
//! questions through the [`SpatialQuery`] capability:
//!
//! - *raycast* – what is the first solid surface along this ray, and which
//!   object owns it?  (pickup targeting)
//! - *overlap sphere* – which volumes touch this small sphere?  (hold
//!   position veto)
//!
//! [`ColliderWorld`] is an in-memory provider made of axis-aligned boxes.
//! Boxes may be static scenery, trigger volumes, or attached to an object and
//! re-centred on it every tick.
//!
//! # Key types
//!
//! | Type | Role |
//! |------|------|
//! | [`Aabb`]          | An axis-aligned bounding box.                    |
//! | [`Collider`]      | A box plus its owner and trigger flag.           |
//! | [`ColliderWorld`] | Provider: stores colliders, answers queries.     |
//!
//! # Example
//!
//! ```rust
//! use tether_spatial::query::{Aabb, ColliderWorld, SpatialQuery};
//! use tether_spatial::transform::Vec3;
//!
//! let mut world = ColliderWorld::new();
//! world.add_static(Aabb::new(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 5.0)));
//!
//! let hit = world.raycast(Vec3::zero(), Vec3::FORWARD, 10.0).unwrap();
//! assert!((hit.distance - 4.0).abs() < 1e-5);
//!
//! // A ray that is too short misses.
//! assert!(world.raycast(Vec3::zero(), Vec3::FORWARD, 3.0).is_none());
//! ```

use tether_types::ObjectId;

use crate::transform::Vec3;

// ────────────────────────────────────────────────────────────────────────────
// Query capability
// ────────────────────────────────────────────────────────────────────────────

/// First blocking surface found by a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    /// Object owning the surface; `None` for static scenery.
    pub object: Option<ObjectId>,
}

/// A volume touched by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub object: Option<ObjectId>,
    /// Trigger volumes report overlaps but are not solid.
    pub is_trigger: bool,
}

/// Black-box environment queries consumed by the carry controller.
///
/// Implementations must answer from current world state only.  The two
/// mutating hooks let the session tell the provider where the objects it
/// moves have gone; providers backed by a real engine can ignore them.
pub trait SpatialQuery {
    /// Nearest solid, non-trigger surface hit by the ray within `max_range`.
    /// `direction` need not be normalised.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<RayHit>;

    /// Every volume (solid or trigger) intersecting the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap>;

    /// The object `owner` is now centred at `position`.
    fn sync_owner(&mut self, _owner: ObjectId, _position: Vec3) {}

    /// The object `owner` no longer exists.
    fn remove_owner(&mut self, _owner: ObjectId) {}
}

// ────────────────────────────────────────────────────────────────────────────
// Aabb
// ────────────────────────────────────────────────────────────────────────────

/// An axis-aligned bounding box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a bounding box from its two opposite corners.
    ///
    /// The constructor normalises the corners so that `min ≤ max` per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box centred on `center` extending `half_extents` along each axis.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Return the centre point of the box.
    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The same box moved so its centre is `center`.
    pub fn recentred(&self, center: Vec3) -> Self {
        Self::from_center(center, self.half_extents())
    }

    /// True when the point lies inside or on the boundary of the box.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True when `other` overlaps (intersects or touches) this box.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Point of the box closest to `p` (`p` itself when inside).
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.max(self.min).min(self.max)
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.closest_point(center).distance(center) <= radius
    }

    /// Slab test.  Returns `(t_enter, t_exit)` along `origin + dir * t` when
    /// the infinite line crosses the box and the exit lies ahead of the
    /// origin.  `t_enter` is negative when the origin is inside.
    pub fn ray_interval(&self, origin: Vec3, dir: Vec3) -> Option<(f32, f32)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let axes = [
            (origin.x, dir.x, self.min.x, self.max.x),
            (origin.y, dir.y, self.min.y, self.max.y),
            (origin.z, dir.z, self.min.z, self.max.z),
        ];
        for (o, d, lo, hi) in axes {
            if d.abs() < 1e-8 {
                // Parallel to this slab: must already be between its planes.
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t1, mut t2) = ((lo - o) * inv, (hi - o) * inv);
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_enter = t_enter.max(t1);
            t_exit = t_exit.min(t2);
            if t_enter > t_exit {
                return None;
            }
        }
        if t_exit < 0.0 {
            return None;
        }
        Some((t_enter, t_exit))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ColliderWorld
// ────────────────────────────────────────────────────────────────────────────

/// A box volume registered with a [`ColliderWorld`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub bounds: Aabb,
    pub owner: Option<ObjectId>,
    pub is_trigger: bool,
}

/// In-memory [`SpatialQuery`] provider over axis-aligned boxes.
///
/// Queries are a linear scan; the worlds this core is exercised against hold
/// tens of colliders, not thousands.
#[derive(Debug, Default)]
pub struct ColliderWorld {
    colliders: Vec<Collider>,
}

impl ColliderWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add solid static scenery (walls, floors, shelves).
    pub fn add_static(&mut self, bounds: Aabb) {
        self.colliders.push(Collider {
            bounds,
            owner: None,
            is_trigger: false,
        });
    }

    /// Add a non-solid trigger volume.
    pub fn add_trigger(&mut self, bounds: Aabb, owner: Option<ObjectId>) {
        self.colliders.push(Collider {
            bounds,
            owner,
            is_trigger: true,
        });
    }

    /// Attach a solid box to `owner`, centred on `center`.  The box follows
    /// the object through [`SpatialQuery::sync_owner`].
    pub fn attach(&mut self, owner: ObjectId, center: Vec3, half_extents: Vec3) {
        self.colliders.push(Collider {
            bounds: Aabb::from_center(center, half_extents),
            owner: Some(owner),
            is_trigger: false,
        });
    }

    /// Return the number of colliders in the world.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// True when the world contains no colliders.
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Colliders belonging to `owner`.
    pub fn colliders_of(&self, owner: ObjectId) -> impl Iterator<Item = &Collider> {
        self.colliders
            .iter()
            .filter(move |c| c.owner == Some(owner))
    }
}

impl SpatialQuery for ColliderWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<RayHit> {
        let dir = direction.normalized();
        if dir == Vec3::zero() || max_range <= 0.0 {
            return None;
        }

        self.colliders
            .iter()
            .filter(|c| !c.is_trigger)
            .filter_map(|c| {
                let (t_enter, _) = c.bounds.ray_interval(origin, dir)?;
                // Rays starting inside a collider ignore it.
                (t_enter >= 0.0 && t_enter <= max_range).then_some((t_enter, c.owner))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, owner)| RayHit {
                point: origin + dir * t,
                distance: t,
                object: owner,
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap> {
        self.colliders
            .iter()
            .filter(|c| c.bounds.intersects_sphere(center, radius))
            .map(|c| Overlap {
                object: c.owner,
                is_trigger: c.is_trigger,
            })
            .collect()
    }

    fn sync_owner(&mut self, owner: ObjectId, position: Vec3) {
        for c in self.colliders.iter_mut().filter(|c| c.owner == Some(owner)) {
            c.bounds = c.bounds.recentred(position);
        }
    }

    fn remove_owner(&mut self, owner: ObjectId) {
        self.colliders.retain(|c| c.owner != Some(owner));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
