//! The observer pose a carrier looks through.
//!
//! The core only ever *reads* a viewpoint: its position is the ray origin for
//! pickups, its axes anchor hold offsets and throw directions.  Whoever drives
//! the camera (player input, a script, a test) writes it elsewhere.
//!
//! [`SharedViewpoint`] is the simplest writable source: a cloneable cell that
//! the driver updates and the session reads on the same thread.

use std::cell::Cell;
use std::rc::Rc;

use crate::transform::{Pose, Quaternion, Vec3};

/// Read-only access to an observer pose.
pub trait ViewpointSource {
    fn view_pose(&self) -> Pose;
}

impl ViewpointSource for Pose {
    fn view_pose(&self) -> Pose {
        *self
    }
}

/// A viewpoint shared between its driver and the session.
#[derive(Debug, Clone, Default)]
pub struct SharedViewpoint(Rc<Cell<Pose>>);

impl SharedViewpoint {
    pub fn new(pose: Pose) -> Self {
        Self(Rc::new(Cell::new(pose)))
    }

    pub fn pose(&self) -> Pose {
        self.0.get()
    }

    pub fn set_pose(&self, pose: Pose) {
        self.0.set(pose);
    }

    pub fn set_position(&self, position: Vec3) {
        let mut pose = self.0.get();
        pose.position = position;
        self.0.set(pose);
    }

    pub fn set_rotation(&self, rotation: Quaternion) {
        let mut pose = self.0.get();
        pose.rotation = rotation;
        self.0.set(pose);
    }
}

impl ViewpointSource for SharedViewpoint {
    fn view_pose(&self) -> Pose {
        self.pose()
    }
}
