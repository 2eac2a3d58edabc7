//! Resumable timed sequences.
//!
//! Draw-back and recall span many ticks.  Each one is an explicit state value
//! advanced once per tick by the session driver and stored in a
//! [`TaskSlot`].  A slot holds at most one task: starting a new task drops
//! the old one, and a dropped task is never advanced again.
//!
//! | Task | Completes when |
//! |------|----------------|
//! | [`DrawBack`]     | elapsed time reaches the draw-back delay |
//! | [`RecallFlight`] | the object is within pickup distance of the live target |

use tether_spatial::easing::EasingCurve;
use tether_spatial::transform::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Done,
}

// ────────────────────────────────────────────────────────────────────────────
// TaskSlot
// ────────────────────────────────────────────────────────────────────────────

/// Holder for at most one in-flight task of a given kind.
#[derive(Debug, Clone)]
pub struct TaskSlot<T> {
    task: Option<T>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self { task: None }
    }
}

impl<T> TaskSlot<T> {
    /// Install `task`, returning whichever task it replaced.
    pub fn start(&mut self, task: T) -> Option<T> {
        self.task.replace(task)
    }

    /// Stop the current task.  Cancellation has no side effects.
    pub fn cancel(&mut self) -> Option<T> {
        self.task.take()
    }

    pub fn get(&self) -> Option<&T> {
        self.task.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.task.as_mut()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Draw-back
// ────────────────────────────────────────────────────────────────────────────

/// Time spent drawing a tethered object back before a throw is armed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawBack {
    elapsed: f32,
    delay: f32,
}

impl DrawBack {
    pub fn new(delay: f32) -> Self {
        Self {
            elapsed: 0.0,
            delay: delay.max(0.0),
        }
    }

    pub fn advance(&mut self, dt: f32) -> TaskStatus {
        self.elapsed += dt;
        if self.elapsed >= self.delay {
            TaskStatus::Done
        } else {
            TaskStatus::Running
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Fraction of the delay covered, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.delay <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.delay).clamp(0.0, 1.0)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recall flight
// ────────────────────────────────────────────────────────────────────────────

/// Parameters shaping a recall trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecallProfile {
    pub speed: f32,
    pub arrive_distance: f32,
    pub curve: EasingCurve,
}

/// A recall trajectory from a fixed start pose toward a target that may move
/// every tick.
///
/// Progress is `elapsed * speed / journey`, where `journey` is the distance
/// from the start to the *current* target.  A moving target can make the
/// fraction shrink or overshoot; the easing curve clamps it to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecallFlight {
    elapsed: f32,
    start: Pose,
}

impl RecallFlight {
    pub fn new(start: Pose) -> Self {
        Self {
            elapsed: 0.0,
            start,
        }
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance by `dt` toward `target` and return the pose for this tick.
    pub fn advance(&mut self, dt: f32, target: Pose, profile: &RecallProfile) -> (Pose, TaskStatus) {
        self.elapsed += dt;

        let journey = self.start.position.distance(target.position);
        let fraction = if journey <= f32::EPSILON {
            1.0
        } else {
            self.elapsed * profile.speed / journey
        };
        let t = profile.curve.evaluate(fraction);

        let pose = Pose::new(
            self.start.position.lerp(target.position, t),
            self.start.rotation.slerp(target.rotation, t),
        );
        let status = if pose.position.distance(target.position) < profile.arrive_distance {
            TaskStatus::Done
        } else {
            TaskStatus::Running
        };
        (pose, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_spatial::transform::{Quaternion, Vec3};

    fn profile(speed: f32) -> RecallProfile {
        RecallProfile {
            speed,
            arrive_distance: 1.0,
            curve: EasingCurve::EaseInOut,
        }
    }

    #[test]
    fn slot_replaces_and_cancels() {
        let mut slot = TaskSlot::default();
        assert!(!slot.is_running());
        assert!(slot.start(DrawBack::new(0.25)).is_none());

        let mut fresh = DrawBack::new(0.5);
        fresh.advance(0.125);
        let replaced = slot.start(fresh).unwrap();
        assert_eq!(replaced.elapsed(), 0.0);
        assert_eq!(slot.get().unwrap().elapsed(), 0.125);

        assert!(slot.cancel().is_some());
        assert!(!slot.is_running());
        assert!(slot.get_mut().is_none());
    }

    #[test]
    fn draw_back_completes_at_delay() {
        let mut draw = DrawBack::new(0.25);
        assert_eq!(draw.advance(0.125), TaskStatus::Running);
        assert_eq!(draw.progress(), 0.5);
        assert_eq!(draw.advance(0.125), TaskStatus::Done);
        assert_eq!(draw.progress(), 1.0);
    }

    #[test]
    fn zero_delay_draw_completes_on_first_tick() {
        let mut draw = DrawBack::new(0.0);
        assert_eq!(draw.progress(), 1.0);
        assert_eq!(draw.advance(0.0), TaskStatus::Done);
    }

    #[test]
    fn recall_terminates_against_a_fixed_target() {
        let start = Pose::at(Vec3::new(0.0, 0.0, 20.0));
        let target = Pose::new(Vec3::zero(), Quaternion::from_euler_degrees(0.0, 90.0, 0.0));
        let mut flight = RecallFlight::new(start);

        let mut ticks = 0;
        let mut last_gap = f32::MAX;
        loop {
            let (pose, status) = flight.advance(1.0 / 60.0, target, &profile(30.0));
            let gap = pose.position.distance(target.position);
            assert!(gap <= last_gap + 1e-4, "recall must not move away from a fixed target");
            last_gap = gap;
            ticks += 1;
            if status == TaskStatus::Done {
                assert!(gap < 1.0);
                break;
            }
            assert!(ticks < 600, "recall did not terminate");
        }
        // 20 units at 30 u/s: roughly two thirds of a second.
        assert!(ticks <= 41, "took {ticks} ticks");
    }

    #[test]
    fn recall_with_zero_journey_arrives_immediately() {
        let here = Pose::at(Vec3::new(1.0, 1.0, 1.0));
        let mut flight = RecallFlight::new(here);
        let (pose, status) = flight.advance(0.0, here, &profile(30.0));
        assert_eq!(status, TaskStatus::Done);
        assert_eq!(pose.position, here.position);
    }

    #[test]
    fn recall_interpolates_from_the_start_pose() {
        let start = Pose::at(Vec3::new(0.0, 0.0, 10.0));
        let target = Pose::at(Vec3::zero());
        let mut flight = RecallFlight::new(start);
        let linear = RecallProfile {
            speed: 10.0,
            arrive_distance: 0.5,
            curve: EasingCurve::Linear,
        };
        // 0.5 s at 10 u/s over a 10 unit journey: halfway.
        let (pose, status) = flight.advance(0.5, target, &linear);
        assert_eq!(status, TaskStatus::Running);
        assert!((pose.position.z - 5.0).abs() < 1e-5);
        assert_eq!(flight.start(), start);
        assert_eq!(flight.elapsed(), 0.5);
    }
}
