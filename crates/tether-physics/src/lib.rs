//! `tether-physics` – the rigid-body seam.
//!
//! The interaction core never integrates motion itself.  It flips bodies
//! between simulated and kinematic, toggles gravity, and applies launch
//! impulses through the [`PhysicsBackend`][backend::PhysicsBackend] driver
//! trait.  Engines plug in behind that trait; [`SimPhysics`][sim::SimPhysics]
//! is the headless backend used by tests and the CLI sandbox.

pub mod backend;
pub mod sim;

pub use backend::PhysicsBackend;
pub use sim::{SimBody, SimPhysics};
