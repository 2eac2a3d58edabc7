//! [`InvariantVerifier`] – ownership and physical-mode rule engine.
//!
//! After each session tick, pass a [`WorldView`] through
//! [`InvariantVerifier::verify`].  Every registered [`Rule`] is evaluated in
//! order; the first violation is returned as
//! [`TetherError::InvariantViolated`].
//!
//! Built-in rules:
//! - [`HeldMatchesOwnership`] – a carrier's held handle is set exactly when
//!   the object is kinematic and names that carrier as its holder.
//! - [`FreeBodiesSimulated`] – objects nobody holds are simulated, unless a
//!   recall is flying them home.
//! - [`TetherHeldFlag`] – a tether's held flag agrees with its host's holder.

use tether_types::{PhysicalMode, TetherError};

use crate::carry::CarryController;
use crate::object::Scene;
use crate::tether::TetherPhase;

/// Read-only snapshot handed to each rule.
pub struct WorldView<'a> {
    pub scene: &'a Scene,
    pub carriers: Vec<&'a CarryController>,
}

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single consistency invariant over the world.
pub trait Rule {
    /// Human-readable name used in violation messages.
    fn name(&self) -> &str;

    fn check(&self, world: &WorldView<'_>) -> Result<(), TetherError>;
}

fn violation(rule: &dyn Rule, details: String) -> TetherError {
    TetherError::InvariantViolated {
        rule: rule.name().to_string(),
        details,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// InvariantVerifier
// ────────────────────────────────────────────────────────────────────────────

/// # Example
///
/// ```
/// use tether_runtime::object::Scene;
/// use tether_runtime::verifier::{InvariantVerifier, WorldView};
///
/// let verifier = InvariantVerifier::with_default_rules();
/// let scene = Scene::new();
/// let world = WorldView { scene: &scene, carriers: Vec::new() };
/// assert!(verifier.verify(&world).is_ok());
/// ```
#[derive(Default)]
pub struct InvariantVerifier {
    rules: Vec<Box<dyn Rule>>,
}

impl InvariantVerifier {
    /// Create an empty verifier with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// A verifier with all built-in rules.
    pub fn with_default_rules() -> Self {
        let mut verifier = Self::new();
        verifier.add_rule(Box::new(HeldMatchesOwnership));
        verifier.add_rule(Box::new(FreeBodiesSimulated));
        verifier.add_rule(Box::new(TetherHeldFlag));
        verifier
    }

    /// Register a new [`Rule`].  Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn verify(&self, world: &WorldView<'_>) -> Result<(), TetherError> {
        for rule in &self.rules {
            rule.check(world)?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

pub struct HeldMatchesOwnership;

impl Rule for HeldMatchesOwnership {
    fn name(&self) -> &str {
        "held_matches_ownership"
    }

    fn check(&self, world: &WorldView<'_>) -> Result<(), TetherError> {
        for carrier in &world.carriers {
            let Some(id) = carrier.held() else {
                continue;
            };
            let Some(obj) = world.scene.get(id) else {
                return Err(violation(
                    self,
                    format!("{} holds {id}, which is not in the scene", carrier.id()),
                ));
            };
            if obj.physical_mode() != PhysicalMode::Kinematic {
                return Err(violation(
                    self,
                    format!("{} holds {id}, which is simulated", carrier.id()),
                ));
            }
            if obj.holder() != Some(carrier.id()) {
                return Err(violation(
                    self,
                    format!("{} holds {id}, whose holder is {:?}", carrier.id(), obj.holder()),
                ));
            }
        }

        for (id, obj) in world.scene.iter() {
            let Some(holder) = obj.holder() else {
                continue;
            };
            let claimed = world
                .carriers
                .iter()
                .any(|c| c.id() == holder && c.held() == Some(id));
            if !claimed {
                return Err(violation(
                    self,
                    format!("{id} names {holder} as holder, but that carrier does not hold it"),
                ));
            }
        }
        Ok(())
    }
}

pub struct FreeBodiesSimulated;

impl Rule for FreeBodiesSimulated {
    fn name(&self) -> &str {
        "free_bodies_simulated"
    }

    fn check(&self, world: &WorldView<'_>) -> Result<(), TetherError> {
        for (id, obj) in world.scene.iter() {
            if obj.holder().is_some() || obj.physical_mode() == PhysicalMode::Simulated {
                continue;
            }
            let recalling = obj.tether().is_some_and(|t| t.is_recalling());
            if !recalling {
                return Err(violation(
                    self,
                    format!("{id} is kinematic with no holder and no recall in flight"),
                ));
            }
        }
        Ok(())
    }
}

pub struct TetherHeldFlag;

impl Rule for TetherHeldFlag {
    fn name(&self) -> &str {
        "tether_held_flag"
    }

    fn check(&self, world: &WorldView<'_>) -> Result<(), TetherError> {
        for (id, obj) in world.scene.iter() {
            let Some(tether) = obj.tether() else {
                continue;
            };
            let held = obj.holder().is_some();
            if tether.is_held() != held {
                return Err(violation(
                    self,
                    format!("{id} tether held={} but holder={:?}", tether.is_held(), obj.holder()),
                ));
            }
            if held && matches!(tether.phase(), TetherPhase::Thrown | TetherPhase::Recalling) {
                return Err(violation(
                    self,
                    format!("{id} is held while {}", tether.phase()),
                ));
            }
        }
        Ok(())
    }
}
