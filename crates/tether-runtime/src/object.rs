//! Carriable objects and the scene that owns them.
//!
//! Carriers and tethers never hold references to objects, only
//! [`ObjectId`] handles resolved through [`Scene`].  A despawned object
//! therefore leaves dangling handles that resolve to nothing instead of
//! dangling pointers.

use std::collections::HashMap;

use tether_spatial::transform::{Pose, Vec3};
use tether_types::{CarrierId, Layer, NodeId, ObjectId, ObjectTag, PhysicalMode};

use crate::settings::TetherSettings;
use crate::tether::Tether;

// ────────────────────────────────────────────────────────────────────────────
// CarriableObject
// ────────────────────────────────────────────────────────────────────────────

/// A world entity that a carrier may pick up.
///
/// `pose` and `scale` are public so external drivers can place objects.
/// Everything touching ownership or physical mode is written only by the
/// carry controller and tether through the
/// [`ObjectAdapter`][crate::adapter::ObjectAdapter].
#[derive(Debug, Clone)]
pub struct CarriableObject {
    name: String,
    pub pose: Pose,
    pub scale: Vec3,
    pub(crate) parent: Option<NodeId>,
    pub(crate) original_parent: Option<NodeId>,
    pub(crate) original_scale: Vec3,
    tag: ObjectTag,
    pub(crate) layer: Layer,
    pub(crate) physical_mode: PhysicalMode,
    pub(crate) gravity_enabled: bool,
    pub(crate) holder: Option<CarrierId>,
    pub(crate) tether: Option<Tether>,
}

impl CarriableObject {
    /// A free, simulated, untagged object with unit scale.
    pub fn new(name: impl Into<String>, pose: Pose) -> Self {
        Self {
            name: name.into(),
            pose,
            scale: Vec3::ONE,
            parent: None,
            original_parent: None,
            original_scale: Vec3::ONE,
            tag: ObjectTag::Untagged,
            layer: Layer::Default,
            physical_mode: PhysicalMode::Simulated,
            gravity_enabled: true,
            holder: None,
            tether: None,
        }
    }

    /// Tag the object so that a pickup ray may take it.
    pub fn pickupable(mut self) -> Self {
        self.tag = ObjectTag::Pickup;
        self
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self.original_parent = Some(parent);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self.original_scale = scale;
        self
    }

    /// Give the object the draw-back / throw / recall capability.
    pub fn with_tether(mut self, settings: TetherSettings) -> Self {
        self.tether = Some(Tether::new(settings, self.scale));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> ObjectTag {
        self.tag
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Parent restored on drop.
    pub fn original_parent(&self) -> Option<NodeId> {
        self.original_parent
    }

    /// Scale recorded at the last pickup and enforced while held.
    pub fn original_scale(&self) -> Vec3 {
        self.original_scale
    }

    pub fn physical_mode(&self) -> PhysicalMode {
        self.physical_mode
    }

    pub fn is_kinematic(&self) -> bool {
        self.physical_mode == PhysicalMode::Kinematic
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// The carrier currently holding this object.
    pub fn holder(&self) -> Option<CarrierId> {
        self.holder
    }

    pub fn tether(&self) -> Option<&Tether> {
        self.tether.as_ref()
    }

    pub(crate) fn tether_mut(&mut self) -> Option<&mut Tether> {
        self.tether.as_mut()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scene
// ────────────────────────────────────────────────────────────────────────────

/// Handle-keyed store of every live [`CarriableObject`].
#[derive(Debug, Default)]
pub struct Scene {
    objects: HashMap<ObjectId, CarriableObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object under a fresh handle.
    pub fn spawn(&mut self, object: CarriableObject) -> ObjectId {
        let id = ObjectId::new();
        self.objects.insert(id, object);
        id
    }

    pub fn despawn(&mut self, id: ObjectId) -> Option<CarriableObject> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&CarriableObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut CarriableObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &CarriableObject)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut CarriableObject)> {
        self.objects.iter_mut().map(|(id, obj)| (*id, obj))
    }

    /// Handles of every object hosting a tether.
    pub fn tethered(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.tether.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    /// First object with the given name.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name == name)
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_object_is_free_and_simulated() {
        let obj = CarriableObject::new("crate", Pose::at(Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(obj.name(), "crate");
        assert_eq!(obj.tag(), ObjectTag::Untagged);
        assert_eq!(obj.layer(), Layer::Default);
        assert_eq!(obj.physical_mode(), PhysicalMode::Simulated);
        assert!(obj.gravity_enabled());
        assert!(obj.holder().is_none());
        assert!(obj.tether().is_none());
    }

    #[test]
    fn builders_record_restore_targets() {
        let shelf = NodeId::new();
        let obj = CarriableObject::new("vase", Pose::identity())
            .pickupable()
            .with_parent(shelf)
            .with_scale(Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(obj.tag(), ObjectTag::Pickup);
        assert_eq!(obj.parent(), Some(shelf));
        assert_eq!(obj.original_parent(), Some(shelf));
        assert_eq!(obj.original_scale(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn tether_captures_spawn_scale() {
        let obj = CarriableObject::new("spear", Pose::identity())
            .with_scale(Vec3::new(1.0, 1.0, 3.0))
            .with_tether(TetherSettings::default());
        assert_eq!(obj.tether().unwrap().rest_scale(), Vec3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn scene_resolves_handles() {
        let mut scene = Scene::new();
        let a = scene.spawn(CarriableObject::new("a", Pose::identity()));
        let b = scene.spawn(
            CarriableObject::new("b", Pose::identity()).with_tether(TetherSettings::default()),
        );
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.find("b"), Some(b));
        assert_eq!(scene.tethered(), vec![b]);

        assert!(scene.despawn(a).is_some());
        assert!(scene.get(a).is_none());
        assert!(!scene.contains(a));
        assert!(scene.despawn(a).is_none());
    }
}
