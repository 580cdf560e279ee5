//! Object registry: bodies and their visual proxies, bound in pairs
//!
//! Every [`ObjectEntry`] owns exactly one body in the [`PhysicsWorld`] and one
//! proxy in the [`Scene`]. They are created together by
//! [`ObjectRegistry::spawn`] and destroyed together by
//! [`ObjectRegistry::remove`], so between frames an object is either fully
//! present or fully gone.

use slotmap::{new_key_type, SecondaryMap, SlotMap};
use tumble_math::{Quat, Vec3};
use tumble_physics::{BodyKey, BodyShape, ListenerToken, MaterialTag, PhysicsError, PhysicsWorld, RigidBody};

use crate::proxy::{ProxyMesh, VisualProxy};
use crate::scene::{ProxyKey, Scene};
use crate::spawner::Spawner;

new_key_type! {
    /// Key to an entry in the registry
    pub struct EntryId;
}

/// Everything needed to create one object
#[derive(Clone, Debug)]
pub struct SpawnSpec {
    pub shape: BodyShape,
    /// 0 = static
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub material: MaterialTag,
}

impl SpawnSpec {
    /// Unit-mass sphere at rest
    pub fn sphere(radius: f32, position: Vec3, material: MaterialTag) -> Self {
        Self::new(BodyShape::sphere(radius), position, material)
    }

    /// Unit-mass box at rest, from full width/height/depth
    pub fn cuboid(size: Vec3, position: Vec3, material: MaterialTag) -> Self {
        Self::new(BodyShape::cuboid(size.x, size.y, size.z), position, material)
    }

    fn new(shape: BodyShape, position: Vec3, material: MaterialTag) -> Self {
        Self {
            shape,
            mass: 1.0,
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            material,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Mesh the proxy is drawn with
    pub fn mesh(&self) -> ProxyMesh {
        match self.shape {
            BodyShape::Sphere { .. } => ProxyMesh::Sphere,
            BodyShape::Cuboid { .. } => ProxyMesh::Cube,
        }
    }
}

/// One body bound to one proxy
#[derive(Clone, Debug)]
pub struct ObjectEntry {
    pub body: BodyKey,
    pub proxy: ProxyKey,
    pub material: MaterialTag,
    /// Collision subscription; cancelled before the body goes away
    pub listener: Option<ListenerToken>,
    /// Proxy scale captured at spawn
    pub scale: Vec3,
}

/// Insertion-ordered pool of live objects
#[derive(Default)]
pub struct ObjectRegistry {
    entries: SlotMap<EntryId, ObjectEntry>,
    /// Spawn order; oldest first
    order: Vec<EntryId>,
    by_body: SecondaryMap<BodyKey, EntryId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the body, then the proxy, subscribe the body, and bind the pair
    ///
    /// Nothing is created if the world rejects the body.
    pub fn spawn(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        spec: SpawnSpec,
    ) -> Result<EntryId, PhysicsError> {
        let body = RigidBody::new(spec.shape, spec.mass, spec.position, spec.material)
            .with_velocity(spec.velocity)
            .with_orientation(spec.orientation);
        let orientation = body.orientation;
        let body_key = world.add_body(body)?;

        let scale = spec.shape.visual_scale();
        let proxy = scene.add_proxy(VisualProxy::new(spec.mesh(), spec.position, orientation, scale));
        let listener = world.subscribe(body_key);

        let id = self.entries.insert(ObjectEntry {
            body: body_key,
            proxy,
            material: spec.material,
            listener,
            scale,
        });
        self.order.push(id);
        self.by_body.insert(body_key, id);

        log::debug!(
            "Spawned {:?} {:?} at {:?} ({} live)",
            spec.mesh(),
            id,
            spec.position.to_array(),
            self.entries.len()
        );
        Ok(id)
    }

    /// Spawn `count` random objects
    pub fn grow(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        spawner: &mut Spawner,
        count: usize,
    ) -> Result<Vec<EntryId>, PhysicsError> {
        (0..count)
            .map(|_| self.spawn(world, scene, spawner.random_object()))
            .collect()
    }

    /// Retire the `count` most recently spawned objects; returns how many went
    pub fn shrink(&mut self, world: &mut PhysicsWorld, scene: &mut dyn Scene, count: usize) -> usize {
        let mut removed = 0;
        while removed < count {
            let Some(&id) = self.order.last() else {
                break;
            };
            self.remove(world, scene, id);
            removed += 1;
        }
        removed
    }

    /// Unsubscribe, remove the body, remove the proxy
    ///
    /// Stale ids are a no-op returning `false`.
    pub fn remove(&mut self, world: &mut PhysicsWorld, scene: &mut dyn Scene, id: EntryId) -> bool {
        let Some(entry) = self.entries.remove(id) else {
            log::trace!("Ignoring removal of stale entry {:?}", id);
            return false;
        };
        self.order.retain(|&other| other != id);
        self.by_body.remove(entry.body);

        if let Some(token) = entry.listener {
            world.unsubscribe(token);
        }
        world.remove_body(entry.body);
        scene.remove_proxy(entry.proxy);

        log::debug!("Removed {:?} ({} live)", id, self.entries.len());
        true
    }

    /// Remove every object; calling it again removes nothing
    pub fn remove_all(&mut self, world: &mut PhysicsWorld, scene: &mut dyn Scene) -> usize {
        let ids = std::mem::take(&mut self.order);
        let mut removed = 0;
        for id in ids {
            if self.remove(world, scene, id) {
                removed += 1;
            }
        }
        removed
    }

    /// Visit every entry live when the traversal starts, oldest first
    ///
    /// The visitor gets the registry back and may remove entries, including
    /// ones not yet visited; those are skipped.
    pub fn for_each<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Self, EntryId),
    {
        let snapshot = self.order.clone();
        for id in snapshot {
            if self.entries.contains_key(id) {
                visit(self, id);
            }
        }
    }

    /// Copy the body's pose onto its proxy
    ///
    /// Returns the synced position, or `None` for a stale id.
    pub fn sync_transform(&self, world: &PhysicsWorld, scene: &mut dyn Scene, id: EntryId) -> Option<Vec3> {
        let entry = self.entries.get(id)?;
        let body = world.get_body(entry.body)?;
        scene.set_transform(entry.proxy, body.position, body.orientation);
        Some(body.position)
    }

    pub fn get(&self, id: EntryId) -> Option<&ObjectEntry> {
        self.entries.get(id)
    }

    /// Entry owning a body
    pub fn entry_for_body(&self, body: BodyKey) -> Option<EntryId> {
        self.by_body.get(body).copied()
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live ids in spawn order
    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.order.iter().copied()
    }
}
