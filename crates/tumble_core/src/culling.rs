//! Horizontal bounds culling
//!
//! Objects that leave the square play area are retired with a despawn cue.
//! Height is unconstrained, so anything still falling or resting inside the
//! square stays.

use serde::{Deserialize, Serialize};
use tumble_math::Vec3;
use tumble_physics::PhysicsWorld;

use crate::audio::AudioSink;
use crate::registry::{EntryId, ObjectRegistry};
use crate::scene::Scene;

/// Removes objects that wander past `boundary_radius` on x or z
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsCuller {
    /// Half-width of the play square
    pub boundary_radius: f32,
    /// Bank played when an object is retired
    pub despawn_bank: String,
    pub despawn_volume: f32,
}

impl Default for BoundsCuller {
    fn default() -> Self {
        Self {
            boundary_radius: 5.0,
            despawn_bank: "bubble".to_string(),
            despawn_volume: 0.6,
        }
    }
}

impl BoundsCuller {
    pub fn new(boundary_radius: f32, despawn_bank: impl Into<String>, despawn_volume: f32) -> Self {
        Self {
            boundary_radius,
            despawn_bank: despawn_bank.into(),
            despawn_volume,
        }
    }

    /// Strictly outside on x or z
    pub fn should_remove(&self, position: Vec3) -> bool {
        position.x.abs() > self.boundary_radius || position.z.abs() > self.boundary_radius
    }

    /// Play the despawn cue once, then remove the entry
    ///
    /// Returns `false` (and plays nothing) for a stale id.
    pub fn retire(
        &self,
        registry: &mut ObjectRegistry,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        audio: &mut dyn AudioSink,
        id: EntryId,
    ) -> bool {
        if !registry.contains(id) {
            return false;
        }
        if let Err(err) = audio.play(&self.despawn_bank, self.despawn_volume) {
            log::debug!("Dropped despawn sound: {err}");
        }
        log::debug!("Culled {:?} outside radius {}", id, self.boundary_radius);
        registry.remove(world, scene, id)
    }

    /// Retire the entry if its body is out of bounds
    pub fn cull(
        &self,
        registry: &mut ObjectRegistry,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        audio: &mut dyn AudioSink,
        id: EntryId,
    ) -> bool {
        let position = registry
            .get(id)
            .and_then(|entry| world.get_body(entry.body))
            .map(|body| body.position);
        match position {
            Some(position) if self.should_remove(position) => self.retire(registry, world, scene, audio, id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::registry::SpawnSpec;
    use crate::scene::SceneGraph;
    use tumble_physics::{ContactMaterial, ContactPolicy, PhysicsConfig};

    #[derive(Default)]
    struct Recorder(Vec<(String, f32)>);

    impl AudioSink for Recorder {
        fn play(&mut self, bank: &str, volume: f32) -> Result<(), AudioError> {
            self.0.push((bank.to_string(), volume));
            Ok(())
        }
    }

    #[test]
    fn test_should_remove_is_strict_and_horizontal() {
        let culler = BoundsCuller::default();
        assert!(!culler.should_remove(Vec3::new(0.0, 3.0, 0.0)));
        assert!(!culler.should_remove(Vec3::new(5.0, 0.0, -5.0)));
        assert!(!culler.should_remove(Vec3::new(0.0, -100.0, 0.0)));
        assert!(culler.should_remove(Vec3::new(5.01, 0.0, 0.0)));
        assert!(culler.should_remove(Vec3::new(0.0, 0.0, -5.01)));
    }

    #[test]
    fn test_retire_plays_cue_once() {
        let policy = ContactPolicy::builder()
            .material("ball")
            .contact("ball", "ball", ContactMaterial::default())
            .build()
            .unwrap();
        let ball = policy.tag("ball").unwrap();
        let mut world = PhysicsWorld::new(PhysicsConfig::default(), policy);
        let mut scene = SceneGraph::new();
        let mut registry = ObjectRegistry::new();
        let mut audio = Recorder::default();
        let culler = BoundsCuller::default();

        let id = registry
            .spawn(&mut world, &mut scene, SpawnSpec::sphere(0.5, Vec3::new(6.0, 1.0, 0.0), ball))
            .unwrap();
        let inside = registry
            .spawn(&mut world, &mut scene, SpawnSpec::sphere(0.5, Vec3::new(0.0, 1.0, 0.0), ball))
            .unwrap();

        assert!(!culler.cull(&mut registry, &mut world, &mut scene, &mut audio, inside));
        assert!(culler.cull(&mut registry, &mut world, &mut scene, &mut audio, id));
        assert!(!culler.retire(&mut registry, &mut world, &mut scene, &mut audio, id));

        assert_eq!(audio.0, vec![("bubble".to_string(), 0.6)]);
        assert_eq!(registry.len(), 1);
        assert_eq!(scene.len(), 1);
        assert_eq!(world.body_count(), 1);
    }
}
