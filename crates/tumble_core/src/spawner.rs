//! Seeded random spawn factories
//!
//! A [`Spawner`] turns a seed into an endless, reproducible stream of
//! [`SpawnSpec`]s: spheres and boxes dropped from a fixed height somewhere
//! above the middle of the arena.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tumble_math::Vec3;
use tumble_physics::MaterialTag;

use crate::registry::SpawnSpec;

/// Ranges the spawner samples from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Drop height of every spawned object
    pub spawn_height: f32,
    /// Width of the square (x, z) the spawn point is drawn from
    pub spawn_spread: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Box edge lengths are drawn independently per axis
    pub min_extent: f32,
    pub max_extent: f32,
    /// Mass of every spawned object
    pub mass: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            spawn_height: 3.0,
            spawn_spread: 3.0,
            min_radius: 0.05,
            max_radius: 0.5,
            min_extent: 0.1,
            max_extent: 1.0,
            mass: 1.0,
        }
    }
}

/// Deterministic source of random spheres and boxes
pub struct Spawner {
    rng: ChaCha8Rng,
    settings: SpawnSettings,
    ball: MaterialTag,
    cube: MaterialTag,
}

impl Spawner {
    pub fn new(seed: u64, settings: SpawnSettings, ball: MaterialTag, cube: MaterialTag) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            settings,
            ball,
            cube,
        }
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    /// Sphere with a random radius at a random drop point
    pub fn random_sphere(&mut self) -> SpawnSpec {
        let radius = self.sample(self.settings.min_radius, self.settings.max_radius);
        let position = self.drop_point();
        SpawnSpec::sphere(radius, position, self.ball).with_mass(self.settings.mass)
    }

    /// Box with random edge lengths at a random drop point
    pub fn random_box(&mut self) -> SpawnSpec {
        let (min, max) = (self.settings.min_extent, self.settings.max_extent);
        let size = Vec3::new(self.sample(min, max), self.sample(min, max), self.sample(min, max));
        let position = self.drop_point();
        SpawnSpec::cuboid(size, position, self.cube).with_mass(self.settings.mass)
    }

    /// Coin flip between a sphere and a box
    pub fn random_object(&mut self) -> SpawnSpec {
        if self.rng.gen_bool(0.5) {
            self.random_sphere()
        } else {
            self.random_box()
        }
    }

    fn drop_point(&mut self) -> Vec3 {
        let half = self.settings.spawn_spread * 0.5;
        let x = self.sample(-half, half);
        let z = self.sample(-half, half);
        Vec3::new(x, self.settings.spawn_height, z)
    }

    /// Uniform in `[min, max)`; an empty range yields `min`
    fn sample(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tumble_physics::{BodyShape, ContactMaterial, ContactPolicy};

    fn tags() -> (MaterialTag, MaterialTag) {
        let policy = ContactPolicy::builder()
            .material("ball")
            .material("cube")
            .contact("ball", "ball", ContactMaterial::default())
            .contact("ball", "cube", ContactMaterial::default())
            .contact("cube", "cube", ContactMaterial::default())
            .build()
            .unwrap();
        (policy.tag("ball").unwrap(), policy.tag("cube").unwrap())
    }

    fn spawner(seed: u64) -> Spawner {
        let (ball, cube) = tags();
        Spawner::new(seed, SpawnSettings::default(), ball, cube)
    }

    #[test]
    fn test_sphere_within_ranges() {
        let mut spawner = spawner(7);
        for _ in 0..200 {
            let spec = spawner.random_sphere();
            let BodyShape::Sphere { radius } = spec.shape else {
                panic!("expected a sphere");
            };
            assert!((0.05..0.5).contains(&radius));
            assert!(spec.position.x >= -1.5 && spec.position.x < 1.5);
            assert!(spec.position.z >= -1.5 && spec.position.z < 1.5);
            assert_eq!(spec.position.y, 3.0);
            assert_eq!(spec.mass, 1.0);
        }
    }

    #[test]
    fn test_box_within_ranges() {
        let mut spawner = spawner(7);
        for _ in 0..200 {
            let spec = spawner.random_box();
            let BodyShape::Cuboid { half_extents } = spec.shape else {
                panic!("expected a box");
            };
            let size = half_extents * 2.0;
            for edge in size.to_array() {
                assert!(edge >= 0.1 - 1e-6 && edge < 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = spawner(42);
        let mut b = spawner(42);
        for _ in 0..20 {
            let (sa, sb) = (a.random_object(), b.random_object());
            assert_eq!(sa.shape, sb.shape);
            assert_eq!(sa.position, sb.position);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = spawner(1);
        let mut b = spawner(2);
        assert_ne!(a.random_sphere().position, b.random_sphere().position);
    }

    #[test]
    fn test_empty_range_is_fixed() {
        let (ball, cube) = tags();
        let settings = SpawnSettings {
            min_radius: 0.25,
            max_radius: 0.25,
            spawn_spread: 0.0,
            ..SpawnSettings::default()
        };
        let mut spawner = Spawner::new(3, settings, ball, cube);
        let spec = spawner.random_sphere();
        assert_eq!(spec.shape, BodyShape::sphere(0.25));
        assert_eq!(spec.position, Vec3::new(0.0, 3.0, 0.0));
    }
}
