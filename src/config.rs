//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. Built-in defaults
//! 2. `config/default.toml` (version controlled)
//! 3. `config/user.toml` (gitignored, user overrides)
//! 4. Environment variables (`TUMBLE_SECTION__KEY`)

use figment::{Figment, providers::{Env, Format, Serialized, Toml}};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tumble_core::{BoundsCuller, CollisionAudioDispatcher, SpawnSettings};
use tumble_physics::{Broadphase, ContactMaterial, ContactPolicy, MaterialTag, PhysicsError};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physics configuration
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Declared materials
    #[serde(default = "default_materials")]
    pub materials: Vec<MaterialConfig>,
    /// Contact parameters for every pair of materials that can touch
    #[serde(default = "default_contacts")]
    pub contacts: Vec<ContactConfig>,
    /// Collision sound configuration
    #[serde(default)]
    pub audio: AudioConfig,
    /// Play area
    #[serde(default)]
    pub arena: ArenaConfig,
    /// Random spawning
    #[serde(default)]
    pub spawn: SpawnConfig,
    /// Headless run driver
    #[serde(default)]
    pub run: RunConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            materials: default_materials(),
            contacts: default_contacts(),
            audio: AudioConfig::default(),
            arena: ArenaConfig::default(),
            spawn: SpawnConfig::default(),
            run: RunConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Built-in defaults
    /// 2. `config/default.toml`
    /// 3. `config/user.toml`
    /// 4. Environment variables (`TUMBLE_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // TUMBLE_PHYSICS__GRAVITY=-5 -> physics.gravity = -5.0
        figment = figment.merge(Env::prefixed("TUMBLE_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        if p.fixed_timestep.is_nan() || p.fixed_timestep <= 0.0 {
            return Err(ConfigError::Invalid(format!("physics.fixed_timestep must be positive, got {}", p.fixed_timestep)));
        }
        if p.max_substeps == 0 {
            return Err(ConfigError::Invalid("physics.max_substeps must be at least 1".into()));
        }
        if p.max_frame_delta.is_nan() || p.max_frame_delta <= 0.0 {
            return Err(ConfigError::Invalid(format!("physics.max_frame_delta must be positive, got {}", p.max_frame_delta)));
        }
        let a = &self.audio;
        if a.impact_ceiling.is_nan() || a.impact_ceiling <= 0.0 {
            return Err(ConfigError::Invalid(format!("audio.impact_ceiling must be positive, got {}", a.impact_ceiling)));
        }
        if !a.audibility_threshold.is_finite() || a.audibility_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!("audio.audibility_threshold must be finite and not negative, got {}", a.audibility_threshold)));
        }
        if !(0.0..=1.0).contains(&a.despawn_volume) {
            return Err(ConfigError::Invalid(format!("audio.despawn_volume must be within [0, 1], got {}", a.despawn_volume)));
        }
        let r = self.arena.boundary_radius;
        if !r.is_finite() || r < 0.0 {
            return Err(ConfigError::Invalid(format!("arena.boundary_radius must be finite and not negative, got {}", r)));
        }
        let s = &self.spawn;
        if s.min_radius.is_nan() || s.min_radius <= 0.0 || s.min_radius > s.max_radius {
            return Err(ConfigError::Invalid(format!("spawn radius range [{}, {}) is invalid", s.min_radius, s.max_radius)));
        }
        if s.min_extent.is_nan() || s.min_extent <= 0.0 || s.min_extent > s.max_extent {
            return Err(ConfigError::Invalid(format!("spawn extent range [{}, {}) is invalid", s.min_extent, s.max_extent)));
        }
        if self.run.target_fps == 0 {
            return Err(ConfigError::Invalid("run.target_fps must be at least 1".into()));
        }
        Ok(())
    }

    /// Build the material registry and contact table
    pub fn contact_policy(&self) -> Result<ContactPolicy, ConfigError> {
        let mut builder = ContactPolicy::builder();
        for material in &self.materials {
            builder = if material.static_only {
                builder.static_material(material.name.as_str())
            } else {
                builder.material(material.name.as_str())
            };
        }
        for contact in &self.contacts {
            builder = builder.contact(
                contact.a.as_str(),
                contact.b.as_str(),
                ContactMaterial::new(contact.friction, contact.restitution),
            );
        }
        Ok(builder.build()?)
    }

    /// Engine-side physics settings
    pub fn world_config(&self) -> tumble_physics::PhysicsConfig {
        let p = &self.physics;
        tumble_physics::PhysicsConfig {
            gravity: tumble_math::Vec3::new(0.0, p.gravity, 0.0),
            broadphase: p.broadphase,
            allow_sleep: p.allow_sleep,
            sleep_speed_limit: p.sleep_speed_limit,
            sleep_time_limit: p.sleep_time_limit,
            linear_damping: p.linear_damping,
            angular_damping: p.angular_damping,
            restitution_threshold: p.restitution_threshold,
        }
    }

    /// Impact sound banks keyed by the policy's material tags
    pub fn audio_dispatcher(&self, policy: &ContactPolicy) -> Result<CollisionAudioDispatcher, ConfigError> {
        let mut dispatcher = CollisionAudioDispatcher::new(self.audio.impact_ceiling, self.audio.audibility_threshold);
        for bank in &self.audio.banks {
            let tag = resolve(policy, "audio.banks", &bank.material)?;
            dispatcher = dispatcher.with_bank(tag, bank.bank.as_str(), bank.attenuation);
        }
        Ok(dispatcher)
    }

    pub fn bounds_culler(&self) -> BoundsCuller {
        BoundsCuller::new(self.arena.boundary_radius, self.audio.despawn_bank.as_str(), self.audio.despawn_volume)
    }

    pub fn spawn_settings(&self) -> SpawnSettings {
        let s = &self.spawn;
        SpawnSettings {
            spawn_height: s.spawn_height,
            spawn_spread: s.spawn_spread,
            min_radius: s.min_radius,
            max_radius: s.max_radius,
            min_extent: s.min_extent,
            max_extent: s.max_extent,
            mass: s.mass,
        }
    }

    /// Materials used for floor, spheres and boxes, in that order
    pub fn spawn_materials(&self, policy: &ContactPolicy) -> Result<(MaterialTag, MaterialTag, MaterialTag), ConfigError> {
        Ok((
            resolve(policy, "physics.floor_material", &self.physics.floor_material)?,
            resolve(policy, "spawn.ball_material", &self.spawn.ball_material)?,
            resolve(policy, "spawn.cube_material", &self.spawn.cube_material)?,
        ))
    }
}

fn resolve(policy: &ContactPolicy, key: &'static str, name: &str) -> Result<MaterialTag, ConfigError> {
    policy.tag(name).ok_or_else(|| ConfigError::UnknownMaterial {
        key,
        name: name.to_string(),
    })
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity along Y (negative = downward)
    pub gravity: f32,
    /// Size of one substep in seconds
    pub fixed_timestep: f32,
    /// Substep budget per frame
    pub max_substeps: u32,
    /// Longest frame delta fed to the world
    pub max_frame_delta: f32,
    /// Candidate pair strategy (`brute_force` or `sweep_and_prune`)
    pub broadphase: Broadphase,
    pub allow_sleep: bool,
    pub sleep_speed_limit: f32,
    pub sleep_time_limit: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Closing speed below which contacts never bounce
    pub restitution_threshold: f32,
    /// Floor Y position
    pub floor_y: f32,
    pub floor_material: String,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 3,
            max_frame_delta: 0.25,
            broadphase: Broadphase::SweepAndPrune,
            allow_sleep: true,
            sleep_speed_limit: 0.1,
            sleep_time_limit: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
            restitution_threshold: 0.5,
            floor_y: 0.0,
            floor_material: "floor".to_string(),
        }
    }
}

/// A declared material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    pub name: String,
    /// Reserved for static geometry
    #[serde(default)]
    pub static_only: bool,
}

/// Contact parameters for one material pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactConfig {
    pub a: String,
    pub b: String,
    pub friction: f32,
    pub restitution: f32,
}

fn default_materials() -> Vec<MaterialConfig> {
    let material = |name: &str, static_only| MaterialConfig {
        name: name.to_string(),
        static_only,
    };
    vec![material("floor", true), material("ball", false), material("cube", false)]
}

fn default_contacts() -> Vec<ContactConfig> {
    let contact = |a: &str, b: &str, friction, restitution| ContactConfig {
        a: a.to_string(),
        b: b.to_string(),
        friction,
        restitution,
    };
    vec![
        contact("floor", "ball", 0.1, 0.7),
        contact("floor", "cube", 0.1, 0.3),
        contact("ball", "ball", 0.3, 0.0),
        contact("ball", "cube", 0.3, 0.0),
        contact("cube", "cube", 0.3, 0.0),
    ]
}

/// Collision sound configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Impact strength that plays at full volume
    pub impact_ceiling: f32,
    /// Impacts at or below this are silent
    pub audibility_threshold: f32,
    pub banks: Vec<BankConfig>,
    /// Played when an object leaves the arena
    pub despawn_bank: String,
    pub despawn_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            impact_ceiling: 10.0,
            audibility_threshold: 0.7,
            banks: vec![
                BankConfig {
                    material: "ball".to_string(),
                    bank: "bounce".to_string(),
                    attenuation: 0.5,
                },
                BankConfig {
                    material: "cube".to_string(),
                    bank: "hit".to_string(),
                    attenuation: 1.0,
                },
            ],
            despawn_bank: "bubble".to_string(),
            despawn_volume: 0.6,
        }
    }
}

/// Sound bank for one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    pub material: String,
    pub bank: String,
    pub attenuation: f32,
}

/// Play area
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Objects with |x| or |z| beyond this are removed
    pub boundary_radius: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self { boundary_radius: 5.0 }
    }
}

/// Random spawning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Seed for the spawn RNG
    pub seed: u64,
    pub spawn_height: f32,
    /// Width of the square spawn points are drawn from
    pub spawn_spread: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_extent: f32,
    pub max_extent: f32,
    pub mass: f32,
    pub ball_material: String,
    pub cube_material: String,
    /// Radius of the sphere dropped at the center on startup (0 = none)
    pub starter_radius: f32,
    pub initial_spheres: usize,
    pub initial_boxes: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            spawn_height: 3.0,
            spawn_spread: 3.0,
            min_radius: 0.05,
            max_radius: 0.5,
            min_extent: 0.1,
            max_extent: 1.0,
            mass: 1.0,
            ball_material: "ball".to_string(),
            cube_material: "cube".to_string(),
            starter_radius: 0.5,
            initial_spheres: 0,
            initial_boxes: 0,
        }
    }
}

/// Headless run driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Frames to run (0 = until killed)
    pub frames: u64,
    pub target_fps: u32,
    /// Spawn one random object every this many frames (0 = never)
    pub spawn_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            target_fps: 60,
            spawn_every: 60,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed
    #[error("Configuration error: {0}")]
    Load(String),
    /// A value is out of range
    #[error("Configuration error: {0}")]
    Invalid(String),
    /// A section names a material that was never declared
    #[error("Configuration error: {key} names unknown material `{name}`")]
    UnknownMaterial { key: &'static str, name: String },
    /// The material/contact tables are inconsistent
    #[error("Configuration error: {0}")]
    Physics(#[from] PhysicsError),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(e.to_string())
    }
}
