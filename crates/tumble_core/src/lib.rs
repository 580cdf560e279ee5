//! Core types for tumble: visual proxies, the scene interface, and the
//! object registry that keeps bodies and proxies in lockstep
//!
//! Also home to the bounds culler, the collision audio dispatcher and the
//! random spawn factories.

pub mod audio;
pub mod culling;
pub mod proxy;
pub mod registry;
pub mod scene;
pub mod spawner;

pub use audio::{AudioError, AudioSink, CollisionAudioDispatcher, LogAudioSink, SoundBank};
pub use culling::BoundsCuller;
pub use proxy::{DirtyFlags, ProxyInstance, ProxyMesh, VisualProxy};
pub use registry::{EntryId, ObjectEntry, ObjectRegistry, SpawnSpec};
pub use scene::{ProxyKey, Scene, SceneGraph};
pub use spawner::{SpawnSettings, Spawner};
