//! Rigid body physics for tumble
//!
//! This crate provides the simulation behind the scene, including:
//! - Collision shapes (spheres, boxes, planes) and narrowphase tests
//! - A material registry with an exhaustive pairwise contact table
//! - Fixed-step rigid body dynamics with gravity, friction and sleeping
//! - Per-body collision event subscriptions

pub mod body;
pub mod broadphase;
pub mod collision;
pub mod error;
pub mod events;
pub mod material;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use body::{BodyKey, RigidBody, StaticCollider};
pub use broadphase::Broadphase;
pub use collision::{collide, collide_plane, Contact};
pub use error::PhysicsError;
pub use events::{CollisionEvent, CollisionPartner, ListenerToken};
pub use material::{ContactMaterial, ContactPolicy, ContactPolicyBuilder, MaterialTag};
pub use shapes::{Aabb, BodyShape, Collider, Cuboid, Plane, Sphere};
pub use world::{PhysicsConfig, PhysicsWorld};
