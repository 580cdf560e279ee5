//! tumble - physics-to-render synchronization
//!
//! Rigid bodies fall, bounce and collide in a [`tumble_physics::PhysicsWorld`];
//! every frame their poses are copied onto visual proxies, objects that leave
//! the arena are retired, and impacts are turned into sounds.

pub mod config;
pub mod systems;
