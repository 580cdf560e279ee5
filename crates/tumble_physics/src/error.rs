//! Physics error types

use thiserror::Error;

use crate::material::MaterialTag;

/// Setup-time errors; the world never produces these during a step
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("Unknown material tag: {0}")]
    UnknownMaterial(MaterialTag),

    #[error("Material '{0}' is reserved for static geometry")]
    StaticOnlyMaterial(String),

    #[error("Material '{0}' is used but never declared")]
    UndeclaredMaterial(String),

    #[error("Material '{0}' declared more than once")]
    DuplicateMaterial(String),

    #[error("Too many materials: {0}")]
    TooManyMaterials(usize),

    #[error("No contact material for pair '{0}' x '{1}'")]
    MissingContactPair(String, String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid mass {0} (must be finite and >= 0)")]
    InvalidMass(f32),
}
