//! Math types for the tumble engine
//!
//! - [`Vec3`] - 3D vector (Y up)
//! - [`Quat`] - unit quaternion orientation

mod vec3;
mod quat;

pub use vec3::Vec3;
pub use quat::Quat;
