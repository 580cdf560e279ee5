//! Unit quaternion for 3D orientation
//!
//! Stored as (x, y, z, w) with `w` the scalar part, matching the layout
//! renderers expect when copying a body orientation onto a proxy.

use bytemuck::{Pod, Zeroable};
use serde::{Serialize, Deserialize};
use crate::Vec3;

/// Rotation quaternion
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity rotation
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a quaternion from raw components (not normalized)
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis`
    ///
    /// A zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Normalize to unit magnitude
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            let inv = 1.0 / mag;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Conjugate; the inverse rotation for unit quaternions
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Compose two rotations: result = self * other
    /// The composed rotation applies `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        let a = self;
        let b = other;
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }

    /// Rotate a vector: v' = q * v * q⁻¹
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Advance the orientation by angular velocity `omega` (rad/s) over `dt`
    ///
    /// First-order integration q' = q + ½·(ω,0)·q·dt, renormalized.
    pub fn integrate(&self, omega: Vec3, dt: f32) -> Self {
        if omega == Vec3::ZERO || dt <= 0.0 {
            return *self;
        }
        let spin = Self::new(omega.x, omega.y, omega.z, 0.0).compose(self);
        let half_dt = 0.5 * dt;
        Self::new(
            self.x + spin.x * half_dt,
            self.y + spin.y * half_dt,
            self.z + spin.z * half_dt,
            self.w + spin.w * half_dt,
        )
        .normalize()
    }

    /// Rotation matrix as three column vectors
    pub fn to_matrix(&self) -> [[f32; 3]; 3] {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, yy, zz) = (x * x2, y * y2, z * z2);
        let (xy, xz, yz) = (x * y2, x * z2, y * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        [
            [1.0 - (yy + zz), xy + wz, xz - wy],
            [xy - wz, 1.0 - (xx + zz), yz + wx],
            [xz + wy, yz - wx, 1.0 - (xx + yy)],
        ]
    }

    /// Approximate equality, treating q and -q as the same rotation
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        (dot.abs() - 1.0).abs() < epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPSILON: f32 = 0.0001;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn test_identity_rotation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec_approx_eq(Quat::IDENTITY.rotate(v), v));
    }

    #[test]
    fn test_axis_angle_rotation() {
        // 90° about Y takes +X to -Z
        let q = Quat::from_axis_angle(Vec3::Y, FRAC_PI_2);
        assert!(vec_approx_eq(q.rotate(Vec3::X), -Vec3::Z));
    }

    #[test]
    fn test_zero_axis_is_identity() {
        assert_eq!(Quat::from_axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }

    #[test]
    fn test_compose_order() {
        let a = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let b = Quat::from_axis_angle(Vec3::X, FRAC_PI_2);
        let v = Vec3::Y;
        let composed = a.compose(&b).rotate(v);
        let sequential = a.rotate(b.rotate(v));
        assert!(vec_approx_eq(composed, sequential));
    }

    #[test]
    fn test_conjugate_inverts() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7);
        let v = Vec3::new(0.3, -2.0, 5.0);
        assert!(vec_approx_eq(q.conjugate().rotate(q.rotate(v)), v));
    }

    #[test]
    fn test_integrate_half_turn() {
        let mut q = Quat::IDENTITY;
        let omega = Vec3::new(0.0, PI, 0.0);
        for _ in 0..1000 {
            q = q.integrate(omega, 0.001);
        }
        let expected = Quat::from_axis_angle(Vec3::Y, PI);
        assert!(q.approx_eq(&expected, 0.001));
        assert!((q.magnitude() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_to_matrix_matches_rotate() {
        let q = Quat::from_axis_angle(Vec3::new(0.2, 1.0, -0.4), 1.1);
        let m = q.to_matrix();
        let v = Vec3::new(1.0, 2.0, 3.0);
        let by_matrix = Vec3::new(
            m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
            m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
            m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
        );
        assert!(vec_approx_eq(by_matrix, q.rotate(v)));
    }
}
