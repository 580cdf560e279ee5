//! Collision shapes
//!
//! [`BodyShape`] is the local shape descriptor a body is created with.
//! [`Collider`] is the same shape placed in world space for a single query.

use crate::error::PhysicsError;
use tumble_math::{Quat, Vec3};

/// A sphere defined by center and radius
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere at the given center with the given radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point is inside or on the sphere
    pub fn contains(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }
}

/// An oriented box
#[derive(Clone, Copy, Debug)]
pub struct Cuboid {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub orientation: Quat,
}

impl Cuboid {
    pub fn new(center: Vec3, half_extents: Vec3, orientation: Quat) -> Self {
        Self {
            center,
            half_extents,
            orientation,
        }
    }

    /// World-space box axes (columns of the rotation matrix)
    pub fn axes(&self) -> [Vec3; 3] {
        let m = self.orientation.to_matrix();
        [
            Vec3::from_array(m[0]),
            Vec3::from_array(m[1]),
            Vec3::from_array(m[2]),
        ]
    }

    /// Half-length of the box's projection onto a unit direction
    pub fn projected_radius(&self, direction: Vec3) -> f32 {
        let [ax, ay, az] = self.axes();
        self.half_extents.x * ax.dot(direction).abs()
            + self.half_extents.y * ay.dot(direction).abs()
            + self.half_extents.z * az.dot(direction).abs()
    }

    /// Tightest axis-aligned box containing this cuboid
    pub fn aabb(&self) -> Aabb {
        let extent = Vec3::new(
            self.projected_radius(Vec3::X),
            self.projected_radius(Vec3::Y),
            self.projected_radius(Vec3::Z),
        );
        Aabb::from_center_half_extents(self.center, extent)
    }
}

/// An axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a position with given half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents (half the size in each dimension)
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if a point is inside or on the AABB
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// True if the two boxes overlap or touch
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// An infinite plane defined by normal and distance from origin
///
/// The plane equation is: normal · point = distance
/// Points with normal · point > distance are "above" the plane (positive side)
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    /// Unit normal vector pointing to the positive side
    pub normal: Vec3,
    /// Signed distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from a normal and distance
    ///
    /// The normal will be normalized automatically.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalized(),
            distance,
        }
    }

    /// Create a plane from a point on the plane and a normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            distance: n.dot(point),
        }
    }

    /// Create a horizontal floor plane at the given Y height
    pub fn floor(y: f32) -> Self {
        Self::from_point_normal(Vec3::new(0.0, y, 0.0), Vec3::Y)
    }

    /// Signed distance from a point to the plane (positive = above)
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Local shape descriptor of a rigid body
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

impl BodyShape {
    pub fn sphere(radius: f32) -> Self {
        BodyShape::Sphere { radius }
    }

    /// Box from full width/height/depth
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        BodyShape::Cuboid {
            half_extents: Vec3::new(width * 0.5, height * 0.5, depth * 0.5),
        }
    }

    /// Reject degenerate or non-finite dimensions
    pub fn validate(&self) -> Result<(), PhysicsError> {
        match *self {
            BodyShape::Sphere { radius } => {
                if radius.is_finite() && radius > 0.0 {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(format!("sphere radius {radius}")))
                }
            }
            BodyShape::Cuboid { half_extents } => {
                if half_extents.is_finite() && half_extents.min_element() > 0.0 {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(format!(
                        "box half-extents {:?}",
                        half_extents.to_array()
                    )))
                }
            }
        }
    }

    /// Place the shape in world space
    pub fn collider(&self, position: Vec3, orientation: Quat) -> Collider {
        match *self {
            BodyShape::Sphere { radius } => Collider::Sphere(Sphere::new(position, radius)),
            BodyShape::Cuboid { half_extents } => {
                Collider::Cuboid(Cuboid::new(position, half_extents, orientation))
            }
        }
    }

    /// Scale for a proxy mesh: a unit-radius sphere or a unit cube
    pub fn visual_scale(&self) -> Vec3 {
        match *self {
            BodyShape::Sphere { radius } => Vec3::splat(radius),
            BodyShape::Cuboid { half_extents } => half_extents * 2.0,
        }
    }
}

/// A shape placed in world space
#[derive(Clone, Copy, Debug)]
pub enum Collider {
    Sphere(Sphere),
    Cuboid(Cuboid),
}

impl Collider {
    pub fn center(&self) -> Vec3 {
        match self {
            Collider::Sphere(s) => s.center,
            Collider::Cuboid(c) => c.center,
        }
    }

    pub fn aabb(&self) -> Aabb {
        match self {
            Collider::Sphere(s) => Aabb::from_center_half_extents(s.center, Vec3::splat(s.radius)),
            Collider::Cuboid(c) => c.aabb(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_sphere_contains() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        assert!(sphere.contains(Vec3::new(0.5, 0.0, 0.0)));
        assert!(sphere.contains(Vec3::new(1.0, 0.0, 0.0))); // on surface
        assert!(!sphere.contains(Vec3::new(1.1, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_from_center_half_extents() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(0.5));
        assert_eq!(aabb.min, Vec3::new(0.5, 1.5, 2.5));
        assert_eq!(aabb.max, Vec3::new(1.5, 2.5, 3.5));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_aabb_overlaps() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(2.0));
        let c = Aabb::new(Vec3::splat(1.5), Vec3::splat(2.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_rotated_cuboid_aabb_grows() {
        let c = Cuboid::new(
            Vec3::ZERO,
            Vec3::splat(0.5),
            Quat::from_axis_angle(Vec3::Y, FRAC_PI_4),
        );
        let aabb = c.aabb();
        // Diagonal of a unit square is sqrt(2)
        assert!((aabb.max.x - 0.5 * 2.0_f32.sqrt()).abs() < 0.0001);
        assert!((aabb.max.y - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_plane_signed_distance() {
        let floor = Plane::floor(0.0);
        assert!(floor.signed_distance(Vec3::ZERO).abs() < 0.0001);
        assert!((floor.signed_distance(Vec3::new(0.0, 1.0, 0.0)) - 1.0).abs() < 0.0001);
        assert!((floor.signed_distance(Vec3::new(0.0, -1.0, 0.0)) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_shape_validation() {
        assert!(BodyShape::sphere(0.5).validate().is_ok());
        assert!(BodyShape::sphere(0.0).validate().is_err());
        assert!(BodyShape::sphere(f32::NAN).validate().is_err());
        assert!(BodyShape::cuboid(1.0, 0.5, 0.2).validate().is_ok());
        assert!(BodyShape::cuboid(1.0, 0.0, 0.2).validate().is_err());
    }

    #[test]
    fn test_visual_scale() {
        assert_eq!(BodyShape::sphere(0.3).visual_scale(), Vec3::splat(0.3));
        assert_eq!(
            BodyShape::cuboid(1.0, 0.5, 0.25).visual_scale(),
            Vec3::new(1.0, 0.5, 0.25)
        );
    }
}
