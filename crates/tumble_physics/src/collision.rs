//! Narrowphase collision detection
//!
//! Every test returns a [`Contact`] whose normal points from the second
//! shape toward the first, i.e. the direction the first shape must move to
//! separate.

use crate::shapes::{Aabb, Collider, Cuboid, Plane, Sphere};
use tumble_math::Vec3;

/// Contact information from a collision
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    /// Point of contact in world space
    pub point: Vec3,
    /// Unit normal pointing from the second shape toward the first
    pub normal: Vec3,
    /// Penetration depth (positive means overlapping)
    pub penetration: f32,
}

impl Contact {
    /// Create a new contact
    pub fn new(point: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            point,
            normal,
            penetration,
        }
    }

    /// Check if this represents an actual collision (positive penetration)
    pub fn is_colliding(&self) -> bool {
        self.penetration > 0.0
    }

    /// Same contact seen from the other shape
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Test sphere vs plane collision
///
/// The contact normal is the plane normal (from the plane toward the sphere).
pub fn sphere_vs_plane(sphere: &Sphere, plane: &Plane) -> Option<Contact> {
    let signed_dist = plane.signed_distance(sphere.center);

    // radius - signed_dist covers both the center-above and center-below cases
    let penetration = sphere.radius - signed_dist;

    if penetration > 0.0 {
        let normal = plane.normal;
        let point = sphere.center - normal * sphere.radius;
        Some(Contact::new(point, normal, penetration))
    } else {
        None
    }
}

/// Test oriented box vs plane collision
///
/// Uses the box's projected radius along the plane normal, so it is exact
/// for any orientation.
pub fn cuboid_vs_plane(cuboid: &Cuboid, plane: &Plane) -> Option<Contact> {
    let radius = cuboid.projected_radius(plane.normal);
    let signed_dist = plane.signed_distance(cuboid.center);
    let penetration = radius - signed_dist;

    if penetration > 0.0 {
        let normal = plane.normal;
        let point = cuboid.center - normal * radius;
        Some(Contact::new(point, normal, penetration))
    } else {
        None
    }
}

/// Sphere vs sphere; normal points from `b` toward `a`
pub fn sphere_vs_sphere(a: &Sphere, b: &Sphere) -> Option<Contact> {
    let delta = a.center - b.center;
    let dist_sq = delta.length_squared();
    let min_dist = a.radius + b.radius;

    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: separate vertically
    let normal = if dist > 0.0001 { delta / dist } else { Vec3::Y };
    let point = b.center + normal * b.radius;
    Some(Contact::new(point, normal, min_dist - dist))
}

/// Sphere vs oriented box; normal points from the box toward the sphere
pub fn sphere_vs_cuboid(sphere: &Sphere, cuboid: &Cuboid) -> Option<Contact> {
    let inv = cuboid.orientation.conjugate();
    let local = inv.rotate(sphere.center - cuboid.center);
    let h = cuboid.half_extents;
    let closest = local.clamp_components(-h, h);
    let delta = local - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > sphere.radius * sphere.radius {
        return None;
    }

    let (local_normal, penetration) = if dist_sq > 0.0001 * 0.0001 {
        let dist = dist_sq.sqrt();
        (delta / dist, sphere.radius - dist)
    } else {
        // Center inside the box: leave through the nearest face
        let to_face = [
            (h.x - local.x, Vec3::X),
            (h.x + local.x, -Vec3::X),
            (h.y - local.y, Vec3::Y),
            (h.y + local.y, -Vec3::Y),
            (h.z - local.z, Vec3::Z),
            (h.z + local.z, -Vec3::Z),
        ];
        let mut best = to_face[0];
        for candidate in &to_face[1..] {
            if candidate.0 < best.0 {
                best = *candidate;
            }
        }
        (best.1, best.0 + sphere.radius)
    };

    if penetration <= 0.0 {
        return None;
    }

    let normal = cuboid.orientation.rotate(local_normal);
    let point = cuboid.center + cuboid.orientation.rotate(closest);
    Some(Contact::new(point, normal, penetration))
}

/// Test AABB vs AABB collision; normal points from `b` toward `a`
pub fn aabb_vs_aabb(a: &Aabb, b: &Aabb) -> Option<Contact> {
    if !a.overlaps(b) {
        return None;
    }

    let overlap_x = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let overlap_y = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    let overlap_z = a.max.z.min(b.max.z) - a.min.z.max(b.min.z);

    let ca = a.center();
    let cb = b.center();

    // Minimum overlap axis is the separation direction
    let mut penetration = overlap_x;
    let mut normal = if ca.x < cb.x { -Vec3::X } else { Vec3::X };

    if overlap_y < penetration {
        penetration = overlap_y;
        normal = if ca.y < cb.y { -Vec3::Y } else { Vec3::Y };
    }
    if overlap_z < penetration {
        penetration = overlap_z;
        normal = if ca.z < cb.z { -Vec3::Z } else { Vec3::Z };
    }

    let point = a.min.max_components(b.min).lerp(a.max.min_components(b.max), 0.5);
    Some(Contact::new(point, normal, penetration))
}

/// Dispatch a world-space collider pair to the matching test
///
/// Box-box contacts use the boxes' world AABBs, which is exact for
/// axis-aligned boxes and conservative for rotated ones.
pub fn collide(a: &Collider, b: &Collider) -> Option<Contact> {
    match (a, b) {
        (Collider::Sphere(sa), Collider::Sphere(sb)) => sphere_vs_sphere(sa, sb),
        (Collider::Sphere(s), Collider::Cuboid(c)) => sphere_vs_cuboid(s, c),
        (Collider::Cuboid(c), Collider::Sphere(s)) => sphere_vs_cuboid(s, c).map(Contact::flipped),
        (Collider::Cuboid(ca), Collider::Cuboid(cb)) => aabb_vs_aabb(&ca.aabb(), &cb.aabb()),
    }
}

/// Test a world-space collider against a plane
pub fn collide_plane(collider: &Collider, plane: &Plane) -> Option<Contact> {
    match collider {
        Collider::Sphere(s) => sphere_vs_plane(s, plane),
        Collider::Cuboid(c) => cuboid_vs_plane(c, plane),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tumble_math::Quat;

    #[test]
    fn test_sphere_vs_plane_above() {
        let sphere = Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5);
        assert!(sphere_vs_plane(&sphere, &Plane::floor(0.0)).is_none());
    }

    #[test]
    fn test_sphere_vs_plane_colliding() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.3, 0.0), 0.5);
        let contact = sphere_vs_plane(&sphere, &Plane::floor(0.0)).unwrap();
        assert!((contact.penetration - 0.2).abs() < 0.0001);
        assert_eq!(contact.normal, Vec3::Y);
        assert!(contact.point.y.abs() < 0.31);
    }

    #[test]
    fn test_cuboid_vs_plane_colliding() {
        let cuboid = Cuboid::new(Vec3::new(0.0, 0.4, 0.0), Vec3::splat(0.5), Quat::IDENTITY);
        let contact = cuboid_vs_plane(&cuboid, &Plane::floor(0.0)).unwrap();
        assert!((contact.penetration - 0.1).abs() < 0.0001);
        assert_eq!(contact.normal, Vec3::Y);
    }

    #[test]
    fn test_rotated_cuboid_reaches_deeper() {
        let rotated = Cuboid::new(
            Vec3::new(0.0, 0.6, 0.0),
            Vec3::splat(0.5),
            Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4),
        );
        // Resting on an edge the box reaches sqrt(2)/2 below its center
        let contact = cuboid_vs_plane(&rotated, &Plane::floor(0.0)).unwrap();
        assert!((contact.penetration - (0.5 * 2.0_f32.sqrt() - 0.6)).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_vs_sphere_normal_points_at_first() {
        let a = Sphere::new(Vec3::new(0.8, 0.0, 0.0), 0.5);
        let b = Sphere::new(Vec3::ZERO, 0.5);
        let contact = sphere_vs_sphere(&a, &b).unwrap();
        assert!((contact.normal - Vec3::X).length() < 0.0001);
        assert!((contact.penetration - 0.2).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_vs_cuboid_face() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.9, 0.0), 0.5);
        let cuboid = Cuboid::new(Vec3::ZERO, Vec3::splat(0.5), Quat::IDENTITY);
        let contact = sphere_vs_cuboid(&sphere, &cuboid).unwrap();
        assert!((contact.normal - Vec3::Y).length() < 0.0001);
        assert!((contact.penetration - 0.1).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_vs_cuboid_no_collision() {
        let sphere = Sphere::new(Vec3::new(2.0, 0.0, 0.0), 0.5);
        let cuboid = Cuboid::new(Vec3::ZERO, Vec3::splat(0.5), Quat::IDENTITY);
        assert!(sphere_vs_cuboid(&sphere, &cuboid).is_none());
    }

    #[test]
    fn test_sphere_center_inside_cuboid() {
        let sphere = Sphere::new(Vec3::new(0.4, 0.0, 0.0), 0.2);
        let cuboid = Cuboid::new(Vec3::ZERO, Vec3::splat(0.5), Quat::IDENTITY);
        let contact = sphere_vs_cuboid(&sphere, &cuboid).unwrap();
        assert!((contact.normal - Vec3::X).length() < 0.0001);
        assert!((contact.penetration - 0.3).abs() < 0.0001);
    }

    #[test]
    fn test_aabb_vs_aabb_colliding() {
        let a = Aabb::new(Vec3::new(0.8, 0.0, 0.0), Vec3::new(1.8, 1.0, 1.0));
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let contact = aabb_vs_aabb(&a, &b).unwrap();
        assert_eq!(contact.normal, Vec3::X);
        assert!((contact.penetration - 0.2).abs() < 0.0001);
    }

    #[test]
    fn test_collide_flips_for_cuboid_first() {
        let cuboid = Collider::Cuboid(Cuboid::new(Vec3::ZERO, Vec3::splat(0.5), Quat::IDENTITY));
        let sphere = Collider::Sphere(Sphere::new(Vec3::new(0.0, 0.9, 0.0), 0.5));
        let contact = collide(&cuboid, &sphere).unwrap();
        // Pushes the cuboid away from the sphere
        assert!((contact.normal + Vec3::Y).length() < 0.0001);
    }
}
