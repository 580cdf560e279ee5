//! Rigid body types

use crate::material::MaterialTag;
use crate::shapes::{Aabb, BodyShape, Collider, Plane};
use slotmap::new_key_type;
use tumble_math::{Quat, Vec3};

// Define generational key type for rigid bodies
new_key_type! {
    /// Key to a rigid body in the physics world
    ///
    /// Uses generational indexing to prevent the ABA problem where a handle
    /// could point to a reused slot. If a body is removed and its slot reused,
    /// old keys will return None instead of pointing to the wrong body.
    pub struct BodyKey;
}

/// A rigid body with pose, velocity, shape and material
///
/// A mass of zero makes the body static: it is never integrated and acts as
/// an immovable obstacle in contact response.
#[derive(Clone, Debug)]
pub struct RigidBody {
    /// Center of mass in world space
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Linear velocity (units per second)
    pub velocity: Vec3,
    /// Angular velocity (radians per second, world axes)
    pub angular_velocity: Vec3,
    /// Mass; 0 = static
    pub mass: f32,
    /// Material used for contact parameters; fixed for the body's lifetime
    material: MaterialTag,
    /// Local collision shape
    shape: BodyShape,
    sleeping: bool,
    /// Seconds spent below the sleep speed limit
    idle_time: f32,
}

impl RigidBody {
    /// Create a body at rest
    pub fn new(shape: BodyShape, mass: f32, position: Vec3, material: MaterialTag) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            material,
            shape,
            sleeping: false,
            idle_time: 0.0,
        }
    }

    /// Create a sphere body
    pub fn sphere(radius: f32, mass: f32, position: Vec3, material: MaterialTag) -> Self {
        Self::new(BodyShape::sphere(radius), mass, position, material)
    }

    /// Create a box body from full width/height/depth
    pub fn cuboid(size: Vec3, mass: f32, position: Vec3, material: MaterialTag) -> Self {
        Self::new(BodyShape::cuboid(size.x, size.y, size.z), mass, position, material)
    }

    /// Set the velocity of this body
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the angular velocity of this body
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set the initial orientation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation.normalize();
        self
    }

    pub fn material(&self) -> MaterialTag {
        self.material
    }

    pub fn shape(&self) -> &BodyShape {
        &self.shape
    }

    /// Static bodies have zero mass
    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    /// 1/mass, or 0 for static bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Whether the step integrates this body
    pub fn is_awake_dynamic(&self) -> bool {
        !self.is_static() && !self.sleeping
    }

    /// Put the body back into the simulation
    pub fn wake(&mut self) {
        self.sleeping = false;
        self.idle_time = 0.0;
    }

    pub(crate) fn sleep(&mut self) {
        self.sleeping = true;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Track time spent nearly at rest; returns true once the body should sleep
    pub(crate) fn accumulate_idle(&mut self, dt: f32, speed_limit: f32, time_limit: f32) -> bool {
        let speed_sq = self.velocity.length_squared() + self.angular_velocity.length_squared();
        if speed_sq < speed_limit * speed_limit {
            self.idle_time += dt;
        } else {
            self.idle_time = 0.0;
        }
        self.idle_time >= time_limit
    }

    /// Shape placed at the body's current pose
    pub fn collider(&self) -> Collider {
        self.shape.collider(self.position, self.orientation)
    }

    /// World-space bounds at the current pose
    pub fn aabb(&self) -> Aabb {
        self.collider().aabb()
    }

    /// Apply a positional correction (e.g., from collision resolution)
    pub fn apply_correction(&mut self, correction: Vec3) {
        self.position += correction;
    }
}

/// Immovable infinite plane, e.g. the floor
#[derive(Clone, Copy, Debug)]
pub struct StaticCollider {
    pub plane: Plane,
    pub material: MaterialTag,
}

impl StaticCollider {
    /// Horizontal floor at height `y`
    pub fn floor(y: f32, material: MaterialTag) -> Self {
        Self {
            plane: Plane::floor(y),
            material,
        }
    }

    /// Arbitrary plane
    pub fn plane(normal: Vec3, distance: f32, material: MaterialTag) -> Self {
        Self {
            plane: Plane::new(normal, distance),
            material,
        }
    }
}
