//! Physics world and simulation

use crate::body::{BodyKey, RigidBody, StaticCollider};
use crate::broadphase::Broadphase;
use crate::collision::{collide, collide_plane, Contact};
use crate::error::PhysicsError;
use crate::events::{CollisionEvent, CollisionPartner, ContactListeners, ListenerToken};
use crate::material::{ContactMaterial, ContactPolicy};
use crate::shapes::BodyShape;
use slotmap::SlotMap;
use tumble_math::Vec3;

/// Tangential speeds below this are treated as zero
const TANGENT_EPSILON: f32 = 0.0001;

/// Extra velocity passes over the contacts of one step
const RELAX_ITERATIONS: usize = 8;

/// Contact found during a step, revisited when relaxing velocities
#[derive(Clone, Copy, Debug)]
enum StepContact {
    Static { body: BodyKey, normal: Vec3 },
    /// `normal` points from `b` towards `a`
    Pair { a: BodyKey, b: BodyKey, normal: Vec3 },
}

/// Configuration for the physics simulation
///
/// Fixed for the lifetime of a world.
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    /// Gravity acceleration
    pub gravity: Vec3,
    /// Candidate pair strategy
    pub broadphase: Broadphase,
    /// Let bodies at rest stop being integrated
    pub allow_sleep: bool,
    /// Combined linear + angular speed under which a body counts as idle
    pub sleep_speed_limit: f32,
    /// Seconds a body must stay idle before it sleeps
    pub sleep_time_limit: f32,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
    /// Closing speeds below this never bounce
    pub restitution_threshold: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            broadphase: Broadphase::SweepAndPrune,
            allow_sleep: true,
            sleep_speed_limit: 0.1,
            sleep_time_limit: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
            restitution_threshold: 0.5,
        }
    }
}

impl PhysicsConfig {
    /// Create a new physics config with the given vertical gravity
    pub fn new(gravity_y: f32) -> Self {
        Self {
            gravity: Vec3::new(0.0, gravity_y, 0.0),
            ..Self::default()
        }
    }

    pub fn with_broadphase(mut self, broadphase: Broadphase) -> Self {
        self.broadphase = broadphase;
        self
    }

    pub fn with_sleep(mut self, allow_sleep: bool) -> Self {
        self.allow_sleep = allow_sleep;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }
}

/// The physics world containing all rigid bodies
pub struct PhysicsWorld {
    /// All rigid bodies in the world (using generational keys)
    bodies: SlotMap<BodyKey, RigidBody>,
    /// Static colliders (floors, walls)
    static_colliders: Vec<StaticCollider>,
    policy: ContactPolicy,
    listeners: ContactListeners,
    /// Contacts of the current step
    contacts: Vec<StepContact>,
    /// Time carried over between `step` calls
    accumulator: f32,
    /// Total simulated seconds
    time: f64,
    config: PhysicsConfig,
}

impl PhysicsWorld {
    /// Create a world; config and policy are fixed from here on
    pub fn new(config: PhysicsConfig, policy: ContactPolicy) -> Self {
        log::info!(
            "Physics world: gravity {:?}, {:?} broadphase, sleep {}, {} materials",
            config.gravity.to_array(),
            config.broadphase,
            if config.allow_sleep { "on" } else { "off" },
            policy.material_count()
        );
        Self {
            bodies: SlotMap::with_key(),
            static_colliders: Vec::new(),
            policy,
            listeners: ContactListeners::default(),
            contacts: Vec::new(),
            accumulator: 0.0,
            time: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn policy(&self) -> &ContactPolicy {
        &self.policy
    }

    /// Add a static collider to the world
    pub fn add_static_collider(&mut self, collider: StaticCollider) -> Result<usize, PhysicsError> {
        if !self.policy.contains(collider.material) {
            return Err(PhysicsError::UnknownMaterial(collider.material));
        }
        self.static_colliders.push(collider);
        Ok(self.static_colliders.len() - 1)
    }

    /// Get immutable access to static colliders
    pub fn static_colliders(&self) -> &[StaticCollider] {
        &self.static_colliders
    }

    /// Add a body to the world and return its key
    ///
    /// Fails immediately on an unregistered material, a static-only material
    /// on a dynamic body, or a degenerate shape/mass.
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyKey, PhysicsError> {
        let material = body.material();
        if !self.policy.contains(material) {
            return Err(PhysicsError::UnknownMaterial(material));
        }
        if !body.mass.is_finite() || body.mass < 0.0 {
            return Err(PhysicsError::InvalidMass(body.mass));
        }
        if !body.is_static() && self.policy.is_static_only(material) {
            let name = self.policy.name(material).unwrap_or_default().to_string();
            return Err(PhysicsError::StaticOnlyMaterial(name));
        }
        body.shape().validate()?;
        Ok(self.bodies.insert(body))
    }

    /// Remove a body from the world and return it
    ///
    /// Its listener and any undelivered events go with it.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<RigidBody> {
        let removed = self.bodies.remove(key)?;
        self.listeners.forget_body(key);
        Some(removed)
    }

    /// Get an immutable reference to a body by key
    pub fn get_body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(key)
    }

    /// Get a mutable reference to a body by key
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.get_mut(key)
    }

    /// Replace a body's velocity, waking it
    pub fn set_velocity(&mut self, key: BodyKey, velocity: Vec3) -> bool {
        match self.bodies.get_mut(key) {
            Some(body) => {
                body.velocity = velocity;
                body.wake();
                true
            }
            None => false,
        }
    }

    /// Get the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterate over all body keys
    pub fn body_keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.bodies.keys()
    }

    pub fn contains_body(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    /// Number of dynamic bodies currently asleep
    pub fn sleeping_count(&self) -> usize {
        self.bodies.values().filter(|b| b.is_sleeping()).count()
    }

    /// Total simulated time in seconds
    pub fn simulated_time(&self) -> f64 {
        self.time
    }

    /// Start delivering collision events for a body
    pub fn subscribe(&mut self, key: BodyKey) -> Option<ListenerToken> {
        if !self.bodies.contains_key(key) {
            return None;
        }
        Some(self.listeners.subscribe(key))
    }

    /// Cancel a subscription; stale tokens are a no-op
    pub fn unsubscribe(&mut self, token: ListenerToken) -> bool {
        self.listeners.unsubscribe(token)
    }

    pub fn is_subscribed(&self, key: BodyKey) -> bool {
        self.listeners.is_subscribed(key)
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Take every event queued since the last drain
    pub fn drain_collision_events(&mut self) -> Vec<CollisionEvent> {
        self.listeners.drain()
    }

    /// Advance the simulation by `frame_delta` seconds
    ///
    /// Time accumulates and is consumed in increments of `fixed_delta`, at
    /// most `max_substeps` per call. Whatever the budget cannot cover is
    /// dropped rather than carried, so a long stall never snowballs. A
    /// non-positive `frame_delta` is a no-op. Returns the substeps taken.
    pub fn step(&mut self, fixed_delta: f32, frame_delta: f32, max_substeps: u32) -> u32 {
        if frame_delta.is_nan() || frame_delta <= 0.0 || fixed_delta.is_nan() || fixed_delta <= 0.0 {
            return 0;
        }
        if max_substeps == 0 {
            return 0;
        }

        self.accumulator += frame_delta;
        let mut substeps = 0;
        while self.accumulator >= fixed_delta && substeps < max_substeps {
            self.internal_step(fixed_delta);
            self.accumulator -= fixed_delta;
            substeps += 1;
        }
        self.accumulator %= fixed_delta;
        substeps
    }

    /// One fixed increment
    ///
    /// This performs:
    /// 1. Gravity, damping and velocity integration for awake dynamic bodies
    /// 2. Static collider collision detection and resolution
    /// 3. Body-body collision detection and resolution
    /// 4. Velocity relaxation over the contacts found in 2 and 3
    /// 5. Pushing bodies back out of static colliders
    /// 6. Sleep bookkeeping
    fn internal_step(&mut self, dt: f32) {
        self.contacts.clear();
        self.integrate(dt);
        self.resolve_static_collisions();
        self.resolve_body_collisions();
        self.relax_contacts();
        self.push_out_of_static_colliders();
        if self.config.allow_sleep {
            self.update_sleep(dt);
        }
        self.time += dt as f64;
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        let linear_keep = (1.0 - self.config.linear_damping).powf(dt);
        let angular_keep = (1.0 - self.config.angular_damping).powf(dt);

        for body in self.bodies.values_mut() {
            if !body.is_awake_dynamic() {
                continue;
            }
            body.velocity += gravity * dt;
            body.velocity *= linear_keep;
            body.angular_velocity *= angular_keep;

            body.position += body.velocity * dt;
            body.orientation = body.orientation.integrate(body.angular_velocity, dt);
        }
    }

    /// Resolve collisions between bodies and static colliders
    fn resolve_static_collisions(&mut self) {
        let threshold = self.config.restitution_threshold;

        for (key, body) in &mut self.bodies {
            if !body.is_awake_dynamic() {
                continue;
            }

            for (index, static_col) in self.static_colliders.iter().enumerate() {
                let Some(contact) = collide_plane(&body.collider(), &static_col.plane) else {
                    continue;
                };
                if !contact.is_colliding() {
                    continue;
                }
                let Some(material) = self.policy.contact(body.material(), static_col.material) else {
                    continue;
                };

                // Push the body out of the static collider
                body.apply_correction(contact.normal * contact.penetration);
                self.contacts.push(StepContact::Static {
                    body: key,
                    normal: contact.normal,
                });

                let velocity_along_normal = body.velocity.dot(contact.normal);
                let impact_strength = (-velocity_along_normal).max(0.0);

                if velocity_along_normal < 0.0 {
                    let restitution = if impact_strength < threshold {
                        0.0
                    } else {
                        material.restitution
                    };
                    let normal_impulse = (1.0 + restitution) * impact_strength;
                    body.velocity += contact.normal * normal_impulse;

                    let tangent = apply_friction_single(body, contact.normal, normal_impulse, material.friction);

                    // Frictional contact makes spheres roll
                    if let BodyShape::Sphere { radius } = *body.shape() {
                        body.angular_velocity = contact.normal.cross(tangent) / radius;
                    }
                }

                self.listeners.emit(CollisionEvent {
                    body: key,
                    material: body.material(),
                    partner: CollisionPartner::Static(index),
                    partner_material: static_col.material,
                    impact_strength,
                    point: contact.point,
                    normal: contact.normal,
                });
            }
        }
    }

    /// Resolve collisions between bodies
    fn resolve_body_collisions(&mut self) {
        // Collect keys and bounds first (needed because we can't iterate and mutate)
        let keys: Vec<BodyKey> = self.bodies.keys().collect();
        let bounds: Vec<_> = keys.iter().map(|&k| self.bodies[k].aabb()).collect();

        for (i, j) in self.config.broadphase.candidate_pairs(&bounds) {
            let (key_a, key_b) = (keys[i], keys[j]);
            let (collider_a, collider_b, active) = {
                let a = &self.bodies[key_a];
                let b = &self.bodies[key_b];
                (a.collider(), b.collider(), a.is_awake_dynamic() || b.is_awake_dynamic())
            };
            // Static/sleeping pairs never move each other
            if !active {
                continue;
            }

            if let Some(contact) = collide(&collider_a, &collider_b) {
                if contact.is_colliding() {
                    self.resolve_body_pair(key_a, key_b, &contact);
                }
            }
        }
    }

    /// Resolve one contact; the normal points from `key_b` toward `key_a`
    fn resolve_body_pair(&mut self, key_a: BodyKey, key_b: BodyKey, contact: &Contact) {
        let wake_speed = self.config.sleep_speed_limit;
        let threshold = self.config.restitution_threshold;
        let Some([a, b]) = self.bodies.get_disjoint_mut([key_a, key_b]) else {
            return;
        };
        let Some(material) = self.policy.contact(a.material(), b.material()) else {
            return;
        };

        // A moving body wakes a sleeping one; otherwise the sleeper acts as static
        wake_on_contact(a, b, wake_speed);
        wake_on_contact(b, a, wake_speed);

        let inv_a = if a.is_awake_dynamic() { a.inverse_mass() } else { 0.0 };
        let inv_b = if b.is_awake_dynamic() { b.inverse_mass() } else { 0.0 };
        let total_inv = inv_a + inv_b;
        if total_inv == 0.0 {
            return;
        }

        let n = contact.normal;
        // Split positional correction by inverse mass
        a.apply_correction(n * (contact.penetration * inv_a / total_inv));
        b.apply_correction(-n * (contact.penetration * inv_b / total_inv));
        self.contacts.push(StepContact::Pair {
            a: key_a,
            b: key_b,
            normal: n,
        });

        let relative_normal = (a.velocity - b.velocity).dot(n);
        let impact_strength = (-relative_normal).max(0.0);

        if relative_normal < 0.0 {
            let restitution = if impact_strength < threshold {
                0.0
            } else {
                material.restitution
            };
            let j = (1.0 + restitution) * impact_strength / total_inv;
            a.velocity += n * (j * inv_a);
            b.velocity -= n * (j * inv_b);

            apply_friction_pair(a, b, n, j, inv_a, inv_b, material);
        }

        let (material_a, material_b) = (a.material(), b.material());
        self.listeners.emit(CollisionEvent {
            body: key_a,
            material: material_a,
            partner: CollisionPartner::Body(key_b),
            partner_material: material_b,
            impact_strength,
            point: contact.point,
            normal: n,
        });
        self.listeners.emit(CollisionEvent {
            body: key_b,
            material: material_b,
            partner: CollisionPartner::Body(key_a),
            partner_material: material_a,
            impact_strength,
            point: contact.point,
            normal: -n,
        });
    }

    /// Cancel approach velocity that one pass over the contacts leaves behind
    ///
    /// A body resting on the floor under another body gets pushed back into
    /// the floor by the pair impulse; alternating passes converge so stacks
    /// come to rest. No restitution, friction or events here.
    fn relax_contacts(&mut self) {
        for _ in 0..RELAX_ITERATIONS {
            for contact in &self.contacts {
                match *contact {
                    StepContact::Static { body, normal } => {
                        let Some(body) = self.bodies.get_mut(body) else {
                            continue;
                        };
                        let approach = body.velocity.dot(normal);
                        if body.is_awake_dynamic() && approach < 0.0 {
                            body.velocity -= normal * approach;
                        }
                    }
                    StepContact::Pair { a, b, normal } => {
                        let Some([a, b]) = self.bodies.get_disjoint_mut([a, b]) else {
                            continue;
                        };
                        let inv_a = if a.is_awake_dynamic() { a.inverse_mass() } else { 0.0 };
                        let inv_b = if b.is_awake_dynamic() { b.inverse_mass() } else { 0.0 };
                        let total_inv = inv_a + inv_b;
                        let relative_normal = (a.velocity - b.velocity).dot(normal);
                        if total_inv == 0.0 || relative_normal >= 0.0 {
                            continue;
                        }
                        let j = -relative_normal / total_inv;
                        a.velocity += normal * (j * inv_a);
                        b.velocity -= normal * (j * inv_b);
                    }
                }
            }
        }
    }

    /// Undo pair corrections that pushed a body into a static collider
    fn push_out_of_static_colliders(&mut self) {
        for body in self.bodies.values_mut() {
            if !body.is_awake_dynamic() {
                continue;
            }
            for static_col in &self.static_colliders {
                if let Some(contact) = collide_plane(&body.collider(), &static_col.plane) {
                    if contact.is_colliding() {
                        body.apply_correction(contact.normal * contact.penetration);
                    }
                }
            }
        }
    }

    fn update_sleep(&mut self, dt: f32) {
        let speed_limit = self.config.sleep_speed_limit;
        let time_limit = self.config.sleep_time_limit;
        for body in self.bodies.values_mut() {
            if body.is_awake_dynamic() && body.accumulate_idle(dt, speed_limit, time_limit) {
                body.sleep();
            }
        }
    }
}

/// Coulomb friction against an immovable surface; returns the remaining
/// tangential velocity
fn apply_friction_single(body: &mut RigidBody, normal: Vec3, normal_impulse: f32, friction: f32) -> Vec3 {
    let tangent_velocity = body.velocity - normal * body.velocity.dot(normal);
    let tangent_speed = tangent_velocity.length();
    if tangent_speed <= TANGENT_EPSILON {
        return Vec3::ZERO;
    }
    let reduction = tangent_speed.min(friction * normal_impulse);
    let direction = tangent_velocity / tangent_speed;
    body.velocity -= direction * reduction;
    direction * (tangent_speed - reduction)
}

/// Coulomb friction between two bodies, capped at `friction * j`
fn apply_friction_pair(
    a: &mut RigidBody,
    b: &mut RigidBody,
    normal: Vec3,
    normal_impulse: f32,
    inv_a: f32,
    inv_b: f32,
    material: ContactMaterial,
) {
    let relative = a.velocity - b.velocity;
    let tangent_velocity = relative - normal * relative.dot(normal);
    let tangent_speed = tangent_velocity.length();
    if tangent_speed <= TANGENT_EPSILON {
        return;
    }
    let direction = tangent_velocity / tangent_speed;
    let jt = (tangent_speed / (inv_a + inv_b)).min(material.friction * normal_impulse);
    a.velocity -= direction * (jt * inv_a);
    b.velocity += direction * (jt * inv_b);
}

fn wake_on_contact(sleeper: &mut RigidBody, other: &RigidBody, wake_speed: f32) {
    if sleeper.is_sleeping()
        && other.is_awake_dynamic()
        && other.velocity.length_squared() >= wake_speed * wake_speed
    {
        sleeper.wake();
    }
}
