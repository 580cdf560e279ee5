//! Material tags and the pairwise contact policy
//!
//! Materials are declared by name once, up front. Every pair of materials that
//! can touch must have an explicit [`ContactMaterial`]; [`ContactPolicyBuilder::build`]
//! rejects a policy with a hole in it instead of falling back at runtime.

use std::fmt;

use crate::error::PhysicsError;

/// Handle to a material declared in a [`ContactPolicy`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialTag(u16);

impl MaterialTag {
    /// Raw index of the tag inside its policy
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MaterialTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Friction and restitution used when two materials touch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactMaterial {
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

impl ContactMaterial {
    /// Values are clamped: friction to `>= 0`, restitution to `[0, 1]`.
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction: friction.max(0.0),
            restitution: restitution.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Debug)]
struct MaterialInfo {
    name: String,
    /// Only ever used by immovable geometry, so two of these never touch
    static_only: bool,
}

/// Declared materials plus a symmetric contact table
#[derive(Clone, Debug)]
pub struct ContactPolicy {
    materials: Vec<MaterialInfo>,
    /// Row-major `n * n` table, mirrored across the diagonal
    table: Vec<Option<ContactMaterial>>,
}

impl ContactPolicy {
    pub fn builder() -> ContactPolicyBuilder {
        ContactPolicyBuilder::default()
    }

    /// Whether the tag was issued by this policy
    pub fn contains(&self, tag: MaterialTag) -> bool {
        tag.index() < self.materials.len()
    }

    /// Look up a material by name
    pub fn tag(&self, name: &str) -> Option<MaterialTag> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(|i| MaterialTag(i as u16))
    }

    /// Name a tag was declared with
    pub fn name(&self, tag: MaterialTag) -> Option<&str> {
        self.materials.get(tag.index()).map(|m| m.name.as_str())
    }

    pub fn is_static_only(&self, tag: MaterialTag) -> bool {
        self.materials
            .get(tag.index())
            .map(|m| m.static_only)
            .unwrap_or(false)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// All declared materials in declaration order
    pub fn materials(&self) -> impl Iterator<Item = (MaterialTag, &str)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialTag(i as u16), m.name.as_str()))
    }

    /// Contact parameters for a pair, in either order
    ///
    /// `None` only for unknown tags or two static-only materials.
    pub fn contact(&self, a: MaterialTag, b: MaterialTag) -> Option<ContactMaterial> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        self.table[a.index() * self.materials.len() + b.index()]
    }
}

/// Builder for [`ContactPolicy`]
///
/// Pair names are resolved by [`build`](Self::build), so materials and pairs
/// may be declared in any order.
#[derive(Default)]
pub struct ContactPolicyBuilder {
    materials: Vec<MaterialInfo>,
    pairs: Vec<(String, String, ContactMaterial)>,
}

impl ContactPolicyBuilder {
    /// Declare a material that dynamic bodies may use
    pub fn material(mut self, name: impl Into<String>) -> Self {
        self.materials.push(MaterialInfo {
            name: name.into(),
            static_only: false,
        });
        self
    }

    /// Declare a material reserved for static geometry (floors, walls)
    pub fn static_material(mut self, name: impl Into<String>) -> Self {
        self.materials.push(MaterialInfo {
            name: name.into(),
            static_only: true,
        });
        self
    }

    /// Define the contact parameters for a pair (order does not matter)
    pub fn contact(mut self, a: impl Into<String>, b: impl Into<String>, material: ContactMaterial) -> Self {
        self.pairs.push((a.into(), b.into(), material));
        self
    }

    /// Validate and freeze the policy
    pub fn build(self) -> Result<ContactPolicy, PhysicsError> {
        let n = self.materials.len();
        if n > u16::MAX as usize {
            return Err(PhysicsError::TooManyMaterials(n));
        }

        for (i, m) in self.materials.iter().enumerate() {
            if self.materials[..i].iter().any(|other| other.name == m.name) {
                return Err(PhysicsError::DuplicateMaterial(m.name.clone()));
            }
        }

        let index_of = |name: &str| -> Result<usize, PhysicsError> {
            self.materials
                .iter()
                .position(|m| m.name == name)
                .ok_or_else(|| PhysicsError::UndeclaredMaterial(name.to_string()))
        };

        let mut table = vec![None; n * n];
        for (a, b, material) in &self.pairs {
            let ia = index_of(a)?;
            let ib = index_of(b)?;
            table[ia * n + ib] = Some(*material);
            table[ib * n + ia] = Some(*material);
        }

        for i in 0..n {
            for j in i..n {
                let both_static = self.materials[i].static_only && self.materials[j].static_only;
                if !both_static && table[i * n + j].is_none() {
                    return Err(PhysicsError::MissingContactPair(
                        self.materials[i].name.clone(),
                        self.materials[j].name.clone(),
                    ));
                }
            }
        }

        Ok(ContactPolicy {
            materials: self.materials,
            table,
        })
    }
}
