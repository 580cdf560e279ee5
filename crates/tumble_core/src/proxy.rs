//! Visual proxies: the renderable side of a simulated object
//!
//! A proxy knows nothing about physics. It carries a transform, a mesh kind,
//! and dirty flags so a renderer only re-uploads what changed.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tumble_math::{Quat, Vec3};

bitflags! {
    /// Flags indicating which parts of a proxy have changed since the last draw
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        /// No changes
        const NONE = 0;
        /// Position or orientation changed
        const TRANSFORM = 1 << 0;
        /// Scale changed
        const SCALE = 1 << 1;
        /// Freshly added to the scene
        const ADDED = 1 << 2;
        /// Everything needs uploading
        const ALL = Self::TRANSFORM.bits() | Self::SCALE.bits() | Self::ADDED.bits();
    }
}

/// Unit mesh a proxy is drawn with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyMesh {
    /// Sphere of radius 1
    Sphere,
    /// Cube of edge 1
    Cube,
}

impl ProxyMesh {
    fn id(self) -> u32 {
        match self {
            ProxyMesh::Sphere => 0,
            ProxyMesh::Cube => 1,
        }
    }
}

/// Renderable transform mirroring a body's pose
#[derive(Clone, Debug)]
pub struct VisualProxy {
    pub mesh: ProxyMesh,
    pub position: Vec3,
    pub orientation: Quat,
    /// Fixed at spawn
    pub scale: Vec3,
    dirty: DirtyFlags,
}

impl VisualProxy {
    /// Create a proxy; it starts fully dirty
    pub fn new(mesh: ProxyMesh, position: Vec3, orientation: Quat, scale: Vec3) -> Self {
        Self {
            mesh,
            position,
            orientation,
            scale,
            dirty: DirtyFlags::ALL,
        }
    }

    /// Overwrite the pose, marking it dirty only when it actually moved
    pub fn set_transform(&mut self, position: Vec3, orientation: Quat) {
        if self.position != position || self.orientation != orientation {
            self.position = position;
            self.orientation = orientation;
            self.dirty |= DirtyFlags::TRANSFORM;
        }
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Clear dirty flags after the renderer has consumed them
    pub fn clear_dirty(&mut self) {
        self.dirty = DirtyFlags::NONE;
    }

    /// Flatten into GPU-friendly instance data
    pub fn instance(&self) -> ProxyInstance {
        ProxyInstance {
            position: self.position.to_array(),
            mesh: self.mesh.id(),
            orientation: [
                self.orientation.x,
                self.orientation.y,
                self.orientation.z,
                self.orientation.w,
            ],
            scale: self.scale.to_array(),
            _padding: 0.0,
        }
    }
}

/// Per-instance data for a renderer, laid out for a vertex buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ProxyInstance {
    /// World position
    pub position: [f32; 3],
    /// 0 = sphere, 1 = cube
    pub mesh: u32,
    /// Orientation quaternion (x, y, z, w)
    pub orientation: [f32; 4],
    pub scale: [f32; 3],
    pub _padding: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_proxy_is_dirty() {
        let proxy = VisualProxy::new(ProxyMesh::Sphere, Vec3::ZERO, Quat::IDENTITY, Vec3::splat(0.5));
        assert_eq!(proxy.dirty(), DirtyFlags::ALL);
    }

    #[test]
    fn test_set_transform_marks_dirty_only_on_change() {
        let mut proxy = VisualProxy::new(ProxyMesh::Cube, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        proxy.clear_dirty();

        proxy.set_transform(Vec3::ZERO, Quat::IDENTITY);
        assert!(!proxy.is_dirty());

        proxy.set_transform(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
        assert_eq!(proxy.dirty(), DirtyFlags::TRANSFORM);
        assert_eq!(proxy.position.y, 1.0);
    }

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<ProxyInstance>(), 48);

        let proxy = VisualProxy::new(ProxyMesh::Cube, Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
        let instance = proxy.instance();
        assert_eq!(instance.position, [1.0, 2.0, 3.0]);
        assert_eq!(instance.mesh, 1);
        assert_eq!(instance.orientation, [0.0, 0.0, 0.0, 1.0]);

        let bytes: &[u8] = bytemuck::bytes_of(&instance);
        assert_eq!(bytes.len(), 48);
    }
}
