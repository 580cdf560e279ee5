//! Rendering seam
//!
//! The loop hands the scene to a [`Renderer`] once per frame. A renderer is
//! written against the scene type it knows how to read. [`HeadlessRenderer`]
//! draws a [`SceneGraph`] and does everything a GPU renderer would up to the
//! upload: it packs instance data and consumes dirty flags.

use tumble_core::{ProxyInstance, Scene, SceneGraph};

/// Draws a scene of type `S` once per frame
pub trait Renderer<S: Scene> {
    fn draw(&mut self, scene: &mut S);
}

/// Renderer without a window
///
/// Keeps the packed instance buffer of the last frame so tests and tools can
/// inspect it.
#[derive(Default)]
pub struct HeadlessRenderer {
    instance_bytes: Vec<u8>,
    frames: u64,
    /// Frames in which at least one proxy changed
    uploads: u64,
}

impl HeadlessRenderer {
    /// Create a headless renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the last packed instance buffer
    pub fn instance_bytes(&self) -> &[u8] {
        &self.instance_bytes
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

impl Renderer<SceneGraph> for HeadlessRenderer {
    fn draw(&mut self, scene: &mut SceneGraph) {
        self.frames += 1;
        let dirty = scene.dirty_count();
        // Removals leave no dirty proxy behind, so a shrinking scene also re-packs
        let packed = self.instance_bytes.len() / std::mem::size_of::<ProxyInstance>();
        if dirty > 0 || packed != scene.len() {
            let instances = scene.instances();
            self.instance_bytes.clear();
            self.instance_bytes.extend_from_slice(bytemuck::cast_slice(&instances));
            self.uploads += 1;
            scene.clear_dirty();
        }
        log::trace!(
            "Frame {}: {} proxies, {} dirty, {} instance bytes",
            self.frames,
            scene.len(),
            dirty,
            self.instance_bytes.len()
        );
    }
}
