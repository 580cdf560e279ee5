//! Scene interface and the slotmap-backed scene graph
//!
//! The registry only ever adds, moves and removes proxies through [`Scene`],
//! so any renderer-side scene can stand in for [`SceneGraph`].

use slotmap::{new_key_type, SlotMap};
use tumble_math::{Quat, Vec3};

use crate::proxy::{ProxyInstance, VisualProxy};

new_key_type! {
    /// Key to a visual proxy in a scene
    pub struct ProxyKey;
}

/// Where visual proxies live
pub trait Scene {
    /// Insert a proxy and return its key
    fn add_proxy(&mut self, proxy: VisualProxy) -> ProxyKey;

    /// Remove a proxy; `None` for stale keys
    fn remove_proxy(&mut self, key: ProxyKey) -> Option<VisualProxy>;

    /// Overwrite a proxy's pose; `false` for stale keys
    fn set_transform(&mut self, key: ProxyKey, position: Vec3, orientation: Quat) -> bool;
}

/// In-memory scene of visual proxies
#[derive(Default)]
pub struct SceneGraph {
    proxies: SlotMap<ProxyKey, VisualProxy>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ProxyKey) -> Option<&VisualProxy> {
        self.proxies.get(key)
    }

    pub fn contains(&self, key: ProxyKey) -> bool {
        self.proxies.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProxyKey, &VisualProxy)> {
        self.proxies.iter()
    }

    /// Number of proxies with pending changes
    pub fn dirty_count(&self) -> usize {
        self.proxies.values().filter(|p| p.is_dirty()).count()
    }

    /// Instance data for every proxy, in slot order
    pub fn instances(&self) -> Vec<ProxyInstance> {
        self.proxies.values().map(VisualProxy::instance).collect()
    }

    /// Mark every proxy as uploaded
    pub fn clear_dirty(&mut self) {
        for proxy in self.proxies.values_mut() {
            proxy.clear_dirty();
        }
    }
}

impl Scene for SceneGraph {
    fn add_proxy(&mut self, proxy: VisualProxy) -> ProxyKey {
        self.proxies.insert(proxy)
    }

    fn remove_proxy(&mut self, key: ProxyKey) -> Option<VisualProxy> {
        self.proxies.remove(key)
    }

    fn set_transform(&mut self, key: ProxyKey, position: Vec3, orientation: Quat) -> bool {
        match self.proxies.get_mut(key) {
            Some(proxy) => {
                proxy.set_transform(position, orientation);
                true
            }
            None => false,
        }
    }
}
