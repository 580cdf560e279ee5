//! Collision events and per-body listener subscriptions
//!
//! A body only produces events while it holds a [`ListenerToken`]. Removing
//! the body (or cancelling the token) also discards events queued for it, so
//! nothing downstream ever sees an event for a body that no longer exists.

use slotmap::{new_key_type, SecondaryMap, SlotMap};
use tumble_math::Vec3;

use crate::body::BodyKey;
use crate::material::MaterialTag;

new_key_type! {
    /// Cancellable subscription to one body's collision events
    pub struct ListenerToken;
}

/// What the subscribed body hit
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionPartner {
    /// Another rigid body
    Body(BodyKey),
    /// A static collider, by its index in the world
    Static(usize),
}

/// One contact, seen from the subscribed body
#[derive(Clone, Copy, Debug)]
pub struct CollisionEvent {
    /// The subscribed body
    pub body: BodyKey,
    /// Material of the subscribed body
    pub material: MaterialTag,
    pub partner: CollisionPartner,
    pub partner_material: MaterialTag,
    /// Closing speed along the contact normal, never negative
    pub impact_strength: f32,
    pub point: Vec3,
    /// Contact normal pointing toward the subscribed body
    pub normal: Vec3,
}

/// Subscription table plus the queue of undelivered events
#[derive(Default)]
pub(crate) struct ContactListeners {
    tokens: SlotMap<ListenerToken, BodyKey>,
    by_body: SecondaryMap<BodyKey, ListenerToken>,
    pending: Vec<CollisionEvent>,
}

impl ContactListeners {
    /// Subscribe a body; an already-subscribed body keeps its token
    pub fn subscribe(&mut self, body: BodyKey) -> ListenerToken {
        if let Some(&token) = self.by_body.get(body) {
            return token;
        }
        let token = self.tokens.insert(body);
        self.by_body.insert(body, token);
        token
    }

    /// Cancel a subscription; stale tokens are ignored
    pub fn unsubscribe(&mut self, token: ListenerToken) -> bool {
        match self.tokens.remove(token) {
            Some(body) => {
                self.by_body.remove(body);
                self.pending.retain(|e| e.body != body);
                true
            }
            None => false,
        }
    }

    /// Drop everything tied to a body that is leaving the world
    pub fn forget_body(&mut self, body: BodyKey) {
        if let Some(token) = self.by_body.remove(body) {
            self.tokens.remove(token);
        }
        self.pending.retain(|e| e.body != body);
    }

    pub fn is_subscribed(&self, body: BodyKey) -> bool {
        self.by_body.contains_key(body)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Queue an event if its body is listening
    pub fn emit(&mut self, event: CollisionEvent) {
        if self.is_subscribed(event.body) {
            self.pending.push(event);
        }
    }

    pub fn drain(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{ContactMaterial, ContactPolicy};

    fn keys(n: usize) -> Vec<BodyKey> {
        let mut map: SlotMap<BodyKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn event_for(body: BodyKey) -> CollisionEvent {
        let tag = ContactPolicy::builder()
            .material("ball")
            .contact("ball", "ball", ContactMaterial::default())
            .build()
            .unwrap()
            .tag("ball")
            .unwrap();
        CollisionEvent {
            body,
            material: tag,
            partner: CollisionPartner::Static(0),
            partner_material: tag,
            impact_strength: 2.0,
            point: Vec3::ZERO,
            normal: Vec3::Y,
        }
    }

    #[test]
    fn test_unsubscribed_body_emits_nothing() {
        let k = keys(1);
        let mut listeners = ContactListeners::default();
        listeners.emit(event_for(k[0]));
        assert!(listeners.drain().is_empty());
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let k = keys(1);
        let mut listeners = ContactListeners::default();
        let a = listeners.subscribe(k[0]);
        let b = listeners.subscribe(k[0]);
        assert_eq!(a, b);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_unsubscribe_discards_pending() {
        let k = keys(2);
        let mut listeners = ContactListeners::default();
        let token = listeners.subscribe(k[0]);
        listeners.subscribe(k[1]);
        listeners.emit(event_for(k[0]));
        listeners.emit(event_for(k[1]));

        assert!(listeners.unsubscribe(token));
        assert!(!listeners.unsubscribe(token));

        let drained = listeners.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].body, k[1]);
    }

    #[test]
    fn test_forget_body() {
        let k = keys(1);
        let mut listeners = ContactListeners::default();
        listeners.subscribe(k[0]);
        listeners.emit(event_for(k[0]));
        listeners.forget_body(k[0]);
        assert!(!listeners.is_subscribed(k[0]));
        assert_eq!(listeners.pending_len(), 0);
        assert_eq!(listeners.len(), 0);
    }
}
