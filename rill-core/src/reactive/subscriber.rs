//! Subscriber types for the reactive system.
//!
//! A subscriber is an effect that must re-run when a signal it read is
//! written. Each signal keeps its subscribers in a [`Subscribers`] set.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::effect::Effect;

/// Unique identifier for a subscriber.
///
/// Each effect gets a unique ID when created. This ID is the effect's
/// identity for subscriber-set membership, so repeated reads of one signal
/// within one run register the effect only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Insertion-ordered set of effects subscribed to one signal.
///
/// Entries are never removed: an effect that stops reading a signal stays
/// subscribed to it. The set owns its effects and is itself owned by the
/// write side of the signal.
#[derive(Default)]
pub struct Subscribers {
    effects: IndexMap<SubscriberId, Effect>,
}

impl Subscribers {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect. Returns `false` if it was already present.
    pub fn insert(&mut self, effect: Effect) -> bool {
        let id = effect.subscriber_id();
        if self.effects.contains_key(&id) {
            return false;
        }
        self.effects.insert(id, effect);
        true
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.effects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Subscriber IDs in registration order.
    pub fn ids(&self) -> Vec<SubscriberId> {
        self.effects.keys().copied().collect()
    }

    /// The effect at `index` in registration order.
    ///
    /// Notification walks the set by index so that effects joining midway
    /// through a write are still reached by it.
    pub fn get(&self, index: usize) -> Option<Effect> {
        self.effects
            .get_index(index)
            .map(|(_, effect)| effect.clone())
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.effects.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn insert_is_idempotent() {
        let effect = Effect::new(|| {});
        let mut subscribers = Subscribers::new();

        assert!(subscribers.insert(effect.clone()));
        assert!(!subscribers.insert(effect.clone()));
        assert_eq!(subscribers.len(), 1);
        assert!(subscribers.contains(effect.subscriber_id()));
    }

    #[test]
    fn members_keep_insertion_order() {
        let a = Effect::new(|| {});
        let b = Effect::new(|| {});
        let c = Effect::new(|| {});

        let mut subscribers = Subscribers::new();
        subscribers.insert(c.clone());
        subscribers.insert(a.clone());
        subscribers.insert(b.clone());
        subscribers.insert(a.clone());

        let order: Vec<_> = (0..subscribers.len())
            .filter_map(|index| subscribers.get(index))
            .map(|effect| effect.subscriber_id())
            .collect();
        assert_eq!(
            order,
            vec![c.subscriber_id(), a.subscriber_id(), b.subscriber_id()]
        );
        assert_eq!(subscribers.ids(), order);
        assert!(subscribers.get(3).is_none());
    }
}
