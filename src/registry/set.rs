//! # Subscription registry: message type → ordered subscriber list.
//!
//! One shared/exclusive lock guards the whole map. Mutations (insert, remove,
//! purge) take the write lock; reads (snapshot, affinity lookup) take the
//! read lock. Handler code **never** runs under either lock — dispatch works
//! on a snapshot.
//!
//! ## Rules
//! - Entries are created lazily on first subscription to a message type and
//!   removed entirely once their list empties. Removing the entry also drops
//!   the cached [`ThreadAffinity`], so a later resubscription re-resolves it
//!   from the type's declaration.
//! - The subscription list is sorted by **descending priority** after every
//!   structural mutation, before any reader can observe it.
//! - A (subscriber, handler) pair may appear at most once per message type;
//!   a duplicate insert is rejected without mutating state.

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry as Slot;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::MediatorError;
use crate::messages::ThreadAffinity;
use crate::registry::subscription::{Subscription, SubscriptionKey};

/// Per-message-type registry entry.
struct Entry {
    /// Cached dispatch affinity, resolved once from the type's declaration.
    affinity: ThreadAffinity,
    /// Subscriptions, kept sorted by descending priority.
    subscriptions: Vec<Subscription>,
}

/// Thread-safe map of subscriptions keyed by message type.
pub(crate) struct SubscriptionRegistry {
    entries: RwLock<HashMap<TypeId, Entry>>,
    closed: AtomicBool,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Inserts a subscription for `type_id`, caching `affinity` on first
    /// sight of the type.
    ///
    /// Fails with [`MediatorError::DuplicateSubscription`] if the same
    /// (subscriber, handler) pair is already registered for this type.
    pub(crate) fn insert(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        affinity: ThreadAffinity,
        subscription: Subscription,
    ) -> Result<(), MediatorError> {
        let mut entries = self.entries.write();
        match entries.entry(type_id) {
            // First subscriber for this type: no duplicate possible, and the
            // affinity cache is (re)established here.
            Slot::Vacant(slot) => {
                slot.insert(Entry {
                    affinity,
                    subscriptions: vec![subscription],
                });
                Ok(())
            }
            Slot::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.subscriptions.iter().any(|s| s.key == subscription.key) {
                    return Err(MediatorError::DuplicateSubscription {
                        message_type: type_name,
                        subscriber_type: subscription.subscriber_type,
                    });
                }
                entry.subscriptions.push(subscription);
                entry
                    .subscriptions
                    .sort_by(|a, b| b.priority.cmp(&a.priority));
                Ok(())
            }
        }
    }

    /// Removes the subscription identified by `key`, if present. Idempotent.
    pub(crate) fn remove(&self, type_id: TypeId, key: SubscriptionKey) {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(&type_id) else {
            return;
        };
        entry.subscriptions.retain(|s| s.key != key);
        if entry.subscriptions.is_empty() {
            entries.remove(&type_id);
        }
    }

    /// Removes every subscription owned by the subscriber with the given
    /// identity token, across all message types.
    pub(crate) fn remove_all(&self, subscriber: usize) {
        let mut entries = self.entries.write();
        entries.retain(|_, entry| {
            entry.subscriptions.retain(|s| s.key.subscriber != subscriber);
            !entry.subscriptions.is_empty()
        });
    }

    /// Best-effort removal of known-stale subscriptions.
    ///
    /// Matches by **instance identity**, not by key: if the stale binding
    /// was already removed and a fresh subscription with the same
    /// (subscriber, handler) pair took its place, the replacement is left
    /// alone. Safe to call concurrently with any other operation; tolerates
    /// the entry (or individual subscriptions) having already disappeared,
    /// and does nothing after [`close`](Self::close).
    pub(crate) fn purge(&self, type_id: TypeId, stale: &[Subscription]) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(&type_id) else {
            return;
        };
        entry
            .subscriptions
            .retain(|s| !stale.iter().any(|dead| dead.is_same(s)));
        if entry.subscriptions.is_empty() {
            entries.remove(&type_id);
        }
    }

    /// Immutable copy of the current (priority-ordered) subscriber list.
    pub(crate) fn snapshot(&self, type_id: TypeId) -> Vec<Subscription> {
        let entries = self.entries.read();
        entries
            .get(&type_id)
            .map(|entry| entry.subscriptions.clone())
            .unwrap_or_default()
    }

    /// Cached dispatch affinity for a message type, if any subscription for
    /// it exists.
    pub(crate) fn affinity_of(&self, type_id: TypeId) -> Option<ThreadAffinity> {
        self.entries.read().get(&type_id).map(|entry| entry.affinity)
    }

    /// Drops all state and rejects further purges. Used on dispose.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::messages::{Message, Priority};

    struct Ping;
    impl Message for Ping {}

    struct Pong;
    impl Message for Pong {}

    #[derive(Default)]
    struct Probe;

    impl Probe {
        fn first(&self, _msg: &Ping) {}
        fn second(&self, _msg: &Ping) {}
        fn on_pong(&self, _msg: &Pong) {}
    }

    fn ping() -> TypeId {
        TypeId::of::<Ping>()
    }

    fn insert(
        registry: &SubscriptionRegistry,
        probe: &Arc<Probe>,
        handler: fn(&Probe, &Ping),
        priority: Priority,
    ) -> Result<(), MediatorError> {
        registry.insert(
            ping(),
            "Ping",
            ThreadAffinity::Queued,
            Subscription::new(probe, handler, priority),
        )
    }

    #[test]
    fn test_duplicate_pair_rejected_without_mutation() {
        let registry = SubscriptionRegistry::new();
        let probe = Arc::new(Probe);

        insert(&registry, &probe, Probe::first, Priority::Normal).unwrap();
        let err = insert(&registry, &probe, Probe::first, Priority::High).unwrap_err();

        assert!(matches!(err, MediatorError::DuplicateSubscription { .. }));
        assert_eq!(registry.snapshot(ping()).len(), 1);
        assert_eq!(registry.snapshot(ping())[0].priority, Priority::Normal);
    }

    #[test]
    fn test_same_handler_different_subscriber_allowed() {
        let registry = SubscriptionRegistry::new();
        let a = Arc::new(Probe);
        let b = Arc::new(Probe);

        insert(&registry, &a, Probe::first, Priority::Normal).unwrap();
        insert(&registry, &b, Probe::first, Priority::Normal).unwrap();

        assert_eq!(registry.snapshot(ping()).len(), 2);
    }

    #[test]
    fn test_snapshot_sorted_by_descending_priority() {
        let registry = SubscriptionRegistry::new();
        let a = Arc::new(Probe);
        let b = Arc::new(Probe);
        let c = Arc::new(Probe);

        insert(&registry, &a, Probe::first, Priority::Low).unwrap();
        insert(&registry, &b, Probe::first, Priority::High).unwrap();
        insert(&registry, &c, Probe::first, Priority::Normal).unwrap();

        let priorities: Vec<Priority> = registry
            .snapshot(ping())
            .iter()
            .map(|s| s.priority)
            .collect();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::Normal, Priority::Low]
        );
    }

    #[test]
    fn test_remove_is_idempotent_and_drops_empty_entry() {
        let registry = SubscriptionRegistry::new();
        let probe = Arc::new(Probe);
        let key = SubscriptionKey::of(&probe, Probe::first);

        insert(&registry, &probe, Probe::first, Priority::Normal).unwrap();
        assert_eq!(registry.affinity_of(ping()), Some(ThreadAffinity::Queued));

        registry.remove(ping(), key);
        assert!(registry.snapshot(ping()).is_empty());
        // Entry gone, so the affinity cache is cleared with it.
        assert_eq!(registry.affinity_of(ping()), None);

        // Second removal of the same key is a no-op.
        registry.remove(ping(), key);
    }

    #[test]
    fn test_remove_all_spans_message_types() {
        let registry = SubscriptionRegistry::new();
        let probe = Arc::new(Probe);
        let other = Arc::new(Probe);

        insert(&registry, &probe, Probe::first, Priority::Normal).unwrap();
        insert(&registry, &other, Probe::second, Priority::Normal).unwrap();
        registry
            .insert(
                TypeId::of::<Pong>(),
                "Pong",
                ThreadAffinity::SameThread,
                Subscription::new(&probe, Probe::on_pong, Priority::Normal),
            )
            .unwrap();

        registry.remove_all(crate::registry::subscriber_token(&probe));

        assert_eq!(registry.snapshot(ping()).len(), 1);
        assert!(registry.snapshot(TypeId::of::<Pong>()).is_empty());
        assert_eq!(registry.affinity_of(TypeId::of::<Pong>()), None);
    }

    #[test]
    fn test_purge_tolerates_missing_entry() {
        let registry = SubscriptionRegistry::new();
        let probe = Arc::new(Probe);
        let sub = Subscription::new(&probe, Probe::first, Priority::Normal);

        // Entry never existed.
        registry.purge(ping(), std::slice::from_ref(&sub));

        registry
            .insert(ping(), "Ping", ThreadAffinity::Queued, sub.clone())
            .unwrap();
        registry.purge(ping(), &[sub]);
        assert!(registry.snapshot(ping()).is_empty());
    }

    #[test]
    fn test_purge_spares_same_key_replacement() {
        let registry = SubscriptionRegistry::new();
        let probe = Arc::new(Probe);

        // Same (subscriber, handler) pair, two distinct registered
        // instances — as when a binding is unsubscribed and re-added while
        // a purge for the old instance is still in flight.
        let stale = Subscription::new(&probe, Probe::first, Priority::Normal);
        let replacement = Subscription::new(&probe, Probe::first, Priority::Normal);
        assert_eq!(stale.key, replacement.key);

        registry
            .insert(ping(), "Ping", ThreadAffinity::Queued, replacement)
            .unwrap();

        registry.purge(ping(), &[stale]);
        assert_eq!(registry.snapshot(ping()).len(), 1);
    }

    #[test]
    fn test_close_clears_and_blocks_purge() {
        let registry = SubscriptionRegistry::new();
        let probe = Arc::new(Probe);

        insert(&registry, &probe, Probe::first, Priority::Normal).unwrap();
        registry.close();

        assert!(registry.snapshot(ping()).is_empty());
        registry.purge(ping(), &[]);
    }
}
