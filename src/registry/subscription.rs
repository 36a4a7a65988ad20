//! # A single (subscriber, handler, priority) binding.
//!
//! [`Subscription`] erases the concrete subscriber and message types behind a
//! deliver closure so the registry can hold bindings for arbitrary message
//! types in one map. The closure owns a [`Weak`] to the subscriber: the
//! registry never extends a subscriber's lifetime, and a dropped subscriber
//! simply reports [`Delivery::Gone`] on the next dispatch so it can be
//! purged lazily.
//!
//! Identity for duplicate detection and removal is [`SubscriptionKey`]:
//! the subscriber's allocation address plus the handler's `fn` pointer.
//! Priority and registration time take no part in identity.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::messages::{Message, Priority};

/// Identity of one subscription: (subscriber, handler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SubscriptionKey {
    /// Address of the subscriber's `Arc` allocation.
    pub(crate) subscriber: usize,
    /// Address of the handler `fn` pointer.
    pub(crate) handler: usize,
}

impl SubscriptionKey {
    pub(crate) fn of<S, M>(subscriber: &Arc<S>, handler: fn(&S, &M)) -> Self {
        Self {
            subscriber: subscriber_token(subscriber),
            handler: handler as usize,
        }
    }
}

/// Stable identity token for a subscriber handle.
pub(crate) fn subscriber_token<S>(subscriber: &Arc<S>) -> usize {
    Arc::as_ptr(subscriber) as *const () as usize
}

/// Outcome of one delivery attempt.
pub(crate) enum Delivery {
    /// The handler ran (successfully or not; panics are caught by the caller).
    Delivered,
    /// The subscriber has been dropped; the binding is stale.
    Gone,
}

/// One registered binding for one message type.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) key: SubscriptionKey,
    pub(crate) priority: Priority,
    /// Subscriber type name, for logs.
    pub(crate) subscriber_type: &'static str,
    deliver: Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Delivery + Send + Sync>,
}

impl Subscription {
    /// Wraps a handler for message type `M` owned by `subscriber`.
    ///
    /// The returned subscription holds only a weak subscriber reference; if
    /// the subscriber is still alive at delivery time it is upgraded for the
    /// duration of the handler call, so it cannot be dropped mid-handler.
    pub(crate) fn new<S, M>(subscriber: &Arc<S>, handler: fn(&S, &M), priority: Priority) -> Self
    where
        S: Send + Sync + 'static,
        M: Message,
    {
        let weak: Weak<S> = Arc::downgrade(subscriber);
        let deliver = move |payload: &(dyn Any + Send + Sync)| {
            let Some(live) = weak.upgrade() else {
                return Delivery::Gone;
            };
            if let Some(message) = payload.downcast_ref::<M>() {
                handler(live.as_ref(), message);
            }
            Delivery::Delivered
        };

        Self {
            key: SubscriptionKey::of(subscriber, handler),
            priority,
            subscriber_type: std::any::type_name::<S>(),
            deliver: Arc::new(deliver),
        }
    }

    /// True if `other` is this exact registered instance.
    ///
    /// Stricter than key equality: a new subscription for the same
    /// (subscriber, handler) pair is a different instance, so a purge aimed
    /// at a stale instance can never hit a live replacement — even if an
    /// allocation address was reused.
    pub(crate) fn is_same(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.deliver, &other.deliver)
    }

    /// Invokes the handler with the given payload.
    ///
    /// Returns [`Delivery::Gone`] without calling the handler if the
    /// subscriber has been dropped. Panic isolation is the dispatch
    /// routine's job, not this method's.
    pub(crate) fn deliver(&self, payload: &(dyn Any + Send + Sync)) -> Delivery {
        (self.deliver)(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Ping;
    impl Message for Ping {}

    #[derive(Default)]
    struct Probe {
        hits: Mutex<u32>,
    }

    impl Probe {
        fn on_ping(&self, _msg: &Ping) {
            *self.hits.lock() += 1;
        }
    }

    #[test]
    fn test_delivers_to_live_subscriber() {
        let probe = Arc::new(Probe::default());
        let sub = Subscription::new(&probe, Probe::on_ping, Priority::Normal);

        assert!(matches!(sub.deliver(&Ping), Delivery::Delivered));
        assert_eq!(*probe.hits.lock(), 1);
    }

    #[test]
    fn test_gone_after_subscriber_dropped() {
        let probe = Arc::new(Probe::default());
        let sub = Subscription::new(&probe, Probe::on_ping, Priority::Normal);
        drop(probe);

        assert!(matches!(sub.deliver(&Ping), Delivery::Gone));
    }

    #[test]
    fn test_key_identifies_subscriber_and_handler() {
        let a = Arc::new(Probe::default());
        let b = Arc::new(Probe::default());

        let on_a = SubscriptionKey::of(&a, Probe::on_ping);
        let on_a_again = SubscriptionKey::of(&a, Probe::on_ping);
        let on_b = SubscriptionKey::of(&b, Probe::on_ping);

        assert_eq!(on_a, on_a_again);
        assert_ne!(on_a, on_b);
    }
}
