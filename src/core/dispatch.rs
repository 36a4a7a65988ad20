//! # Inline dispatch routine.
//!
//! [`dispatch_now`] is the single code path behind both delivery modes:
//! a `SameThread` publish runs it on the publishing thread, and the queue
//! worker runs it for every dequeued envelope. Observable behavior
//! (priority order, failure isolation, stale purge) is identical either way.
//!
//! ## Rules
//! - Handlers run on a snapshot, never under the registry lock.
//! - A panicking handler is caught and logged; remaining subscribers still
//!   receive the message.
//! - Subscriptions whose subscriber has been dropped are skipped and handed
//!   to a fire-and-forget purge after the pass — dispatch never blocks on
//!   registry cleanup.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use crate::messages::Envelope;
use crate::registry::{Delivery, SubscriptionRegistry};

/// Delivers `envelope` to every live subscriber of its message type, in
/// descending priority order.
pub(crate) fn dispatch_now(registry: &Arc<SubscriptionRegistry>, envelope: &Envelope) {
    let subscriptions = registry.snapshot(envelope.type_id);
    if subscriptions.is_empty() {
        return;
    }

    let mut stale = Vec::new();
    for subscription in &subscriptions {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            subscription.deliver(envelope.payload.as_ref())
        }));
        match outcome {
            Ok(Delivery::Delivered) => {}
            Ok(Delivery::Gone) => stale.push(subscription.clone()),
            Err(payload) => {
                error!(
                    message_type = envelope.type_name,
                    subscriber_type = subscription.subscriber_type,
                    panic = panic_message(payload.as_ref()),
                    "handler panicked while handling message"
                );
            }
        }
    }

    if stale.is_empty() {
        return;
    }
    schedule_purge(registry, envelope, stale);
}

/// Removes known-dead subscriptions off the dispatch path.
///
/// The stale list holds the exact subscription instances observed dead, so
/// a late purge can never remove a fresh binding registered for the same
/// (subscriber, handler) pair in the meantime. Runs on the ambient tokio
/// runtime when one is available; a `SameThread` publish from a plain OS
/// thread has no runtime to spawn onto, so the purge happens inline there
/// (bounded: one write lock plus a retain).
fn schedule_purge(
    registry: &Arc<SubscriptionRegistry>,
    envelope: &Envelope,
    stale: Vec<crate::registry::Subscription>,
) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let registry = Arc::clone(registry);
            let type_id = envelope.type_id;
            handle.spawn(async move {
                registry.purge(type_id, &stale);
            });
        }
        Err(_) => registry.purge(envelope.type_id, &stale),
    }
}

/// Best-effort extraction of a panic payload for logging.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
