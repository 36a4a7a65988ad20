//! # Message trait and per-type dispatch policy.
//!
//! Any `Send + Sync + 'static` value can be a message; implementing
//! [`Message`] declares it to the mediator and (optionally) overrides the
//! type's [`ThreadAffinity`].
//!
//! The affinity is a **static, per-type declaration**: the mediator resolves
//! it once, when the first subscription for the type is registered, and
//! caches it alongside the subscriber list. It is never re-evaluated per
//! publish.
//!
//! ## Example
//! ```
//! use postbus::{Message, ThreadAffinity};
//!
//! struct CacheInvalidated;
//!
//! // Delivered inline, on the publishing thread, before `publish` returns.
//! impl Message for CacheInvalidated {
//!     fn affinity() -> ThreadAffinity {
//!         ThreadAffinity::SameThread
//!     }
//! }
//!
//! struct OrderPlaced {
//!     pub id: u64,
//! }
//!
//! // Default affinity: queued, delivered by the mediator worker.
//! impl Message for OrderPlaced {}
//! ```

/// Per-message-type delivery policy.
///
/// Decides **where** handlers run, not who receives the message:
/// - [`SameThread`](ThreadAffinity::SameThread): handlers run inline on the
///   publishing thread; `publish` returns only after the full dispatch pass.
/// - [`Queued`](ThreadAffinity::Queued): the message is enqueued and later
///   dispatched by the single mediator worker; `publish` returns after the
///   enqueue. Queued messages are globally FIFO across all queued types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadAffinity {
    /// Dispatch inline on whichever thread calls `publish`.
    ///
    /// Multiple publishers may run handlers for such a type concurrently
    /// with each other and with the queue worker; handlers must be
    /// thread-safe.
    SameThread,
    /// Enqueue and dispatch asynchronously on the mediator worker.
    Queued,
}

impl Default for ThreadAffinity {
    /// Messages are queued unless the type opts into inline delivery.
    fn default() -> Self {
        ThreadAffinity::Queued
    }
}

/// A value that can be published through the mediator.
///
/// The mediator identifies messages by their concrete runtime type
/// ([`TypeId`](std::any::TypeId)); handlers are bound to exactly one message
/// type. Messages are immutable from the dispatcher's perspective — handlers
/// receive `&M`.
pub trait Message: Send + Sync + 'static {
    /// Declared thread affinity for this message type.
    ///
    /// Resolved once, at first subscription, and cached; see
    /// [`ThreadAffinity`] for the delivery semantics of each variant.
    fn affinity() -> ThreadAffinity
    where
        Self: Sized,
    {
        ThreadAffinity::default()
    }
}
