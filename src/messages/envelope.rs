//! # Type-erased container for queued messages.
//!
//! `publish` on a queued-affinity type erases the concrete message into an
//! [`Envelope`] before handing it to the worker queue. The payload is held in
//! an `Arc` so the timeout path can move a clone onto a blocking task without
//! copying the message.

use std::any::{Any, TypeId};
use std::sync::Arc;

/// A published message together with its runtime type identity.
#[derive(Clone)]
pub(crate) struct Envelope {
    /// Concrete type of the payload, used to look up subscriptions.
    pub(crate) type_id: TypeId,
    /// Type name for logs and warnings.
    pub(crate) type_name: &'static str,
    /// The message itself.
    pub(crate) payload: Arc<dyn Any + Send + Sync>,
}

impl Envelope {
    pub(crate) fn new<M: Send + Sync + 'static>(message: M) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            payload: Arc::new(message),
        }
    }
}
