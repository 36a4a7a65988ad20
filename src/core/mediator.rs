//! # Mediator: the public publish/subscribe facade.
//!
//! [`Mediator`] composes the subscription registry, the inline dispatch
//! routine, and the queue worker behind four operations — `subscribe`,
//! `unsubscribe`, `unsubscribe_all`, `publish` — plus the
//! `start`/`stop`/`dispose` lifecycle.
//!
//! ## Delivery modes
//! ```text
//! publish(msg)
//!   │  cached affinity for msg's type (Queued when never subscribed)
//!   ├─ SameThread ──► dispatch_now() on the calling thread (returns after
//!   │                 the full pass)
//!   └─ Queued ──────► unbounded queue ──► single worker ──► dispatch_now()
//! ```
//!
//! ## Rules
//! - Publishing or subscribing while the mediator is shutting down is an
//!   expected race: logged at warning level, dropped, and **not** surfaced
//!   as an error to the caller.
//! - Operating on a disposed mediator is a programming error:
//!   [`MediatorError::Disposed`].
//! - One failing subscriber never affects delivery to the others or to
//!   subsequent messages.

use std::any::TypeId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::MediatorConfig;
use crate::core::{dispatch, engine};
use crate::error::MediatorError;
use crate::messages::{Envelope, Message, Priority, ThreadAffinity};
use crate::registry::{Subscription, SubscriptionKey, SubscriptionRegistry, subscriber_token};

/// In-process typed publish/subscribe dispatcher.
///
/// Producers publish messages without knowing who consumes them; consumers
/// subscribe and unsubscribe dynamically at runtime. The mediator holds only
/// weak references to subscribers — a subscription never keeps its owner
/// alive.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use postbus::{Mediator, MediatorConfig, Message, Priority, ThreadAffinity};
///
/// struct ConfigReloaded;
/// impl Message for ConfigReloaded {
///     fn affinity() -> ThreadAffinity { ThreadAffinity::SameThread }
/// }
///
/// #[derive(Default)]
/// struct Cache { reloads: Mutex<u32> }
/// impl Cache {
///     fn on_reload(&self, _msg: &ConfigReloaded) { *self.reloads.lock() += 1; }
/// }
///
/// let mediator = Mediator::new(MediatorConfig::default());
/// let cache = Arc::new(Cache::default());
/// mediator.subscribe(&cache, Cache::on_reload, Priority::Normal)?;
///
/// // SameThread affinity: delivered before publish returns.
/// mediator.publish(ConfigReloaded)?;
/// assert_eq!(*cache.reloads.lock(), 1);
/// # Ok::<(), postbus::MediatorError>(())
/// ```
pub struct Mediator {
    registry: Arc<SubscriptionRegistry>,
    queue_tx: UnboundedSender<Envelope>,
    /// Receiver parked here until `start` hands it to the worker.
    queue_rx: Mutex<Option<UnboundedReceiver<Envelope>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    shutting_down: AtomicBool,
    disposed: AtomicBool,
    config: MediatorConfig,
}

impl Mediator {
    /// Creates a mediator. The queue worker is not running yet; call
    /// [`start`](Self::start) (or drive it through
    /// [`Hosted`](crate::Hosted)) to begin draining queued messages.
    ///
    /// `SameThread` delivery works without a running worker; queued messages
    /// published before `start` simply wait in the queue.
    #[must_use]
    pub fn new(config: MediatorConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            registry: Arc::new(SubscriptionRegistry::new()),
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            worker: Mutex::new(None),
            cancel: CancellationToken::new(),
            shutting_down: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            config,
        }
    }

    /// Registers `handler` on `subscriber` for message type `M`.
    ///
    /// The message type's [`ThreadAffinity`] is resolved from its
    /// declaration on first subscription and cached until the type's last
    /// subscription is removed.
    ///
    /// # Errors
    /// - [`MediatorError::Disposed`] after [`dispose`](Self::dispose).
    /// - [`MediatorError::DuplicateSubscription`] if this exact
    ///   (subscriber, handler) pair is already registered for `M`.
    ///   Registering the same handler for a *different* subscriber, or a
    ///   different handler for the same subscriber, is fine.
    pub fn subscribe<S, M>(
        &self,
        subscriber: &Arc<S>,
        handler: fn(&S, &M),
        priority: Priority,
    ) -> Result<(), MediatorError>
    where
        S: Send + Sync + 'static,
        M: Message,
    {
        self.ensure_live()?;
        if self.shutting_down.load(Ordering::Acquire) {
            warn!(
                message_type = std::any::type_name::<M>(),
                subscriber_type = std::any::type_name::<S>(),
                "mediator is shutting down; subscription dropped"
            );
            return Ok(());
        }
        self.registry.insert(
            TypeId::of::<M>(),
            std::any::type_name::<M>(),
            M::affinity(),
            Subscription::new(subscriber, handler, priority),
        )
    }

    /// Removes the (subscriber, handler) binding for `M`, if present.
    ///
    /// Idempotent: unsubscribing something that was never subscribed (or was
    /// already purged) is a no-op.
    ///
    /// # Errors
    /// [`MediatorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn unsubscribe<S, M>(
        &self,
        subscriber: &Arc<S>,
        handler: fn(&S, &M),
    ) -> Result<(), MediatorError>
    where
        S: Send + Sync + 'static,
        M: Message,
    {
        self.ensure_live()?;
        self.registry
            .remove(TypeId::of::<M>(), SubscriptionKey::of(subscriber, handler));
        Ok(())
    }

    /// Removes every subscription owned by `subscriber`, across all message
    /// types. After this returns, no handler of `subscriber` will be invoked
    /// for any subsequently published message.
    ///
    /// # Errors
    /// [`MediatorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn unsubscribe_all<S>(&self, subscriber: &Arc<S>) -> Result<(), MediatorError>
    where
        S: Send + Sync + 'static,
    {
        self.ensure_live()?;
        self.registry.remove_all(subscriber_token(subscriber));
        Ok(())
    }

    /// Publishes a message to all current subscribers of its type.
    ///
    /// Delivery depends on the type's cached affinity (defaulting to
    /// [`ThreadAffinity::Queued`] when the type was never subscribed):
    /// - `SameThread`: handlers run inline, in descending priority order,
    ///   before this call returns.
    /// - `Queued`: the message is enqueued for the worker and this call
    ///   returns immediately.
    ///
    /// During shutdown the message is dropped with a warning — an expected
    /// race, not an error.
    ///
    /// # Errors
    /// [`MediatorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn publish<M: Message>(&self, message: M) -> Result<(), MediatorError> {
        self.ensure_live()?;
        if self.shutting_down.load(Ordering::Acquire) {
            warn!(
                message_type = std::any::type_name::<M>(),
                "mediator is shutting down; message dropped"
            );
            return Ok(());
        }

        let envelope = Envelope::new(message);
        match self
            .registry
            .affinity_of(envelope.type_id)
            .unwrap_or_default()
        {
            ThreadAffinity::SameThread => dispatch::dispatch_now(&self.registry, &envelope),
            ThreadAffinity::Queued => {
                if self.queue_tx.send(envelope).is_err() {
                    // Worker already exited and dropped the receiver.
                    warn!(
                        message_type = std::any::type_name::<M>(),
                        "mediator queue is closed; message dropped"
                    );
                }
            }
        }
        Ok(())
    }

    /// Launches the queue worker on the ambient tokio runtime.
    ///
    /// # Errors
    /// - [`MediatorError::Disposed`] after [`dispose`](Self::dispose).
    /// - [`MediatorError::AlreadyStarted`] on a second call.
    /// - [`MediatorError::NoRuntime`] when called from outside a tokio
    ///   runtime.
    pub fn start(&self) -> Result<(), MediatorError> {
        self.ensure_live()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| MediatorError::NoRuntime)?;
        let queue_rx = self
            .queue_rx
            .lock()
            .take()
            .ok_or(MediatorError::AlreadyStarted)?;

        info!("starting mediator queue worker");
        let worker = runtime.spawn(engine::run_queue(
            Arc::clone(&self.registry),
            queue_rx,
            self.cancel.clone(),
            self.config.dispatch_timeout,
        ));
        *self.worker.lock() = Some(worker);
        Ok(())
    }

    /// Stops accepting new queued work, cancels the worker, and waits for it
    /// to finish its in-flight dispatch.
    ///
    /// From the moment this is called, `publish` on queued types drops the
    /// message with a warning. Messages still sitting in the queue are
    /// abandoned. Safe to call more than once.
    pub async fn stop(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        info!("stopping mediator");
        self.shutting_down.store(true, Ordering::Release);
        self.cancel.cancel();
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            let _ = handle.await;
        }
        info!("mediator stopped");
    }

    /// Releases all internal state. Idempotent.
    ///
    /// Clears the registry, cancels the worker without waiting for it, and
    /// makes every later public call fail with [`MediatorError::Disposed`].
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutting_down.store(true, Ordering::Release);
        self.cancel.cancel();
        self.registry.close();
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
    }

    fn ensure_live(&self) -> Result<(), MediatorError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(MediatorError::Disposed);
        }
        Ok(())
    }
}
