//! # postbus
//!
//! **Postbus** is an in-process, typed publish/subscribe mediator for Rust.
//!
//! Producers publish messages without knowing who (if anyone) consumes them;
//! consumers subscribe and unsubscribe dynamically at runtime. The crate is
//! designed as the messaging backbone of a larger application: components
//! stay decoupled, and the mediator takes care of ordering, isolation, and
//! shutdown.
//!
//! ## Architecture
//! ```text
//!  Publishers (any thread):             Subscribers (weakly referenced):
//!
//!    publish(M)                                sub1.handler(&M)
//!        │                                          ▲
//!        ▼                                          │ priority order
//! ┌─────────────────────────────┐          ┌────────┴──────────┐
//! │  Mediator                   │          │  dispatch_now()   │
//! │  - affinity cache (per M)   │          │  - snapshot       │
//! │  - SubscriptionRegistry     │─────────►│  - invoke each    │
//! │    (RwLock: TypeId → subs)  │ snapshot │  - isolate panics │
//! └───────┬─────────────────────┘          │  - purge stale    │
//!         │ Queued affinity                └────────▲──────────┘
//!         ▼                                         │
//!   [unbounded queue] ───► single worker ───────────┘
//!                          (global FIFO, optional
//!                           advisory timeout)
//! ```
//!
//! Both delivery modes converge on one dispatch routine, so priority order,
//! failure isolation, and stale-subscriber cleanup behave identically
//! whether a message was dispatched inline or through the queue.
//!
//! ## Guarantees
//! | Concern            | Behavior                                                               |
//! |--------------------|------------------------------------------------------------------------|
//! | **Ordering**       | Per type: descending [`Priority`]. Queued messages: global FIFO.       |
//! | **Isolation**      | A panicking handler is caught and logged; the pass continues.          |
//! | **Leak safety**    | Subscriptions hold weak references; dead ones are purged lazily.       |
//! | **Timeout**        | Advisory: a slow dispatch warns but is never abandoned.                |
//! | **Shutdown races** | Publish/subscribe while stopping is a logged warning, not an error.    |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use postbus::{Mediator, MediatorConfig, Message, Priority};
//!
//! // Queued by default: delivered asynchronously by the mediator worker.
//! struct OrderPlaced { id: u64 }
//! impl Message for OrderPlaced {}
//!
//! #[derive(Default)]
//! struct Billing { orders: Mutex<Vec<u64>> }
//! impl Billing {
//!     fn on_order(&self, msg: &OrderPlaced) { self.orders.lock().push(msg.id); }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), postbus::MediatorError> {
//!     let mediator = Mediator::new(MediatorConfig::default());
//!     let billing = Arc::new(Billing::default());
//!
//!     mediator.subscribe(&billing, Billing::on_order, Priority::Normal)?;
//!     mediator.start()?;
//!
//!     mediator.publish(OrderPlaced { id: 42 })?;
//!
//!     mediator.stop().await;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod messages;
mod registry;

// ---- Public re-exports ----

pub use config::MediatorConfig;
pub use core::{Hosted, Mediator};
pub use error::MediatorError;
pub use messages::{Message, Priority, ThreadAffinity};
