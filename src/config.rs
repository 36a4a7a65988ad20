//! # Mediator configuration.
//!
//! [`MediatorConfig`] controls the one tunable of the dispatch engine: the
//! advisory per-message dispatch timeout for the queued path.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use postbus::MediatorConfig;
//!
//! let mut cfg = MediatorConfig::default();
//! cfg.dispatch_timeout = Some(Duration::from_secs(2));
//! ```

use std::time::Duration;

/// Configuration for a [`Mediator`](crate::Mediator).
#[derive(Clone, Debug, Default)]
pub struct MediatorConfig {
    /// Advisory time budget for dispatching one queued message.
    ///
    /// When set, a dispatch that runs longer produces a warning naming the
    /// message type and the configured budget. The slow dispatch is **not**
    /// cancelled; the worker waits for it to finish before taking the next
    /// message, so queued ordering is preserved at the cost of liveness.
    ///
    /// When `None` (the default) the worker dispatches directly, without the
    /// per-message timer race on the hot path.
    pub dispatch_timeout: Option<Duration>,
}
