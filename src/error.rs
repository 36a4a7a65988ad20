//! Error types used by the mediator.
//!
//! [`MediatorError`] covers contract violations raised synchronously to the
//! caller that committed them. Failures inside user handlers are **not**
//! represented here: a panicking handler is caught, logged, and isolated so
//! it can never poison delivery to other subscribers. Expected shutdown races
//! (publishing or subscribing while stopping) are logged warnings, not
//! errors.

use thiserror::Error;

/// # Contract violations raised by the mediator.
///
/// These are programming errors: they fail the offending call but never the
/// dispatcher itself, and they never corrupt registry state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MediatorError {
    /// The same (subscriber, handler) pair was registered twice for one
    /// message type. The first registration stays intact.
    #[error("handler in {subscriber_type} is already subscribed to {message_type}")]
    DuplicateSubscription {
        /// Message type the duplicate targeted.
        message_type: &'static str,
        /// Type of the subscriber that attempted the duplicate.
        subscriber_type: &'static str,
    },

    /// Operation on a mediator whose resources have been released via
    /// [`Mediator::dispose`](crate::Mediator::dispose).
    #[error("mediator has been disposed")]
    Disposed,

    /// [`Mediator::start`](crate::Mediator::start) was called while the
    /// queue worker was already running.
    #[error("mediator queue worker is already started")]
    AlreadyStarted,

    /// [`Mediator::start`](crate::Mediator::start) was called from outside
    /// a tokio runtime, so there is nothing to spawn the queue worker onto.
    #[error("mediator must be started from within a tokio runtime")]
    NoRuntime,
}

impl MediatorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use postbus::MediatorError;
    ///
    /// assert_eq!(MediatorError::Disposed.as_label(), "mediator_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MediatorError::DuplicateSubscription { .. } => "duplicate_subscription",
            MediatorError::Disposed => "mediator_disposed",
            MediatorError::AlreadyStarted => "mediator_already_started",
            MediatorError::NoRuntime => "mediator_no_runtime",
        }
    }
}
