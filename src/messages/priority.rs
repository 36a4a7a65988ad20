//! # Subscription priority.
//!
//! [`Priority`] orders handler invocation among subscriptions of the **same**
//! message type: higher priority runs first. It has no effect across message
//! types and does not participate in subscription identity — removal matches
//! on (subscriber, handler) only.

/// Dispatch order among subscribers of one message type.
///
/// Ties between equal priorities are resolved once, at insertion time, by the
/// registry's sort; no further order is guaranteed between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Runs after `Normal` subscribers.
    Low,
    /// Default for subscriptions that do not specify a priority.
    Normal,
    /// Runs before `Normal` subscribers.
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}
