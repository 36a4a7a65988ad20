//! Subscription storage: per-message-type ordered subscriber lists behind a
//! single reader/writer lock, plus the cached dispatch-affinity decision.

mod set;
mod subscription;

pub(crate) use set::SubscriptionRegistry;
pub(crate) use subscription::{Delivery, Subscription, SubscriptionKey, subscriber_token};
