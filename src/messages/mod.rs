//! Message typing: the [`Message`] trait, per-type [`ThreadAffinity`],
//! subscription [`Priority`], and the internal queued-message envelope.

mod envelope;
mod message;
mod priority;

pub use message::{Message, ThreadAffinity};
pub use priority::Priority;

pub(crate) use envelope::Envelope;
