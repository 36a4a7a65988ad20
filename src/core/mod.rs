//! Dispatch machinery: the shared inline dispatch routine, the queue
//! worker, the [`Mediator`] facade, and the [`Hosted`] lifecycle contract.

mod dispatch;
mod engine;
mod hosted;
mod mediator;

pub use hosted::Hosted;
pub use mediator::Mediator;
