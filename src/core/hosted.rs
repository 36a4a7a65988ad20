//! # Managed-lifecycle contract for embedding the mediator in a host.
//!
//! [`Hosted`] is the start/stop interface a lifecycle host drives once each,
//! with a cancellation token available during stop to bound the wait. The
//! mediator implements it on top of its inherent
//! [`start`](crate::Mediator::start)/[`stop`](crate::Mediator::stop).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::mediator::Mediator;
use crate::error::MediatorError;

/// Start/stop contract for components managed by a lifecycle host.
///
/// The host calls each method at most once. `ctx` on
/// [`stop`](Hosted::stop) is the host's grace token: when it fires before
/// the component finished stopping, the component should give up waiting
/// (host policy decides the bound, not the component).
#[async_trait]
pub trait Hosted: Send + Sync {
    /// Brings the component up.
    async fn start(&self, ctx: CancellationToken) -> Result<(), MediatorError>;

    /// Brings the component down, waiting at most until `ctx` is cancelled.
    async fn stop(&self, ctx: CancellationToken) -> Result<(), MediatorError>;
}

#[async_trait]
impl Hosted for Mediator {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), MediatorError> {
        Mediator::start(self)
    }

    async fn stop(&self, ctx: CancellationToken) -> Result<(), MediatorError> {
        tokio::select! {
            _ = Mediator::stop(self) => {}
            _ = ctx.cancelled() => {
                warn!("host grace expired before the mediator worker finished");
            }
        }
        Ok(())
    }
}
