//! # Queue worker for asynchronous dispatch.
//!
//! A single dedicated worker drains the unbounded message queue and runs the
//! same inline dispatch routine the `SameThread` path uses. Because there is
//! exactly one worker, queued messages are globally FIFO — across all queued
//! message types, not just within one.
//!
//! ## Worker lifetime
//! ```text
//! Created ──start()──► Running ──cancel/queue closed──► Stopped
//!                        │
//!                        ├─ no timeout: dispatch directly on the worker
//!                        └─ timeout:    dispatch on spawn_blocking,
//!                                       raced against a timer; on timer win,
//!                                       warn and AWAIT the slow dispatch
//! ```
//!
//! ## Rules
//! - The worker suspends only while waiting for the next item (or, with a
//!   timeout, for the dispatch/timer race). No busy polling.
//! - The per-message timeout is advisory: it logs a warning, it never
//!   cancels the in-flight dispatch. The next item is processed only after
//!   the slow dispatch finishes — ordering over liveness, by contract.
//! - Cancellation during an idle wait exits the loop cleanly; items still
//!   queued at that point are abandoned.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::core::dispatch::{self, panic_message};
use crate::messages::Envelope;
use crate::registry::SubscriptionRegistry;

/// Drains the queue until cancellation or queue closure.
pub(crate) async fn run_queue(
    registry: Arc<SubscriptionRegistry>,
    mut queue: UnboundedReceiver<Envelope>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
) {
    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            next = queue.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        match timeout {
            None => dispatch_on_worker(&registry, &envelope),
            Some(budget) => dispatch_with_budget(&registry, envelope, budget).await,
        }
    }
}

/// Hot path: dispatch directly on the worker, no timer race.
///
/// Per-handler panics are already isolated inside the dispatch routine; this
/// outer guard only covers the routine itself so the queue loop survives
/// anything.
fn dispatch_on_worker(registry: &Arc<SubscriptionRegistry>, envelope: &Envelope) {
    let guarded = panic::catch_unwind(AssertUnwindSafe(|| {
        dispatch::dispatch_now(registry, envelope);
    }));
    if let Err(payload) = guarded {
        error!(
            message_type = envelope.type_name,
            panic = panic_message(payload.as_ref()),
            "unhandled panic while dispatching queued message"
        );
    }
}

/// Timeout path: run the dispatch as its own blocking unit and race it
/// against a timer. The timer only warns; the dispatch is always awaited to
/// completion before the worker takes the next message.
async fn dispatch_with_budget(
    registry: &Arc<SubscriptionRegistry>,
    envelope: Envelope,
    budget: Duration,
) {
    let job_registry = Arc::clone(registry);
    let job_envelope = envelope.clone();
    let mut job =
        tokio::task::spawn_blocking(move || dispatch_on_worker(&job_registry, &job_envelope));

    tokio::select! {
        joined = &mut job => report_join(joined, envelope.type_name),
        _ = tokio::time::sleep(budget) => {
            warn!(
                message_type = envelope.type_name,
                timeout = ?budget,
                "dispatch exceeded the configured timeout; waiting for it to finish"
            );
            report_join(job.await, envelope.type_name);
        }
    }
}

fn report_join(joined: Result<(), tokio::task::JoinError>, type_name: &'static str) {
    if let Err(join_error) = joined {
        error!(
            message_type = type_name,
            error = %join_error,
            "dispatch task failed to join"
        );
    }
}
