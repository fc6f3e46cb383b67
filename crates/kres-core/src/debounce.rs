//! Trigger coalescing
//!
//! [`debounce`] turns a channel of trigger signals into a bounded-rate
//! sequence of action runs:
//!
//! - A trigger arriving after the coalescer has been quiet for at least
//!   `min_interval` runs the action at once (leading edge).
//! - A trigger arriving sooner is held until `min_interval` has passed since
//!   the previous run; everything received in the meantime is folded into
//!   that single trailing run.
//!
//! A steady stream of triggers therefore yields at most one run per
//! `min_interval`, and the latest trigger is always covered by a run that
//! starts after it was received.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Run `action` for coalesced `triggers`, at most once per `min_interval`
///
/// The action is awaited on the caller's task, so two runs never overlap.
/// Returns when `cancel` fires (abandoning any pending window or in-flight
/// run) or when every trigger sender has been dropped.
pub async fn debounce<F, Fut>(
    cancel: CancellationToken,
    min_interval: Duration,
    mut triggers: mpsc::Receiver<()>,
    mut action: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut last_run: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            signal = triggers.recv() => {
                if signal.is_none() {
                    debug!("Trigger channel closed, debounce loop exiting");
                    return;
                }
            }
        }

        if let Some(ran_at) = last_run {
            let ready_at = ran_at + min_interval;
            if ready_at > Instant::now() {
                trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Holding trigger until debounce window closes"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep_until(ready_at) => {}
                }
            }
        }

        // Triggers queued while waiting are covered by this run
        while triggers.try_recv().is_ok() {
            trace!("Coalesced pending trigger");
        }

        last_run = Some(Instant::now());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = action() => {}
        }
    }
}
