// Tasks spawned by `Resolver::start`. Each one exits as soon as the
// activation's cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::address::{AddressSet, State};
use crate::config::AddressComparison;
use crate::debounce::debounce;
use crate::target::Target;
use crate::traits::{ClientConn, DirectoryClient};

/// Offer one trigger signal without blocking
///
/// A full channel already holds a pending trigger, which covers this one.
pub(super) fn offer_trigger(resolves: &mpsc::Sender<()>, source: &'static str) {
    match resolves.try_send(()) {
        Ok(()) => trace!(source, "Trigger queued"),
        Err(TrySendError::Full(())) => trace!(source, "Trigger already pending, coalesced"),
        Err(TrySendError::Closed(())) => debug!(source, "Resolver stopped, trigger dropped"),
    }
}

/// Debounced lookups: one `get_addresses` at a time, results forwarded
pub(super) async fn run_resolve_executor(
    cancel: CancellationToken,
    debounce_interval: Duration,
    resolves: mpsc::Receiver<()>,
    client: Arc<dyn DirectoryClient>,
    target: Target,
    results: mpsc::Sender<AddressSet>,
) {
    let client = client.as_ref();
    let (target, results) = (&target, &results);

    debounce(cancel, debounce_interval, resolves, move || {
        resolve_once(client, target, results)
    })
    .await;
}

async fn resolve_once(
    client: &dyn DirectoryClient,
    target: &Target,
    results: &mpsc::Sender<AddressSet>,
) {
    match client.get_addresses(target).await {
        Ok(addrs) => {
            debug!(
                service = %target,
                addrs = ?addrs.as_slice(),
                "Address lookup succeeded"
            );
            if results.send(addrs).await.is_err() {
                debug!(service = %target, "Reconcile loop gone, lookup result dropped");
            }
        }
        Err(e) => {
            // The next periodic tick or manual trigger retries
            error!(
                service = %target,
                directory = client.directory_name(),
                "Address lookup failed: {}",
                e
            );
        }
    }
}

/// A trigger every `refresh_interval`, first one a full interval after start
pub(super) async fn run_periodic_resolve(
    cancel: CancellationToken,
    refresh_interval: Duration,
    resolves: mpsc::Sender<()>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + refresh_interval, refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                debug!("Refresh timer ticked");
                offer_trigger(&resolves, "periodic");
            }
        }
    }
}

/// Forward the directory's watch stream straight onto the results channel
pub(super) async fn run_passive_resolve(
    cancel: CancellationToken,
    client: Arc<dyn DirectoryClient>,
    target: Target,
    results: mpsc::Sender<AddressSet>,
) {
    let mut changes = client.watch_addresses(&target);

    loop {
        let addrs = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = changes.next() => match next {
                Some(addrs) => addrs,
                None => {
                    warn!(
                        service = %target,
                        directory = client.directory_name(),
                        "Watch stream ended, relying on periodic refresh"
                    );
                    return;
                }
            },
        };

        debug!(service = %target, addrs = ?addrs.as_slice(), "Watch pushed addresses");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            sent = results.send(addrs) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

/// Apply changed address sets to the consumer
///
/// Owns `last`, the set most recently handed to the consumer. It starts
/// empty, so an empty first result is not forwarded.
pub(super) async fn run_reconcile(
    cancel: CancellationToken,
    conn: Arc<dyn ClientConn>,
    target: Target,
    comparison: AddressComparison,
    resolves: mpsc::Sender<()>,
    mut results: mpsc::Receiver<AddressSet>,
) {
    offer_trigger(&resolves, "bootstrap");

    let mut last = AddressSet::empty();
    loop {
        let addrs = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(service = %target, "Reconcile loop closed");
                return;
            }
            next = results.recv() => match next {
                Some(addrs) => addrs,
                None => return,
            },
        };

        if addrs.same_as(&last, comparison) {
            debug!(service = %target, "Addresses unchanged");
            continue;
        }

        info!(
            service = %target,
            previous = last.len(),
            current = addrs.len(),
            "Applying new addresses"
        );
        conn.update_state(State::from_addresses(&addrs));
        last = addrs;
    }
}
