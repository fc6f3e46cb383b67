//! Resolution orchestrator
//!
//! The Resolver is responsible for:
//! - Triggering lookups periodically, on demand and at startup
//! - Rate limiting lookups through the debounce coalescer
//! - Forwarding watch pushes from the directory without a lookup
//! - Suppressing unchanged address sets before they reach the consumer
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────┐  ┌─────────────┐  ┌────────────┐
//!  │ periodic │  │ resolve_now │  │ bootstrap  │
//!  └────┬─────┘  └──────┬──────┘  └─────┬──────┘
//!       └───────────────┼───────────────┘
//!                       ▼  resolves (capacity 1)
//!              ┌──────────────────┐
//!              │ debounce/executor│── get_addresses ──▶ DirectoryClient
//!              └────────┬─────────┘                          │
//!                       ▼  results (capacity 1)              │ watch_addresses
//!              ┌──────────────────┐ ◀────────────────────────┘
//!              │  reconcile loop  │
//!              └────────┬─────────┘
//!                       ▼  only when changed
//!                  ClientConn::update_state
//! ```
//!
//! ## Lifecycle
//!
//! 1. Create with [`Resolver::new()`] (inert, no tasks)
//! 2. Activate with [`Resolver::start()`] (idempotent)
//! 3. Request extra lookups with [`Resolver::resolve_now()`]
//! 4. Deactivate with [`Resolver::close()`] or [`Resolver::shutdown()`]
//!
//! A closed resolver may be started again; each activation gets a fresh
//! cancellation token and fresh channels.

mod activities;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::target::Target;
use crate::traits::{ClientConn, DirectoryClient};

/// Options passed along with a consumer's resolve request
///
/// Carried for logging only; every request is handled the same way.
#[derive(Debug, Clone, Default)]
pub struct ResolveNowOptions {
    _reserved: (),
}

impl ResolveNowOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }
}

/// Keeps one consumer's endpoint list in step with one target
///
/// ## Threading
///
/// All methods take `&self`; the resolver can be shared behind an `Arc`.
/// Activation state sits behind a mutex that is never held across an
/// await point. Each activation runs four tasks which talk only through
/// channels and one cancellation token:
///
/// - **executor**: debounced `get_addresses` calls, one at a time
/// - **periodic**: a trigger every `refresh_interval`
/// - **passive**: forwards the directory's watch stream
/// - **reconcile**: owns the last applied set and calls the consumer
pub struct Resolver {
    target: Target,
    conn: Arc<dyn ClientConn>,
    client: Arc<dyn DirectoryClient>,
    config: ResolverConfig,
    activation: Mutex<Option<Activation>>,
}

/// Everything owned by one start/close cycle
struct Activation {
    cancel: CancellationToken,
    resolves: mpsc::Sender<()>,
    tasks: JoinSet<()>,
}

impl Resolver {
    /// Create a new resolver
    ///
    /// No tasks are started until [`Resolver::start()`] is called.
    ///
    /// # Parameters
    ///
    /// - `target`: The service to resolve
    /// - `conn`: Consumer receiving endpoint updates
    /// - `client`: Directory client used for lookups and watches
    /// - `config`: Refresh, debounce and comparison settings
    pub fn new(
        target: Target,
        conn: Arc<dyn ClientConn>,
        client: Arc<dyn DirectoryClient>,
        config: ResolverConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            target,
            conn,
            client,
            config,
            activation: Mutex::new(None),
        })
    }

    /// The target this resolver watches
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The settings this resolver was built with
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether the resolver is currently started
    pub fn is_active(&self) -> bool {
        self.lock_activation().is_some()
    }

    /// Start resolving
    ///
    /// Spawns the resolver's tasks on the current tokio runtime and queues a
    /// bootstrap lookup so the consumer is populated without waiting for the
    /// first periodic tick. Calling this while already started does nothing.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Started, or already running
    /// - `Err(Error::Runtime)`: Called outside a tokio runtime
    pub fn start(&self) -> Result<()> {
        let mut activation = self.lock_activation();
        if activation.is_some() {
            debug!(service = %self.target, "Resolver already started");
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::runtime(format!(
                "Resolver must start inside a tokio runtime: {}",
                e
            ))
        })?;

        let cancel = CancellationToken::new();
        let (resolves_tx, resolves_rx) = mpsc::channel(1);
        let (results_tx, results_rx) = mpsc::channel(1);

        let mut tasks = JoinSet::new();
        tasks.spawn_on(
            activities::run_resolve_executor(
                cancel.clone(),
                self.config.debounce_interval(),
                resolves_rx,
                self.client.clone(),
                self.target.clone(),
                results_tx.clone(),
            ),
            &handle,
        );
        tasks.spawn_on(
            activities::run_periodic_resolve(
                cancel.clone(),
                self.config.refresh_interval(),
                resolves_tx.clone(),
            ),
            &handle,
        );
        tasks.spawn_on(
            activities::run_passive_resolve(
                cancel.clone(),
                self.client.clone(),
                self.target.clone(),
                results_tx,
            ),
            &handle,
        );
        tasks.spawn_on(
            activities::run_reconcile(
                cancel.clone(),
                self.conn.clone(),
                self.target.clone(),
                self.config.address_comparison,
                resolves_tx.clone(),
                results_rx,
            ),
            &handle,
        );

        *activation = Some(Activation {
            cancel,
            resolves: resolves_tx,
            tasks,
        });

        info!(
            service = %self.target,
            directory = self.client.directory_name(),
            refresh_ms = self.config.refresh_interval_ms,
            debounce_ms = self.config.debounce_interval_ms,
            "Resolver started"
        );
        Ok(())
    }

    /// Ask for a lookup as soon as the debounce window allows
    ///
    /// Never blocks and never reports back. If a trigger is already pending
    /// the request is folded into it; before [`Resolver::start()`] it is
    /// dropped, since starting always performs a lookup.
    pub fn resolve_now(&self, options: ResolveNowOptions) {
        debug!(service = %self.target, ?options, "Resolve requested");

        match self.lock_activation().as_ref() {
            Some(activation) => {
                activities::offer_trigger(&activation.resolves, "manual");
            }
            None => debug!(
                service = %self.target,
                "Resolver not started, ignoring resolve request"
            ),
        }
    }

    /// Stop resolving without waiting for the tasks to finish
    ///
    /// Safe to call repeatedly and on a resolver that was never started.
    /// No consumer update is issued once the reconcile task observes the
    /// cancellation.
    pub fn close(&self) {
        let activation = self.lock_activation().take();
        let Some(activation) = activation else {
            return;
        };

        activation.cancel.cancel();
        let mut tasks = activation.tasks;
        tasks.detach_all();

        info!(service = %self.target, "Resolver closed");
    }

    /// Stop resolving and wait until every task has exited
    pub async fn shutdown(&self) {
        let activation = self.lock_activation().take();
        let Some(activation) = activation else {
            return;
        };

        activation.cancel.cancel();
        let mut tasks = activation.tasks;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined
                && e.is_panic()
            {
                error!(service = %self.target, "Resolver task panicked: {}", e);
            }
        }

        info!(service = %self.target, "Resolver shut down");
    }

    fn lock_activation(&self) -> MutexGuard<'_, Option<Activation>> {
        self.activation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("target", &self.target)
            .field("directory", &self.client.directory_name())
            .field("config", &self.config)
            .field("active", &self.is_active())
            .finish()
    }
}
