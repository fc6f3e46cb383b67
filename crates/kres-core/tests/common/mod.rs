//! Test doubles and common utilities for resolver contract tests
//!
//! The doubles count every interaction so tests can assert on what the
//! resolver did, not just on what the consumer ended up with.

#![allow(dead_code)]

use kres_core::error::Result;
use kres_core::traits::AddressStream;
use kres_core::{
    AddressSet, ClientConn, DirectoryClient, Error, Resolver, ResolverConfig, State, Target,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// One scripted answer to `get_addresses`
#[derive(Debug, Clone)]
pub enum Answer {
    Addrs(Vec<&'static str>),
    Fail(&'static str),
    /// Never completes
    Hang,
}

/// A directory whose lookups follow a script and whose watch is driven by
/// the test
///
/// The last scripted answer repeats forever.
pub struct ScriptedDirectory {
    script: Mutex<VecDeque<Answer>>,
    latency: Duration,
    watch_enabled: bool,
    watch_tx: broadcast::Sender<AddressSet>,
    lookup_calls: AtomicUsize,
    watch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedDirectory {
    pub fn new(script: Vec<Answer>) -> Arc<Self> {
        Self::with_latency(script, Duration::ZERO)
    }

    pub fn with_latency(script: Vec<Answer>, latency: Duration) -> Arc<Self> {
        Self::build(script, latency, true)
    }

    /// A directory whose watch streams end immediately
    pub fn without_watch(script: Vec<Answer>) -> Arc<Self> {
        Self::build(script, Duration::ZERO, false)
    }

    fn build(script: Vec<Answer>, latency: Duration, watch_enabled: bool) -> Arc<Self> {
        assert!(!script.is_empty(), "script needs at least one answer");
        let (watch_tx, _) = broadcast::channel(16);

        Arc::new(Self {
            script: Mutex::new(script.into()),
            latency,
            watch_enabled,
            watch_tx,
            lookup_calls: AtomicUsize::new(0),
            watch_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Push an address set to every open watch stream
    pub fn push(&self, addrs: &[&str]) {
        let _ = self.watch_tx.send(AddressSet::new(addrs.iter().copied()));
    }

    /// Number of open watch streams
    pub fn watchers(&self) -> usize {
        self.watch_tx.receiver_count()
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_answer(&self) -> Answer {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

/// Decrements the in-flight counter even when the lookup is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DirectoryClient for ScriptedDirectory {
    async fn get_addresses(&self, _target: &Target) -> Result<AddressSet> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_answer() {
            Answer::Addrs(addrs) => Ok(AddressSet::new(addrs)),
            Answer::Fail(msg) => Err(Error::directory(msg)),
            Answer::Hang => std::future::pending().await,
        }
    }

    fn watch_addresses(&self, _target: &Target) -> AddressStream {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.watch_enabled {
            return Box::pin(tokio_stream::empty());
        }
        let stream =
            BroadcastStream::new(self.watch_tx.subscribe()).filter_map(|item| item.ok());
        Box::pin(stream)
    }

    fn directory_name(&self) -> &'static str {
        "scripted"
    }
}

/// A consumer that records every state it receives
#[derive(Default)]
pub struct RecordingConn {
    states: Mutex<Vec<State>>,
}

impl RecordingConn {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn update_count(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    /// Address lists of every received state, in order
    pub fn history(&self) -> Vec<Vec<String>> {
        self.states
            .lock()
            .unwrap()
            .iter()
            .map(|state| state.addresses.iter().map(|a| a.addr.clone()).collect())
            .collect()
    }
}

impl ClientConn for RecordingConn {
    fn update_state(&self, state: State) {
        self.states.lock().unwrap().push(state);
    }
}

pub fn greeter() -> Target {
    Target::new("prod", "greeter", "grpc")
}

/// Resolver config with millisecond intervals
pub fn fast_config(refresh_ms: u64, debounce_ms: u64) -> ResolverConfig {
    ResolverConfig::new()
        .with_refresh_interval(Duration::from_millis(refresh_ms))
        .with_debounce_interval(Duration::from_millis(debounce_ms))
}

pub fn new_resolver(
    conn: &Arc<RecordingConn>,
    directory: &Arc<ScriptedDirectory>,
    config: ResolverConfig,
) -> Resolver {
    Resolver::new(greeter(), conn.clone(), directory.clone(), config)
        .expect("resolver construction succeeds")
}

/// Sleep in small steps until `condition` holds or `limit` elapses
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    condition()
}

pub fn addrs(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
