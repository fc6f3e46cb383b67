// # Memory Directory
//
// In-memory implementation of DirectoryClient.
//
// ## Purpose
//
// Holds endpoint sets that the embedding application sets by hand, and
// pushes every change to watchers. Useful for tests, demos, and setups where
// endpoints come from somewhere the resolver cannot query itself (a config
// file, a control-plane message).
//
// ## Behavior
//
// - Lookups of a target that was never set (or was removed) fail
// - Watchers see each later change; they are not replayed the current set
// - Removing a target does not end its watch streams

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::address::AddressSet;
use crate::target::Target;
use crate::traits::{AddressStream, DirectoryClient, DirectoryClientFactory};
use crate::Error;

type Entries = HashMap<Target, watch::Sender<Option<AddressSet>>>;

/// In-memory directory implementation
///
/// Every target gets a `watch` channel; the current value is the target's
/// address set, or `None` when it has none registered.
///
/// # Example
///
/// ```rust,no_run
/// use kres_core::{AddressSet, DirectoryClient, MemoryDirectory, Target};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let directory = MemoryDirectory::new();
///     let target: Target = "greeter.prod:grpc".parse()?;
///
///     directory.set_addresses(&target, AddressSet::new(["10.0.0.1:50051"]));
///
///     let addrs = directory.get_addresses(&target).await?;
///     assert_eq!(addrs.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<RwLock<Entries>>,
}

impl MemoryDirectory {
    /// Create a new empty memory directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the address set of `target`, notifying its watchers
    pub fn set_addresses(&self, target: &Target, addrs: AddressSet) {
        let mut entries = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(target.clone())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(addrs));
    }

    /// Forget the address set of `target`
    ///
    /// Later lookups fail until it is set again. Watchers are not notified.
    pub fn remove(&self, target: &Target) {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = entries.get(target) {
            sender.send_replace(None);
        }
    }

    /// Number of targets with a registered address set
    pub fn len(&self) -> usize {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|sender| sender.borrow().is_some())
            .count()
    }

    /// Check if no target has a registered address set
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DirectoryClient for MemoryDirectory {
    async fn get_addresses(&self, target: &Target) -> Result<AddressSet, Error> {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(target)
            .and_then(|sender| sender.borrow().clone())
            .ok_or_else(|| Error::directory(format!("No addresses registered for {}", target)))
    }

    fn watch_addresses(&self, target: &Target) -> AddressStream {
        let mut entries = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let receiver = entries
            .entry(target.clone())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();

        Box::pin(WatchStream::from_changes(receiver).filter_map(|addrs| addrs))
    }

    fn directory_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, Default, Deserialize)]
struct MemoryDirectoryOptions {
    /// `service.namespace:port` -> addresses
    #[serde(default)]
    targets: HashMap<String, Vec<String>>,
}

/// Factory for creating MemoryDirectory instances
///
/// Options: `{"targets": {"greeter.prod:grpc": ["10.0.0.1:50051"]}}`,
/// or `null` for an empty directory.
pub struct MemoryDirectoryFactory;

impl DirectoryClientFactory for MemoryDirectoryFactory {
    fn create(&self, options: &serde_json::Value) -> Result<Arc<dyn DirectoryClient>, Error> {
        let options: MemoryDirectoryOptions = if options.is_null() {
            MemoryDirectoryOptions::default()
        } else {
            serde_json::from_value(options.clone())?
        };

        let directory = MemoryDirectory::new();
        for (target, addrs) in options.targets {
            directory.set_addresses(&target.parse()?, AddressSet::from(addrs));
        }

        Ok(Arc::new(directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn greeter() -> Target {
        Target::new("prod", "greeter", "grpc")
    }

    #[tokio::test]
    async fn test_memory_directory_basic() {
        let directory = MemoryDirectory::new();
        assert!(directory.is_empty());

        directory.set_addresses(&greeter(), AddressSet::new(["10.0.0.1:80"]));
        assert_eq!(directory.len(), 1);

        let addrs = directory.get_addresses(&greeter()).await.unwrap();
        assert_eq!(addrs, AddressSet::new(["10.0.0.1:80"]));

        directory.remove(&greeter());
        assert!(directory.is_empty());
        assert!(matches!(
            directory.get_addresses(&greeter()).await,
            Err(Error::Directory(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_directory_unknown_target() {
        let directory = MemoryDirectory::new();
        let err = directory.get_addresses(&greeter()).await.unwrap_err();
        assert!(err.to_string().contains("greeter.prod:grpc"));
    }

    #[tokio::test]
    async fn test_memory_directory_watch_sees_changes_only() {
        let directory = MemoryDirectory::new();
        directory.set_addresses(&greeter(), AddressSet::new(["10.0.0.1:80"]));

        let mut changes = directory.watch_addresses(&greeter());

        directory.set_addresses(&greeter(), AddressSet::new(["10.0.0.1:80", "10.0.0.2:80"]));

        let next = tokio::time::timeout(Duration::from_secs(1), changes.next())
            .await
            .expect("watch yields the change")
            .expect("stream still open");
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_memory_directory_watch_wakes_on_set() {
        let directory = MemoryDirectory::new();
        directory.set_addresses(&greeter(), AddressSet::new(["10.0.0.1:80"]));

        let mut changes = directory.watch_addresses(&greeter());
        let mut next = tokio_test::task::spawn(changes.next());
        tokio_test::assert_pending!(next.poll());

        directory.set_addresses(&greeter(), AddressSet::new(["10.0.0.2:80"]));
        assert!(next.is_woken());
        assert_eq!(
            tokio_test::assert_ready!(next.poll()),
            Some(AddressSet::new(["10.0.0.2:80"]))
        );
    }

    #[tokio::test]
    async fn test_memory_directory_watch_before_set() {
        let directory = MemoryDirectory::new();
        let mut changes = directory.watch_addresses(&greeter());
        assert!(directory.is_empty());

        directory.set_addresses(&greeter(), AddressSet::new(["10.0.0.9:80"]));

        let next = tokio::time::timeout(Duration::from_secs(1), changes.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next, AddressSet::new(["10.0.0.9:80"]));
    }

    #[tokio::test]
    async fn test_memory_directory_factory() {
        let options = serde_json::json!({
            "targets": { "greeter.prod:grpc": ["10.0.0.1:80", "10.0.0.2:80"] }
        });
        let directory = MemoryDirectoryFactory.create(&options).unwrap();

        let addrs = directory.get_addresses(&greeter()).await.unwrap();
        assert_eq!(addrs.len(), 2);
        assert_eq!(directory.directory_name(), "memory");

        let empty = MemoryDirectoryFactory.create(&serde_json::Value::Null).unwrap();
        assert!(empty.get_addresses(&greeter()).await.is_err());

        let bad = serde_json::json!({ "targets": { "no-port": [] } });
        assert!(matches!(
            MemoryDirectoryFactory.create(&bad),
            Err(Error::InvalidTarget(_))
        ));
    }
}
