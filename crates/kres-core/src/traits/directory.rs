// # Directory Client Trait
//
// Defines the interface for querying and watching the directory service
// that knows which endpoints currently back a target.
//
// ## Implementations
//
// - In-memory: `kres_core::MemoryDirectory` (embedding, tests)
// - DNS: `kres-directory-dns` crate
//
// ## Usage
//
// ```rust,ignore
// use kres_core::{DirectoryClient, Target};
// use tokio_stream::StreamExt;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* DirectoryClient implementation */;
//     let target: Target = "greeter.prod:grpc".parse()?;
//
//     // Point lookup
//     let addrs = client.get_addresses(&target).await?;
//
//     // Membership changes
//     let mut changes = client.watch_addresses(&target);
//     while let Some(addrs) = changes.next().await {
//         println!("endpoints changed: {:?}", addrs);
//     }
//
//     Ok(())
// }
// ```

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::address::AddressSet;
use crate::target::Target;

/// Stream of address sets pushed by a directory watch
pub type AddressStream = Pin<Box<dyn Stream<Item = AddressSet> + Send + 'static>>;

/// Trait for directory-service clients
///
/// This trait defines two capabilities:
/// 1. **get_addresses()**: Look up the current endpoints of a target
/// 2. **watch_addresses()**: Stream of endpoint sets as membership changes
///
/// Implementations must be thread-safe; the resolver shares one client
/// between its lookup and watch tasks.
///
/// ## Responsibilities
///
/// - Talk to the backing registry and enforce any request timeouts
/// - Interpret the [`Target`] (the resolver treats it as opaque)
///
/// ## Not Responsibilities
///
/// - Retrying failed lookups (the resolver's next trigger retries)
/// - Suppressing unchanged results (the resolver compares against the
///   last applied set)
/// - Rate limiting (lookups are debounced by the resolver)
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Look up the endpoints currently backing `target`
    ///
    /// # Returns
    ///
    /// - `Ok(AddressSet)`: The endpoints, in the directory's order
    /// - `Err(Error)`: If the lookup failed
    async fn get_addresses(&self, target: &Target) -> Result<AddressSet, crate::Error>;

    /// Watch `target` for membership changes
    ///
    /// Returns a stream that yields the full endpoint set each time it
    /// changes upstream.
    ///
    /// # Behavior
    ///
    /// - May yield nothing at all if the directory has no push channel
    /// - Ending the stream stops the watch; the resolver keeps polling
    /// - Must be cancellation-safe (dropping the stream stops watching)
    fn watch_addresses(&self, target: &Target) -> AddressStream;

    /// Short name used in log output
    fn directory_name(&self) -> &'static str;
}

/// Helper trait for constructing directory clients from configuration
pub trait DirectoryClientFactory: Send + Sync {
    /// Create a DirectoryClient instance from configuration
    ///
    /// # Parameters
    ///
    /// - `options`: Client-specific options (`null` when none were configured)
    ///
    /// # Returns
    ///
    /// A shared DirectoryClient trait object
    fn create(&self, options: &serde_json::Value)
    -> Result<Arc<dyn DirectoryClient>, crate::Error>;
}
