//! Plugin-based directory registry
//!
//! The registry maps dial-target URL schemes to directory client factories,
//! so resolvers can be built from a string like `k8s:///greeter.prod:grpc`
//! without hardcoding which directory backs which scheme.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kres_core::{KresConfig, MemoryDirectoryFactory, ResolverRegistry};
//!
//! let registry = ResolverRegistry::new();
//! registry.register_directory("memory", Box::new(MemoryDirectoryFactory));
//!
//! let resolver = registry.build("memory:///greeter.prod:grpc", conn, &KresConfig::new())?;
//! resolver.start()?;
//! ```
//!
//! ## Registration
//!
//! Directory crates should expose a `register()` function:
//!
//! ```rust,ignore
//! // In kres-directory-dns
//! pub fn register(registry: &ResolverRegistry) {
//!     registry.register_directory("dns", Box::new(DnsDirectoryFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::KresConfig;
use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::target::DialTarget;
use crate::traits::{ClientConn, DirectoryClient, DirectoryClientFactory};

/// Registry of directory client factories keyed by URL scheme
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ResolverRegistry {
    directories: RwLock<HashMap<String, Arc<dyn DirectoryClientFactory>>>,
}

impl ResolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory client factory
    ///
    /// Schemes are case-insensitive. Registering a scheme twice replaces the
    /// earlier factory.
    ///
    /// # Parameters
    ///
    /// - `scheme`: Dial-target scheme (e.g., "k8s", "dns")
    /// - `factory`: Factory object for creating directory clients
    pub fn register_directory(
        &self,
        scheme: impl Into<String>,
        factory: Box<dyn DirectoryClientFactory>,
    ) {
        let scheme = scheme.into().to_ascii_lowercase();
        debug!(scheme = %scheme, "Registering directory factory");
        let mut directories = self
            .directories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        directories.insert(scheme, Arc::from(factory));
    }

    /// Check whether a factory is registered for `scheme`
    pub fn has_scheme(&self, scheme: &str) -> bool {
        let directories = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        directories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<String> {
        let directories = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut schemes: Vec<String> = directories.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Create a directory client
    ///
    /// # Parameters
    ///
    /// - `scheme`: Registered scheme
    /// - `options`: Options handed to the factory
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn DirectoryClient>)`: Created client
    /// - `Err(Error::UnknownScheme)`: No factory for `scheme`
    /// - `Err(Error)`: The factory rejected the options
    pub fn create_directory(
        &self,
        scheme: &str,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn DirectoryClient>> {
        // Clone the factory out so the lock is not held while it runs
        let factory = {
            let directories = self
                .directories
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            directories
                .get(&scheme.to_ascii_lowercase())
                .cloned()
                .ok_or_else(|| Error::unknown_scheme(scheme))?
        };

        factory.create(options)
    }

    /// Build an inert resolver for a dial target
    ///
    /// The scheme picks the factory, `config.directories[scheme]` (or `null`)
    /// is passed to it, and `config.resolver` configures the resolver.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use kres_core::{ClientConn, KresConfig, MemoryDirectoryFactory, ResolverRegistry, State};
    /// # struct Printer;
    /// # impl ClientConn for Printer { fn update_state(&self, state: State) { println!("{:?}", state); } }
    /// # fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    /// let registry = ResolverRegistry::new();
    /// registry.register_directory("memory", Box::new(MemoryDirectoryFactory));
    ///
    /// let resolver = registry.build("memory:///greeter.prod:grpc", Arc::new(Printer), &KresConfig::new())?;
    /// assert!(!resolver.is_active());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(
        &self,
        dial_target: &str,
        conn: Arc<dyn ClientConn>,
        config: &KresConfig,
    ) -> Result<Resolver> {
        let dial = DialTarget::parse(dial_target)?;
        let client = self.create_directory(&dial.scheme, &config.directory_options(&dial.scheme))?;

        debug!(
            scheme = %dial.scheme,
            service = %dial.target,
            directory = client.directory_name(),
            "Building resolver"
        );

        Resolver::new(dial.target, conn, client, config.resolver.clone())
    }
}
