// # Cluster DNS Directory
//
// This crate provides a DirectoryClient backed by cluster DNS.
//
// ## Purpose
//
// Resolves a target through the service record the cluster publishes for
// it, `<service>.<namespace>.svc.<cluster_domain>`. For headless services
// that name returns one record per ready endpoint.
//
// ## Limitations
//
// DNS has no change notification. The watch stream never yields, so the
// resolver only learns about changes through periodic and manual lookups.
// Named ports cannot be looked up; the target's port must be numeric.

use kres_core::ResolverRegistry;
use kres_core::traits::{AddressStream, DirectoryClient, DirectoryClientFactory};
use kres_core::{AddressSet, Error, Result, Target};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

/// Cluster domain used when none is configured
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Directory client resolving service records through the system resolver
#[derive(Debug, Clone)]
pub struct DnsDirectory {
    cluster_domain: String,
}

impl DnsDirectory {
    /// Create a DNS directory for `cluster_domain` (e.g. "cluster.local")
    pub fn new(cluster_domain: impl Into<String>) -> Self {
        let cluster_domain = cluster_domain.into();
        Self {
            cluster_domain: cluster_domain.trim_matches('.').to_string(),
        }
    }

    /// The cluster domain names are built under
    pub fn cluster_domain(&self) -> &str {
        &self.cluster_domain
    }

    /// DNS name of the service behind `target`
    pub fn service_name(&self, target: &Target) -> String {
        format!(
            "{}.{}.svc.{}",
            target.service, target.namespace, self.cluster_domain
        )
    }

    fn port(target: &Target) -> Result<u16> {
        target.port.parse().map_err(|_| {
            Error::invalid_target(format!(
                "DNS directory needs a numeric port, got '{}' in {}",
                target.port, target
            ))
        })
    }
}

impl Default for DnsDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_DOMAIN)
    }
}

#[async_trait]
impl DirectoryClient for DnsDirectory {
    async fn get_addresses(&self, target: &Target) -> Result<AddressSet> {
        let port = Self::port(target)?;
        let host = self.service_name(target);

        trace!(host = %host, port, "Looking up service record");

        let mut addrs: Vec<String> = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| Error::directory(format!("DNS lookup of {} failed: {}", host, e)))?
            .map(|addr| addr.to_string())
            .collect();

        // Resolver answers rotate; sort so unchanged membership compares equal
        addrs.sort();
        addrs.dedup();

        debug!(host = %host, count = addrs.len(), "DNS lookup complete");
        Ok(AddressSet::from(addrs))
    }

    fn watch_addresses(&self, _target: &Target) -> AddressStream {
        Box::pin(tokio_stream::pending())
    }

    fn directory_name(&self) -> &'static str {
        "dns"
    }
}

#[derive(Debug, Deserialize)]
struct DnsDirectoryOptions {
    #[serde(default = "default_cluster_domain")]
    cluster_domain: String,
}

fn default_cluster_domain() -> String {
    DEFAULT_CLUSTER_DOMAIN.to_string()
}

/// Factory for creating DNS directories
///
/// Options: `{"cluster_domain": "cluster.local"}`, or `null` for the default.
pub struct DnsDirectoryFactory;

impl DirectoryClientFactory for DnsDirectoryFactory {
    fn create(&self, options: &serde_json::Value) -> Result<Arc<dyn DirectoryClient>> {
        if options.is_null() {
            return Ok(Arc::new(DnsDirectory::default()));
        }

        let options: DnsDirectoryOptions = serde_json::from_value(options.clone())?;
        if options.cluster_domain.trim_matches('.').is_empty() {
            return Err(Error::config("cluster_domain must not be empty"));
        }

        Ok(Arc::new(DnsDirectory::new(options.cluster_domain)))
    }
}

/// Register the DNS directory with a registry
///
/// # Example
///
/// ```rust
/// let registry = kres_core::ResolverRegistry::new();
/// kres_directory_dns::register(&registry);
/// assert!(registry.has_scheme("dns"));
/// ```
pub fn register(registry: &ResolverRegistry) {
    registry.register_directory("dns", Box::new(DnsDirectoryFactory));
}
