// # Targets
//
// A `Target` names the logical service whose endpoints are resolved:
// namespace, service name and port (a name or a number). The resolver never
// looks inside it; directory clients interpret it.
//
// Text form is `service.namespace:port`, with the namespace optional
// (`service:port` means the `default` namespace). A `DialTarget` prefixes it
// with a URL scheme selecting the directory client, e.g.
// `k8s:///greeter.prod:grpc`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Namespace assumed when a target omits one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Identifier of the logical service being resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Namespace the service lives in
    pub namespace: String,
    /// Service name
    pub service: String,
    /// Port name or number
    pub port: String,
}

impl Target {
    /// Create a new target
    pub fn new(
        namespace: impl Into<String>,
        service: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.service, self.namespace, self.port)
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_target(format!("missing port in '{}'", s)))?;

        if port.is_empty() {
            return Err(Error::invalid_target(format!("empty port in '{}'", s)));
        }

        let (service, namespace) = match host.split_once('.') {
            Some((service, namespace)) => (service, namespace),
            None => (host, DEFAULT_NAMESPACE),
        };

        if service.is_empty() {
            return Err(Error::invalid_target(format!("empty service in '{}'", s)));
        }
        if namespace.is_empty() || namespace.contains('.') {
            return Err(Error::invalid_target(format!("bad namespace in '{}'", s)));
        }

        Ok(Self::new(namespace, service, port))
    }
}

/// A target prefixed with the scheme of the directory that resolves it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    /// URL scheme (e.g. `k8s`, `dns`)
    pub scheme: String,
    /// The service to resolve
    pub target: Target,
}

impl DialTarget {
    /// Parse `scheme://[authority]/service.namespace:port`
    ///
    /// The authority is accepted and ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| Error::invalid_target(format!("missing scheme in '{}'", s)))?;

        if scheme.is_empty() {
            return Err(Error::invalid_target(format!("empty scheme in '{}'", s)));
        }

        let endpoint = rest
            .split_once('/')
            .map(|(_authority, endpoint)| endpoint)
            .ok_or_else(|| Error::invalid_target(format!("missing endpoint in '{}'", s)))?;

        if endpoint.contains('/') {
            return Err(Error::invalid_target(format!(
                "endpoint must not contain '/' in '{}'",
                s
            )));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            target: endpoint.parse()?,
        })
    }
}
