//! Address sets and the state pushed to consumers

use serde::{Deserialize, Serialize};

use crate::config::AddressComparison;

/// Ordered `host:port` endpoints produced by one successful resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressSet {
    addrs: Vec<String>,
}

impl AddressSet {
    /// Create an address set, keeping the given order
    pub fn new<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addrs: addrs.into_iter().map(Into::into).collect(),
        }
    }

    /// An address set with no endpoints
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of addresses
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Whether the set has no addresses
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Iterate over the addresses in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addrs.iter().map(String::as_str)
    }

    /// The addresses as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.addrs
    }

    /// Compare two sets under the given rule
    pub fn same_as(&self, other: &AddressSet, comparison: AddressComparison) -> bool {
        match comparison {
            AddressComparison::Sequence => self.addrs == other.addrs,
            AddressComparison::Set => self.normalized() == other.normalized(),
        }
    }

    fn normalized(&self) -> Vec<&str> {
        let mut addrs: Vec<&str> = self.iter().collect();
        addrs.sort_unstable();
        addrs.dedup();
        addrs
    }
}

impl From<Vec<String>> for AddressSet {
    fn from(addrs: Vec<String>) -> Self {
        Self { addrs }
    }
}

impl<'a> FromIterator<&'a str> for AddressSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl FromIterator<String> for AddressSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Role of an address in the consumer's pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// A server that handles requests directly
    Backend,
    /// A look-aside load balancer
    Balancer,
}

/// One endpoint as seen by the consumer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// `host:port`
    pub addr: String,
    /// Role of the endpoint
    pub kind: AddressKind,
}

impl Address {
    /// Create a backend address
    pub fn backend(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            kind: AddressKind::Backend,
        }
    }
}

/// State handed to [`crate::ClientConn::update_state`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Endpoints in resolution order
    pub addresses: Vec<Address>,
}

impl State {
    /// Build a state listing every address as a backend, preserving order
    pub fn from_addresses(addrs: &AddressSet) -> Self {
        Self {
            addresses: addrs.iter().map(Address::backend).collect(),
        }
    }

    /// The `host:port` strings of this state, in order
    pub fn addrs(&self) -> Vec<&str> {
        self.addresses.iter().map(|a| a.addr.as_str()).collect()
    }
}
