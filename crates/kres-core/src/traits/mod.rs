//! Core traits for the resolver
//!
//! This module defines the abstract interfaces the resolver is wired to.
//!
//! - [`DirectoryClient`]: Query and watch the directory service
//! - [`ClientConn`]: Receive endpoint updates

pub mod client_conn;
pub mod directory;

pub use client_conn::ClientConn;
pub use directory::{AddressStream, DirectoryClient, DirectoryClientFactory};
