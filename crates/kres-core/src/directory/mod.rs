// # Directory Client Implementations
//
// This module provides implementations of the DirectoryClient trait that
// need nothing beyond the core crate.

pub mod memory;

pub use memory::{MemoryDirectory, MemoryDirectoryFactory};
