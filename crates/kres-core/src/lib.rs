// # kres-core
//
// Core library for resolving the live endpoints of a logical service and
// keeping an RPC client's connection pool in step with them.
//
// ## Architecture Overview
//
// - **DirectoryClient**: Trait for querying and watching a service directory
// - **ClientConn**: Trait for the consumer that receives endpoint updates
// - **Resolver**: Orchestrator merging periodic, watch and manual triggers
//   into a de-duplicated stream of state updates
// - **debounce**: Coalescer that bounds how often lookups run
// - **ResolverRegistry**: Plugin-based registry of directory clients by scheme
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Directory access and consumers are traits
// 2. **Event-Driven**: Watch streams push changes without a lookup round-trip
// 3. **Plugin-Based**: Directory clients are registered per URL scheme
// 4. **Library-First**: No global state, no process lifecycle assumptions
// 5. **Idempotency**: Unchanged address sets never reach the consumer

pub mod address;
pub mod config;
pub mod debounce;
pub mod directory;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod target;
pub mod traits;

// Re-export core types for convenience
pub use address::{Address, AddressKind, AddressSet, State};
pub use config::{AddressComparison, KresConfig, ResolverConfig};
pub use debounce::debounce;
pub use directory::{MemoryDirectory, MemoryDirectoryFactory};
pub use error::{Error, Result};
pub use registry::ResolverRegistry;
pub use resolver::{ResolveNowOptions, Resolver};
pub use target::{DialTarget, Target};
pub use traits::{ClientConn, DirectoryClient, DirectoryClientFactory};
