//! Consumer-side connection trait

use crate::address::State;

/// Trait for the consumer that routes requests over the resolved endpoints
///
/// The resolver only ever pushes into it. Implementations must accept
/// repeated calls with overlapping or identical content, and be safe to
/// call from any task.
pub trait ClientConn: Send + Sync {
    /// Replace the consumer's endpoint list
    fn update_state(&self, state: State);
}
