//! Checkpoint persistence.
//!
//! The checkpoint is a single integer: the identifier of the last notice
//! delivered downstream. It is read once when a run starts and overwritten
//! after every delivered notice.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Watcher configuration
//! ├── last_id.txt           # Checkpoint (plain integer)
//! └── stats.json            # Report of the last run
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStore;

/// Durable store for the checkpoint.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the checkpoint; `None` means the board was never bootstrapped.
    async fn load(&self) -> Result<Option<u64>>;

    /// Atomically overwrite the checkpoint.
    async fn save(&self, id: u64) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
