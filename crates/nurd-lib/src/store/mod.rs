//! Durable append-only storage for job snapshots

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::models::{JobSnapshot, StoredSnapshot};
use anyhow::Result;
use async_trait::async_trait;

/// Append-only table of snapshot rows
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append one snapshot and return it with its assigned row id
    async fn append(&self, snapshot: &JobSnapshot) -> Result<StoredSnapshot>;

    /// Read every stored row in ascending id order
    async fn read_all(&self) -> Result<Vec<StoredSnapshot>>;
}
