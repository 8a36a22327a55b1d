//! In-process snapshot store

use super::SnapshotStore;
use crate::models::{JobSnapshot, StoredSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Snapshot table held in memory, lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<StoredSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn append(&self, snapshot: &JobSnapshot) -> Result<StoredSnapshot> {
        let mut rows = self.rows.write().await;
        let stored = StoredSnapshot {
            id: rows.len() as i64 + 1,
            snapshot: snapshot.clone(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn read_all(&self) -> Result<Vec<StoredSnapshot>> {
        Ok(self.rows.read().await.clone())
    }
}
