//! Snapshot store backed by an append-only JSON-lines file
//!
//! Every row is written as one JSON object per line and synced before the
//! append returns. Row ids continue from the highest id found on open.

use super::SnapshotStore;
use crate::models::{JobSnapshot, StoredSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Append-only snapshot table persisted to disk
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Writer>,
}

struct Writer {
    file: File,
    next_id: i64,
}

impl FileStore {
    /// Open or create the store at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let exists = fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check snapshot file {:?}", path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let existing = if exists {
            read_rows(&path).await?
        } else {
            Vec::new()
        };
        let next_id = existing.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open snapshot store {:?}", path))?;

        info!(path = %path.display(), rows = existing.len(), "Opened snapshot store");

        Ok(Self {
            path,
            inner: Mutex::new(Writer { file, next_id }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_rows(path: &Path) -> Result<Vec<StoredSnapshot>> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot store {:?}", path))?;

    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Corrupt row at {:?} line {}", path, n + 1))
        })
        .collect()
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn append(&self, snapshot: &JobSnapshot) -> Result<StoredSnapshot> {
        let mut writer = self.inner.lock().await;

        let stored = StoredSnapshot {
            id: writer.next_id,
            snapshot: snapshot.clone(),
        };
        let mut line = serde_json::to_vec(&stored).context("Failed to serialize snapshot")?;
        line.push(b'\n');

        writer
            .file
            .write_all(&line)
            .await
            .context("Failed to write snapshot row")?;
        writer
            .file
            .sync_data()
            .await
            .context("Failed to sync snapshot store")?;

        writer.next_id += 1;
        Ok(stored)
    }

    async fn read_all(&self) -> Result<Vec<StoredSnapshot>> {
        // Hold the writer lock so a half-written row is never observed
        let _writer = self.inner.lock().await;
        read_rows(&self.path).await
    }
}
