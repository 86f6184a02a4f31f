use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::record::{Snapshot, TransactionRecord};

use super::SnapshotStore;

// ════════════════════════════════════════════════════════════════
//  FileSnapshotStore
// ════════════════════════════════════════════════════════════════

/// Snapshot хранится одним JSON-массивом с отступами.
///
/// Запись идёт сначала в `<file>.tmp`, после fsync файл
/// переименовывается поверх целевого.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{data_dir}/transactions_{account_id}.json`
    pub fn for_account(data_dir: impl AsRef<Path>, account_id: &str) -> Self {
        Self::new(data_dir.as_ref().join(format!("transactions_{account_id}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    // ── Load ──

    async fn do_load(&self) -> Result<Snapshot, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.display(), "no snapshot yet, starting empty");
                return Ok(Snapshot::new());
            }
            Err(source) => return Err(StoreError::Read { path: self.display(), source }),
        };

        let records: Vec<TransactionRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt { path: self.display(), detail: e.to_string() })?;
        let snapshot = Snapshot::from_records(records)
            .map_err(|detail| StoreError::Corrupt { path: self.display(), detail })?;

        tracing::debug!(path = %self.display(), records = snapshot.len(), "loaded snapshot");
        Ok(snapshot)
    }

    // ── Persist ──

    async fn do_persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(snapshot.records())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::Write { path: parent.display().to_string(), source })?;
            }
        }

        let tmp = self.tmp_path();
        if let Err(source) = write_synced(&tmp, &data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Write { path: tmp.display().to_string(), source });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Write { path: self.display(), source });
        }

        tracing::debug!(path = %self.display(), records = snapshot.len(), "persisted snapshot");
        Ok(())
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut f = tokio::fs::File::create(path).await?;
    f.write_all(data).await?;
    f.sync_all().await
}

// ════════════════════════════════════════════════════════════════
//  SnapshotStore impl
// ════════════════════════════════════════════════════════════════

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Snapshot, StoreError>> + Send + '_>> {
        Box::pin(self.do_load())
    }

    fn persist(
        &self,
        snapshot: &Snapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let snapshot = snapshot.clone();
        Box::pin(async move { self.do_persist(&snapshot).await })
    }
}
