use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::Snapshot;

use super::SnapshotStore;

/// Snapshot store в памяти процесса. Ничего не переживает процесс;
/// для dry run и для подсчёта вызовов persist в тестах.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshot: RwLock<Snapshot>,
    persists: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot: RwLock::new(snapshot), persists: AtomicUsize::new(0) }
    }

    /// Сколько успешных вызовов `persist` было.
    pub fn persist_count(&self) -> usize {
        self.persists.load(Ordering::Relaxed)
    }

    pub async fn current(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Snapshot, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(self.snapshot.read().await.clone()) })
    }

    fn persist(
        &self,
        snapshot: &Snapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let snapshot = snapshot.clone();
        Box::pin(async move {
            *self.snapshot.write().await = snapshot;
            self.persists.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }
}
