mod file;
mod memory;

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;
use crate::record::Snapshot;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

/// Долговременное хранилище [`Snapshot`].
///
/// `load` из ещё не записанного хранилища отдаёт пустой snapshot.
/// `persist` заменяет snapshot целиком; читатель видит либо старое,
/// либо новое содержимое, но не смесь.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Snapshot, StoreError>> + Send + '_>>;

    fn persist(
        &self,
        snapshot: &Snapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}
