//! Инкрементальная синхронизация append-only журнала транзакций в локальный
//! JSON snapshot.
//!
//! Один цикл: [`SnapshotStore`] → cursor → [`HistoryRetriever`]
//! → [`PageFetcher`] на каждую страницу → append → persist.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod page;
pub mod record;
pub mod retriever;
pub mod scheduler;
pub mod store;
pub mod sync;

pub use config::SyncConfig;
pub use error::{ConfigError, FetchError, FetchErrorKind, StoreError, SyncError};
pub use fetcher::{HttpPageSource, PageFetcher, PageSource, RetryPolicy};
pub use page::{ContinuationToken, Page, PageQuery, TimestampFilter, continuation_token};
pub use record::{Cursor, Snapshot, TransactionRecord};
pub use retriever::{HistoryRetriever, Retrieval};
pub use scheduler::{CycleOutcome, Scheduler};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use sync::{CycleReport, SyncOrchestrator};
