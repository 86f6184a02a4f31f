use std::sync::Arc;

use crate::config::SyncConfig;
use crate::error::{ConfigError, FetchError, SyncError};
use crate::fetcher::{HttpPageSource, PageFetcher, PageSource};
use crate::record::Cursor;
use crate::retriever::HistoryRetriever;
use crate::store::{FileSnapshotStore, SnapshotStore};

/// Итог одного цикла.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Сколько записей добавлено в snapshot.
    pub added: usize,
    pub pages: usize,
    /// Transient-ошибка, оборвавшая выборку, если была.
    pub interrupted: Option<FetchError>,
    /// Курсор snapshot после цикла.
    pub cursor: Option<Cursor>,
}

/// Load → выборка от курсора → append → persist, для одного аккаунта.
///
/// Между циклами состояния нет, вся память — в snapshot store.
pub struct SyncOrchestrator {
    retriever: HistoryRetriever,
    store: Arc<dyn SnapshotStore>,
}

impl SyncOrchestrator {
    pub fn new(retriever: HistoryRetriever, store: Arc<dyn SnapshotStore>) -> Self {
        Self { retriever, store }
    }

    /// HTTP источник + файловый snapshot, собранные из конфига.
    pub fn from_config(cfg: &SyncConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let source: Arc<dyn PageSource> =
            Arc::new(HttpPageSource::new(cfg.url(), cfg.request_timeout())?);
        let fetcher = PageFetcher::new(source, cfg.retry_policy());
        let retriever = HistoryRetriever::new(fetcher, &cfg.account_id, cfg.page_limit);
        let store = Arc::new(FileSnapshotStore::for_account(&cfg.data_dir, &cfg.account_id));
        Ok(Self::new(retriever, store))
    }

    pub fn account_id(&self) -> &str {
        self.retriever.account_id()
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, SyncError> {
        let mut snapshot = self.store.load().await?;
        let cursor = snapshot.cursor();
        tracing::debug!(
            account = %self.account_id(),
            stored = snapshot.len(),
            cursor = ?cursor.as_ref().map(Cursor::as_str),
            "starting cycle"
        );

        let retrieval = self
            .retriever
            .retrieve_since(cursor.as_ref())
            .await
            .map_err(SyncError::Fetch)?;

        let added = if retrieval.records.is_empty() {
            0
        } else {
            let added = snapshot.append(retrieval.records);
            if added > 0 {
                self.store.persist(&snapshot).await?;
            }
            added
        };

        Ok(CycleReport {
            added,
            pages: retrieval.pages,
            interrupted: retrieval.interrupted,
            cursor: snapshot.cursor(),
        })
    }
}
