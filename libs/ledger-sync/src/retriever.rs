use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::page::{PageQuery, TimestampFilter};
use crate::record::{Cursor, TransactionRecord};

/// Записи, собранные за один проход выборки.
#[derive(Debug, Default)]
pub struct Retrieval {
    pub records: Vec<TransactionRecord>,
    /// Успешно полученные страницы.
    pub pages: usize,
    /// Заполнено, если источник был недоступен дольше бюджета повторов;
    /// тогда в `records` всё, что успели получить до этого.
    pub interrupted: Option<FetchError>,
}

/// Проходит источник постранично от курсора до конца.
pub struct HistoryRetriever {
    fetcher: PageFetcher,
    account_id: String,
    page_limit: u32,
}

impl HistoryRetriever {
    pub fn new(fetcher: PageFetcher, account_id: impl Into<String>, page_limit: u32) -> Self {
        Self { fetcher, account_id: account_id.into(), page_limit }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Все записи строго после `cursor`, в порядке источника.
    ///
    /// Transient-сбой дольше бюджета повторов заканчивает проход
    /// досрочно, собранное сохраняется. Protocol-сбой отбрасывает
    /// проход и возвращается как ошибка.
    pub async fn retrieve_since(&self, cursor: Option<&Cursor>) -> Result<Retrieval, FetchError> {
        let mut query = PageQuery::new(&self.account_id, self.page_limit)
            .with_timestamp(cursor.cloned().map(TimestampFilter::After));
        let mut out = Retrieval::default();

        loop {
            let page = match self.fetcher.fetch(&query).await {
                Ok(page) => page,
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        account = %self.account_id,
                        pages = out.pages,
                        kept = out.records.len(),
                        error = %e,
                        "source unavailable, stopping with partial results"
                    );
                    out.interrupted = Some(e);
                    return Ok(out);
                }
                Err(e) => return Err(e),
            };

            out.pages += 1;
            tracing::debug!(
                account = %self.account_id,
                page = out.pages,
                records = page.records.len(),
                next = ?page.next.as_ref().map(|t| t.as_str()),
                "fetched page"
            );
            out.records.extend(page.records);

            let Some(token) = page.next else {
                tracing::info!(
                    account = %self.account_id,
                    pages = out.pages,
                    records = out.records.len(),
                    "reached end of history"
                );
                return Ok(out);
            };

            let next = TimestampFilter::Continuation(token);
            if query.timestamp.as_ref() == Some(&next) {
                return Err(FetchError::protocol(format!(
                    "source returned the same continuation '{}' twice",
                    next.to_param()
                )));
            }
            query.timestamp = Some(next);
        }
    }
}
