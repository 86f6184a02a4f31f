#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ledger_sync::{
    FetchError, HistoryRetriever, Page, PageFetcher, PageQuery, PageSource, RetryPolicy,
    SnapshotStore, SyncOrchestrator, TransactionRecord,
};

pub const ACCOUNT: &str = "0.0.626047";

pub fn rec(ts: &str) -> TransactionRecord {
    let value = serde_json::json!({
        "consensus_timestamp": ts,
        "transaction_id": format!("{ACCOUNT}-{ts}"),
        "name": "CRYPTOTRANSFER",
        "result": "SUCCESS",
    });
    TransactionRecord::try_from(value).unwrap()
}

pub fn timestamps(records: &[TransactionRecord]) -> Vec<String> {
    records.iter().map(|r| r.consensus_timestamp().to_string()).collect()
}

pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy { max_attempts, retry_delay: Duration::ZERO, rate_limit_pause: Duration::ZERO }
}

pub fn orchestrator(
    source: Arc<dyn PageSource>,
    store: Arc<dyn SnapshotStore>,
    max_attempts: u32,
) -> SyncOrchestrator {
    let fetcher = PageFetcher::new(source, fast_policy(max_attempts));
    SyncOrchestrator::new(HistoryRetriever::new(fetcher, ACCOUNT, 100), store)
}

// ═══════════════════════════════════════════════════════════════
//  FakeLedger — отвечает на запросы как mirror node
// ═══════════════════════════════════════════════════════════════

/// Двойник удалённого журнала. Учитывает `timestamp=gt:..`, режет по `page_size`
/// и отдаёт next-ссылку, когда страница полная.
pub struct FakeLedger {
    records: Mutex<Vec<TransactionRecord>>,
    page_size: usize,
    queries: Mutex<Vec<PageQuery>>,
    /// Номер вызова (с 1) → подставленная ошибка.
    failures: Mutex<HashMap<usize, FetchError>>,
    /// Начиная с этого вызова все падают transient.
    down_from: Mutex<Option<usize>>,
}

impl FakeLedger {
    pub fn new(records: Vec<TransactionRecord>, page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            page_size,
            queries: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            down_from: Mutex::new(None),
        })
    }

    pub fn push(&self, record: TransactionRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn fail_call(&self, call: usize, error: FetchError) {
        self.failures.lock().unwrap().insert(call, error);
    }

    pub fn go_down_from(&self, call: usize) {
        *self.down_from.lock().unwrap() = Some(call);
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    fn answer(&self, query: &PageQuery) -> Result<Page, FetchError> {
        let call = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.clone());
            queries.len()
        };
        if let Some(e) = self.failures.lock().unwrap().remove(&call) {
            return Err(e);
        }
        if matches!(*self.down_from.lock().unwrap(), Some(n) if call >= n) {
            return Err(FetchError::transient(format!("HTTP 503 on call {call}")));
        }

        let after = query
            .timestamp
            .as_ref()
            .map(|f| f.to_param())
            .map(|p| p.trim_start_matches("gt:").to_string());
        let limit = self.page_size.min(query.limit as usize);

        let page: Vec<TransactionRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| after.as_deref().is_none_or(|a| r.consensus_timestamp() > a))
            .take(limit)
            .cloned()
            .collect();

        let next = match page.last() {
            Some(last) if page.len() == limit => serde_json::Value::String(format!(
                "/api/v1/transactions?account.id={}&limit={}&order=asc&timestamp=gt:{}",
                query.account_id,
                query.limit,
                last.consensus_timestamp()
            )),
            _ => serde_json::Value::Null,
        };
        let body = serde_json::json!({ "transactions": page, "links": { "next": next } });
        Page::from_body(&body.to_string())
    }
}

impl PageSource for FakeLedger {
    fn fetch_page(
        &self,
        query: &PageQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Page, FetchError>> + Send + '_>> {
        let reply = self.answer(query);
        Box::pin(async move { reply })
    }
}

// ═══════════════════════════════════════════════════════════════
//  ScriptedSource — заготовленные ответы, запрос игнорирует
// ═══════════════════════════════════════════════════════════════

pub struct ScriptedSource {
    replies: Mutex<VecDeque<Result<Page, FetchError>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Result<Page, FetchError>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), calls: Mutex::new(0) })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl PageSource for ScriptedSource {
    fn fetch_page(
        &self,
        _query: &PageQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Page, FetchError>> + Send + '_>> {
        *self.calls.lock().unwrap() += 1;
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Page { records: Vec::new(), next: None }));
        Box::pin(async move { reply })
    }
}
