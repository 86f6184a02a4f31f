use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, FetchError};
use crate::page::{Page, PageQuery};

// ═══════════════════════════════════════════════════════════════
//  PageSource
// ═══════════════════════════════════════════════════════════════

/// Один запрос к удалённому журналу, без повторов.
///
/// Сбои транспорта приходят как `Transient`, кривое тело ответа как
/// `Protocol`. Повторы — забота fetcher'а.
pub trait PageSource: Send + Sync {
    fn fetch_page(
        &self,
        query: &PageQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Page, FetchError>> + Send + '_>>;
}

// ═══════════════════════════════════════════════════════════════
//  HttpPageSource
// ═══════════════════════════════════════════════════════════════

/// `GET {url}?account.id=..&limit=..&order=asc[&timestamp=..]`
pub struct HttpPageSource {
    http: reqwest::Client,
    url: String,
}

impl HttpPageSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(url, http))
    }

    /// Готовый клиент (proxy, TLS, таймауты настраивает вызывающий).
    pub fn with_client(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { http, url: url.into() }
    }

    async fn get(&self, query: &PageQuery) -> Result<Page, FetchError> {
        let resp = self
            .http
            .get(&self.url)
            .query(&query.to_pairs())
            .send()
            .await?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::transient(format!("read body: {e}")))?;

        if !status.is_success() {
            let body: String = body.chars().take(200).collect();
            return Err(FetchError::transient(format!("HTTP {status}: {body}")));
        }

        Page::from_body(&body)
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(
        &self,
        query: &PageQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Page, FetchError>> + Send + '_>> {
        let query = query.clone();
        Box::pin(async move { self.get(&query).await })
    }
}

// ═══════════════════════════════════════════════════════════════
//  RetryPolicy
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Всего попыток на страницу, включая первую.
    pub max_attempts: u32,
    /// Фиксированная пауза между неудачными попытками.
    pub retry_delay: Duration,
    /// Пауза после каждого успешного запроса; в бюджет повторов не входит.
    pub rate_limit_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
            rate_limit_pause: Duration::from_secs(1),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  PageFetcher
// ═══════════════════════════════════════════════════════════════

/// Обёртка над [`PageSource`]: повторы и rate limiting.
#[derive(Clone)]
pub struct PageFetcher {
    source: Arc<dyn PageSource>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn PageSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Получить одну страницу. Transient-ошибки повторяются, пока не
    /// кончится бюджет попыток; protocol-ошибки возвращаются сразу.
    pub async fn fetch(&self, query: &PageQuery) -> Result<Page, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.source.fetch_page(query).await {
                Ok(page) => {
                    if !self.policy.rate_limit_pause.is_zero() {
                        tokio::time::sleep(self.policy.rate_limit_pause).await;
                    }
                    return Ok(page);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    tracing::error!(attempts = attempt, error = %e, "max retries reached");
                    return Err(e.after_attempts(attempt));
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        retry_in = ?self.policy.retry_delay,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
