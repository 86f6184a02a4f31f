use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::record::{Cursor, TransactionRecord};

// ═══════════════════════════════════════════════════════════════
//  Query
// ═══════════════════════════════════════════════════════════════

/// Непрозрачный фильтр `<op>:<value>` из next-ссылки предыдущей страницы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Проверить форму `<op>:<value>`, которую источник кладёт в ссылки.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        match raw.split_once(':') {
            Some((op, value)) if !op.is_empty() && !value.is_empty() => Ok(Self(raw.to_string())),
            _ => Err(FetchError::protocol(format!(
                "continuation token '{raw}' is not of the form <op>:<value>"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Значение query-параметра `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFilter {
    /// Строго после курсора: `gt:<cursor>`.
    After(Cursor),
    /// Continuation как есть, из предыдущей страницы.
    Continuation(ContinuationToken),
}

impl TimestampFilter {
    pub fn to_param(&self) -> String {
        match self {
            TimestampFilter::After(cursor) => format!("gt:{cursor}"),
            TimestampFilter::Continuation(token) => token.as_str().to_string(),
        }
    }
}

/// Параметры запроса одной страницы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub account_id: String,
    pub limit: u32,
    pub timestamp: Option<TimestampFilter>,
}

impl PageQuery {
    pub fn new(account_id: impl Into<String>, limit: u32) -> Self {
        Self { account_id: account_id.into(), limit, timestamp: None }
    }

    pub fn with_timestamp(mut self, filter: Option<TimestampFilter>) -> Self {
        self.timestamp = filter;
        self
    }

    /// Пары query string в документированном источником порядке.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("account.id", self.account_id.clone()),
            ("limit", self.limit.to_string()),
            ("order", "asc".to_string()),
        ];
        if let Some(ref filter) = self.timestamp {
            pairs.push(("timestamp", filter.to_param()));
        }
        pairs
    }
}

// ═══════════════════════════════════════════════════════════════
//  Page
// ═══════════════════════════════════════════════════════════════

/// Пачка записей и откуда продолжать; `next = None`, когда
/// у источника больше ничего нет.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<TransactionRecord>,
    pub next: Option<ContinuationToken>,
}

#[derive(Deserialize)]
struct RawPage {
    transactions: Option<Value>,
    #[serde(default)]
    links: Option<RawLinks>,
}

#[derive(Deserialize)]
struct RawLinks {
    #[serde(default)]
    next: Option<String>,
}

impl Page {
    /// Распарсить тело ответа. Любое несоответствие формы — protocol error,
    /// страница отвергается целиком.
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let raw: RawPage = serde_json::from_str(body)?;

        let items = match raw.transactions {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(FetchError::protocol("'transactions' is not an array")),
            None => return Err(FetchError::protocol("response without 'transactions'")),
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                TransactionRecord::try_from(item)
                    .map_err(|e| FetchError::protocol(format!("transactions[{i}]: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let next = match raw.links.and_then(|l| l.next) {
            Some(link) => Some(continuation_token(&link)?),
            None => None,
        };

        Ok(Self { records, next })
    }
}

/// Достать query-параметр `timestamp` из next-ссылки
/// (напр. `/api/v1/transactions?account.id=0.0.1&limit=100&order=asc&timestamp=gt:1700000000.000000001`).
pub fn continuation_token(link: &str) -> Result<ContinuationToken, FetchError> {
    let Some((_, query)) = link.split_once('?') else {
        return Err(FetchError::protocol(format!("next link '{link}' has no query string")));
    };
    let query = query.split('#').next().unwrap_or_default();

    for pair in query.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name != "timestamp" {
            continue;
        }
        let value = urlencoding::decode(value).map_err(|e| {
            FetchError::protocol(format!("next link '{link}': bad timestamp encoding: {e}"))
        })?;
        return ContinuationToken::parse(&value);
    }

    Err(FetchError::protocol(format!("next link '{link}' has no 'timestamp' parameter")))
}
