use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::fetcher::RetryPolicy;

/// Всё, что нужно синхронизации одного аккаунта. Читается из
/// таблицы `[sync]` TOML-файла демона.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Аккаунт, напр. `0.0.626047`.
    pub account_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Записей на страницу (query-параметр `limit`).
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_rate_limit_pause_ms")]
    pub rate_limit_pause_ms: u64,
    /// Каталог с `transactions_<account_id>.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Пауза между циклами синхронизации.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_base_url() -> String {
    "https://mainnet-public.mirrornode.hedera.com".into()
}
fn default_endpoint() -> String {
    "/api/v1/transactions".into()
}
fn default_page_limit() -> u32 {
    100
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_max_attempts() -> u32 {
    5
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_rate_limit_pause_ms() -> u64 {
    1000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_interval_secs() -> u64 {
    10
}

impl SyncConfig {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            rate_limit_pause_ms: default_rate_limit_pause_ms(),
            data_dir: default_data_dir(),
            interval_secs: default_interval_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_id.is_empty() {
            return Err(ConfigError::invalid("account_id", "must not be empty"));
        }
        // ID становится частью имени файла.
        if !self
            .account_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        {
            return Err(ConfigError::invalid(
                "account_id",
                format!("'{}' may only contain [A-Za-z0-9._-]", self.account_id),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::invalid("base_url", format!("'{}' is not an http(s) url", self.base_url)));
        }
        if !(1..=100).contains(&self.page_limit) {
            return Err(ConfigError::invalid("page_limit", format!("{} not in 1..=100", self.page_limit)));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be positive"));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid("interval_secs", "must be positive"));
        }
        Ok(())
    }

    /// Полный URL запроса, base + endpoint.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            rate_limit_pause: Duration::from_millis(self.rate_limit_pause_ms),
        }
    }
}
