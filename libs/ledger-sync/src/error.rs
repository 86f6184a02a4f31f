/// Категория ошибки запроса. По ней цикл повторов и retriever
/// выбирают между "попробовать ещё" и "бросить этот цикл".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Таймаут, обрыв соединения, не-2xx статус — повторяется.
    Transient,
    /// Ответ не той формы — не повторяется.
    Protocol,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Transient => f.write_str("transient"),
            FetchErrorKind::Protocol => f.write_str("protocol"),
        }
    }
}

/// Ошибка от page source или page fetcher.
///
/// `attempts` заполняет fetcher, когда бюджет повторов исчерпан;
/// у ошибки прямо из источника там 0.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    attempts: u32,
}

impl FetchError {
    /// Сбой транспорта — повтор может помочь.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self { kind: FetchErrorKind::Transient, message: msg.into(), attempts: 0 }
    }

    /// Кривой ответ — повтор того же запроса не поможет.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self { kind: FetchErrorKind::Protocol, message: msg.into(), attempts: 0 }
    }

    pub(crate) fn after_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FetchErrorKind::Transient
    }
}

impl std::fmt::Debug for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.attempts > 0 {
            write!(f, "{} (after {} attempts)", self.message, self.attempts)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for FetchError {}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::protocol(format!("parse response: {e}"))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::transient(format!("http: {e}"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("read snapshot '{path}': {source}")]
    Read { path: String, source: std::io::Error },

    #[error("corrupt snapshot '{path}': {detail}")]
    Corrupt { path: String, detail: String },

    #[error("write snapshot '{path}': {source}")]
    Write { path: String, source: std::io::Error },

    #[error("encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("fetch ({kind}): {0}", kind = .0.kind())]
    Fetch(FetchError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field}: {detail}")]
    Invalid { field: &'static str, detail: String },

    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        Self::Invalid { field, detail: detail.into() }
    }
}
