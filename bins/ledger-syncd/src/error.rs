#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Setup(#[from] ledger_sync::ConfigError),

    #[error("{0}")]
    CycleFailed(String),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
