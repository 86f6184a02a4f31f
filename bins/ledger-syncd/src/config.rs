use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use ledger_sync::SyncConfig;

use crate::error::DaemonError;

#[derive(Parser)]
#[command(name = "ledger-syncd", about = "Инкрементальная синхронизация истории транзакций аккаунта")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Синхронизировать в цикле до Ctrl+C
    Run(SyncArgs),
    /// Один цикл синхронизации и выход
    Once(SyncArgs),
}

#[derive(Args, Clone, Debug)]
pub struct SyncArgs {
    /// Путь к TOML конфиг файлу
    #[arg(long, default_value = "ledger-sync.toml", env = "LEDGER_SYNC_CONFIG")]
    pub config: String,

    /// ID аккаунта (напр. 0.0.626047), перекрывает конфиг
    #[arg(long)]
    pub account: Option<String>,

    /// Пауза между циклами, секунды
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Каталог для transactions_<account>.json
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

// ---- TOML Config ----

/// ```toml
/// [sync]
/// account_id = "0.0.626047"
/// interval_secs = 10
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sync: toml::Table,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        toml::from_str(&content)
            .map_err(|e| DaemonError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }
}

/// Итоговая конфигурация: config file < CLI.
/// Отсутствующий файл допустим, если аккаунт задан в CLI.
pub fn effective(args: &SyncArgs) -> Result<SyncConfig, DaemonError> {
    let file = match FileConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            if Path::new(&args.config).exists() {
                return Err(e);
            }
            FileConfig::default()
        }
    };

    let mut table = file.sync;
    if let Some(ref account) = args.account {
        table.insert("account_id".into(), toml::Value::String(account.clone()));
    }
    if let Some(secs) = args.interval_secs {
        let secs = i64::try_from(secs).map_err(|_| DaemonError::Config {
            context: "cli",
            detail: format!("--interval-secs {secs} is too large"),
        })?;
        table.insert("interval_secs".into(), toml::Value::Integer(secs));
    }
    if let Some(ref dir) = args.data_dir {
        table.insert("data_dir".into(), toml::Value::String(dir.display().to_string()));
    }

    let cfg: SyncConfig = toml::Value::Table(table)
        .try_into()
        .map_err(|e| DaemonError::Config { context: "sync", detail: e.to_string() })?;
    cfg.validate()?;
    Ok(cfg)
}
