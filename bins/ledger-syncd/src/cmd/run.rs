use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ledger_sync::{Scheduler, SyncOrchestrator};

use crate::config::{SyncArgs, effective};
use crate::error::DaemonError;

/// Сколько ждать завершения текущего цикла после Ctrl+C.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(args: SyncArgs) -> Result<(), DaemonError> {
    tracing::info!("ledger-syncd starting");

    // --- Загрузка конфига ---
    let cfg = effective(&args)?;
    tracing::info!(
        config = %args.config,
        account = %cfg.account_id,
        url = %cfg.url(),
        data_dir = %cfg.data_dir.display(),
        interval_secs = cfg.interval_secs,
        "loaded config"
    );

    let orchestrator = Arc::new(SyncOrchestrator::from_config(&cfg)?);
    let scheduler = Scheduler::new(orchestrator, cfg.interval());

    // --- CancellationToken для graceful shutdown ---
    let token = CancellationToken::new();
    let loop_token = token.clone();
    let mut handle = tokio::spawn(async move { scheduler.run(loop_token).await });

    // --- Ожидание Ctrl+C ---
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("shutting down...");
        }
        _ = &mut handle => {
            tracing::warn!("scheduler exited on its own");
            return Ok(());
        }
    }
    token.cancel();

    // Drain: текущему циклу даём DRAIN_TIMEOUT, потом abort. Abort цикл
    // тоже отменяет (Scheduler::tick держит его задачу). Несохранённое
    // будет скачано заново при следующем запуске.
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut handle).await {
        Ok(Ok(cycles)) => tracing::info!(cycles, "shutdown complete"),
        Ok(Err(e)) => tracing::error!(error = %e, "scheduler task failed"),
        Err(_) => {
            handle.abort();
            tracing::warn!("cycle still running after drain timeout, aborted");
        }
    }
    Ok(())
}
