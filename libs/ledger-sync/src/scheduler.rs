use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::error::FetchError;
use crate::sync::{CycleReport, SyncOrchestrator};

// ═══════════════════════════════════════════════════════════════
//  CycleOutcome
// ═══════════════════════════════════════════════════════════════

/// Итог одного цикла; Display даёт строку статуса цикла.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Synced { added: usize },
    Idle,
    /// Источник отвалился посередине; полученное до этого сохранено.
    Partial { added: usize, error: FetchError },
    Failed(String),
}

impl From<CycleReport> for CycleOutcome {
    fn from(report: CycleReport) -> Self {
        match (report.interrupted, report.added) {
            (Some(error), added) => CycleOutcome::Partial { added, error },
            (None, 0) => CycleOutcome::Idle,
            (None, added) => CycleOutcome::Synced { added },
        }
    }
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleOutcome::Synced { added } => write!(f, "synced {added} new transactions"),
            CycleOutcome::Idle => f.write_str("no new transactions"),
            CycleOutcome::Partial { added, error } => write!(
                f,
                "synced {added} new transactions before the source became unavailable: {error}"
            ),
            CycleOutcome::Failed(e) => write!(f, "sync failed: {e}"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Гоняет циклы один за другим с фиксированной паузой, пока не
/// отменят. Упавший или запаниковавший цикл логируется, цикл идёт дальше.
pub struct Scheduler {
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, interval: Duration) -> Self {
        Self { orchestrator, interval }
    }

    /// Один цикл + строка статуса в лог.
    pub async fn tick(&self) -> CycleOutcome {
        let orchestrator = self.orchestrator.clone();
        // Отдельная задача: паника в цикле приходит как JoinError.
        // Если этот future дропнут (abort снаружи), цикл отменяется вместе с ним.
        let handle =
            AbortOnDropHandle::new(tokio::spawn(async move { orchestrator.run_cycle().await }));

        let outcome = match handle.await {
            Ok(Ok(report)) => CycleOutcome::from(report),
            Ok(Err(e)) => CycleOutcome::Failed(e.to_string()),
            Err(e) => CycleOutcome::Failed(format!("cycle aborted: {e}")),
        };
        self.report(&outcome);
        outcome
    }

    fn report(&self, outcome: &CycleOutcome) {
        let account = self.orchestrator.account_id();
        match outcome {
            CycleOutcome::Synced { .. } | CycleOutcome::Idle => {
                tracing::info!(%account, "{outcome}")
            }
            CycleOutcome::Partial { .. } => tracing::warn!(%account, "{outcome}"),
            CycleOutcome::Failed(_) => tracing::error!(%account, "{outcome}"),
        }
    }

    /// Крутиться до отмены `token`. Возвращает число прошедших циклов.
    pub async fn run(&self, token: CancellationToken) -> usize {
        tracing::info!(
            account = %self.orchestrator.account_id(),
            interval = ?self.interval,
            "scheduler started"
        );

        let mut cycles = 0;
        while !token.is_cancelled() {
            self.tick().await;
            cycles += 1;

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(cycles, "scheduler stopped");
        cycles
    }
}
