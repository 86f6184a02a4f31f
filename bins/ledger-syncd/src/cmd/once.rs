use std::sync::Arc;

use ledger_sync::{CycleOutcome, Scheduler, SyncOrchestrator};

use crate::config::{SyncArgs, effective};
use crate::error::DaemonError;

pub async fn run(args: SyncArgs) -> Result<(), DaemonError> {
    let cfg = effective(&args)?;
    let orchestrator = Arc::new(SyncOrchestrator::from_config(&cfg)?);

    match Scheduler::new(orchestrator, cfg.interval()).tick().await {
        CycleOutcome::Failed(e) => Err(DaemonError::CycleFailed(e)),
        _ => Ok(()),
    }
}
