use crate::domain::ParserRun;
use crate::error::Result;
use async_trait::async_trait;

/// Records parser executions for health monitoring. Recording is always
/// best-effort from the orchestrator's point of view — a `RunLog` failure
/// must never demote a successful parse or abort a fallback.
#[async_trait]
pub trait RunLog: Send + Sync {
    async fn record(&self, run: &ParserRun) -> Result<()>;
}
