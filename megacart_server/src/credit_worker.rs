use std::time::Duration;

use log::*;
use megacart_engine::{gateway::RazorpayGateway, SettlementApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the ledger credit retry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Vendor credits that failed at settlement time stay queued in the database. This worker applies them on a fixed
/// interval until they go through.
pub fn start_credit_retry_worker(
    api: SettlementApi<SqliteDatabase, RazorpayGateway>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Ledger credit retry worker started. Running every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running ledger credit retry job");
            match api.retry_pending_credits().await {
                Ok(result) if result.failed > 0 => {
                    warn!("🕰️ {} ledger credits applied, {} still failing", result.applied, result.failed);
                },
                Ok(result) => debug!("🕰️ {} ledger credits applied", result.applied),
                Err(e) => {
                    error!("🕰️ Error running ledger credit retry job: {e}");
                },
            }
        }
    })
}
