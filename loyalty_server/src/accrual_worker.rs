use std::time::Duration;

use log::*;
use loyalty_engine::{AccrualOracle, BalanceApi, LedgerRepository};
use tokio::task::JoinHandle;

/// Starts the accrual worker, which keeps polling the accrual system for unfinished orders.
///
/// The worker runs until the api's shutdown token is cancelled. Await the returned handle after cancelling to let
/// the current pass finish.
pub fn start_accrual_worker<B, O>(api: BalanceApi<B, O>, period: Duration) -> JoinHandle<()>
where
    B: LedgerRepository,
    O: AccrualOracle,
{
    tokio::spawn(async move {
        info!("🕰️ Accrual worker started");
        api.run_reconciliation_loop(period).await;
        info!("🕰️ Accrual worker stopped");
    })
}
