use chrono::Duration;
use kofe_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the stale payment sweeper. Do not await the returned JoinHandle, as it will run
/// indefinitely.
///
/// Epay invoices expire after one day, so a `pending` payment older than `max_age` will never get
/// a webhook. The sweeper flips those rows to `expired` so they stop looking like money in flight.
pub fn start_payment_sweeper(
    db: SqliteDatabase,
    producers: EventProducers,
    period: std::time::Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = OrderFlowApi::new(db, producers);
        let mut timer = tokio::time::interval(period);
        info!("🕰️ Stale payment sweeper started (pending invoices expire after {}h)", max_age.num_hours());
        loop {
            timer.tick().await;
            debug!("🕰️ Running the stale payment sweep");
            match api.expire_stale_payments(max_age).await {
                Ok(0) => debug!("🕰️ No stale payments to expire"),
                Ok(n) => info!("🕰️ {n} stale payments expired"),
                Err(e) => error!("🕰️ Error sweeping stale payments: {e}"),
            }
        }
    })
}
