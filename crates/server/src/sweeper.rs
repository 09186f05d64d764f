//! Background retention task
//!
//! A fixed-interval loop, independent of request volume: ledger
//! growth stays bounded even while no visits arrive, and a traffic
//! spike cannot pile up extra sweeps.

use std::time::Duration;
use tally_ledger::Sweeper;
use tracing::warn;

/// Run the retention sweeper forever at a fixed interval
///
/// The first tick fires immediately, so stale records left over from
/// a previous run are purged at startup.
pub async fn run(sweeper: Sweeper, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(err) = sweeper.sweep() {
            warn!(%err, "retention sweep failed");
        }
    }
}
