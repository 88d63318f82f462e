use crate::api::AppState;
use powchain_core::{ChainFetcher, Resolution};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodic consensus. Stops once the node's shutdown flag is raised.
pub fn spawn_consensus_task<F: ChainFetcher>(
    state: AppState<F>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; give peers a moment to come up.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if state.shutdown.is_cancelled() {
                debug!("consensus task stopping");
                break;
            }
            if state.peers.is_empty() {
                continue;
            }
            match state.resolver.resolve(&state.ledger, &state.peers).await {
                Resolution::Replaced => info!(length = state.ledger.len(), "adopted peer chain"),
                Resolution::Unchanged => debug!("local chain is authoritative"),
            }
        }
    })
}
