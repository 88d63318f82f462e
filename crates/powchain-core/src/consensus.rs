//! Longest-valid-chain reconciliation across peers.
use crate::ledger::{validate_chain, Ledger};
use crate::peers::{Peer, PeerRegistry};
use crate::{Block, ChainSnapshot};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fetches a peer's full chain. Implementations report every failure
/// (network, status, body) as an error; the resolver skips that peer.
pub trait ChainFetcher: Send + Sync + 'static {
    fn fetch_chain(
        &self,
        peer: &Peer,
    ) -> impl Future<Output = anyhow::Result<ChainSnapshot>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Replaced,
    Unchanged,
}

pub struct ConsensusResolver<F> {
    fetcher: Arc<F>,
    timeout: Duration,
}

impl<F> Clone for ConsensusResolver<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            timeout: self.timeout,
        }
    }
}

impl<F: ChainFetcher> ConsensusResolver<F> {
    /// `timeout` bounds each peer fetch separately.
    pub fn new(fetcher: F, timeout: Duration) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            timeout,
        }
    }

    /// Fetch every peer concurrently and adopt the longest valid chain that
    /// is strictly longer than ours. Individual peer failures are skipped;
    /// only the aggregate outcome is reported.
    pub async fn resolve(&self, ledger: &Ledger, peers: &PeerRegistry) -> Resolution {
        let peers = peers.list();
        let mut best_len = ledger.len();
        let mut best: Option<Vec<Block>> = None;

        for (peer, snapshot) in peers.iter().zip(self.fetch_all(&peers).await) {
            let Some(snapshot) = snapshot else { continue };
            if snapshot.length != snapshot.chain.len() {
                warn!(
                    %peer,
                    reported = snapshot.length,
                    received = snapshot.chain.len(),
                    "peer length does not match its chain, skipping"
                );
                continue;
            }
            if snapshot.length <= best_len {
                debug!(%peer, length = snapshot.length, best_len, "peer chain not longer");
                continue;
            }
            if !validate_chain(&snapshot.chain) {
                warn!(%peer, length = snapshot.length, "peer chain failed validation");
                continue;
            }
            best_len = snapshot.length;
            best = Some(snapshot.chain);
        }

        if let Some(chain) = best {
            if ledger.replace_if_longer(chain) {
                info!(length = best_len, "Our chain was replaced");
                return Resolution::Replaced;
            }
        }
        Resolution::Unchanged
    }

    /// One slot per peer, in the order given; `None` marks a failed fetch.
    async fn fetch_all(&self, peers: &[Peer]) -> Vec<Option<ChainSnapshot>> {
        let mut tasks = JoinSet::new();
        for (slot, peer) in peers.iter().cloned().enumerate() {
            let fetcher = self.fetcher.clone();
            let timeout = self.timeout;
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, fetcher.fetch_chain(&peer)).await;
                let snapshot = match result {
                    Ok(Ok(snapshot)) => Some(snapshot),
                    Ok(Err(e)) => {
                        warn!(%peer, error = %e, "chain fetch failed, skipping peer");
                        None
                    }
                    Err(_) => {
                        warn!(%peer, ?timeout, "chain fetch timed out, skipping peer");
                        None
                    }
                };
                (slot, snapshot)
            });
        }

        let mut out = vec![None; peers.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, snapshot)) => out[slot] = snapshot,
                Err(e) => warn!(error = %e, "chain fetch task failed"),
            }
        }
        out
    }
}
