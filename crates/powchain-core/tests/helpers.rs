#![allow(dead_code)]
use anyhow::anyhow;
use powchain_core::{CancelFlag, ChainFetcher, ChainSnapshot, Ledger, Peer};
use std::collections::HashMap;
use std::time::Duration;

/// A ledger mined up to `len` blocks (genesis included).
pub fn mined_ledger(len: usize) -> Ledger {
    let ledger = Ledger::new();
    let cancel = CancelFlag::new();
    while ledger.len() < len {
        ledger.submit_transaction("alice", "bob", ledger.len() as u64);
        ledger.mine_block(&cancel).expect("mining should succeed");
    }
    ledger
}

pub enum Reply {
    Chain(ChainSnapshot),
    Fail,
    Hang,
}

/// In-memory peers keyed by their normalised address.
#[derive(Default)]
pub struct StubFetcher {
    replies: HashMap<String, Reply>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, peer: &str, reply: Reply) -> Self {
        let key = Peer::parse(peer).expect("valid peer").to_string();
        self.replies.insert(key, reply);
        self
    }
}

impl ChainFetcher for StubFetcher {
    async fn fetch_chain(&self, peer: &Peer) -> anyhow::Result<ChainSnapshot> {
        match self.replies.get(&peer.to_string()) {
            Some(Reply::Chain(snapshot)) => Ok(snapshot.clone()),
            Some(Reply::Fail) => Err(anyhow!("connection refused")),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(anyhow!("unreachable"))
            }
            None => Err(anyhow!("unknown peer {peer}")),
        }
    }
}
