//! Core of a minimal proof-of-work ledger node: block types, hashing, the
//! proof search, the ledger itself and longest-valid-chain consensus.
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod consensus;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod ledger;
pub mod mine;
pub mod peers;
pub mod pow;

pub use consensus::{ChainFetcher, ConsensusResolver, Resolution};
pub use error::{LedgerError, Result};
pub use ledger::{validate_chain, Ledger, MiningStrategy};
pub use peers::{Peer, PeerRegistry};
pub use pow::CancelFlag;

use constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

/// Transaction as submitted by a client. Every field is required; the
/// options only exist so a missing one can be reported by name.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<u64>,
}

impl TransactionRequest {
    pub fn into_transaction(self) -> Result<Transaction> {
        let mut missing = Vec::new();
        if self.sender.is_none() {
            missing.push("sender");
        }
        if self.recipient.is_none() {
            missing.push("recipient");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        match (self.sender, self.recipient, self.amount) {
            (Some(sender), Some(recipient), Some(amount)) => Ok(Transaction {
                sender,
                recipient,
                amount,
            }),
            _ => Err(LedgerError::Validation(missing.join(", "))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Lowercase hex SHA-256 of the canonical encoding.
    pub fn hash(&self) -> String {
        hashing::hash(self)
    }
}

/// Wire shape of a full chain, as served to clients and peers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

/// Fixed first block: index 1, proof 100, sentinel previous hash, no transactions.
pub fn genesis_block() -> Block {
    Block {
        index: 1,
        timestamp: now_secs(),
        transactions: vec![],
        proof: GENESIS_PROOF,
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
    }
}

/// Seconds since the unix epoch with sub-second precision.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
