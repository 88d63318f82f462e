//! Proof-of-work puzzle: find `proof` such that
//! `sha256(format!("{last_proof}{proof}"))` starts with [`POW_DIFFICULTY`]
//! hex zero digits.
use crate::constants::{CANCEL_CHECK_INTERVAL, POW_DIFFICULTY};
use crate::hashing::hex_digest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort signal for long-running proof searches. Clones observe the
/// same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub fn valid(last_proof: u64, proof: u64) -> bool {
    meets_difficulty(last_proof, proof, POW_DIFFICULTY)
}

pub(crate) fn meets_difficulty(last_proof: u64, proof: u64, difficulty: usize) -> bool {
    let guess = format!("{last_proof}{proof}");
    count_leading_hex_zeros(&hex_digest(guess.as_bytes())) >= difficulty
}

/// Smallest `proof >= 0` with `valid(last_proof, proof)`, or `None` once
/// `cancel` is raised.
pub fn mine(last_proof: u64, cancel: &CancelFlag) -> Option<u64> {
    search(last_proof, POW_DIFFICULTY, cancel)
}

pub(crate) fn search(last_proof: u64, difficulty: usize, cancel: &CancelFlag) -> Option<u64> {
    let mut proof = 0u64;
    loop {
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return None;
        }
        if meets_difficulty(last_proof, proof, difficulty) {
            return Some(proof);
        }
        proof = proof.checked_add(1)?;
    }
}

pub fn count_leading_hex_zeros(digest: &str) -> usize {
    digest.chars().take_while(|c| *c == '0').count()
}
