use crate::constants::POW_DIFFICULTY;
use crate::pow::{meets_difficulty, CancelFlag};
use rayon::prelude::*;
use tracing::debug;

/// Searches proofs in parallel. `find_first` keeps the answer identical to
/// the sequential [`crate::pow::mine`]: the smallest valid proof.
/// Returns `None` if `cancel` is raised before a proof is found.
pub fn mine_parallel(last_proof: u64, cancel: &CancelFlag) -> Option<u64> {
    search_parallel(last_proof, POW_DIFFICULTY, cancel)
}

fn search_parallel(last_proof: u64, difficulty: usize, cancel: &CancelFlag) -> Option<u64> {
    let found = (0u64..u64::MAX).into_par_iter().find_first(|proof| {
        cancel.is_cancelled() || meets_difficulty(last_proof, *proof, difficulty)
    })?;

    // A cancelled search stops at whatever candidate it was looking at.
    if meets_difficulty(last_proof, found, difficulty) {
        debug!(last_proof, proof = found, "parallel proof search finished");
        Some(found)
    } else {
        None
    }
}
