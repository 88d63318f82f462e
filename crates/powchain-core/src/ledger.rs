//! The chain plus its pending pool, behind one lock.
//!
//! Only tip capture, the stale-tip recheck and the final append/pool clear
//! happen under the lock. The proof search itself runs unlocked.
use crate::constants::{MINING_REWARD, REWARD_SENDER};
use crate::error::{LedgerError, Result};
use crate::hashing::hash;
use crate::{genesis_block, mine, now_secs, pow, Block, CancelFlag, ChainSnapshot, Transaction};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MiningStrategy {
    #[default]
    Sequential,
    /// Spread the proof search over the rayon pool.
    Parallel,
}

#[derive(Debug)]
struct State {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

#[derive(Debug)]
pub struct Ledger {
    state: Mutex<State>,
    strategy: MiningStrategy,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Fresh ledger holding only the genesis block.
    pub fn new() -> Self {
        Self::with_strategy(MiningStrategy::default())
    }

    pub fn with_strategy(strategy: MiningStrategy) -> Self {
        Self {
            state: Mutex::new(State {
                chain: vec![genesis_block()],
                pending: Vec::new(),
            }),
            strategy,
        }
    }

    /// Queue a transaction for the next block and return that block's index.
    pub fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> u64 {
        self.submit(Transaction::new(sender, recipient, amount))
    }

    pub fn submit(&self, tx: Transaction) -> u64 {
        let mut state = self.state.lock();
        state.pending.push(tx);
        tip(&state.chain).index + 1
    }

    /// Solve the puzzle against the current tip and commit the pending pool.
    ///
    /// Fails with [`LedgerError::StaleTip`] when the tip was replaced during
    /// the search, and with [`LedgerError::Aborted`] when `cancel` fired.
    pub fn mine_block(&self, cancel: &CancelFlag) -> Result<Block> {
        self.mine_inner(None, cancel)
    }

    /// Like [`Ledger::mine_block`], with the fixed reward to `recipient`
    /// appended as the block's last transaction. The reward is added at
    /// commit time, so a stale or aborted attempt leaves the pool untouched.
    pub fn mine_block_with_reward(&self, recipient: &str, cancel: &CancelFlag) -> Result<Block> {
        let reward = Transaction::new(REWARD_SENDER, recipient, MINING_REWARD);
        self.mine_inner(Some(reward), cancel)
    }

    fn mine_inner(&self, reward: Option<Transaction>, cancel: &CancelFlag) -> Result<Block> {
        let last = self.last_block();
        let previous_hash = hash(&last);

        let proof = match self.strategy {
            MiningStrategy::Sequential => pow::mine(last.proof, cancel),
            MiningStrategy::Parallel => mine::mine_parallel(last.proof, cancel),
        }
        .ok_or(LedgerError::Aborted)?;

        self.commit(&last, previous_hash, proof, reward)
    }

    fn commit(
        &self,
        last: &Block,
        previous_hash: String,
        proof: u64,
        reward: Option<Transaction>,
    ) -> Result<Block> {
        let mut state = self.state.lock();
        if tip(&state.chain) != last {
            debug!(index = last.index + 1, proof, "tip moved during proof search");
            return Err(LedgerError::StaleTip);
        }

        let mut transactions = std::mem::take(&mut state.pending);
        transactions.extend(reward);
        let block = Block {
            index: last.index + 1,
            timestamp: now_secs(),
            transactions,
            proof,
            previous_hash,
        };
        state.chain.push(block.clone());
        drop(state);

        info!(
            index = block.index,
            proof = block.proof,
            txs = block.transactions.len(),
            "New block forged"
        );
        Ok(block)
    }

    /// See [`validate_chain`].
    pub fn validate(chain: &[Block]) -> bool {
        validate_chain(chain)
    }

    /// Swap in `candidate` if it is still strictly longer than the local
    /// chain. Callers validate first; this only settles the length race.
    pub fn replace_if_longer(&self, candidate: Vec<Block>) -> bool {
        let mut state = self.state.lock();
        if candidate.len() <= state.chain.len() {
            return false;
        }
        info!(
            old_len = state.chain.len(),
            new_len = candidate.len(),
            "replacing local chain"
        );
        state.chain = candidate;
        true
    }

    pub fn chain(&self) -> Vec<Block> {
        self.state.lock().chain.clone()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.chain())
    }

    pub fn len(&self) -> usize {
        self.state.lock().chain.len()
    }

    /// Always false: the chain holds at least the genesis block.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn last_block(&self) -> Block {
        tip(&self.state.lock().chain).clone()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.state.lock().pending.clone()
    }
}

fn tip(chain: &[Block]) -> &Block {
    // Every constructor and replacement keeps the chain non-empty.
    &chain[chain.len() - 1]
}

/// The single authority on chain legitimacy: non-empty, and every block
/// links to the hash of its predecessor with a proof valid against the
/// predecessor's proof. Stops at the first violation.
pub fn validate_chain(chain: &[Block]) -> bool {
    if chain.is_empty() {
        return false;
    }
    for (prev, curr) in chain.iter().zip(chain.iter().skip(1)) {
        if curr.previous_hash != hash(prev) {
            debug!(index = curr.index, "previous_hash does not match predecessor");
            return false;
        }
        if !pow::valid(prev.proof, curr.proof) {
            debug!(index = curr.index, "invalid proof");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

    fn mined(ledger: &Ledger) -> Block {
        ledger.mine_block(&CancelFlag::new()).unwrap()
    }

    #[test]
    fn new_ledger_holds_genesis_only() {
        let ledger = Ledger::new();
        let chain = ledger.chain();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index, 1);
        assert_eq!(chain[0].proof, GENESIS_PROOF);
        assert_eq!(chain[0].previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(ledger.pending().is_empty());
        assert!(Ledger::validate(&chain));
    }

    #[test]
    fn submit_returns_next_index_and_grows_pool() {
        let ledger = Ledger::new();
        assert_eq!(ledger.submit_transaction("a", "b", 1), 2);
        assert_eq!(ledger.submit_transaction("b", "c", 2), 2);
        assert_eq!(ledger.pending().len(), 2);
        mined(&ledger);
        assert_eq!(ledger.submit_transaction("c", "d", 3), 3);
    }

    #[test]
    fn mine_commits_pool_in_order_and_clears_it() {
        let ledger = Ledger::new();
        ledger.submit_transaction("a", "b", 1);
        ledger.submit_transaction("b", "c", 2);
        let before = ledger.pending();
        let genesis = ledger.last_block();

        let block = mined(&ledger);
        assert_eq!(block.index, 2);
        assert_eq!(block.transactions, before);
        assert_eq!(block.previous_hash, hash(&genesis));
        assert!(pow::valid(genesis.proof, block.proof));
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.last_block(), block);
    }

    #[test]
    fn reward_is_last_transaction() {
        let ledger = Ledger::new();
        ledger.submit_transaction("a", "b", 9);
        let block = ledger
            .mine_block_with_reward("node-1", &CancelFlag::new())
            .unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], Transaction::new("a", "b", 9));
        assert_eq!(
            block.transactions[1],
            Transaction::new(REWARD_SENDER, "node-1", MINING_REWARD)
        );
    }

    #[test]
    fn aborted_mine_leaves_state_untouched() {
        let ledger = Ledger::new();
        ledger.submit_transaction("a", "b", 1);
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert_eq!(
            ledger.mine_block_with_reward("node", &cancel),
            Err(LedgerError::Aborted)
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn mined_chain_validates() {
        let ledger = Ledger::new();
        for i in 0..4 {
            ledger.submit_transaction("a", "b", i);
            mined(&ledger);
        }
        let chain = ledger.chain();
        assert_eq!(chain.len(), 5);
        assert!(chain.iter().enumerate().all(|(i, b)| b.index == i as u64 + 1));
        assert!(validate_chain(&chain));
    }

    #[test]
    fn parallel_strategy_produces_valid_chain() {
        let ledger = Ledger::with_strategy(MiningStrategy::Parallel);
        mined(&ledger);
        mined(&ledger);
        assert!(validate_chain(&ledger.chain()));
    }

    #[test]
    fn validate_rejects_empty_chain() {
        assert!(!validate_chain(&[]));
    }

    #[test]
    fn validate_rejects_broken_link() {
        let ledger = Ledger::new();
        mined(&ledger);
        mined(&ledger);
        let mut chain = ledger.chain();
        chain[1].transactions.push(Transaction::new("x", "y", 1));
        assert!(!validate_chain(&chain));
    }

    #[test]
    fn validate_rejects_bad_proof() {
        let ledger = Ledger::new();
        mined(&ledger);
        let mut chain = ledger.chain();
        let last_proof = chain[0].proof;
        chain[1].proof = (0..).find(|p| !pow::valid(last_proof, *p)).unwrap();
        assert!(!validate_chain(&chain));
    }

    #[test]
    fn commit_onto_replaced_tip_is_stale() {
        let local = Ledger::new();
        local.submit_transaction("a", "b", 1);
        let last = local.last_block();
        let proof = pow::mine(last.proof, &CancelFlag::new()).unwrap();

        let remote = Ledger::new();
        mined(&remote);
        assert!(local.replace_if_longer(remote.chain()));

        let result = local.commit(&last, hash(&last), proof, None);
        assert_eq!(result, Err(LedgerError::StaleTip));
        assert_eq!(local.chain(), remote.chain());
        assert_eq!(local.pending().len(), 1);
    }

    #[test]
    fn second_miner_on_same_tip_is_stale() {
        let ledger = Ledger::new();
        let last = ledger.last_block();
        let proof = pow::mine(last.proof, &CancelFlag::new()).unwrap();
        assert!(ledger.commit(&last, hash(&last), proof, None).is_ok());
        assert_eq!(
            ledger.commit(&last, hash(&last), proof, None),
            Err(LedgerError::StaleTip)
        );
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn replace_requires_strictly_longer() {
        let local = Ledger::new();
        mined(&local);
        let remote = Ledger::new();
        mined(&remote);
        assert!(!local.replace_if_longer(remote.chain()));
        mined(&remote);
        assert!(local.replace_if_longer(remote.chain()));
        assert_eq!(local.chain(), remote.chain());
    }

    #[test]
    fn replacement_keeps_pending_pool() {
        let local = Ledger::new();
        local.submit_transaction("a", "b", 1);
        let remote = Ledger::new();
        mined(&remote);
        assert!(local.replace_if_longer(remote.chain()));
        assert_eq!(local.pending().len(), 1);
    }
}
