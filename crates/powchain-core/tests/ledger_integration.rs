mod helpers;

use helpers::mined_ledger;
use powchain_core::{
    constants::{MINING_REWARD, REWARD_SENDER},
    genesis_block, hashing, now_secs, pow, validate_chain, Block, CancelFlag, ChainSnapshot, Ledger,
    MiningStrategy, Transaction,
};
use rand::Rng;
use std::sync::Arc;
use std::thread;

fn random_txs(n: usize) -> Vec<Transaction> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|i| {
            Transaction::new(
                format!("user-{i}"),
                format!("user-{}", i + 1),
                rng.gen_range(0..1_000),
            )
        })
        .collect()
}

#[test]
fn chain_built_by_mining_is_always_valid() {
    let ledger = Ledger::new();
    let cancel = CancelFlag::new();
    for _ in 0..5 {
        for tx in random_txs(rand::thread_rng().gen_range(0..8)) {
            ledger.submit(tx);
        }
        ledger.mine_block(&cancel).unwrap();
        assert!(validate_chain(&ledger.chain()));
    }
    assert_eq!(ledger.len(), 6);
}

#[test]
fn every_block_links_and_proves_against_its_predecessor() {
    let chain = mined_ledger(4).chain();
    for pair in chain.windows(2) {
        assert_eq!(pair[1].previous_hash, hashing::hash(&pair[0]));
        assert!(pow::valid(pair[0].proof, pair[1].proof));
        assert_eq!(pair[1].index, pair[0].index + 1);
    }
}

#[test]
fn chain_stays_valid_after_a_json_round_trip() -> anyhow::Result<()> {
    let ledger = mined_ledger(5);
    let wire = serde_json::to_string(&ledger.snapshot())?;
    let received: ChainSnapshot = serde_json::from_str(&wire)?;
    assert_eq!(received.chain, ledger.chain());
    assert!(validate_chain(&received.chain));
    Ok(())
}

#[test]
fn block_hash_survives_timestamp_round_trip() -> anyhow::Result<()> {
    let mut block: Block = genesis_block();
    let base = now_secs();
    for step in 0..2_000u32 {
        block.timestamp = base + f64::from(step) * 0.000_123_7;
        let back: Block = serde_json::from_str(&serde_json::to_string(&block)?)?;
        assert_eq!(back.timestamp.to_bits(), block.timestamp.to_bits());
        assert_eq!(hashing::hash(&back), hashing::hash(&block));
    }
    Ok(())
}

#[test]
fn tampered_amount_breaks_validation() {
    let mut chain = mined_ledger(4).chain();
    assert!(validate_chain(&chain));
    chain[1].transactions[0].amount += 1;
    assert!(!validate_chain(&chain));
}

#[test]
fn concurrent_submits_all_land_in_exactly_one_block() {
    let ledger = Arc::new(Ledger::with_strategy(MiningStrategy::Parallel));
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    ledger.submit_transaction(format!("w{w}"), "sink", i);
                }
            })
        })
        .collect();

    let cancel = CancelFlag::new();
    for _ in 0..3 {
        ledger.mine_block(&cancel).unwrap();
    }
    for w in writers {
        w.join().unwrap();
    }
    ledger.mine_block(&cancel).unwrap();

    let committed: usize = ledger.chain().iter().map(|b| b.transactions.len()).sum();
    assert_eq!(committed, 100);
    assert!(ledger.pending().is_empty());
    assert!(validate_chain(&ledger.chain()));
}

#[test]
fn reward_follows_client_transactions() {
    let ledger = Ledger::new();
    let txs = random_txs(3);
    for tx in txs.clone() {
        ledger.submit(tx);
    }
    let block = ledger
        .mine_block_with_reward("miner-7", &CancelFlag::new())
        .unwrap();
    assert_eq!(&block.transactions[..3], &txs[..]);
    assert_eq!(
        block.transactions[3],
        Transaction::new(REWARD_SENDER, "miner-7", MINING_REWARD)
    );
}
