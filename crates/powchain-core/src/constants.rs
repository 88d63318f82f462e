pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Leading hex zero digits a proof digest must carry.
pub const POW_DIFFICULTY: usize = 4;
pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: &str = "1";
pub const MINING_REWARD: u64 = 1;
pub const REWARD_SENDER: &str = "0";
/// Proof candidates tried between two looks at the cancellation flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;
