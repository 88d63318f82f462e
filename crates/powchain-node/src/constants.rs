pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub(crate) const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
pub(crate) const DEFAULT_MINE_RETRIES: u32 = 3;
pub(crate) const CHAIN_PATH: &str = "/chain";
