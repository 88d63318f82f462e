use crate::constants::{DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_LISTEN, DEFAULT_MINE_RETRIES};
use anyhow::{Context, Result};
use clap::Parser;
use powchain_core::{MiningStrategy, Peer};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "powchain-node")]
#[command(about = "Minimal proof-of-work ledger node")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Identity credited with mining rewards (random if omitted)
    #[arg(long)]
    pub node_id: Option<String>,

    /// Peer to register at startup; repeatable
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-peer chain fetch timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_MS)]
    pub fetch_timeout_ms: u64,

    /// Run consensus every N seconds; 0 disables the background task
    #[arg(long, default_value_t = 0)]
    pub resolve_interval_secs: u64,

    /// Search proofs on all cores
    #[arg(long)]
    pub parallel_mining: bool,

    /// Attempts per /mine request when the tip moves mid-search
    #[arg(long, default_value_t = DEFAULT_MINE_RETRIES)]
    pub mine_retries: u32,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen: SocketAddr,
    pub node_id: String,
    pub peers: Vec<Peer>,
    pub fetch_timeout: Duration,
    pub resolve_interval: Option<Duration>,
    pub strategy: MiningStrategy,
    pub mine_retries: u32,
}

impl NodeConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let listen = args
            .listen
            .parse()
            .with_context(|| format!("invalid listen address {:?}", args.listen))?;
        let peers = args
            .peers
            .iter()
            .map(|p| Peer::parse(p))
            .collect::<powchain_core::Result<Vec<_>>>()?;
        Ok(Self {
            listen,
            node_id: args.node_id.unwrap_or_else(fresh_node_id),
            peers,
            fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
            resolve_interval: (args.resolve_interval_secs > 0)
                .then(|| Duration::from_secs(args.resolve_interval_secs)),
            strategy: if args.parallel_mining {
                MiningStrategy::Parallel
            } else {
                MiningStrategy::Sequential
            },
            mine_retries: args.mine_retries.max(1),
        })
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            node_id: fresh_node_id(),
            peers: Vec::new(),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            resolve_interval: None,
            strategy: MiningStrategy::Sequential,
            mine_retries: DEFAULT_MINE_RETRIES,
        }
    }
}

/// 32 hex characters, a v4 uuid without dashes.
pub fn fresh_node_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
