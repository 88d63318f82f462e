//! HTTP adapter around `powchain-core`: routes, the peer chain fetcher,
//! configuration and background consensus.
pub mod api;
pub mod config;
mod constants;
pub mod fetch;
pub mod tasks;

pub use api::{router, AppState};
pub use config::{Args, NodeConfig};
pub use fetch::HttpChainFetcher;
