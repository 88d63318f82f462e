use crate::constants::CHAIN_PATH;
use anyhow::{bail, Context, Result};
use powchain_core::{ChainFetcher, ChainSnapshot, Peer};
use std::time::Duration;

/// Reads `GET http://{peer}/chain` from other nodes.
#[derive(Clone, Debug)]
pub struct HttpChainFetcher {
    http: reqwest::Client,
}

impl HttpChainFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { http })
    }
}

pub fn chain_url(peer: &Peer) -> String {
    format!("http://{peer}{CHAIN_PATH}")
}

impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &Peer) -> Result<ChainSnapshot> {
        let url = chain_url(peer);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = res.status();
        if !status.is_success() {
            bail!("GET {url} returned {status}");
        }
        res.json::<ChainSnapshot>()
            .await
            .with_context(|| format!("decoding chain from {url}"))
    }
}
