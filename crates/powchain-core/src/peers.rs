//! Known peer addresses, normalised to `host[:port]`.
use crate::error::{LedgerError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Peer {
    pub host: String,
    pub port: Option<u16>,
}

impl Peer {
    /// Accepts `scheme://host[:port][/path]` or `host[:port][/path]`; a
    /// missing scheme means `http`. Scheme, path, query, fragment and
    /// userinfo are dropped and the port defaults to the scheme's.
    pub fn parse(address: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidAddress(address.to_string());
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let parsed = if trimmed.contains("://") {
            Url::parse(trimmed)
        } else {
            Url::parse(&format!("http://{trimmed}"))
        }
        .map_err(|_| invalid())?;

        let host = match parsed.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_ascii_lowercase(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(invalid()),
        };
        Ok(Self {
            host,
            port: parsed.port_or_known_default(),
        })
    }
}

impl FromStr for Peer {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host: &str = &self.host;
        match (host.contains(':'), self.port) {
            (true, Some(port)) => write!(f, "[{host}]:{port}"),
            (true, None) => write!(f, "[{host}]"),
            (false, Some(port)) => write!(f, "{host}:{port}"),
            (false, None) => f.write_str(host),
        }
    }
}

#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: RwLock<BTreeSet<Peer>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store `address`. Registering a known peer is a no-op.
    pub fn register(&self, address: &str) -> Result<Peer> {
        let peer = Peer::parse(address)?;
        self.peers.write().insert(peer.clone());
        Ok(peer)
    }

    /// Store an already-parsed peer. Returns false if it was known.
    pub fn insert(&self, peer: Peer) -> bool {
        self.peers.write().insert(peer)
    }

    /// Current peers, in a stable order.
    pub fn list(&self) -> Vec<Peer> {
        self.peers.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}
