//! Deterministic block digest.
//!
//! The canonical form is compact JSON with object keys sorted
//! lexicographically at every level, numbers in serde_json's shortest
//! round-trip formatting, UTF-8 text. Key order is imposed explicitly so the
//! digest does not depend on whether `serde_json/preserve_order` is enabled
//! somewhere in the dependency graph.
use crate::Block;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub fn canonicalize(block: &Block) -> Vec<u8> {
    canonical_bytes(block)
}

pub fn hash(block: &Block) -> String {
    hex_digest(&canonicalize(block))
}

pub fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // Blocks only hold strings, integers and finite floats, all of which
    // serde_json accepts.
    let value = serde_json::to_value(value).unwrap_or(Value::Null);
    serde_json::to_vec(&sorted(value)).unwrap_or_default()
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k, sorted(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
