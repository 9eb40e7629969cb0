use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;

use super::GENESIS_HASH;
use super::payload::{self, Payload};

/// A single block in the ledger holding one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub data: Payload,
    pub hash: String, // Cached hash of the block
    pub previous_hash: String,
    pub timestamp: DateTime<Utc>,
    pub pow: u64, // Proof-of-Work nonce
}

impl Block {
    /// Create the genesis block (first block in the chain). It carries the
    /// sentinel hash and is never mined.
    pub fn genesis() -> Self {
        Self {
            data: Payload::new(),
            hash: String::from(GENESIS_HASH),
            previous_hash: String::from(GENESIS_HASH),
            timestamp: Utc::now(),
            pow: 0,
        }
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(previous_hash: String, data: Payload) -> Self {
        Self {
            data,
            hash: String::new(),
            previous_hash,
            timestamp: Utc::now(),
            pow: 0,
        }
    }

    /// Compute the SHA-256 hash of this block from `previous_hash`, the
    /// canonical JSON of `data`, the timestamp and `pow`, in that order.
    pub fn compute_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}",
            self.previous_hash,
            payload::canonical_json(&self.data),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.pow
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash
    /// starting with `difficulty` leading zeros (in hex).
    ///
    /// There is no attempt cap: expected work is about `16^difficulty` hashes.
    pub fn mine(&mut self, difficulty: u32) {
        let started = Instant::now();
        let start_pow = self.pow;
        loop {
            self.hash = self.compute_hash();
            if self.meets_difficulty(difficulty) {
                break;
            }
            self.pow = self.pow.wrapping_add(1);
        }
        debug!(
            "mined hash={} pow={} attempts={} in {} ms",
            self.hash,
            self.pow,
            self.pow.wrapping_sub(start_pow) + 1,
            started.elapsed().as_millis()
        );
    }

    /// Whether the cached hash has `difficulty` leading zero hex characters.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.len() >= difficulty as usize
            && self
                .hash
                .chars()
                .take(difficulty as usize)
                .all(|c| c == '0')
    }

    /// Whether the cached hash still matches the block content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}
