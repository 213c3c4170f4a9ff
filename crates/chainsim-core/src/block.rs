use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::error::{BlockchainError, Result};
use crate::hash::sha256_hex;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single block in the chain.
///
/// A block is a value: every field that feeds the hash is fixed at construction
/// and `hash` caches the digest over exactly those fields. Changing any input
/// means constructing a new block; [`crate::chain::Chain::verify`] recomputes
/// the digest to catch blocks mutated behind the chain's back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub previous_hash: String,
    /// Opaque transaction records, carried verbatim.
    pub payload: Vec<String>,
    /// Who produced the block: a validator address, a miner tag, or "system"
    /// for genesis.
    pub producer: String,
    /// Unix timestamp in milliseconds, read once at construction.
    pub timestamp: u64,
    /// Winning Proof-of-Work nonce; `None` for genesis and PoS blocks.
    pub nonce: Option<u64>,
    pub hash: String,
}

impl Block {
    /// Build a block and derive its hash from the canonical field order.
    ///
    /// Fails fast with [`BlockchainError::InvalidBlockInput`] on malformed
    /// arguments instead of defaulting anything: an empty previous hash, or a
    /// previous hash that disagrees with the height about being genesis.
    pub fn new(
        height: u64,
        previous_hash: impl Into<String>,
        payload: Vec<String>,
        producer: impl Into<String>,
        nonce: Option<u64>,
    ) -> Result<Self> {
        let previous_hash = previous_hash.into();
        if previous_hash.is_empty() {
            return Err(BlockchainError::InvalidBlockInput(
                "previous hash must not be empty".to_string(),
            ));
        }
        if height == 0 && previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(BlockchainError::InvalidBlockInput(format!(
                "genesis block must use the {GENESIS_PREVIOUS_HASH:?} previous-hash sentinel, got {previous_hash:?}"
            )));
        }
        if height > 0 && previous_hash == GENESIS_PREVIOUS_HASH {
            return Err(BlockchainError::InvalidBlockInput(format!(
                "block at height {height} cannot use the genesis previous-hash sentinel"
            )));
        }

        let producer = producer.into();
        let timestamp = unix_millis();
        let hash = sha256_hex(preimage(
            height,
            &previous_hash,
            &payload,
            &producer,
            timestamp,
            nonce,
        ));
        Ok(Self {
            height,
            previous_hash,
            payload,
            producer,
            timestamp,
            nonce,
            hash,
        })
    }

    /// The block at height 0, linked to the previous-hash sentinel.
    pub fn genesis(payload: Vec<String>, producer: impl Into<String>) -> Result<Self> {
        Self::new(0, GENESIS_PREVIOUS_HASH, payload, producer, None)
    }

    /// Recompute the digest from the stored fields.
    ///
    /// Equals `self.hash` for any untampered block; used by integrity audits.
    pub fn compute_hash(&self) -> String {
        sha256_hex(preimage(
            self.height,
            &self.previous_hash,
            &self.payload,
            &self.producer,
            self.timestamp,
            self.nonce,
        ))
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

/// Canonical serialization of a payload: its JSON encoding.
///
/// Both the block preimage and the Proof-of-Work candidate string embed the
/// payload through this one function, so the two can never drift apart.
pub fn payload_json(payload: &[String]) -> String {
    serde_json::to_string(payload).expect("a list of strings serializes to JSON")
}

/// Hash preimage in canonical field order:
/// height, previous hash, serialized payload, producer, timestamp, then the
/// nonce when one is present.
fn preimage(
    height: u64,
    previous_hash: &str,
    payload: &[String],
    producer: &str,
    timestamp: u64,
    nonce: Option<u64>,
) -> String {
    let body = format!(
        "{height}:{previous_hash}:{}:{producer}:{timestamp}",
        payload_json(payload)
    );
    match nonce {
        Some(nonce) => format!("{body}:{nonce}"),
        None => body,
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as u64
}
