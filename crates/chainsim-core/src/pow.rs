use crate::block::payload_json;
use crate::constants::{HASH_HEX_SIZE, MINE_PROGRESS_INTERVAL};
use crate::error::{BlockchainError, Result};
use crate::hash::sha256_hex;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

/// Outcome of a successful nonce search: the winning nonce and the candidate
/// hash that met the target prefix.
///
/// The seal is not a block. The caller wraps it into one with
/// [`crate::Block::new`], passing the nonce along so it enters the block's own
/// canonical serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seal {
    pub nonce: u64,
    pub hash: String,
}

/// Search nonce space until the candidate hash starts with `difficulty` zero
/// hex characters.
///
/// Nonces are tried in increasing order from 0, so for fixed inputs the lowest
/// satisfying nonce wins and the result is reproducible. The search runs until
/// it succeeds; use [`mine_with_stop`] or [`mine_parallel`] when the caller
/// needs to bound it from outside.
pub fn mine(payload: &[String], previous_hash: &str, difficulty: u32) -> Result<Seal> {
    let stop = AtomicBool::new(false);
    let seal = mine_with_stop(payload, previous_hash, difficulty, &stop)?
        .expect("a search without a stop signal only returns on success");
    Ok(seal)
}

/// [`mine`] with an external stop signal, honored before every attempt.
///
/// Returns `Ok(None)` when the flag was raised before a satisfying nonce
/// turned up. A caller wanting a wall-clock timeout raises the flag from a
/// timer; the engine itself imposes no attempt cap.
pub fn mine_with_stop(
    payload: &[String],
    previous_hash: &str,
    difficulty: u32,
    stop: &AtomicBool,
) -> Result<Option<Seal>> {
    check_difficulty(difficulty)?;
    let serialized = payload_json(payload);
    if difficulty == 0 {
        // Every hash satisfies an empty prefix; nonce 0 wins without a search.
        return Ok(Some(zero_difficulty_seal(&serialized, previous_hash)));
    }
    let prefix = target_prefix(difficulty);

    let mut nonce = 0u64;
    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let hash = sha256_hex(candidate(&serialized, previous_hash, nonce));
        if hash.starts_with(&prefix) {
            info!("found nonce {nonce} after {} attempts, hash {hash}", nonce + 1);
            return Ok(Some(Seal { nonce, hash }));
        }
        nonce = nonce.wrapping_add(1);
        if nonce % MINE_PROGRESS_INTERVAL == 0 {
            debug!("still searching, {nonce} nonces tried");
        }
    }
}

/// Race rayon workers over disjoint nonce ranges; first find wins and the
/// remaining searches are abandoned, not awaited.
///
/// Unlike [`mine`], the winning nonce is whichever a worker hit first, not
/// necessarily the lowest. The stop flag is honored inside the search
/// predicate: raising it unwinds the whole race and yields `Ok(None)`.
pub fn mine_parallel(
    payload: &[String],
    previous_hash: &str,
    difficulty: u32,
    stop: &AtomicBool,
) -> Result<Option<Seal>> {
    check_difficulty(difficulty)?;
    let serialized = payload_json(payload);
    if difficulty == 0 {
        return Ok(Some(zero_difficulty_seal(&serialized, previous_hash)));
    }
    let prefix = target_prefix(difficulty);
    let attempts = AtomicU64::new(0);

    // A raised stop flag makes every candidate a "hit" so all workers bail out
    // on their next attempt; the recheck below filters the sentinel back out.
    let found = (0u64..u64::MAX)
        .into_par_iter()
        .find_any(|&nonce| {
            if stop.load(Ordering::Relaxed) {
                return true;
            }
            let tried = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            if tried % MINE_PROGRESS_INTERVAL == 0 {
                debug!("still searching, {tried} nonces tried");
            }
            sha256_hex(candidate(&serialized, previous_hash, nonce)).starts_with(&prefix)
        })
        .expect("nonce space exhausted (practically impossible)");

    let hash = sha256_hex(candidate(&serialized, previous_hash, found));
    if !hash.starts_with(&prefix) {
        return Ok(None);
    }
    info!(
        "parallel search found nonce {found} after {} attempts, hash {hash}",
        attempts.load(Ordering::Relaxed)
    );
    Ok(Some(Seal { nonce: found, hash }))
}

/// Candidate preimage: serialized payload, previous hash, then the decimal
/// nonce, concatenated in that order.
fn candidate(serialized_payload: &str, previous_hash: &str, nonce: u64) -> String {
    format!("{serialized_payload}{previous_hash}{nonce}")
}

fn target_prefix(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}

fn zero_difficulty_seal(serialized_payload: &str, previous_hash: &str) -> Seal {
    Seal {
        nonce: 0,
        hash: sha256_hex(candidate(serialized_payload, previous_hash, 0)),
    }
}

fn check_difficulty(difficulty: u32) -> Result<()> {
    if difficulty as usize > HASH_HEX_SIZE {
        return Err(BlockchainError::InvalidDifficulty {
            difficulty,
            max: HASH_HEX_SIZE,
        });
    }
    Ok(())
}
