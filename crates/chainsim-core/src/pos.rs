use crate::block::Block;
use crate::error::{BlockchainError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A staking participant: an address unique within its set, and the weight
/// that drives its selection probability.
///
/// A value snapshot for one simulation run; re-staking between rounds means
/// building a new set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    pub stake: u64,
}

impl Validator {
    pub fn new(address: impl Into<String>, stake: u64) -> Self {
        Self {
            address: address.into(),
            stake,
        }
    }
}

/// Sum of all stakes, widened so large sets cannot overflow.
pub fn total_stake(validators: &[Validator]) -> u128 {
    validators.iter().map(|v| u128::from(v.stake)).sum()
}

/// Pick the next proposer, weighted by stake: validator `i` wins with
/// probability `stake_i / total`.
///
/// The random source is injected so a seeded generator reproduces a whole
/// selection sequence. A set whose total stake is zero (including the empty
/// set) has no valid weighted choice and fails with
/// [`BlockchainError::NoEligibleStake`]; nothing falls back to an arbitrary
/// validator.
pub fn select_validator<'a, R: Rng>(
    validators: &'a [Validator],
    rng: &mut R,
) -> Result<&'a Validator> {
    let total = total_stake(validators);
    if total == 0 {
        return Err(BlockchainError::NoEligibleStake);
    }

    // The draw is an integer strictly below the total, so the subtract-scan
    // always lands on a validator; zero-stake entries can never absorb it.
    let mut draw = rng.gen_range(0..total);
    for validator in validators {
        let stake = u128::from(validator.stake);
        if draw < stake {
            debug!(
                "selected validator {} (stake {} of {total})",
                validator.address, validator.stake
            );
            return Ok(validator);
        }
        draw -= stake;
    }
    unreachable!("a draw below the total stake lands within the scan")
}

/// Run one proposer round: select a validator and build the block extending
/// `last_block` with `payload`. No search is involved; cost is one random draw
/// plus the O(n) scan.
pub fn propose<R: Rng>(
    validators: &[Validator],
    last_block: &Block,
    payload: Vec<String>,
    rng: &mut R,
) -> Result<Block> {
    let validator = select_validator(validators, rng)?;
    Block::new(
        last_block.height + 1,
        last_block.hash.clone(),
        payload,
        validator.address.clone(),
        None,
    )
}
