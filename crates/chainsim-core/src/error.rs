use thiserror::Error;

/// Error type shared by block construction, both consensus engines and the chain.
#[derive(Error, Debug)]
pub enum BlockchainError {
    #[error("invalid block input: {0}")]
    InvalidBlockInput(String),

    #[error("invalid difficulty: {difficulty} leading zeros requested, digest has {max} hex characters")]
    InvalidDifficulty { difficulty: u32, max: usize },

    #[error("no eligible stake: total stake of the validator set is zero")]
    NoEligibleStake,

    #[error("chain linkage violation: {0}")]
    ChainLinkage(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlockchainError>;
