//! Minimal blockchain consensus simulator: a hash-linked chain grown either by
//! Proof-of-Work nonce search or by stake-weighted Proof-of-Stake proposer
//! selection. Transactions are opaque payload; networking and persistence live
//! elsewhere.

pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod hash;
pub mod pos;
pub mod pow;

pub use block::{payload_json, Block};
pub use chain::Chain;
pub use error::{BlockchainError, Result};
pub use hash::sha256_hex;
pub use pos::{propose, select_validator, total_stake, Validator};
pub use pow::{mine, mine_parallel, mine_with_stop, Seal};
