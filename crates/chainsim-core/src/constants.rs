pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Previous-hash sentinel carried by the block at height 0.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Mining progress is logged once per this many attempts.
pub const MINE_PROGRESS_INTERVAL: u64 = 1_000_000;
