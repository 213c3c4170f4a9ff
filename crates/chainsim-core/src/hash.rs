use sha2::{Digest, Sha256};

/// SHA-256 digest of `data`, encoded as 64 lowercase hex characters.
///
/// Pure function: no state is shared between calls, so it can be used from any
/// number of threads at once (the parallel miner does exactly that).
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}
