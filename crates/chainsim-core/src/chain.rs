use crate::block::Block;
use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::error::{BlockchainError, Result};
use serde::Serialize;

/// An append-only sequence of hash-linked blocks, indexed by height.
///
/// The vector is private so the only way in is [`Chain::append`], which
/// refuses anything that does not extend the tip. Appending needs `&mut self`,
/// so one writer at a time per chain is enforced by the borrow checker;
/// share a chain behind a lock if concurrent readers must coexist with a
/// writer. There is deliberately no `Deserialize`: a chain rebuilt from raw
/// data would bypass the append checks.
#[derive(Clone, Debug, Serialize)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Start a chain from a fresh genesis block.
    pub fn genesis(payload: Vec<String>, producer: impl Into<String>) -> Result<Self> {
        let genesis = Block::genesis(payload, producer)?;
        Ok(Self {
            blocks: vec![genesis],
        })
    }

    /// The most recently appended block.
    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("a chain always holds at least its genesis block")
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at `height`, if the chain has grown that far.
    pub fn get(&self, height: u64) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Append `block` if it extends the tip; otherwise fail with
    /// [`BlockchainError::ChainLinkage`] and leave the chain untouched.
    ///
    /// All-or-nothing: both checks run before any mutation.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let tip = self.tip();
        if block.height != tip.height + 1 {
            return Err(BlockchainError::ChainLinkage(format!(
                "block height {} does not extend tip height {}",
                block.height, tip.height
            )));
        }
        if block.previous_hash != tip.hash {
            return Err(BlockchainError::ChainLinkage(format!(
                "previous hash {} does not match tip hash {}",
                block.previous_hash, tip.hash
            )));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Audit the whole chain: genesis shape, every linkage, and every stored
    /// hash against its recomputed digest.
    ///
    /// Off the hot path; `append` keeps new blocks consistent, this catches
    /// anything mutated after the fact.
    pub fn verify(&self) -> bool {
        let Some(genesis) = self.blocks.first() else {
            return false;
        };
        if genesis.height != 0
            || genesis.previous_hash != GENESIS_PREVIOUS_HASH
            || genesis.hash != genesis.compute_hash()
        {
            return false;
        }

        for pair in self.blocks.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.height != previous.height + 1 {
                return false;
            }
            if current.previous_hash != previous.hash {
                return false;
            }
            if current.hash != current.compute_hash() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_one_block() -> (Chain, Block) {
        let mut chain = Chain::genesis(vec!["genesis".to_string()], "system").unwrap();
        let block = Block::new(
            1,
            chain.tip().hash.clone(),
            vec!["tx1".to_string()],
            "alice",
            None,
        )
        .unwrap();
        chain.append(block.clone()).unwrap();
        (chain, block)
    }

    #[test]
    fn genesis_chain_has_one_verified_block() {
        let chain = Chain::genesis(vec!["genesis".to_string()], "system").unwrap();
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert!(chain.tip().is_genesis());
        assert!(chain.verify());
    }

    #[test]
    fn append_advances_the_tip() {
        let (chain, block) = chain_with_one_block();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.tip(), &block);
        assert!(chain.verify());
    }

    #[test]
    fn height_skip_is_rejected_and_chain_unchanged() {
        let (mut chain, _) = chain_with_one_block();
        let skipping = Block::new(
            4,
            chain.tip().hash.clone(),
            vec!["tx4".to_string()],
            "bob",
            None,
        )
        .unwrap();

        let before = chain.len();
        let err = chain.append(skipping).unwrap_err();
        assert!(matches!(err, BlockchainError::ChainLinkage(_)));
        assert_eq!(chain.len(), before);
    }

    #[test]
    fn mismatched_previous_hash_is_rejected_and_tip_survives() {
        let (mut chain, tip_before) = chain_with_one_block();
        let unlinked = Block::new(
            2,
            "feedfacefeedfacefeedfacefeedface".to_string(),
            vec!["tx2".to_string()],
            "bob",
            None,
        )
        .unwrap();

        let err = chain.append(unlinked).unwrap_err();
        assert!(matches!(err, BlockchainError::ChainLinkage(_)));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.tip(), &tip_before);
    }

    #[test]
    fn get_indexes_by_height() {
        let (chain, block) = chain_with_one_block();
        assert_eq!(chain.get(0).unwrap().height, 0);
        assert_eq!(chain.get(1), Some(&block));
        assert!(chain.get(2).is_none());
    }

    #[test]
    fn verify_catches_a_tampered_block() {
        let (mut chain, _) = chain_with_one_block();
        assert!(chain.verify());

        chain.blocks[1].payload.push("forged".to_string());
        assert!(!chain.verify());
    }

    #[test]
    fn verify_catches_a_rewritten_hash() {
        let (mut chain, _) = chain_with_one_block();
        chain.blocks[1].hash = "0".repeat(64);
        assert!(!chain.verify());
    }
}
