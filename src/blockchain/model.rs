use log::info;
use serde::Serialize;

use super::Block;
use super::payload;
use crate::error::ChainError;

/// Simple in-memory blockchain with Proof-of-Work.
#[derive(Debug, Clone, Serialize)]
pub struct Blockchain {
    pub genesis_block: Block,
    pub chain: Vec<Block>,
    pub difficulty: u32,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        let genesis = Block::genesis();
        Self {
            genesis_block: genesis.clone(),
            chain: vec![genesis],
            difficulty,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain.last().unwrap_or(&self.genesis_block)
    }

    /// Mine and append a transfer block linked to the current tail.
    pub fn add_block(&mut self, from: &str, to: &str, amount: f64) -> &Block {
        let mut block = self.next_block(from, to, amount);
        block.mine(self.difficulty);
        self.push(block)
    }

    /// Unmined transfer block linked to the current tail. Mine it (possibly
    /// without holding the chain) and hand it back through `append_mined_block`.
    pub fn next_block(&self, from: &str, to: &str, amount: f64) -> Block {
        Block::new(
            self.last_block().hash.clone(),
            payload::transfer(from, to, amount),
        )
    }

    /// Append a block that was mined elsewhere. Rejected if the tail moved
    /// since the block was prepared, or if its hash or PoW do not hold.
    pub fn append_mined_block(&mut self, block: Block) -> Result<(), ChainError> {
        if block.previous_hash != self.last_block().hash {
            return Err(ChainError::StaleTip);
        }
        if !block.has_valid_hash() {
            return Err(ChainError::InvalidHash);
        }
        if !block.meets_difficulty(self.difficulty) {
            return Err(ChainError::InsufficientWork(self.difficulty));
        }
        self.push(block);
        Ok(())
    }

    fn push(&mut self, block: Block) -> &Block {
        info!(
            "sealed block #{} (hash={}, pow={})",
            self.chain.len(),
            block.hash,
            block.pow
        );
        self.chain.push(block);
        self.last_block()
    }

    /// Validate the entire chain: every block's hash matches its content and
    /// links to its predecessor. The genesis block is only used as an anchor.
    pub fn is_valid(&self) -> bool {
        self.chain.windows(2).all(|pair| {
            let (prev, current) = (&pair[0], &pair[1]);
            current.has_valid_hash() && current.previous_hash == prev.hash
        })
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }
}
