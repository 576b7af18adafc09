use serde::Serialize;
use thiserror::Error;

use std::fmt;
use std::sync::Arc;

use super::hasher::{digest, HashError};
use super::pow::verify_proof;
use super::transaction::Transaction;

/// A block whose stored hash and proof do not satisfy the puzzle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Block {index} failed verification (hash {hash}, proof {proof})")]
pub struct IntegrityError {
    pub index: u64,
    pub hash: String,
    pub proof: u64,
}

/// Represents a block in the chain
///
/// Blocks are immutable once built. The hash is computed at construction
/// from `(index, timestamp, transactions)` and is never recomputed.
pub struct Block {
    index: u64,
    timestamp: f64,
    transactions: Vec<Transaction>,
    proof: u64,
    hash: String,
    previous: Option<Arc<Block>>,
}

impl Block {
    /// Builds a block from its header fields and an already found proof
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `timestamp` - Creation time in seconds since the Unix epoch
    /// * `transactions` - The transactions carried by the block
    /// * `proof` - The proof-of-work nonce
    /// * `previous` - The predecessor, `None` only for the genesis block
    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous: Option<Arc<Block>>,
    ) -> Result<Self, HashError> {
        let hash = digest(index, timestamp, &transactions)?;

        Ok(Block {
            index,
            timestamp,
            transactions,
            proof,
            hash,
            previous,
        })
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn proof(&self) -> u64 {
        self.proof
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn previous(&self) -> Option<&Arc<Block>> {
        self.previous.as_ref()
    }

    pub fn is_genesis(&self) -> bool {
        self.previous.is_none()
    }

    /// Checks the stored hash and proof against the puzzle at `difficulty`
    pub fn verify(&self, difficulty: u8) -> Result<(), IntegrityError> {
        if verify_proof(&self.hash, self.proof, difficulty) {
            Ok(())
        } else {
            Err(IntegrityError {
                index: self.index,
                hash: self.hash.clone(),
                proof: self.proof,
            })
        }
    }

    /// Checks the structural link to the predecessor
    pub fn is_linked(&self) -> bool {
        match &self.previous {
            Some(previous) => previous.index.checked_add(1) == Some(self.index),
            None => self.index == 0,
        }
    }

    /// Display record of the block without its predecessor link
    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            index: self.index,
            timestamp: self.timestamp,
            proof: self.proof,
            hash: self.hash.clone(),
            transactions: self.transactions.clone(),
        }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("index", &self.index)
            .field("timestamp", &self.timestamp)
            .field("transactions", &self.transactions)
            .field("proof", &self.proof)
            .field("hash", &self.hash)
            .field("previous", &self.previous.as_ref().map(|block| block.index))
            .finish()
    }
}

impl Drop for Block {
    // Unlink predecessors one at a time so dropping a long chain does not
    // recurse once per block.
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(block) = next {
            match Arc::try_unwrap(block) {
                Ok(mut owned) => next = owned.previous.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_record(f, self.index, self.timestamp, self.proof, &self.transactions)
    }
}

/// Human readable record of a block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub index: u64,
    pub timestamp: f64,
    pub proof: u64,
    pub hash: String,
    pub transactions: Vec<Transaction>,
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_record(f, self.index, self.timestamp, self.proof, &self.transactions)
    }
}

fn write_record(
    f: &mut fmt::Formatter<'_>,
    index: u64,
    timestamp: f64,
    proof: u64,
    transactions: &[Transaction],
) -> fmt::Result {
    writeln!(f, "Block: {}", index)?;
    writeln!(f, "Time: {}", timestamp)?;
    writeln!(f, "Proof: {}", proof)?;
    write!(f, "Transactions:")?;
    if transactions.is_empty() {
        return writeln!(f, " none");
    }
    writeln!(f)?;
    for transaction in transactions {
        writeln!(f, "  {}", transaction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::pow::find_proof;

    fn mined(index: u64, transactions: Vec<Transaction>, previous: Option<Arc<Block>>) -> Block {
        let hash = digest(index, 10.0 + index as f64, &transactions).unwrap();
        let proof = find_proof(&hash, 1).unwrap();
        Block::new(index, 10.0 + index as f64, transactions, proof, previous).unwrap()
    }

    #[test]
    fn test_new_block() {
        let transactions = vec![Transaction::new_seed("genesis", 100, 1.0)];
        let block = Block::new(0, 1.0, transactions.clone(), 7, None).unwrap();

        assert_eq!(block.index(), 0);
        assert_eq!(block.proof(), 7);
        assert_eq!(block.transactions(), transactions.as_slice());
        assert_eq!(block.hash(), digest(0, 1.0, &transactions).unwrap());
        assert!(block.is_genesis());
        assert!(block.is_linked());
    }

    #[test]
    fn test_hash_excludes_proof() {
        let a = Block::new(1, 2.0, vec![], 1, None).unwrap();
        let b = Block::new(1, 2.0, vec![], 2, None).unwrap();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_verify_mined_block() {
        let block = mined(0, vec![Transaction::new_seed("genesis", 5, 1.0)], None);
        assert!(block.verify(1).is_ok());
    }

    #[test]
    fn test_verify_reports_index() {
        let hash = digest(0, 3.0, &[]).unwrap();
        let good = find_proof(&hash, 2).unwrap();
        let bad = (0..).find(|n| *n != good && !verify_proof(&hash, *n, 2)).unwrap();

        let block = Block::new(0, 3.0, vec![], bad, None).unwrap();
        let err = block.verify(2).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.proof, bad);
    }

    #[test]
    fn test_linkage() {
        let genesis = Arc::new(mined(0, vec![Transaction::new_seed("genesis", 5, 1.0)], None));
        let child = mined(1, vec![Transaction::new("genesis", "adam", 1, Some(2.0))], Some(genesis.clone()));
        assert!(child.is_linked());
        assert_eq!(child.previous().unwrap().index(), 0);

        let skipped = Block::new(5, 1.0, vec![], 0, Some(genesis)).unwrap();
        assert!(!skipped.is_linked());
    }

    #[test]
    fn test_drop_long_chain() {
        let mut tail = Arc::new(Block::new(0, 0.0, vec![], 0, None).unwrap());
        for index in 1..100_000u64 {
            tail = Arc::new(Block::new(index, 0.0, vec![], 0, Some(tail)).unwrap());
        }
        drop(tail);
    }

    #[test]
    fn test_display_record() {
        let block = Block::new(0, 1.5, vec![Transaction::new_seed("genesis", 5, 1.5)], 3, None).unwrap();
        let text = block.to_string();

        assert!(text.starts_with("Block: 0\nTime: 1.5\nProof: 3\nTransactions:\n"));
        assert!(text.contains("(mint) -> genesis: 5"));
        assert_eq!(text, block.summary().to_string());
    }
}
