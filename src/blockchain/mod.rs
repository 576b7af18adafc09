// Blockchain module
//
// This module contains the core chain implementation including:
// - Block hashing
// - Proof of work search and verification
// - Block structure and chain traversal
// - Ledger replay and transaction validation
// - Staging and commit of pending transactions

pub mod block;
pub mod chain;
pub mod hasher;
pub mod ledger;
pub mod observer;
pub mod pow;
pub mod shared;
pub mod transaction;

// Re-export main components for easier access
pub use block::{Block, BlockSummary, IntegrityError};
pub use chain::{Blockchain, BlockchainError, Blocks, CommitError, MiningHandle};
pub use ledger::{replay_ledger, settled_transactions, sort_for_replay, Ledger, LedgerError};
pub use observer::{ChainObserver, LogObserver, NoopObserver};
pub use pow::{find_proof, verify_proof, ProofOfWork};
pub use shared::SharedBlockchain;
pub use transaction::{Address, Transaction};
