//! A proof-of-work block chain with a replayable account ledger.
//!
//! Blocks are immutable, chained to their predecessor and guarded by a
//! leading-zero proof-of-work puzzle. Balances are never stored; they are
//! replayed from every settled transaction in timestamp order.
//!
//! ```no_run
//! use powledger::{Blockchain, ChainConfig};
//!
//! let mut chain = Blockchain::new(ChainConfig::new(2000, 4))?;
//! chain.stage("genesis", "adam", 1000, None)?;
//! chain.stage("genesis", "eve", 1000, None)?;
//! let block = chain.commit()?;
//! println!("{}", block);
//! assert!(chain.verify_chain());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod blockchain;
pub mod config;

pub use blockchain::{
    Address, Block, BlockSummary, Blockchain, BlockchainError, CommitError, Ledger, LedgerError,
    SharedBlockchain, Transaction,
};
pub use config::{ChainConfig, ConfigError};
