use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ChainConfig;

use super::block::{Block, BlockSummary};
use super::chain::{Blockchain, BlockchainError, MiningHandle};
use super::ledger::Ledger;
use super::transaction::{Address, Transaction};

/// Thread-safe handle to a single blockchain
///
/// Every operation runs under one lock, so staging sees a consistent ledger
/// and a commit swaps the tail atomically with respect to readers. Mining can
/// be cancelled without taking the lock.
#[derive(Debug, Clone)]
pub struct SharedBlockchain {
    chain: Arc<Mutex<Blockchain>>,
    mining: MiningHandle,
}

impl SharedBlockchain {
    pub fn new(config: ChainConfig) -> Result<Self, BlockchainError> {
        Ok(Self::from_chain(Blockchain::new(config)?))
    }

    pub fn from_chain(chain: Blockchain) -> Self {
        let mining = chain.mining_handle();
        SharedBlockchain {
            chain: Arc::new(Mutex::new(chain)),
            mining,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Blockchain>, BlockchainError> {
        self.chain
            .lock()
            .map_err(|e| BlockchainError::SystemError(format!("Chain lock poisoned: {}", e)))
    }

    /// Runs `f` with shared access to the chain
    pub fn read<R>(&self, f: impl FnOnce(&Blockchain) -> R) -> Result<R, BlockchainError> {
        let chain = self.lock()?;
        Ok(f(&chain))
    }

    pub fn stage(
        &self,
        sender: impl Into<Address>,
        recipient: impl Into<Address>,
        amount: u64,
        timestamp: Option<f64>,
    ) -> Result<(), BlockchainError> {
        self.lock()?.stage(sender, recipient, amount, timestamp)?;
        Ok(())
    }

    pub fn commit(&self) -> Result<BlockSummary, BlockchainError> {
        Ok(self.lock()?.commit()?)
    }

    pub fn verify_chain(&self) -> Result<bool, BlockchainError> {
        self.read(Blockchain::verify_chain)
    }

    pub fn ledger_snapshot(&self) -> Result<Ledger, BlockchainError> {
        Ok(self.lock()?.ledger_snapshot()?)
    }

    pub fn pending(&self) -> Result<Vec<Transaction>, BlockchainError> {
        self.read(|chain| chain.pending().to_vec())
    }

    pub fn tail(&self) -> Result<Arc<Block>, BlockchainError> {
        self.read(|chain| Arc::clone(chain.tail()))
    }

    /// Aborts the running commit; has no effect when none is running
    pub fn cancel_mining(&self) {
        self.mining.cancel();
    }
}
