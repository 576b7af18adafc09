use log::{debug, info, warn};

use super::block::Block;
use super::chain::CommitError;
use super::ledger::LedgerError;
use super::transaction::Transaction;

/// Receives notifications about chain activity
///
/// The chain never logs on its own; presentation is left to the observer
/// supplied at construction. Every hook defaults to doing nothing.
pub trait ChainObserver: Send + Sync {
    fn genesis_created(&self, _block: &Block) {}

    fn transaction_staged(&self, _transaction: &Transaction) {}

    fn transaction_rejected(&self, _transaction: &Transaction, _error: &LedgerError) {}

    fn block_committed(&self, _block: &Block) {}

    fn commit_failed(&self, _error: &CommitError) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChainObserver for NoopObserver {}

/// Observer that forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ChainObserver for LogObserver {
    fn genesis_created(&self, block: &Block) {
        info!("Created genesis block {} (proof {})", block.hash(), block.proof());
    }

    fn transaction_staged(&self, transaction: &Transaction) {
        debug!("Staged transaction {}", transaction);
    }

    fn transaction_rejected(&self, transaction: &Transaction, error: &LedgerError) {
        warn!("Rejected transaction {}: {}", transaction, error);
    }

    fn block_committed(&self, block: &Block) {
        info!(
            "Committed block {} with {} transactions (proof {})",
            block.index(),
            block.transactions().len(),
            block.proof()
        );
    }

    fn commit_failed(&self, error: &CommitError) {
        warn!("Commit failed: {}", error);
    }
}
