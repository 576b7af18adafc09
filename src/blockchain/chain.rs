use std::fmt;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ChainConfig, ConfigError};

use super::block::{Block, BlockSummary, IntegrityError};
use super::hasher::{digest, HashError};
use super::ledger::{replay_ledger, settled_transactions, sort_for_replay, Ledger, LedgerError};
use super::observer::{ChainObserver, LogObserver};
use super::pow::ProofOfWork;
use super::transaction::{now_timestamp, Address, Transaction};

/// Errors that can occur while mining and linking a block
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("No transactions to add to block")]
    EmptyQueue,

    /// A freshly mined block failed its own verification. This is a bug in
    /// the proof search, not a user error.
    #[error("Mined block failed verification: {0}")]
    Mining(#[from] IntegrityError),

    #[error("Failed to hash block: {0}")]
    Hash(#[from] HashError),

    #[error("No nonce solves block {index}")]
    Exhausted { index: u64 },

    #[error("Mining of block {index} was cancelled")]
    Cancelled { index: u64 },
}

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create genesis block: {0}")]
    Genesis(#[source] CommitError),

    #[error("Transaction rejected: {0}")]
    Validation(#[from] LedgerError),

    #[error("Commit failed: {0}")]
    Commit(#[from] CommitError),

    #[error("Invalid chain: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("System error: {0}")]
    SystemError(String),
}

/// Shared flag that aborts an in-flight proof search
///
/// Only a running search is affected. Every commit clears the flag before it
/// starts searching, so a cancel issued while idle is dropped.
#[derive(Debug, Clone, Default)]
pub struct MiningHandle {
    cancelled: Arc<AtomicBool>,
}

impl MiningHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn flag(&self) -> &AtomicBool {
        &self.cancelled
    }

    fn take(&self) -> bool {
        self.cancelled.swap(false, Ordering::SeqCst)
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Lazy walk from the tail back to genesis
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    next: Option<&'a Block>,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.next?;
        self.next = block.previous().map(Arc::as_ref);
        Some(block)
    }
}

impl FusedIterator for Blocks<'_> {}

/// Represents the blockchain
///
/// Holds the tail block, the pending transactions and the parameters fixed
/// at creation. Every mutating call takes `&mut self`, so a chain has a
/// single writer; wrap it in [`super::SharedBlockchain`] to share it.
pub struct Blockchain {
    /// Most recent block, every other block hangs off its `previous` link
    tail: Arc<Block>,

    /// Transactions staged for the next block
    pending: Vec<Transaction>,

    pow: ProofOfWork,

    seed_amount: u64,

    seed_account: Address,

    mining: MiningHandle,

    observer: Box<dyn ChainObserver>,
}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blockchain")
            .field("height", &self.tail.index())
            .field("tail", &self.tail.hash())
            .field("pending", &self.pending.len())
            .field("difficulty", &self.pow.difficulty())
            .field("seed_amount", &self.seed_amount)
            .field("seed_account", &self.seed_account)
            .finish()
    }
}

impl Blockchain {
    /// Creates a new blockchain with a mined genesis block
    ///
    /// Events are reported through [`LogObserver`].
    pub fn new(config: ChainConfig) -> Result<Self, BlockchainError> {
        Self::with_observer(config, Box::new(LogObserver))
    }

    /// Creates a new blockchain reporting events to `observer`
    ///
    /// # Arguments
    ///
    /// * `config` - Difficulty, seed amount and seed account
    /// * `observer` - Receiver of staging and commit notifications
    ///
    /// # Returns
    ///
    /// A chain holding only the genesis block, or an error if the
    /// configuration is invalid or the genesis block could not be mined
    pub fn with_observer(
        config: ChainConfig,
        observer: Box<dyn ChainObserver>,
    ) -> Result<Self, BlockchainError> {
        config.validate()?;

        let pow = ProofOfWork::new(config.difficulty);
        let mining = MiningHandle::default();

        let timestamp = now_timestamp();
        let seed = Transaction::new_seed(config.seed_account.clone(), config.seed_amount, timestamp);
        let genesis = forge(&pow, &mining, 0, timestamp, vec![seed], None)
            .map_err(BlockchainError::Genesis)?;

        observer.genesis_created(&genesis);

        Ok(Blockchain {
            tail: Arc::new(genesis),
            pending: Vec::new(),
            pow,
            seed_amount: config.seed_amount,
            seed_account: config.seed_account,
            mining,
            observer,
        })
    }

    pub fn tail(&self) -> &Arc<Block> {
        &self.tail
    }

    pub fn genesis(&self) -> &Block {
        let mut block = self.tail.as_ref();
        while let Some(previous) = block.previous() {
            block = previous;
        }
        block
    }

    /// Index of the tail block
    pub fn height(&self) -> u64 {
        self.tail.index()
    }

    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    pub fn difficulty(&self) -> u8 {
        self.pow.difficulty()
    }

    pub fn seed_amount(&self) -> u64 {
        self.seed_amount
    }

    pub fn seed_account(&self) -> &Address {
        &self.seed_account
    }

    /// Transactions staged but not yet committed, in staging order
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Handle that can cancel mining from another thread
    pub fn mining_handle(&self) -> MiningHandle {
        self.mining.clone()
    }

    /// Walks the chain from the tail back to genesis
    ///
    /// Each call starts a fresh walk.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            next: Some(self.tail.as_ref()),
        }
    }

    /// Mines a block holding `transactions` and makes it the new tail
    ///
    /// # Returns
    ///
    /// The new tail. On error the chain is unchanged.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> Result<Arc<Block>, CommitError> {
        let result = self.mine_next(transactions);

        match &result {
            Ok(block) => {
                self.tail = Arc::clone(block);
                self.observer.block_committed(block);
            }
            Err(err) => self.observer.commit_failed(err),
        }

        result
    }

    fn mine_next(&self, transactions: Vec<Transaction>) -> Result<Arc<Block>, CommitError> {
        if transactions.is_empty() {
            return Err(CommitError::EmptyQueue);
        }

        let index = self.tail.index() + 1;
        let block = forge(
            &self.pow,
            &self.mining,
            index,
            now_timestamp(),
            transactions,
            Some(Arc::clone(&self.tail)),
        )?;

        Ok(Arc::new(block))
    }

    /// Checks every block's proof and link, reporting the first failure
    ///
    /// The walk goes from tail to genesis and stops at the first block that
    /// fails.
    pub fn verify_chain_diagnostic(&self) -> Result<(), IntegrityError> {
        let difficulty = self.pow.difficulty();

        for block in self.blocks() {
            block.verify(difficulty)?;

            if !block.is_linked() {
                return Err(IntegrityError {
                    index: block.index(),
                    hash: block.hash().to_string(),
                    proof: block.proof(),
                });
            }
        }

        Ok(())
    }

    pub fn verify_chain(&self) -> bool {
        self.verify_chain_diagnostic().is_ok()
    }

    /// Every committed transaction in replay (timestamp) order
    pub fn settled_transactions(&self) -> Vec<Transaction> {
        settled_transactions(self.blocks())
    }

    /// Balances replayed from the committed chain
    ///
    /// Pending transactions are not included.
    pub fn ledger_snapshot(&self) -> Result<Ledger, LedgerError> {
        replay_ledger(&self.settled_transactions())
    }

    /// Validates a transfer and queues it for the next block
    ///
    /// # Arguments
    ///
    /// * `sender` - The paying account
    /// * `recipient` - The receiving account
    /// * `amount` - The amount to transfer
    /// * `timestamp` - Creation time, defaults to now
    pub fn stage(
        &mut self,
        sender: impl Into<Address>,
        recipient: impl Into<Address>,
        amount: u64,
        timestamp: Option<f64>,
    ) -> Result<(), LedgerError> {
        self.stage_transaction(Transaction::new(sender, recipient, amount, timestamp))
    }

    /// Validates an already built transaction and queues it
    ///
    /// The candidate is replayed together with the committed transactions at
    /// its place in timestamp order, so it is admitted only if the ledger
    /// still replays once it is settled. Pending transactions are not taken
    /// into account. On error the pending set is untouched.
    pub fn stage_transaction(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if let Err(err) = self.admit(&transaction) {
            self.observer.transaction_rejected(&transaction, &err);
            return Err(err);
        }

        self.observer.transaction_staged(&transaction);
        self.pending.push(transaction);
        Ok(())
    }

    fn admit(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        if !transaction.timestamp.is_finite() {
            return Err(LedgerError::NonFiniteTimestamp);
        }

        let mut replay = self.settled_transactions();
        // Pushed last so a timestamp tie settles after the committed entries
        replay.push(transaction.clone());
        sort_for_replay(&mut replay);

        replay_ledger(&replay).map(|_| ())
    }

    /// Mines every pending transaction into a new block
    ///
    /// The pending set is cleared only when the block is linked.
    pub fn commit(&mut self) -> Result<BlockSummary, CommitError> {
        let block = self.append(self.pending.clone())?;
        self.pending.clear();
        Ok(block.summary())
    }
}

/// Hashes the header, searches a proof and builds a verified block
fn forge(
    pow: &ProofOfWork,
    mining: &MiningHandle,
    index: u64,
    timestamp: f64,
    transactions: Vec<Transaction>,
    previous: Option<Arc<Block>>,
) -> Result<Block, CommitError> {
    let header_hash = digest(index, timestamp, &transactions)?;

    mining.reset();
    let proof = match pow.solve_cancellable(&header_hash, mining.flag()) {
        Some(proof) => proof,
        None if mining.take() => return Err(CommitError::Cancelled { index }),
        None => return Err(CommitError::Exhausted { index }),
    };

    let block = Block::new(index, timestamp, transactions, proof, previous)?;
    block.verify(pow.difficulty())?;
    Ok(block)
}
