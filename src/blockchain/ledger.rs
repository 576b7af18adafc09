use serde::Serialize;
use thiserror::Error;

use std::collections::BTreeMap;

use super::block::Block;
use super::transaction::{Address, Transaction};

/// Reasons a transaction cannot be applied to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger does not start with a seed credit")]
    MissingGenesis,

    #[error("Unknown sender: {0}")]
    UnknownSender(Address),

    #[error("Insufficient funds in {account}: balance {balance}, required {amount}")]
    Overdraft {
        account: Address,
        balance: u64,
        amount: u64,
    },

    #[error("Transaction timestamp must be a finite number")]
    NonFiniteTimestamp,
}

/// Collects every transaction reachable from `blocks` in replay order
///
/// Replay order is global timestamp order. A transaction in a later block
/// with an earlier timestamp is replayed before transactions of earlier
/// blocks. Ties keep block order (genesis first), then in-block order.
pub fn settled_transactions<'a, I>(blocks: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut per_block: Vec<&[Transaction]> = blocks.into_iter().map(Block::transactions).collect();
    // Walks arrive tail first
    per_block.reverse();

    let mut transactions: Vec<Transaction> = per_block.into_iter().flatten().cloned().collect();
    sort_for_replay(&mut transactions);
    transactions
}

/// Stable sort by timestamp; equal timestamps keep their current order
pub fn sort_for_replay(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}

/// Replays ordered transactions into account balances
///
/// The first transaction must be the seed credit. This is a pure fold and
/// never touches the chain.
pub fn replay_ledger(transactions: &[Transaction]) -> Result<Ledger, LedgerError> {
    let (seed, rest) = transactions.split_first().ok_or(LedgerError::MissingGenesis)?;
    let mut ledger = Ledger::seeded(seed)?;

    for transaction in rest {
        ledger.apply(transaction)?;
    }

    Ok(ledger)
}

/// Account balances derived from settled transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    balances: BTreeMap<Address, u64>,
}

impl Ledger {
    /// Opens a ledger from the seed credit
    pub fn seeded(seed: &Transaction) -> Result<Self, LedgerError> {
        if !seed.is_seed() {
            return Err(LedgerError::MissingGenesis);
        }
        if !seed.timestamp.is_finite() {
            return Err(LedgerError::NonFiniteTimestamp);
        }

        let mut balances = BTreeMap::new();
        balances.insert(seed.recipient.clone(), seed.amount);
        Ok(Ledger { balances })
    }

    /// Gets the balance of an account, `None` if it never received funds
    pub fn balance(&self, address: &Address) -> Option<u64> {
        self.balances.get(address).copied()
    }

    /// Sum of all balances
    pub fn total(&self) -> u128 {
        self.balances.values().map(|balance| *balance as u128).sum()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, u64)> {
        self.balances.iter().map(|(address, balance)| (address, *balance))
    }

    /// Checks that `transaction` could be applied without changing anything
    ///
    /// # Returns
    ///
    /// The sender's balance after the debit
    pub fn validate(&self, transaction: &Transaction) -> Result<u64, LedgerError> {
        if !transaction.timestamp.is_finite() {
            return Err(LedgerError::NonFiniteTimestamp);
        }

        let sender = transaction
            .sender
            .as_ref()
            .ok_or_else(|| LedgerError::UnknownSender(transaction.recipient.clone()))?;

        let balance = self
            .balance(sender)
            .ok_or_else(|| LedgerError::UnknownSender(sender.clone()))?;

        balance
            .checked_sub(transaction.amount)
            .ok_or_else(|| LedgerError::Overdraft {
                account: sender.clone(),
                balance,
                amount: transaction.amount,
            })
    }

    /// Debits the sender and credits the recipient
    ///
    /// On error the ledger is left unchanged.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<(), LedgerError> {
        let remaining = self.validate(transaction)?;

        if let Some(sender) = &transaction.sender {
            self.balances.insert(sender.clone(), remaining);
        }

        // Credits are bounded by the seed amount, so this cannot overflow
        *self.balances.entry(transaction.recipient.clone()).or_insert(0) += transaction.amount;
        Ok(())
    }
}
