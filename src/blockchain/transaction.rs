use chrono::Utc;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Opaque account identifier
///
/// Addresses are plain names compared by value. They carry no key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Creates a new address from any string-like value
    pub fn new(name: impl Into<String>) -> Self {
        Address(name.into())
    }

    /// Returns the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(name: &str) -> Self {
        Address(name.to_string())
    }
}

impl From<String> for Address {
    fn from(name: String) -> Self {
        Address(name)
    }
}

/// Current time as fractional seconds since the Unix epoch
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Represents a value transfer between two accounts
///
/// The field order below is the serialized order and is part of the block
/// hash preimage. Do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address, `None` for the seed credit
    pub sender: Option<Address>,

    /// Recipient's address
    pub recipient: Address,

    /// Amount being transferred
    pub amount: u64,

    /// Creation time in seconds since the Unix epoch
    pub timestamp: f64,
}

impl Transaction {
    /// Creates a new transfer
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    /// * `timestamp` - Creation time, defaults to now when `None`
    ///
    /// # Returns
    ///
    /// A new Transaction instance
    pub fn new(
        sender: impl Into<Address>,
        recipient: impl Into<Address>,
        amount: u64,
        timestamp: Option<f64>,
    ) -> Self {
        Transaction {
            sender: Some(sender.into()),
            recipient: recipient.into(),
            amount,
            timestamp: timestamp.unwrap_or_else(now_timestamp),
        }
    }

    /// Creates the seed credit that opens the ledger
    ///
    /// # Arguments
    ///
    /// * `recipient` - The seed account
    /// * `amount` - The total supply
    /// * `timestamp` - Creation time
    pub fn new_seed(recipient: impl Into<Address>, amount: u64, timestamp: f64) -> Self {
        Transaction {
            sender: None,
            recipient: recipient.into(),
            amount,
            timestamp,
        }
    }

    /// Checks if the transaction is a seed credit (no sender)
    pub fn is_seed(&self) -> bool {
        self.sender.is_none()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sender {
            Some(sender) => write!(
                f,
                "{} -> {}: {} @ {}",
                sender, self.recipient, self.amount, self.timestamp
            ),
            None => write!(
                f,
                "(mint) -> {}: {} @ {}",
                self.recipient, self.amount, self.timestamp
            ),
        }
    }
}
