use std::io::Write;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::transaction::Transaction;

/// Errors that can occur while building a hash preimage
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to encode transactions: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Failed to write preimage: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes the header hash of a block
///
/// The preimage is `"{index}{timestamp}{transactions}"` where the transaction
/// list is compact JSON with each object's fields in declaration order. An
/// empty list contributes nothing. The proof is never part of the preimage.
///
/// # Returns
///
/// The SHA-256 digest as 64 lowercase hexadecimal characters
pub fn digest(index: u64, timestamp: f64, transactions: &[Transaction]) -> Result<String, HashError> {
    let mut hasher = Sha256::new();
    write!(hasher, "{}{}", index, timestamp)?;

    if !transactions.is_empty() {
        serde_json::to_writer(&mut hasher, transactions)?;
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Computes the proof-of-work digest for a header hash and nonce
pub fn proof_digest(header_hash: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(header_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
