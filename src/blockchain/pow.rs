use std::sync::atomic::{AtomicBool, Ordering};

use super::hasher::proof_digest;

/// Largest meaningful difficulty: a SHA-256 hex digest has 64 characters
pub const MAX_DIFFICULTY: u8 = 64;

/// How many nonces are tried between checks of the cancel flag
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Proof-of-work puzzle at a fixed difficulty
///
/// A nonce solves the puzzle for a header hash when
/// `sha256(header_hash ++ nonce)` starts with `difficulty` hex zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u8,
}

impl ProofOfWork {
    pub fn new(difficulty: u8) -> Self {
        ProofOfWork { difficulty }
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// Finds the smallest nonce solving the puzzle for `header_hash`
    pub fn solve(&self, header_hash: &str) -> Option<u64> {
        find_proof(header_hash, self.difficulty)
    }

    /// Like [`ProofOfWork::solve`], but gives up once `cancel` is raised
    pub fn solve_cancellable(&self, header_hash: &str, cancel: &AtomicBool) -> Option<u64> {
        find_proof_cancellable(header_hash, self.difficulty, cancel)
    }

    pub fn verify(&self, header_hash: &str, nonce: u64) -> bool {
        verify_proof(header_hash, nonce, self.difficulty)
    }
}

/// Checks the leading-zero predicate for a hex digest
fn meets_difficulty(digest: &str, difficulty: u8) -> bool {
    let difficulty = difficulty as usize;
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|b| b == b'0')
}

/// Returns true when `nonce` solves the puzzle for `header_hash`
pub fn verify_proof(header_hash: &str, nonce: u64, difficulty: u8) -> bool {
    meets_difficulty(&proof_digest(header_hash, nonce), difficulty)
}

/// Scans nonces from zero upward and returns the first one that verifies
///
/// The scan is sequential, so the result is deterministic for a given header
/// hash and difficulty. Returns `None` only if the whole `u64` range fails.
pub fn find_proof(header_hash: &str, difficulty: u8) -> Option<u64> {
    (0..=u64::MAX).find(|&nonce| verify_proof(header_hash, nonce, difficulty))
}

/// Sequential search that stops early when `cancel` becomes true
pub fn find_proof_cancellable(header_hash: &str, difficulty: u8, cancel: &AtomicBool) -> Option<u64> {
    for nonce in 0..=u64::MAX {
        if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }
        if verify_proof(header_hash, nonce, difficulty) {
            return Some(nonce);
        }
    }
    None
}
