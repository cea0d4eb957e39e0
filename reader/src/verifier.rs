//! Integrity verification of reassembled documents
//!
//! A document is accepted only when the SHA-512 of the exact reassembled
//! bytes, hex encoded, equals the hash committed in the terminal header.
//! The comparison is case-sensitive.

use ebp_ledger::TransactionHash;
use sha2::{Digest, Sha512};
use std::time::Instant;
use tracing::{debug, warn};

use crate::validator::ValidatedRecord;

/// A verified document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedDocument {
    pub title: String,
    pub description: String,
    pub data: Vec<u8>,
    /// Set only when the hash check passed
    pub valid: bool,
    pub terminal_hash: TransactionHash,
    pub height: u64,
    pub timestamp: u64,
    /// Number of records the document was assembled from
    pub chunks: usize,
}

impl ReconstructedDocument {
    /// UTF-8 view of the data, if it is text
    pub fn data_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// Outcome of verifying one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified(ReconstructedDocument),
    /// Recomputed hash differs from the committed one
    Mismatch {
        expected: String,
        computed: String,
        size: usize,
    },
    /// Terminal header carries no hash
    Uncommitted,
}

impl Verification {
    pub fn into_document(self) -> Option<ReconstructedDocument> {
        match self {
            Verification::Verified(document) => Some(document),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Check reassembled bytes against the terminal record's committed hash.
    pub fn verify(&self, terminal: &ValidatedRecord, data: Vec<u8>, chunks: usize) -> Verification {
        let Some(expected) = terminal.header.hash.as_deref() else {
            return Verification::Uncommitted;
        };

        let start = Instant::now();
        let computed = compute_sha512(&data);

        if computed != expected {
            warn!(
                terminal = %terminal.hash(),
                size = data.len(),
                expected = %expected,
                computed = %computed,
                "Reassembled document failed hash check"
            );
            return Verification::Mismatch {
                expected: expected.to_string(),
                computed,
                size: data.len(),
            };
        }

        debug!(
            terminal = %terminal.hash(),
            size = data.len(),
            duration_us = start.elapsed().as_micros() as u64,
            "Document verified"
        );

        Verification::Verified(ReconstructedDocument {
            title: terminal.header.title.clone(),
            description: terminal.header.description.clone(),
            data,
            valid: true,
            terminal_hash: terminal.hash().clone(),
            height: terminal.height(),
            timestamp: terminal.record.timestamp,
            chunks,
        })
    }
}

/// SHA-512 of data as lower-case hex
pub fn compute_sha512(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
