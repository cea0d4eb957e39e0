//! Reader counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ReaderStats {
    pub(crate) reads_attempted: AtomicU64,
    pub(crate) reads_failed: AtomicU64,
    pub(crate) records_fetched: AtomicU64,
    pub(crate) records_validated: AtomicU64,
    pub(crate) records_rejected: AtomicU64,
    pub(crate) documents_verified: AtomicU64,
    pub(crate) integrity_failures: AtomicU64,
    pub(crate) broken_chains: AtomicU64,
    pub(crate) duplicates_detected: AtomicU64,
}

/// Public statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStatsSnapshot {
    pub reads_attempted: u64,
    pub reads_failed: u64,
    pub records_fetched: u64,
    pub records_validated: u64,
    pub records_rejected: u64,
    pub documents_verified: u64,
    pub integrity_failures: u64,
    pub broken_chains: u64,
    pub duplicates_detected: u64,
}

impl ReaderStats {
    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold another set of counters into these totals.
    pub(crate) fn merge(&self, other: &ReaderStatsSnapshot) {
        let pairs = [
            (&self.reads_attempted, other.reads_attempted),
            (&self.reads_failed, other.reads_failed),
            (&self.records_fetched, other.records_fetched),
            (&self.records_validated, other.records_validated),
            (&self.records_rejected, other.records_rejected),
            (&self.documents_verified, other.documents_verified),
            (&self.integrity_failures, other.integrity_failures),
            (&self.broken_chains, other.broken_chains),
            (&self.duplicates_detected, other.duplicates_detected),
        ];
        for (counter, n) in pairs {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ReaderStatsSnapshot {
        ReaderStatsSnapshot {
            reads_attempted: self.reads_attempted.load(Ordering::Relaxed),
            reads_failed: self.reads_failed.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            records_validated: self.records_validated.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            documents_verified: self.documents_verified.load(Ordering::Relaxed),
            integrity_failures: self.integrity_failures.load(Ordering::Relaxed),
            broken_chains: self.broken_chains.load(Ordering::Relaxed),
            duplicates_detected: self.duplicates_detected.load(Ordering::Relaxed),
        }
    }
}
