//! Chain reconstruction
//!
//! Every terminal record (one whose header commits to a document hash) is
//! walked back to its origin. Chunks are collected terminal-first and
//! emitted origin-first, so the assembled bytes read in write order.
//!
//! ## Strategies
//!
//! - `Linked`: each header names the record holding the previous chunk
//!   (`prevTx`); `null` marks the origin.
//! - `Sequence`: each header carries its position (`seq`, 0 at the
//!   origin); the predecessor of `seq = n` is the newest record with
//!   `seq = n - 1` that is not newer than the current one.
//!
//! Lookups go through maps built once per reconstruction, so each hop is
//! constant time regardless of chain length.

use ebp_ledger::TransactionHash;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::validator::ValidatedRecord;

/// How chunk records link to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStrategy {
    /// Backward hash pointers (`prevTx`)
    #[default]
    Linked,
    /// Sequence numbers (`seq`)
    Sequence,
}

impl fmt::Display for ChainStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStrategy::Linked => write!(f, "linked"),
            ChainStrategy::Sequence => write!(f, "sequence"),
        }
    }
}

impl FromStr for ChainStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linked" => Ok(ChainStrategy::Linked),
            "sequence" => Ok(ChainStrategy::Sequence),
            other => Err(format!("unknown chain strategy: {}", other)),
        }
    }
}

/// How a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStatus {
    /// Reached the origin record
    Complete,
    /// A predecessor is not among the validated records
    Broken { missing: String },
    /// The chain loops back onto a record already walked
    Cycle { at: TransactionHash },
}

impl WalkStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, WalkStatus::Complete)
    }
}

/// Result of walking one terminal record back to its origin
#[derive(Debug, Clone)]
pub struct ChainWalk {
    /// Index of the terminal record
    pub terminal: usize,
    /// Chunks in origin-first order
    pub data: Vec<u8>,
    pub records_walked: usize,
    pub status: WalkStatus,
    /// Links that resolved to more than one record (first match was used)
    pub duplicates: Vec<TransactionHash>,
}

/// Walks chains over one asset/owner's validated records
#[derive(Debug)]
pub struct ChainReconstructor {
    records: Vec<ValidatedRecord>,
    strategy: ChainStrategy,
    by_hash: HashMap<TransactionHash, Vec<usize>>,
    by_seq: HashMap<u32, Vec<usize>>,
}

impl ChainReconstructor {
    pub fn new(records: Vec<ValidatedRecord>, strategy: ChainStrategy) -> Self {
        let mut by_hash: HashMap<TransactionHash, Vec<usize>> = HashMap::new();
        let mut by_seq: HashMap<u32, Vec<usize>> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            by_hash.entry(record.hash().clone()).or_default().push(index);
            if let Some(seq) = record.header.seq {
                by_seq.entry(seq).or_default().push(index);
            }
        }

        Self {
            records,
            strategy,
            by_hash,
            by_seq,
        }
    }

    pub fn records(&self) -> &[ValidatedRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> &ValidatedRecord {
        &self.records[index]
    }

    pub fn strategy(&self) -> ChainStrategy {
        self.strategy
    }

    fn first_index(&self, hash: &TransactionHash) -> Option<usize> {
        self.by_hash.get(hash).and_then(|indices| indices.first().copied())
    }

    /// Hashes that appear on more than one record
    pub fn duplicate_hashes(&self) -> Vec<&TransactionHash> {
        let mut hashes: Vec<_> = self
            .by_hash
            .iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(hash, _)| hash)
            .collect();
        hashes.sort();
        hashes
    }

    /// Terminal records, oldest first (height, then hash).
    ///
    /// A terminal fetched more than once yields only its first copy.
    pub fn terminals(&self) -> Vec<usize> {
        let mut terminals: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(index, record)| {
                record.header.is_terminal() && self.first_index(record.hash()) == Some(*index)
            })
            .map(|(index, _)| index)
            .collect();

        terminals.sort_by(|a, b| {
            let (a, b) = (&self.records[*a], &self.records[*b]);
            a.height()
                .cmp(&b.height())
                .then_with(|| a.hash().cmp(b.hash()))
        });
        terminals
    }

    /// Walk one terminal record back to its origin.
    pub fn walk(&self, terminal: usize) -> ChainWalk {
        let mut path = Vec::new();
        let mut duplicates = Vec::new();

        let status = match self.strategy {
            ChainStrategy::Linked => self.walk_linked(terminal, &mut path, &mut duplicates),
            ChainStrategy::Sequence => self.walk_sequence(terminal, &mut path, &mut duplicates),
        };

        let size = path.iter().map(|i| self.records[*i].chunk_len()).sum();
        let mut data = Vec::with_capacity(size);
        for index in path.iter().rev() {
            for chunk in self.records[*index].chunks() {
                data.extend_from_slice(chunk);
            }
        }

        ChainWalk {
            terminal,
            data,
            records_walked: path.len(),
            status,
            duplicates,
        }
    }

    /// Walk every terminal, oldest document first.
    pub fn walk_all(&self) -> Vec<ChainWalk> {
        self.terminals()
            .into_iter()
            .map(|terminal| self.walk(terminal))
            .collect()
    }

    fn walk_linked(
        &self,
        terminal: usize,
        path: &mut Vec<usize>,
        duplicates: &mut Vec<TransactionHash>,
    ) -> WalkStatus {
        let mut visited = HashSet::new();
        let mut current = terminal;

        loop {
            let record = &self.records[current];
            if !visited.insert(current) {
                return WalkStatus::Cycle {
                    at: record.hash().clone(),
                };
            }
            path.push(current);

            let Some(prev) = record.header.prev_tx.as_deref() else {
                return WalkStatus::Complete;
            };

            let candidates = prev
                .parse::<TransactionHash>()
                .ok()
                .and_then(|hash| self.by_hash.get(&hash).map(|indices| (hash, indices)));

            match candidates {
                Some((hash, indices)) => {
                    if indices.len() > 1 {
                        duplicates.push(hash);
                    }
                    current = indices[0];
                }
                None => {
                    return WalkStatus::Broken {
                        missing: prev.to_string(),
                    }
                }
            }
        }
    }

    fn walk_sequence(
        &self,
        terminal: usize,
        path: &mut Vec<usize>,
        duplicates: &mut Vec<TransactionHash>,
    ) -> WalkStatus {
        let mut current = terminal;
        path.push(current);

        let Some(mut seq) = self.records[current].header.seq else {
            return WalkStatus::Broken {
                missing: "seq".to_string(),
            };
        };

        while seq > 0 {
            let target = seq - 1;
            let ceiling = self.records[current].height();

            let mut candidates: Vec<usize> = self
                .by_seq
                .get(&target)
                .map(|indices| {
                    indices
                        .iter()
                        .copied()
                        .filter(|i| self.records[*i].height() <= ceiling)
                        .collect()
                })
                .unwrap_or_default();

            candidates.sort_by(|a, b| {
                let (a, b) = (&self.records[*a], &self.records[*b]);
                b.height()
                    .cmp(&a.height())
                    .then_with(|| a.hash().cmp(b.hash()))
            });

            let Some(&chosen) = candidates.first() else {
                return WalkStatus::Broken {
                    missing: format!("seq {}", target),
                };
            };

            let best_height = self.records[chosen].height();
            if candidates
                .iter()
                .skip(1)
                .any(|i| self.records[*i].height() == best_height)
            {
                duplicates.push(self.records[chosen].hash().clone());
            }

            current = chosen;
            seq = target;
            path.push(current);
        }

        WalkStatus::Complete
    }
}
