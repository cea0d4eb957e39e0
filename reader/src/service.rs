//! On-chain reader - the entry point tying the pipeline together.
//!
//! ```text
//! AssetInspector ─► RecordFetcher ─► ChainValidator ─► ChainReconstructor ─► IntegrityVerifier
//!  (asset/owner)     (page+hydrate)   (header filter)   (walk terminals)      (SHA-512 check)
//! ```
//!
//! A read is bounded by an overall deadline and can be cancelled through a
//! watch channel. The reader never writes, so abandoning a read leaves
//! nothing behind.

use ebp_ledger::{Address, AssetId, LedgerClient, TransactionHash};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::fetcher::RecordFetcher;
use crate::header::HeaderCipher;
use crate::inspector::{parse_asset_id, AssetInspector, AssetSummary};
use crate::reconstructor::{ChainReconstructor, ChainWalk, WalkStatus};
use crate::stats::{ReaderStats, ReaderStatsSnapshot};
use crate::validator::ChainValidator;
use crate::verifier::{IntegrityVerifier, ReconstructedDocument, Verification};

/// Asset metadata plus every verified document stored for it
#[derive(Debug, Clone)]
pub struct OnChainData {
    pub asset: AssetSummary,
    /// Oldest document first; empty when nothing verified
    pub documents: Vec<ReconstructedDocument>,
    /// Counters for this read only
    pub stats: ReaderStatsSnapshot,
}

/// Reads protocol documents through a shared ledger client handle
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ebp_ledger::{HttpLedgerClient, NetworkType};
/// use ebp_reader::{OnChainReader, ReaderConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Arc::new(HttpLedgerClient::for_network(NetworkType::Main)?);
/// let reader = OnChainReader::new(client, ReaderConfig::default());
///
/// let data = reader.read("3A8416DB2D53B6C8").await?;
/// for document in &data.documents {
///     println!("{}: {} bytes", document.title, document.data.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct OnChainReader<C: ?Sized> {
    client: Arc<C>,
    config: ReaderConfig,
    cipher: HeaderCipher,
    verifier: IntegrityVerifier,
    stats: Arc<ReaderStats>,
}

impl<C: LedgerClient + ?Sized> OnChainReader<C> {
    pub fn new(client: Arc<C>, config: ReaderConfig) -> Self {
        Self {
            cipher: HeaderCipher::new(config.header_encoding),
            client,
            config,
            verifier: IntegrityVerifier::new(),
            stats: Arc::new(ReaderStats::default()),
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn stats(&self) -> ReaderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Read an asset and every document stored for it, within the deadline.
    pub async fn read(&self, asset_id: &str) -> Result<OnChainData> {
        let asset_id = parse_asset_id(asset_id)?;
        self.tracked_read(asset_id, None).await
    }

    /// Like [`read`](Self::read), aborting outstanding fetches once `cancel`
    /// becomes `true`.
    pub async fn read_with_cancel(
        &self,
        asset_id: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<OnChainData> {
        if *cancel.borrow_and_update() {
            return Err(ReaderError::Cancelled);
        }
        let asset_id = parse_asset_id(asset_id)?;
        self.tracked_read(asset_id, Some(cancel)).await
    }

    /// Run one read against its own counters, then fold them into the
    /// reader-wide totals whatever the outcome.
    async fn tracked_read(
        &self,
        asset_id: AssetId,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<OnChainData> {
        let stats = Arc::new(ReaderStats::default());
        ReaderStats::incr(&stats.reads_attempted);

        let read = tokio::time::timeout(self.config.deadline(), self.read_asset(asset_id, &stats));
        let result = match cancel {
            Some(mut cancel) => tokio::select! {
                result = read => result.unwrap_or(Err(ReaderError::DeadlineExceeded)),
                _ = cancelled(&mut cancel) => {
                    info!(asset_id = %asset_id, "Read cancelled");
                    Err(ReaderError::Cancelled)
                }
            },
            None => read.await.unwrap_or(Err(ReaderError::DeadlineExceeded)),
        };

        if result.is_err() {
            ReaderStats::incr(&stats.reads_failed);
        }
        let snapshot = stats.snapshot();
        self.stats.merge(&snapshot);

        let (asset, documents) = result?;
        Ok(OnChainData {
            asset,
            documents,
            stats: snapshot,
        })
    }

    async fn read_asset(
        &self,
        asset_id: AssetId,
        stats: &Arc<ReaderStats>,
    ) -> Result<(AssetSummary, Vec<ReconstructedDocument>)> {
        let asset = AssetInspector::new(&*self.client, &self.config)
            .inspect(asset_id)
            .await?;
        let documents = self.reconstruct_into(asset_id, &asset.owner, stats).await?;
        Ok((asset, documents))
    }

    /// Reassemble and verify every document for an asset/owner pair.
    pub async fn reconstruct(
        &self,
        asset_id: AssetId,
        owner: &Address,
    ) -> Result<Vec<ReconstructedDocument>> {
        self.reconstruct_into(asset_id, owner, &self.stats).await
    }

    async fn reconstruct_into(
        &self,
        asset_id: AssetId,
        owner: &Address,
        stats: &Arc<ReaderStats>,
    ) -> Result<Vec<ReconstructedDocument>> {
        let start = Instant::now();

        let records = RecordFetcher::new(&*self.client, &self.config)
            .fetch(owner)
            .await?;
        let fetched = records.len();
        ReaderStats::add(&stats.records_fetched, fetched);

        let validated = ChainValidator::new(asset_id, owner, self.cipher).filter(records);
        ReaderStats::add(&stats.records_validated, validated.len());
        ReaderStats::add(&stats.records_rejected, fetched - validated.len());

        if validated.is_empty() {
            info!(asset_id = %asset_id, owner = %owner, fetched, "No protocol records found");
            return Ok(Vec::new());
        }

        let reconstructor = Arc::new(ChainReconstructor::new(
            validated,
            self.config.chain_strategy,
        ));
        let terminals = reconstructor.terminals();
        debug!(
            asset_id = %asset_id,
            records = reconstructor.records().len(),
            terminals = terminals.len(),
            strategy = %reconstructor.strategy(),
            "Walking chains"
        );

        // Chain walks are independent and CPU-bound; run them on the blocking pool.
        let verifier = self.verifier;
        let walked: Vec<(Option<ReconstructedDocument>, Vec<TransactionHash>)> =
            stream::iter(terminals)
                .map(|terminal| {
                    let reconstructor = Arc::clone(&reconstructor);
                    let stats = Arc::clone(stats);
                    tokio::task::spawn_blocking(move || {
                        finish_chain(&reconstructor, terminal, &verifier, &stats)
                    })
                })
                .buffered(self.config.concurrency())
                .try_collect()
                .await?;

        // Each repeated hash counts once, wherever it was spotted.
        let mut duplicates: BTreeSet<TransactionHash> =
            reconstructor.duplicate_hashes().into_iter().cloned().collect();
        let mut documents = Vec::with_capacity(walked.len());
        for (document, walk_duplicates) in walked {
            duplicates.extend(walk_duplicates);
            documents.extend(document);
        }
        if !duplicates.is_empty() {
            ReaderStats::add(&stats.duplicates_detected, duplicates.len());
            warn!(
                asset_id = %asset_id,
                duplicates = ?duplicates.iter().map(|h| h.as_str()).collect::<Vec<_>>(),
                "Duplicate records fetched, using first match"
            );
        }

        info!(
            asset_id = %asset_id,
            owner = %owner,
            fetched,
            validated = reconstructor.records().len(),
            documents = documents.len(),
            time_ms = start.elapsed().as_millis() as u64,
            "Reconstruction finished"
        );

        Ok(documents)
    }
}

/// Walk one terminal and verify the result.
fn finish_chain(
    reconstructor: &ChainReconstructor,
    terminal: usize,
    verifier: &IntegrityVerifier,
    stats: &ReaderStats,
) -> (Option<ReconstructedDocument>, Vec<TransactionHash>) {
    let ChainWalk {
        data,
        records_walked,
        status,
        duplicates,
        ..
    } = reconstructor.walk(terminal);
    let record = reconstructor.record(terminal);

    if !duplicates.is_empty() {
        debug!(
            terminal = %record.hash(),
            links = duplicates.len(),
            "Chain link resolved to more than one record"
        );
    }

    let document = match status {
        WalkStatus::Complete => match verifier.verify(record, data, records_walked) {
            Verification::Verified(document) => {
                ReaderStats::incr(&stats.documents_verified);
                Some(document)
            }
            Verification::Mismatch { .. } | Verification::Uncommitted => {
                ReaderStats::incr(&stats.integrity_failures);
                None
            }
        },
        WalkStatus::Broken { missing } => {
            ReaderStats::incr(&stats.broken_chains);
            warn!(
                terminal = %record.hash(),
                missing = %missing,
                walked = records_walked,
                "Chain incomplete, document skipped"
            );
            None
        }
        WalkStatus::Cycle { at } => {
            ReaderStats::incr(&stats.broken_chains);
            warn!(
                terminal = %record.hash(),
                at = %at,
                walked = records_walked,
                "Chain loops back on itself, document skipped"
            );
            None
        }
    };
    (document, duplicates)
}

/// Resolves once the flag is set; never resolves if the sender goes away.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
