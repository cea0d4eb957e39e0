//! In-memory ledger for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use crate::client::LedgerClient;
use crate::error::{LedgerError, Result};
use crate::types::*;

/// Mock ledger for testing.
///
/// Records are returned in insertion order; search honours the page size
/// and page number of the criteria.
pub struct MockLedgerClient {
    records: Vec<(Address, AggregateRecord)>,
    assets: HashMap<AssetId, AssetInfo>,
    names: HashMap<AssetId, Vec<String>>,
    latency: Option<Duration>,
    fail_search: AtomicBool,
    fail_get_transaction: AtomicBool,
    search_calls: AtomicU32,
    get_transaction_calls: AtomicU32,
    get_asset_calls: AtomicU32,
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            assets: HashMap::new(),
            names: HashMap::new(),
            latency: None,
            fail_search: AtomicBool::new(false),
            fail_get_transaction: AtomicBool::new(false),
            search_calls: AtomicU32::new(0),
            get_transaction_calls: AtomicU32::new(0),
            get_asset_calls: AtomicU32::new(0),
        }
    }

    /// Add an aggregate visible to searches for `address`.
    pub fn with_record(mut self, address: Address, record: AggregateRecord) -> Self {
        self.records.push((address, record));
        self
    }

    pub fn with_records(
        mut self,
        address: Address,
        records: impl IntoIterator<Item = AggregateRecord>,
    ) -> Self {
        self.records
            .extend(records.into_iter().map(|record| (address, record)));
        self
    }

    pub fn with_asset(mut self, asset: AssetInfo) -> Self {
        self.assets.insert(asset.id, asset);
        self
    }

    pub fn with_asset_names(mut self, id: AssetId, names: Vec<String>) -> Self {
        self.names.insert(id, names);
        self
    }

    /// Delay every call, for timeout and cancellation tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_get_transaction(&self, fail: bool) {
        self.fail_get_transaction.store(fail, Ordering::SeqCst);
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn get_transaction_calls(&self) -> u32 {
        self.get_transaction_calls.load(Ordering::SeqCst)
    }

    pub fn get_asset_calls(&self) -> u32 {
        self.get_asset_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn unavailable(operation: &str) -> LedgerError {
        LedgerError::Server {
            status: 503,
            message: format!("mock {} disabled", operation),
        }
    }
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn search_aggregates(&self, criteria: &SearchCriteria) -> Result<Page<AggregateSummary>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_search.load(Ordering::SeqCst) {
            return Err(Self::unavailable("search"));
        }

        let page_size = criteria.page_size.max(1) as usize;
        let skip = criteria.page_number.saturating_sub(1) as usize * page_size;
        let data: Vec<AggregateSummary> = self
            .records
            .iter()
            .filter(|(address, record)| {
                *address == criteria.address && criteria.types.contains(&record.kind)
            })
            .skip(skip)
            .take(page_size)
            .map(|(_, record)| record.summary())
            .collect();

        Ok(Page::new(data, criteria.page_number, criteria.page_size))
    }

    async fn get_transaction(
        &self,
        hash: &TransactionHash,
        _group: TransactionGroup,
    ) -> Result<AggregateRecord> {
        self.get_transaction_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_get_transaction.load(Ordering::SeqCst) {
            return Err(Self::unavailable("get_transaction"));
        }

        self.records
            .iter()
            .find(|(_, record)| &record.hash == hash)
            .map(|(_, record)| record.clone())
            .ok_or_else(|| LedgerError::NotFound(hash.to_string()))
    }

    async fn get_asset(&self, id: AssetId) -> Result<AssetInfo> {
        self.get_asset_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        self.assets
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_hex()))
    }

    async fn get_asset_names(&self, ids: &[AssetId]) -> Result<Vec<AssetNames>> {
        self.simulate_latency().await;

        Ok(ids
            .iter()
            .map(|id| AssetNames {
                asset_id: *id,
                names: self.names.get(id).cloned().unwrap_or_default(),
            })
            .collect())
    }
}
