//! The `LedgerClient` trait - the read-only ledger surface the reader consumes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

/// Read-only access to a ledger node.
///
/// One handle is built per network selection and shared by reference with
/// everything that reads from that network.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Search aggregate transactions involving an address, one page at a time.
    async fn search_aggregates(&self, criteria: &SearchCriteria) -> Result<Page<AggregateSummary>>;

    /// Fetch a transaction with every inner transaction hydrated.
    async fn get_transaction(
        &self,
        hash: &TransactionHash,
        group: TransactionGroup,
    ) -> Result<AggregateRecord>;

    /// Fetch the current state of a mosaic.
    async fn get_asset(&self, id: AssetId) -> Result<AssetInfo>;

    /// Fetch namespace names linked to each mosaic.
    async fn get_asset_names(&self, ids: &[AssetId]) -> Result<Vec<AssetNames>>;
}
