//! Asset metadata lookup

use ebp_ledger::{Address, AssetId, LedgerClient, LedgerError};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::fetcher::with_timeout;

/// Descriptive metadata about an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub asset_id: AssetId,
    pub supply: u64,
    /// Height the asset was created at
    pub height: u64,
    pub owner: Address,
    pub supply_mutable: bool,
    pub transferable: bool,
    pub restrictable: bool,
    pub revokable: bool,
    /// First namespace name linked to the asset
    pub alias: Option<String>,
}

/// Parse a user-supplied asset id, rejecting empty input up front.
pub fn parse_asset_id(input: &str) -> Result<AssetId> {
    if input.trim().is_empty() {
        return Err(ReaderError::EmptyAssetId);
    }
    Ok(input.parse()?)
}

/// Resolves asset metadata through the ledger client
pub struct AssetInspector<'a, C: ?Sized> {
    client: &'a C,
    call_timeout: Duration,
}

impl<'a, C: LedgerClient + ?Sized> AssetInspector<'a, C> {
    pub fn new(client: &'a C, config: &ReaderConfig) -> Self {
        Self {
            client,
            call_timeout: config.call_timeout(),
        }
    }

    pub async fn inspect(&self, asset_id: AssetId) -> Result<AssetSummary> {
        let info = match with_timeout(self.call_timeout, "get_asset", self.client.get_asset(asset_id)).await {
            Err(ReaderError::Ledger(LedgerError::NotFound(_))) => {
                return Err(ReaderError::AssetNotFound(asset_id.to_hex()))
            }
            other => other?,
        };

        let names = with_timeout(
            self.call_timeout,
            "get_asset_names",
            self.client.get_asset_names(&[asset_id]),
        )
        .await?;

        let alias = names
            .into_iter()
            .find(|entry| entry.asset_id == asset_id)
            .and_then(|entry| entry.names.into_iter().next());

        debug!(
            asset_id = %asset_id,
            owner = %info.owner,
            alias = ?alias,
            "Resolved asset"
        );

        Ok(AssetSummary {
            asset_id: info.id,
            supply: info.supply,
            height: info.start_height,
            owner: info.owner,
            supply_mutable: info.flags.supply_mutable,
            transferable: info.flags.transferable,
            restrictable: info.flags.restrictable,
            revokable: info.flags.revokable,
            alias,
        })
    }

    /// Parse then inspect.
    pub async fn inspect_str(&self, asset_id: &str) -> Result<AssetSummary> {
        let asset_id = parse_asset_id(asset_id)?;
        self.inspect(asset_id).await
    }
}
