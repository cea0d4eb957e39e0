//! HTTP client for the Symbol REST gateway

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::client::LedgerClient;
use crate::error::{LedgerError, Result};
use crate::types::*;

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Base URL of the REST gateway, e.g. `https://node.example:3001`
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl LedgerConfig {
    /// Settings for the default public node of a network
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            base_url: network.default_node_url().to_string(),
            ..Default::default()
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: NetworkType::Main.default_node_url().to_string(),
            timeout_secs: 30,
        }
    }
}

/// REST implementation of [`LedgerClient`]
///
/// # Example
///
/// ```rust,no_run
/// use ebp_ledger::{HttpLedgerClient, LedgerClient, NetworkType};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpLedgerClient::for_network(NetworkType::Test)?;
/// let asset = client.get_asset("3A8416DB2D53B6C8".parse()?).await?;
/// println!("owner: {}", asset.owner);
/// # Ok(())
/// # }
/// ```
pub struct HttpLedgerClient {
    config: LedgerConfig,
    client: Client,
    /// Public key -> address, filled as inner transactions are decoded
    signer_addresses: DashMap<String, Address>,
}

impl HttpLedgerClient {
    /// Create a client for an explicit gateway
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config: LedgerConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
            signer_addresses: DashMap::new(),
        })
    }

    /// Create a client for the default node of a network
    pub fn for_network(network: NetworkType) -> Result<Self> {
        Self::new(LedgerConfig::for_network(network))
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // ==================== Helper Methods ====================

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        self.handle_response(response, url).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        url: &str,
    ) -> Result<T> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound(url.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Resolve a signer public key to its address, consulting the cache first
    async fn signer_address(&self, public_key: &str) -> Result<Address> {
        if let Some(address) = self.signer_addresses.get(public_key) {
            return Ok(*address);
        }

        let url = format!(
            "{}/accounts/{}",
            self.config.base_url,
            urlencoding::encode(public_key)
        );
        let info: AccountInfoDto = self.get_json(&url).await?;
        let address = Address::from_hex(&info.account.address)?;

        debug!(public_key = %public_key, address = %address, "Resolved signer address");
        self.signer_addresses.insert(public_key.to_string(), address);
        Ok(address)
    }

    async fn inner_transaction(&self, dto: &TransactionBodyDto) -> Result<InnerTransaction> {
        let signer_key = dto.signer_public_key.as_deref().ok_or_else(|| {
            LedgerError::InvalidResponse("inner transaction without signerPublicKey".into())
        })?;
        let signer = self.signer_address(signer_key).await?;

        let recipient = dto
            .recipient_address
            .as_deref()
            .map(Address::from_hex)
            .transpose()?;

        Ok(InnerTransaction {
            kind: TransactionType::from(dto.kind),
            signer,
            recipient,
            message: decode_message(dto.message.as_deref())?,
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn search_aggregates(&self, criteria: &SearchCriteria) -> Result<Page<AggregateSummary>> {
        let mut url = format!(
            "{}/transactions/{}?address={}&pageSize={}&pageNumber={}",
            self.config.base_url,
            criteria.group.as_path(),
            urlencoding::encode(&criteria.address.to_string()),
            criteria.page_size,
            criteria.page_number,
        );
        for kind in &criteria.types {
            url.push_str(&format!("&type={}", kind.code()));
        }

        let page: TransactionPageDto = self.get_json(&url).await?;
        let data = page
            .data
            .iter()
            .map(|tx| -> Result<AggregateSummary> {
                let (hash, height, timestamp) = tx.meta.top_level()?;
                Ok(AggregateSummary {
                    hash,
                    height,
                    timestamp,
                    kind: TransactionType::from(tx.transaction.kind),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(
            data,
            page.pagination.page_number,
            page.pagination.page_size,
        ))
    }

    async fn get_transaction(
        &self,
        hash: &TransactionHash,
        group: TransactionGroup,
    ) -> Result<AggregateRecord> {
        let url = format!(
            "{}/transactions/{}/{}",
            self.config.base_url,
            group.as_path(),
            hash
        );
        let tx: TransactionDto = self.get_json(&url).await?;
        let (record_hash, height, timestamp) = tx.meta.top_level()?;

        let mut inner = Vec::with_capacity(tx.transaction.transactions.len());
        for embedded in &tx.transaction.transactions {
            inner.push(self.inner_transaction(&embedded.transaction).await?);
        }

        Ok(AggregateRecord {
            hash: record_hash,
            height,
            timestamp,
            kind: TransactionType::from(tx.transaction.kind),
            inner,
        })
    }

    async fn get_asset(&self, id: AssetId) -> Result<AssetInfo> {
        let url = format!("{}/mosaics/{}", self.config.base_url, id.to_hex());
        let info: MosaicInfoDto = self.get_json(&url).await?;
        let mosaic = info.mosaic;

        Ok(AssetInfo {
            id: mosaic.id.parse()?,
            supply: parse_u64("supply", &mosaic.supply)?,
            start_height: parse_u64("startHeight", &mosaic.start_height)?,
            owner: Address::from_hex(&mosaic.owner_address)?,
            flags: AssetFlags::from_bits(mosaic.flags),
        })
    }

    async fn get_asset_names(&self, ids: &[AssetId]) -> Result<Vec<AssetNames>> {
        let url = format!("{}/namespaces/mosaic/names", self.config.base_url);
        let body = MosaicNamesRequestDto {
            mosaic_ids: ids.iter().map(AssetId::to_hex).collect(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let names: MosaicNamesResponseDto = self.handle_response(response, &url).await?;

        names
            .mosaic_names
            .into_iter()
            .map(|entry| -> Result<AssetNames> {
                Ok(AssetNames {
                    asset_id: entry.mosaic_id.parse()?,
                    names: entry.names,
                })
            })
            .collect()
    }
}

/// Strip the message-type byte from a hex-encoded message
fn decode_message(message: Option<&str>) -> Result<Vec<u8>> {
    let Some(message) = message else {
        return Ok(Vec::new());
    };
    let bytes = hex::decode(message)
        .map_err(|e| LedgerError::InvalidResponse(format!("message is not hex: {}", e)))?;
    Ok(bytes.into_iter().skip(1).collect())
}

fn parse_u64(field: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| LedgerError::InvalidResponse(format!("{} is not a u64: {}", field, value)))
}

// ============================================================================
// Gateway DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
struct TransactionPageDto {
    data: Vec<TransactionDto>,
    pagination: PaginationDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationDto {
    page_number: u32,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct TransactionDto {
    meta: TransactionMetaDto,
    transaction: TransactionBodyDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMetaDto {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    height: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl TransactionMetaDto {
    /// Hash, height and timestamp of a top-level transaction
    fn top_level(&self) -> Result<(TransactionHash, u64, u64)> {
        let hash = self
            .hash
            .as_deref()
            .ok_or_else(|| LedgerError::InvalidResponse("transaction meta without hash".into()))?
            .parse()?;
        let height = parse_u64("height", self.height.as_deref().unwrap_or("0"))?;
        let timestamp = parse_u64("timestamp", self.timestamp.as_deref().unwrap_or("0"))?;
        Ok((hash, height, timestamp))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBodyDto {
    #[serde(rename = "type")]
    kind: u16,
    #[serde(default)]
    signer_public_key: Option<String>,
    #[serde(default)]
    recipient_address: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    transactions: Vec<TransactionDto>,
}

#[derive(Debug, Deserialize)]
struct AccountInfoDto {
    account: AccountDto,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    address: String,
}

#[derive(Debug, Deserialize)]
struct MosaicInfoDto {
    mosaic: MosaicDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MosaicDto {
    id: String,
    supply: String,
    start_height: String,
    owner_address: String,
    flags: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MosaicNamesRequestDto {
    mosaic_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MosaicNamesResponseDto {
    mosaic_names: Vec<MosaicNamesDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MosaicNamesDto {
    mosaic_id: String,
    names: Vec<String>,
}
