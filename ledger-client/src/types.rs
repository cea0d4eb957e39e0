//! Identifier and record types for the ledger API

use base32::Alphabet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IdentifierError;

const BASE32: Alphabet = Alphabet::Rfc4648 { padding: false };

// ============================================================================
// Identifiers
// ============================================================================

/// 64-bit mosaic identifier
///
/// Displays as 16 upper-case hex digits, which is the form the protocol
/// embeds in headers and uses as cipher IV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    pub const HEX_LEN: usize = 16;

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Upper-case hex form
    pub fn to_hex(&self) -> String {
        format!("{:016X}", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if s.len() != Self::HEX_LEN {
            return Err(IdentifierError::Length {
                kind: "asset id",
                expected: "16 hex digits",
                actual: s.len(),
            });
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| IdentifierError::Encoding {
                kind: "asset id",
                value: s.to_string(),
            })
    }
}

impl Serialize for AssetId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Decoded 24-byte account address
///
/// Parses from the 39-character base32 form (optionally hyphenated) or the
/// 48-character hex form the REST gateway returns. Displays as base32.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; Address::LEN]);

impl Address {
    pub const LEN: usize = 24;
    pub const ENCODED_LEN: usize = 39;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Network byte the address was derived for
    pub fn network_byte(&self) -> u8 {
        self.0[0]
    }

    /// Upper-case hex form used by the REST gateway
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, IdentifierError> {
        if s.len() != Self::LEN * 2 {
            return Err(IdentifierError::Length {
                kind: "address",
                expected: "48 hex digits",
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|_| IdentifierError::Encoding {
            kind: "address",
            value: s.to_string(),
        })?;
        let mut raw = [0u8; Self::LEN];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }

    fn from_base32(s: &str) -> Result<Self, IdentifierError> {
        // 24 bytes do not fill a base32 quantum; pad to 25 bytes (40 chars).
        let padded = format!("{}A", s.to_ascii_uppercase());
        let bytes = base32::decode(BASE32, &padded)
            .filter(|bytes| bytes.len() > Self::LEN)
            .ok_or_else(|| IdentifierError::Encoding {
                kind: "address",
                value: s.to_string(),
            })?;
        let mut raw = [0u8; Self::LEN];
        raw.copy_from_slice(&bytes[..Self::LEN]);
        Ok(Self(raw))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut padded = [0u8; Self::LEN + 1];
        padded[..Self::LEN].copy_from_slice(&self.0);
        let encoded = base32::encode(BASE32, &padded);
        f.write_str(&encoded[..Self::ENCODED_LEN])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '-').collect();
        match cleaned.len() {
            0 => Err(IdentifierError::Empty),
            Self::ENCODED_LEN => Self::from_base32(&cleaned),
            48 => Self::from_hex(&cleaned),
            n => Err(IdentifierError::Length {
                kind: "address",
                expected: "39 base32 or 48 hex characters",
                actual: n,
            }),
        }
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 32-byte transaction hash, kept as upper-case hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionHash(String);

impl TransactionHash {
    pub const HEX_LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionHash {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if s.len() != Self::HEX_LEN {
            return Err(IdentifierError::Length {
                kind: "transaction hash",
                expected: "64 hex digits",
                actual: s.len(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentifierError::Encoding {
                kind: "transaction hash",
                value: s.to_string(),
            });
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for TransactionHash {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionHash> for String {
    fn from(hash: TransactionHash) -> Self {
        hash.0
    }
}

/// Ledger network selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Main,
    Test,
}

impl NetworkType {
    /// Network identifier (also the first byte of every address)
    pub fn id(&self) -> u8 {
        match self {
            NetworkType::Main => 104,
            NetworkType::Test => 152,
        }
    }

    /// Public node used when no explicit URL is configured
    pub fn default_node_url(&self) -> &'static str {
        match self {
            NetworkType::Main => "https://ik1-432-48199.vs.sakura.ne.jp:3001",
            NetworkType::Test => "https://vmi831828.contaboserver.net:3001",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Main => write!(f, "main"),
            NetworkType::Test => write!(f, "test"),
        }
    }
}

impl FromStr for NetworkType {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "mainnet" | "104" => Ok(NetworkType::Main),
            "test" | "testnet" | "152" => Ok(NetworkType::Test),
            other => Err(IdentifierError::UnknownNetwork(other.to_string())),
        }
    }
}

// ============================================================================
// Transactions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum TransactionType {
    AggregateComplete,
    AggregateBonded,
    Transfer,
    Other(u16),
}

impl TransactionType {
    pub fn code(&self) -> u16 {
        match self {
            TransactionType::AggregateComplete => 0x4141,
            TransactionType::AggregateBonded => 0x4241,
            TransactionType::Transfer => 0x4154,
            TransactionType::Other(code) => *code,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            TransactionType::AggregateComplete | TransactionType::AggregateBonded
        )
    }
}

impl From<u16> for TransactionType {
    fn from(code: u16) -> Self {
        match code {
            0x4141 => TransactionType::AggregateComplete,
            0x4241 => TransactionType::AggregateBonded,
            0x4154 => TransactionType::Transfer,
            other => TransactionType::Other(other),
        }
    }
}

impl From<TransactionType> for u16 {
    fn from(kind: TransactionType) -> Self {
        kind.code()
    }
}

/// Which transaction pool to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionGroup {
    #[default]
    Confirmed,
    Unconfirmed,
    Partial,
}

impl TransactionGroup {
    pub fn as_path(&self) -> &'static str {
        match self {
            TransactionGroup::Confirmed => "confirmed",
            TransactionGroup::Unconfirmed => "unconfirmed",
            TransactionGroup::Partial => "partial",
        }
    }
}

/// One row of an aggregate search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub hash: TransactionHash,
    pub height: u64,
    pub timestamp: u64,
    pub kind: TransactionType,
}

/// Transaction embedded in an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerTransaction {
    pub kind: TransactionType,
    pub signer: Address,
    /// Only set for transfers
    pub recipient: Option<Address>,
    /// Plain-message payload without the message-type byte
    pub message: Vec<u8>,
}

impl InnerTransaction {
    /// Transfer sent by an account to itself
    pub fn is_self_transfer(&self) -> bool {
        self.kind == TransactionType::Transfer && self.recipient == Some(self.signer)
    }
}

/// Fully hydrated aggregate transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub hash: TransactionHash,
    pub height: u64,
    pub timestamp: u64,
    pub kind: TransactionType,
    pub inner: Vec<InnerTransaction>,
}

impl AggregateRecord {
    /// True when there is at least one inner transaction and every one of
    /// them is a self-to-self transfer
    pub fn is_self_transfer_only(&self) -> bool {
        !self.inner.is_empty() && self.inner.iter().all(InnerTransaction::is_self_transfer)
    }

    pub fn summary(&self) -> AggregateSummary {
        AggregateSummary {
            hash: self.hash.clone(),
            height: self.height,
            timestamp: self.timestamp,
            kind: self.kind,
        }
    }
}

// ============================================================================
// Assets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFlags {
    pub supply_mutable: bool,
    pub transferable: bool,
    pub restrictable: bool,
    pub revokable: bool,
}

impl AssetFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            supply_mutable: bits & 0x01 != 0,
            transferable: bits & 0x02 != 0,
            restrictable: bits & 0x04 != 0,
            revokable: bits & 0x08 != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        (self.supply_mutable as u8)
            | (self.transferable as u8) << 1
            | (self.restrictable as u8) << 2
            | (self.revokable as u8) << 3
    }
}

/// Current state of a mosaic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: AssetId,
    pub supply: u64,
    pub start_height: u64,
    pub owner: Address,
    pub flags: AssetFlags,
}

/// Namespace names linked to a mosaic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetNames {
    pub asset_id: AssetId,
    pub names: Vec<String>,
}

// ============================================================================
// Paging
// ============================================================================

/// Aggregate search criteria
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub address: Address,
    pub types: Vec<TransactionType>,
    pub group: TransactionGroup,
    pub page_size: u32,
    /// 1-based
    pub page_number: u32,
}

impl SearchCriteria {
    /// Confirmed complete and bonded aggregates involving `address`
    pub fn aggregates_for(address: Address, page_size: u32) -> Self {
        Self {
            address,
            types: vec![
                TransactionType::AggregateComplete,
                TransactionType::AggregateBonded,
            ],
            group: TransactionGroup::Confirmed,
            page_size,
            page_number: 1,
        }
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }
}

/// One page of search results
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub is_last_page: bool,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, page_number: u32, page_size: u32) -> Self {
        let is_last_page = data.is_empty() || (data.len() as u32) < page_size;
        Self {
            data,
            page_number,
            page_size,
            is_last_page,
        }
    }
}
