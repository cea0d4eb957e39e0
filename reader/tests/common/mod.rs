//! Shared fixtures: protocol records built the way a writer would put them
//! on the ledger.

#![allow(dead_code)]

use ebp_ledger::{
    Address, AggregateRecord, AssetFlags, AssetId, AssetInfo, InnerTransaction, MockLedgerClient,
    TransactionHash, TransactionType,
};
use ebp_reader::{compute_sha512, DataHeader, HeaderCipher, HeaderEncoding, PROTOCOL_NAME};

pub const ASSET_HEX: &str = "3A8416DB2D53B6C8";

pub fn asset_id() -> AssetId {
    ASSET_HEX.parse().unwrap()
}

pub fn owner() -> Address {
    Address::from_bytes([0x68; Address::LEN])
}

pub fn stranger() -> Address {
    Address::from_bytes([0x98; Address::LEN])
}

pub fn asset_info() -> AssetInfo {
    AssetInfo {
        id: asset_id(),
        supply: 1,
        start_height: 10,
        owner: owner(),
        flags: AssetFlags::from_bits(0b0010),
    }
}

/// Deterministic transaction hash for fixture number `n`
pub fn tx_hash(n: u32) -> TransactionHash {
    format!("{:064X}", n).parse().unwrap()
}

/// Builds protocol records for one asset/owner pair
pub struct ChainBuilder {
    cipher: HeaderCipher,
    asset_hex: String,
    owner: Address,
}

impl ChainBuilder {
    pub fn new(encoding: HeaderEncoding) -> Self {
        Self {
            cipher: HeaderCipher::new(encoding),
            asset_hex: ASSET_HEX.to_string(),
            owner: owner(),
        }
    }

    pub fn encrypted() -> Self {
        Self::new(HeaderEncoding::Encrypted)
    }

    pub fn header(&self, title: &str, prev: Option<&TransactionHash>, hash: Option<String>) -> DataHeader {
        DataHeader {
            version: format!("{}/1.0", PROTOCOL_NAME),
            mosaic_id: self.asset_hex.clone(),
            address: self.owner.to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            prev_tx: prev.map(|h| h.as_str().to_string()),
            hash,
            seq: None,
        }
    }

    pub fn self_transfer(&self, message: Vec<u8>) -> InnerTransaction {
        InnerTransaction {
            kind: TransactionType::Transfer,
            signer: self.owner,
            recipient: Some(self.owner),
            message,
        }
    }

    /// One aggregate: encoded header followed by chunk transfers.
    pub fn record(&self, n: u32, height: u64, header: &DataHeader, chunks: &[&[u8]]) -> AggregateRecord {
        let payload = self.cipher.encode(&self.asset_hex, header).unwrap();

        let mut inner = vec![self.self_transfer(payload.into_bytes())];
        inner.extend(chunks.iter().map(|chunk| self.self_transfer(chunk.to_vec())));

        AggregateRecord {
            hash: tx_hash(n),
            height,
            timestamp: height * 15_000,
            kind: TransactionType::AggregateComplete,
            inner,
        }
    }

    /// A linked chain with one chunk per record. Record `i` gets hash
    /// `first + i` and height `height + i`; the last one is the terminal.
    pub fn chain(&self, title: &str, first: u32, height: u64, chunks: &[&[u8]]) -> Vec<AggregateRecord> {
        let document = chunks.concat();
        let mut records = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let n = first + i as u32;
            let prev = (i > 0).then(|| tx_hash(n - 1));
            let hash = (i == chunks.len() - 1).then(|| compute_sha512(&document));
            let header = self.header(title, prev.as_ref(), hash);
            records.push(self.record(n, height + i as u64, &header, &[chunk]));
        }

        records
    }

    /// Same as [`chain`](Self::chain) but linked by sequence numbers.
    pub fn sequence(&self, title: &str, first: u32, height: u64, chunks: &[&[u8]]) -> Vec<AggregateRecord> {
        let document = chunks.concat();

        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let hash = (i == chunks.len() - 1).then(|| compute_sha512(&document));
                let mut header = self.header(title, None, hash);
                header.seq = Some(i as u32);
                self.record(first + i as u32, height + i as u64, &header, &[chunk])
            })
            .collect()
    }
}

/// Mock ledger with the asset registered and `records` visible for the owner
pub fn ledger(records: impl IntoIterator<Item = AggregateRecord>) -> MockLedgerClient {
    MockLedgerClient::new()
        .with_asset(asset_info())
        .with_asset_names(asset_id(), vec!["library.genesis".to_string()])
        .with_records(owner(), records)
}
