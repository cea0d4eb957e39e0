//! Filters hydrated aggregates down to protocol records for one asset/owner.

use ebp_ledger::{Address, AggregateRecord, AssetId, TransactionHash};
use std::fmt;
use tracing::debug;

use crate::header::{DataHeader, HeaderCipher};

/// An aggregate paired with its decoded, matching header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub record: AggregateRecord,
    pub header: DataHeader,
}

impl ValidatedRecord {
    pub fn hash(&self) -> &TransactionHash {
        &self.record.hash
    }

    pub fn height(&self) -> u64 {
        self.record.height
    }

    /// Chunk payloads: every inner message except the header
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.record.inner.iter().skip(1).map(|tx| tx.message.as_slice())
    }

    pub fn chunk_len(&self) -> usize {
        self.chunks().map(<[u8]>::len).sum()
    }
}

/// Why an aggregate was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No inner transactions
    Empty,
    /// Some inner transaction is not a self-to-self transfer
    ForeignTransaction,
    /// First payload did not decode as a header
    NotHeader,
    ProtocolMismatch,
    AssetMismatch,
    OwnerMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Empty => "no inner transactions",
            Rejection::ForeignTransaction => "not self-transfer only",
            Rejection::NotHeader => "not a protocol header",
            Rejection::ProtocolMismatch => "protocol mismatch",
            Rejection::AssetMismatch => "asset mismatch",
            Rejection::OwnerMismatch => "owner mismatch",
        };
        f.write_str(reason)
    }
}

/// Checks aggregates against the asset and owner being read
#[derive(Debug, Clone)]
pub struct ChainValidator {
    asset_id: String,
    owner: String,
    cipher: HeaderCipher,
}

impl ChainValidator {
    pub fn new(asset_id: AssetId, owner: &Address, cipher: HeaderCipher) -> Self {
        Self {
            asset_id: asset_id.to_hex(),
            owner: owner.to_string(),
            cipher,
        }
    }

    /// Validate one aggregate.
    pub fn validate(&self, record: AggregateRecord) -> Result<ValidatedRecord, Rejection> {
        let first = record.inner.first().ok_or(Rejection::Empty)?;
        if !record.is_self_transfer_only() {
            return Err(Rejection::ForeignTransaction);
        }

        let header = self
            .cipher
            .decode(&self.asset_id, &first.message)
            .into_header()
            .ok_or(Rejection::NotHeader)?;

        if !header.matches_protocol() {
            return Err(Rejection::ProtocolMismatch);
        }
        if header.mosaic_id != self.asset_id {
            return Err(Rejection::AssetMismatch);
        }
        if header.address != self.owner {
            return Err(Rejection::OwnerMismatch);
        }

        Ok(ValidatedRecord { record, header })
    }

    /// Keep the records that validate, preserving order.
    pub fn filter(&self, records: Vec<AggregateRecord>) -> Vec<ValidatedRecord> {
        records
            .into_iter()
            .filter_map(|record| {
                let hash = record.hash.clone();
                match self.validate(record) {
                    Ok(validated) => Some(validated),
                    Err(reason) => {
                        debug!(hash = %hash, reason = %reason, "Skipping aggregate");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderEncoding, PROTOCOL_NAME};
    use ebp_ledger::{InnerTransaction, TransactionType};

    fn asset() -> AssetId {
        AssetId::new(0x3A84_16DB_2D53_B6C8)
    }

    fn owner() -> Address {
        Address::from_bytes([0x68; Address::LEN])
    }

    fn header() -> DataHeader {
        DataHeader {
            version: format!("{}/1.0", PROTOCOL_NAME),
            mosaic_id: asset().to_hex(),
            address: owner().to_string(),
            title: "t".into(),
            description: "d".into(),
            prev_tx: None,
            hash: None,
            seq: None,
        }
    }

    fn transfer(message: &[u8]) -> InnerTransaction {
        InnerTransaction {
            kind: TransactionType::Transfer,
            signer: owner(),
            recipient: Some(owner()),
            message: message.to_vec(),
        }
    }

    fn record_with(header: &DataHeader) -> AggregateRecord {
        let payload = HeaderCipher::default()
            .encode(&asset().to_hex(), header)
            .unwrap();
        AggregateRecord {
            hash: "11".repeat(32).parse().unwrap(),
            height: 10,
            timestamp: 0,
            kind: TransactionType::AggregateComplete,
            inner: vec![transfer(payload.as_bytes()), transfer(b"chunk")],
        }
    }

    fn validator() -> ChainValidator {
        ChainValidator::new(asset(), &owner(), HeaderCipher::default())
    }

    #[test]
    fn test_accepts_matching_record() {
        let validated = validator().validate(record_with(&header())).unwrap();
        assert_eq!(validated.header, header());
        assert_eq!(validated.chunks().collect::<Vec<_>>(), vec![b"chunk".as_slice()]);
        assert_eq!(validated.chunk_len(), 5);
    }

    #[test]
    fn test_rejects_empty_record() {
        let mut record = record_with(&header());
        record.inner.clear();
        assert_eq!(validator().validate(record), Err(Rejection::Empty));
    }

    #[test]
    fn test_rejects_transfer_to_other_account() {
        let mut record = record_with(&header());
        record.inner[1].recipient = Some(Address::from_bytes([0x98; Address::LEN]));
        assert_eq!(validator().validate(record), Err(Rejection::ForeignTransaction));
    }

    #[test]
    fn test_rejects_non_transfer() {
        let mut record = record_with(&header());
        record.inner[1].kind = TransactionType::Other(0x414D);
        assert_eq!(validator().validate(record), Err(Rejection::ForeignTransaction));
    }

    #[test]
    fn test_rejects_undecodable_header() {
        let mut record = record_with(&header());
        record.inner[0].message = b"just a note".to_vec();
        assert_eq!(validator().validate(record), Err(Rejection::NotHeader));
    }

    #[test]
    fn test_rejects_wrong_protocol() {
        let mut h = header();
        h.version = "nft-drive/1.0".into();
        assert_eq!(
            validator().validate(record_with(&h)),
            Err(Rejection::ProtocolMismatch)
        );
    }

    #[test]
    fn test_rejects_wrong_asset() {
        let mut h = header();
        h.mosaic_id = "0000000000000001".into();
        assert_eq!(
            validator().validate(record_with(&h)),
            Err(Rejection::AssetMismatch)
        );
    }

    #[test]
    fn test_rejects_wrong_owner() {
        let mut h = header();
        h.address = Address::from_bytes([0x98; Address::LEN]).to_string();
        assert_eq!(
            validator().validate(record_with(&h)),
            Err(Rejection::OwnerMismatch)
        );
    }

    #[test]
    fn test_plain_encoding_validator() {
        let plain = HeaderCipher::new(HeaderEncoding::Plain);
        let mut record = record_with(&header());
        record.inner[0].message = plain
            .encode(&asset().to_hex(), &header())
            .unwrap()
            .into_bytes();

        let validator = ChainValidator::new(asset(), &owner(), plain);
        assert!(validator.validate(record.clone()).is_ok());
        assert_eq!(
            ChainValidator::new(asset(), &owner(), HeaderCipher::default()).validate(record),
            Err(Rejection::NotHeader)
        );
    }

    #[test]
    fn test_filter_keeps_order() {
        let mut second = record_with(&header());
        second.hash = "22".repeat(32).parse().unwrap();
        let mut foreign = record_with(&header());
        foreign.inner.clear();

        let kept = validator().filter(vec![record_with(&header()), foreign, second]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].hash().as_str(), "22".repeat(32));
    }
}
