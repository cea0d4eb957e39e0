//! Protocol header codec
//!
//! The first inner transaction of every chunk record carries a small JSON
//! header. In the encrypted encoding the JSON is AES-256-CBC ciphertext,
//! hex encoded, keyed with a fixed protocol key and using the 16-character
//! asset id string as IV. That IV is public, so this is an integrity and
//! recognition scheme rather than confidentiality; it is kept as-is for
//! compatibility with existing records.
//!
//! Anything that fails to decode is simply "not a header". Unrelated
//! transfers are told apart from protocol payloads this way, so a decode
//! failure carries no detail.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix every header `version` must start with
pub const PROTOCOL_NAME: &str = "eternal-book-protocol";

/// Fixed AES-256 key for the on-chain data storage kind
const CIPHER_KEY: &[u8; 32] = b"EternalBookProtocol-OnChainData.";

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Decoded protocol header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataHeader {
    /// Protocol marker, e.g. `eternal-book-protocol/1.0`
    pub version: String,
    /// Asset id (16 upper-case hex digits)
    pub mosaic_id: String,
    /// Owner address (base32 form)
    pub address: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Hash of the record holding the previous chunk; null at the origin
    #[serde(default)]
    pub prev_tx: Option<String>,
    /// SHA-512 of the whole document; only on terminal records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Position of the record within its document (sequence strategy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u32>,
}

impl DataHeader {
    /// Terminal records commit to the hash of the full document
    pub fn is_terminal(&self) -> bool {
        self.hash.is_some()
    }

    pub fn is_origin(&self) -> bool {
        self.prev_tx.is_none()
    }

    pub fn matches_protocol(&self) -> bool {
        self.version.starts_with(PROTOCOL_NAME)
    }
}

/// How header payloads are written on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderEncoding {
    /// Hex-encoded AES-256-CBC ciphertext
    #[default]
    Encrypted,
    /// Bare JSON object
    Plain,
}

impl fmt::Display for HeaderEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderEncoding::Encrypted => write!(f, "encrypted"),
            HeaderEncoding::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for HeaderEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "encrypted" => Ok(HeaderEncoding::Encrypted),
            "plain" => Ok(HeaderEncoding::Plain),
            other => Err(format!("unknown header encoding: {}", other)),
        }
    }
}

/// Outcome of decoding a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDecode {
    Header(DataHeader),
    NotHeader,
}

impl HeaderDecode {
    pub fn into_header(self) -> Option<DataHeader> {
        match self {
            HeaderDecode::Header(header) => Some(header),
            HeaderDecode::NotHeader => None,
        }
    }
}

/// Failure to produce a header payload
#[derive(Debug, Error)]
pub enum HeaderEncodeError {
    #[error("asset id is not a valid IV: expected 16 bytes, got {0}")]
    InvalidIv(usize),

    #[error("header serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes and decodes header payloads for one encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderCipher {
    encoding: HeaderEncoding,
}

impl HeaderCipher {
    pub fn new(encoding: HeaderEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> HeaderEncoding {
        self.encoding
    }

    /// Decode the payload of a first inner transaction.
    pub fn decode(&self, asset_id: &str, payload: &[u8]) -> HeaderDecode {
        let plaintext = match self.encoding {
            HeaderEncoding::Encrypted => decrypt(asset_id, payload),
            HeaderEncoding::Plain => plain_json(payload).map(<[u8]>::to_vec),
        };

        plaintext
            .and_then(|bytes| serde_json::from_slice::<DataHeader>(&bytes).ok())
            .map_or(HeaderDecode::NotHeader, HeaderDecode::Header)
    }

    /// Produce the payload text for a header.
    pub fn encode(&self, asset_id: &str, header: &DataHeader) -> Result<String, HeaderEncodeError> {
        match self.encoding {
            HeaderEncoding::Plain => Ok(serde_json::to_string(header)?),
            HeaderEncoding::Encrypted => {
                let iv = asset_id.as_bytes();
                let cipher = Aes256CbcEnc::new_from_slices(CIPHER_KEY, iv)
                    .map_err(|_| HeaderEncodeError::InvalidIv(iv.len()))?;
                let json = serde_json::to_vec(header)?;
                Ok(hex::encode(cipher.encrypt_padded_vec_mut::<Pkcs7>(&json)))
            }
        }
    }
}

fn decrypt(asset_id: &str, payload: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(payload).ok()?;
    let ciphertext = hex::decode(text).ok()?;
    let cipher = Aes256CbcDec::new_from_slices(CIPHER_KEY, asset_id.as_bytes()).ok()?;
    cipher.decrypt_padded_vec_mut::<Pkcs7>(&ciphertext).ok()
}

fn plain_json(payload: &[u8]) -> Option<&[u8]> {
    (payload.first() == Some(&b'{') && payload.last() == Some(&b'}')).then_some(payload)
}
