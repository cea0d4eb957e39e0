//! Eternal Book Protocol reader
//!
//! Reassembles documents stored on a ledger as chains of self-transfer
//! aggregates. Each aggregate's first inner message is a protocol header;
//! the rest carry raw chunk bytes. Records link backwards from a terminal
//! (which commits to the SHA-512 of the whole document) to an origin.
//!
//! ## Pipeline
//!
//! - [`AssetInspector`] - resolve asset metadata and owner
//! - [`RecordFetcher`] - page and hydrate the owner's aggregates
//! - [`ChainValidator`] - keep records whose header matches asset and owner
//! - [`ChainReconstructor`] - walk each terminal back to its origin
//! - [`IntegrityVerifier`] - accept only documents whose hash matches
//!
//! [`OnChainReader`] runs the whole pipeline under a deadline.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod header;
pub mod inspector;
pub mod reconstructor;
pub mod service;
pub mod stats;
pub mod validator;
pub mod verifier;

pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use fetcher::RecordFetcher;
pub use header::{DataHeader, HeaderCipher, HeaderDecode, HeaderEncoding, PROTOCOL_NAME};
pub use inspector::{parse_asset_id, AssetInspector, AssetSummary};
pub use reconstructor::{ChainReconstructor, ChainStrategy, ChainWalk, WalkStatus};
pub use service::{OnChainData, OnChainReader};
pub use stats::ReaderStatsSnapshot;
pub use validator::{ChainValidator, Rejection, ValidatedRecord};
pub use verifier::{compute_sha512, IntegrityVerifier, ReconstructedDocument, Verification};
