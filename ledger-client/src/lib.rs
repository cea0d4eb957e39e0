//! Ledger client for the Eternal Book Protocol reader
//!
//! Exposes the small read-only slice of a Symbol node the reader needs:
//! - Paged aggregate-transaction search by address
//! - Transaction lookup by hash with inner transactions hydrated
//! - Mosaic (asset) lookup and linked namespace names
//!
//! # Example
//!
//! ```rust,no_run
//! use ebp_ledger::{HttpLedgerClient, LedgerClient, NetworkType, SearchCriteria};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpLedgerClient::for_network(NetworkType::Main)?;
//!
//! let asset = client.get_asset("3A8416DB2D53B6C8".parse()?).await?;
//! let page = client
//!     .search_aggregates(&SearchCriteria::aggregates_for(asset.owner, 100))
//!     .await?;
//! println!("{} aggregates on the first page", page.data.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

// Re-export main types
pub use client::LedgerClient;
pub use error::{IdentifierError, LedgerError, Result};
pub use http::{HttpLedgerClient, LedgerConfig};
pub use mock::MockLedgerClient;
pub use types::*;
