//! Reader configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::header::HeaderEncoding;
use crate::reconstructor::ChainStrategy;

/// Configuration for [`OnChainReader`](crate::OnChainReader)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Search page size
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Timeout for each individual ledger call, in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Deadline for a whole read, in seconds
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,

    /// Maximum transactions hydrated (and chains walked) at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,

    /// How header payloads are encoded on the ledger
    #[serde(default)]
    pub header_encoding: HeaderEncoding,

    /// How chunk records link to each other
    #[serde(default)]
    pub chain_strategy: ChainStrategy,
}

fn default_page_size() -> u32 { 100 }
fn default_call_timeout() -> u64 { 30 }
fn default_deadline() -> u64 { 300 }
fn default_max_concurrent() -> usize { 4 }

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            call_timeout_secs: default_call_timeout(),
            deadline_secs: default_deadline(),
            max_concurrent_fetches: default_max_concurrent(),
            header_encoding: HeaderEncoding::default(),
            chain_strategy: ChainStrategy::default(),
        }
    }
}

impl ReaderConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            page_size: env_parse("EBP_PAGE_SIZE").unwrap_or(defaults.page_size),
            call_timeout_secs: env_parse("EBP_CALL_TIMEOUT_SECS")
                .unwrap_or(defaults.call_timeout_secs),
            deadline_secs: env_parse("EBP_DEADLINE_SECS").unwrap_or(defaults.deadline_secs),
            max_concurrent_fetches: env_parse("EBP_MAX_CONCURRENT_FETCHES")
                .unwrap_or(defaults.max_concurrent_fetches),
            header_encoding: env_parse("EBP_HEADER_ENCODING").unwrap_or(defaults.header_encoding),
            chain_strategy: env_parse("EBP_CHAIN_STRATEGY").unwrap_or(defaults.chain_strategy),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Concurrency limit, never zero
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
