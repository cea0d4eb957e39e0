//! CLI configuration file

use anyhow::Context;
use ebp_ledger::{LedgerConfig, NetworkType};
use ebp_reader::ReaderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Which ledger to read from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network")]
    pub kind: NetworkType,

    /// Gateway URL; the network's public node when unset
    #[serde(default)]
    pub node_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            kind: default_network(),
            node_url: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_network() -> NetworkType { NetworkType::Main }
fn default_http_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String { "info".to_string() }

impl Config {
    /// Load from a TOML file; a missing file means defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            base_url: self
                .network
                .node_url
                .clone()
                .unwrap_or_else(|| self.network.kind.default_node_url().to_string()),
            timeout_secs: self.network.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.kind, NetworkType::Main);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.reader.page_size, 100);
        assert_eq!(
            config.ledger_config().base_url,
            NetworkType::Main.default_node_url()
        );
    }

    #[test]
    fn test_node_url_overrides_network_default() {
        let config: Config = toml::from_str(
            r#"
[network]
kind = "test"
node_url = "http://localhost:3000"
"#,
        )
        .unwrap();

        assert_eq!(config.network.kind, NetworkType::Test);
        assert_eq!(config.ledger_config().base_url, "http://localhost:3000");
        assert_eq!(config.ledger_config().timeout_secs, 30);
    }
}
