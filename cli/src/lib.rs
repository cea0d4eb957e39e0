//! Support code for the `ebp-cli` binary

pub mod config;
pub mod output;

pub use config::{Config, LogConfig, NetworkConfig};
