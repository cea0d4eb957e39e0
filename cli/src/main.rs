//! ebp-cli: read Eternal Book Protocol documents from a ledger
//!
//! Resolves the asset, reassembles every verified document stored for it
//! and prints the result as JSON. Ctrl-C cancels a read in progress.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ebp_cli::config::Config;
use ebp_cli::output;
use ebp_ledger::{HttpLedgerClient, NetworkType};
use ebp_reader::OnChainReader;

#[derive(Parser)]
#[command(name = "ebp-cli")]
#[command(about = "Read Eternal Book Protocol documents stored on a ledger")]
struct Cli {
    /// Asset (mosaic) id, 16 hex digits
    asset_id: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "ebp.toml", env = "EBP_CONFIG")]
    config: PathBuf,

    /// Network (overrides config file)
    #[arg(short, long, env = "EBP_NETWORK")]
    network: Option<NetworkType>,

    /// Gateway URL (overrides config file)
    #[arg(long, env = "EBP_NODE_URL")]
    node: Option<String>,

    /// Directory to write verified documents to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(long, env = "EBP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(network) = cli.network {
        config.network.kind = network;
    }
    if let Some(node) = cli.node {
        config.network.node_url = Some(node);
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    if cli.json_logs {
        config.log.json = true;
    }

    init_tracing(&config)?;

    let ledger_config = config.ledger_config();
    info!(
        network = %config.network.kind,
        node = %ledger_config.base_url,
        asset_id = %cli.asset_id,
        "Reading asset"
    );

    let client = Arc::new(HttpLedgerClient::new(ledger_config)?);
    let reader = OnChainReader::new(client, config.reader.clone());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let data = match reader.read_with_cancel(&cli.asset_id, cancel_rx).await {
        Ok(data) => data,
        Err(e) => {
            error!("Read failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let files = match &cli.output {
        Some(dir) => output::write_documents(dir, &data)?,
        None => Vec::new(),
    };

    println!("{}", output::render(&data, &files)?);

    let stats = &data.stats;
    info!(
        documents = data.documents.len(),
        records = stats.records_fetched,
        rejected = stats.records_rejected,
        integrity_failures = stats.integrity_failures,
        broken_chains = stats.broken_chains,
        duplicates = stats.duplicates_detected,
        "Read complete"
    );

    Ok(())
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let level = &config.log.level;
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "ebp_cli={level},ebp_reader={level},ebp_ledger={level}"
        ))
    })?;

    // Logs go to stderr so stdout stays clean JSON
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
