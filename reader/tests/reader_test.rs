//! End-to-end reads against an in-memory ledger

mod common;

use common::*;
use ebp_ledger::{LedgerError, MockLedgerClient};
use ebp_reader::{
    compute_sha512, ChainStrategy, HeaderEncoding, OnChainReader, ReaderConfig, ReaderError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};

fn reader(client: MockLedgerClient) -> (OnChainReader<MockLedgerClient>, Arc<MockLedgerClient>) {
    reader_with(client, ReaderConfig::default())
}

fn reader_with(
    client: MockLedgerClient,
    config: ReaderConfig,
) -> (OnChainReader<MockLedgerClient>, Arc<MockLedgerClient>) {
    let client = Arc::new(client);
    (OnChainReader::new(Arc::clone(&client), config), client)
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_two_record_document() {
    let builder = ChainBuilder::encrypted();
    let (reader, _) = reader(ledger(builder.chain("Genesis", 1, 100, &[b"foo", b"bar"])));

    let data = assert_ok!(reader.read(ASSET_HEX).await);

    assert_eq!(data.asset.asset_id, asset_id());
    assert_eq!(data.asset.owner, owner());
    assert_eq!(data.asset.alias.as_deref(), Some("library.genesis"));
    assert!(data.asset.transferable);

    assert_eq!(data.documents.len(), 1);
    let document = &data.documents[0];
    assert_eq!(document.data, b"foobar");
    assert!(document.valid);
    assert_eq!(document.title, "Genesis");
    assert_eq!(document.description, "Genesis description");
    assert_eq!(document.terminal_hash, tx_hash(2));
    assert_eq!(document.height, 101);
    assert_eq!(document.chunks, 2);
}

#[tokio::test]
async fn test_single_record_document() {
    let builder = ChainBuilder::encrypted();
    let (reader, _) = reader(ledger(builder.chain("Leaflet", 1, 100, &[b"only chunk"])));

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].data_as_str(), Some("only chunk"));
}

#[tokio::test]
async fn test_long_chain_across_pages() {
    let chunks: Vec<Vec<u8>> = (0..237).map(|i| format!("[{:03}]", i).into_bytes()).collect();
    let chunk_refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();

    let builder = ChainBuilder::encrypted();
    let (reader, client) = reader(ledger(builder.chain("Tome", 1, 1_000, &chunk_refs)));

    let data = reader.read(ASSET_HEX).await.unwrap();

    assert_eq!(client.search_calls(), 3);
    assert_eq!(client.get_transaction_calls(), 237);
    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].data, chunks.concat());
    assert_eq!(data.documents[0].chunks, 237);

    let stats = reader.stats();
    assert_eq!(stats.records_fetched, 237);
    assert_eq!(stats.records_validated, 237);
    assert_eq!(stats.documents_verified, 1);
}

#[tokio::test]
async fn test_documents_ordered_oldest_first() {
    let builder = ChainBuilder::encrypted();
    let newer = builder.chain("Newer", 10, 500, &[b"new-", b"book"]);
    let older = builder.chain("Older", 20, 100, &[b"old-", b"book"]);

    let (reader, _) = reader(ledger(newer.into_iter().chain(older)));
    let data = reader.read(ASSET_HEX).await.unwrap();

    let titles: Vec<&str> = data.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Older", "Newer"]);
    assert_eq!(data.documents[0].data, b"old-book");
    assert_eq!(data.documents[1].data, b"new-book");
}

#[tokio::test]
async fn test_plain_header_encoding() {
    let builder = ChainBuilder::new(HeaderEncoding::Plain);
    let config = ReaderConfig {
        header_encoding: HeaderEncoding::Plain,
        ..Default::default()
    };
    let (reader, _) = reader_with(ledger(builder.chain("Plain", 1, 100, &[b"foo", b"bar"])), config);

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].data, b"foobar");
}

#[tokio::test]
async fn test_encrypted_records_invisible_to_plain_reader() {
    let builder = ChainBuilder::encrypted();
    let config = ReaderConfig {
        header_encoding: HeaderEncoding::Plain,
        ..Default::default()
    };
    let (reader, _) = reader_with(ledger(builder.chain("Hidden", 1, 100, &[b"foo", b"bar"])), config);

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert!(data.documents.is_empty());
    assert_eq!(reader.stats().records_rejected, 2);
}

#[tokio::test]
async fn test_sequence_strategy() {
    let builder = ChainBuilder::encrypted();
    let config = ReaderConfig {
        chain_strategy: ChainStrategy::Sequence,
        ..Default::default()
    };
    let (reader, _) = reader_with(
        ledger(builder.sequence("Numbered", 1, 100, &[b"one ", b"two ", b"three"])),
        config,
    );

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].data, b"one two three");
}

// ============================================================================
// Rejected and incomplete data
// ============================================================================

#[tokio::test]
async fn test_hash_mismatch_yields_no_document() {
    let builder = ChainBuilder::encrypted();
    let origin = builder.header("Tampered", None, None);
    let terminal = builder.header("Tampered", Some(&tx_hash(1)), Some(compute_sha512(b"foobaz")));

    let (reader, _) = reader(ledger(vec![
        builder.record(1, 100, &origin, &[b"foo"]),
        builder.record(2, 101, &terminal, &[b"bar"]),
    ]));

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert!(data.documents.is_empty());
    assert_eq!(reader.stats().integrity_failures, 1);
}

#[tokio::test]
async fn test_missing_predecessor_yields_no_document() {
    let builder = ChainBuilder::encrypted();
    let mut records = builder.chain("Torn", 1, 100, &[b"foo", b"bar"]);
    records.remove(0);

    let (reader, _) = reader(ledger(records));

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert!(data.documents.is_empty());
    assert_eq!(reader.stats().broken_chains, 1);
}

#[tokio::test]
async fn test_validator_exclusions() {
    let builder = ChainBuilder::encrypted();
    let committed = Some(compute_sha512(b"intruder"));

    let mut foreign_asset = builder.header("Foreign asset", None, committed.clone());
    foreign_asset.mosaic_id = "0000000000000001".to_string();

    let mut foreign_owner = builder.header("Foreign owner", None, committed.clone());
    foreign_owner.address = stranger().to_string();

    let mut other_protocol = builder.header("Other protocol", None, committed.clone());
    other_protocol.version = "some-other-protocol/1.0".to_string();

    let mut not_self = builder.record(
        13,
        203,
        &builder.header("Not self", None, committed),
        &[b"intruder"],
    );
    not_self.inner[1].recipient = Some(stranger());

    let mut records = builder.chain("Genuine", 1, 100, &[b"foo", b"bar"]);
    records.push(builder.record(10, 200, &foreign_asset, &[b"intruder"]));
    records.push(builder.record(11, 201, &foreign_owner, &[b"intruder"]));
    records.push(builder.record(12, 202, &other_protocol, &[b"intruder"]));
    records.push(not_self);

    let (reader, _) = reader(ledger(records));
    let data = reader.read(ASSET_HEX).await.unwrap();

    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].title, "Genuine");

    let stats = reader.stats();
    assert_eq!(stats.records_fetched, 6);
    assert_eq!(stats.records_validated, 2);
    assert_eq!(stats.records_rejected, 4);
}

#[tokio::test]
async fn test_duplicate_link_uses_first_match() {
    let builder = ChainBuilder::encrypted();
    let mut records = builder.chain("Echo", 1, 100, &[b"foo", b"bar"]);
    records.push(records[0].clone());

    let (reader, _) = reader(ledger(records));
    let data = reader.read(ASSET_HEX).await.unwrap();

    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].data, b"foobar");
    assert_eq!(reader.stats().duplicates_detected, 1);
}

#[tokio::test]
async fn test_duplicate_terminal_yields_one_document() {
    let builder = ChainBuilder::encrypted();
    let mut records = builder.chain("Echo", 1, 100, &[b"foo", b"bar"]);
    records.push(records[1].clone());

    let (reader, _) = reader(ledger(records));
    let data = reader.read(ASSET_HEX).await.unwrap();

    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].data, b"foobar");
    assert_eq!(data.documents[0].terminal_hash, tx_hash(2));
    assert_eq!(data.stats.duplicates_detected, 1);
    assert_eq!(data.stats.documents_verified, 1);
}

#[tokio::test]
async fn test_no_records_is_empty_not_error() {
    let (reader, _) = reader(ledger(Vec::new()));

    let data = reader.read(ASSET_HEX).await.unwrap();
    assert!(data.documents.is_empty());
}

#[tokio::test]
async fn test_read_stats_cover_one_read() {
    let builder = ChainBuilder::encrypted();
    let (reader, _) = reader(ledger(builder.chain("Genesis", 1, 100, &[b"foo", b"bar"])));

    let first = reader.read(ASSET_HEX).await.unwrap();
    let second = reader.read(ASSET_HEX).await.unwrap();

    assert_eq!(first.stats, second.stats);
    assert_eq!(second.stats.reads_attempted, 1);
    assert_eq!(second.stats.records_fetched, 2);
    assert_eq!(second.stats.documents_verified, 1);

    let totals = reader.stats();
    assert_eq!(totals.reads_attempted, 2);
    assert_eq!(totals.records_fetched, 4);
    assert_eq!(totals.documents_verified, 2);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_empty_asset_id_makes_no_calls() {
    let (reader, client) = reader(ledger(Vec::new()));

    let result = reader.read("").await;
    assert!(matches!(result, Err(ReaderError::EmptyAssetId)));
    assert_eq!(client.get_asset_calls(), 0);
    assert_eq!(client.search_calls(), 0);
}

#[tokio::test]
async fn test_unknown_asset() {
    let (reader, client) = reader(MockLedgerClient::new());

    let result = reader.read(ASSET_HEX).await;
    assert!(matches!(result, Err(ReaderError::AssetNotFound(_))));
    assert_eq!(client.search_calls(), 0);
}

#[tokio::test]
async fn test_transport_failure_is_not_empty_result() {
    let builder = ChainBuilder::encrypted();
    let client = ledger(builder.chain("Genesis", 1, 100, &[b"foo", b"bar"]));
    client.set_fail_search(true);
    let (reader, _) = reader(client);

    let err = assert_err!(reader.read(ASSET_HEX).await);
    assert!(err.is_transport());
    assert!(matches!(
        err,
        ReaderError::Ledger(LedgerError::Server { status: 503, .. })
    ));
    assert_eq!(reader.stats().reads_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_exceeded() {
    let client = ledger(Vec::new()).with_latency(Duration::from_secs(5));
    let config = ReaderConfig {
        deadline_secs: 1,
        call_timeout_secs: 30,
        ..Default::default()
    };
    let (reader, _) = reader_with(client, config);

    let result = reader.read(ASSET_HEX).await;
    assert!(matches!(result, Err(ReaderError::DeadlineExceeded)));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation() {
    let client = ledger(Vec::new()).with_latency(Duration::from_secs(5));
    let (reader, client) = reader(client);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = cancel_tx.send(true);
    });

    let result = reader.read_with_cancel(ASSET_HEX, cancel_rx).await;
    assert!(matches!(result, Err(ReaderError::Cancelled)));
    assert_eq!(client.search_calls(), 0);

    let totals = reader.stats();
    assert_eq!(totals.reads_attempted, 1);
    assert_eq!(totals.reads_failed, 1);
}

#[tokio::test]
async fn test_already_cancelled_makes_no_calls() {
    let (reader, client) = reader(ledger(Vec::new()));
    let (_cancel_tx, cancel_rx) = watch::channel(true);

    let result = reader.read_with_cancel(ASSET_HEX, cancel_rx).await;
    assert!(matches!(result, Err(ReaderError::Cancelled)));
    assert_eq!(client.get_asset_calls(), 0);
}
