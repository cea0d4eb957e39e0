//! Record fetching
//!
//! Pages through every confirmed complete/bonded aggregate for an owner,
//! then hydrates each one into its full body. Paging is sequential (each
//! page depends on the previous one reporting more data); hydration runs
//! with bounded concurrency and keeps search order. Any failed call fails
//! the whole fetch - later stages never see a partial record set.

use ebp_ledger::{
    Address, AggregateRecord, AggregateSummary, LedgerClient, SearchCriteria, TransactionGroup,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};

/// Fetches candidate aggregates for an owner
pub struct RecordFetcher<'a, C: ?Sized> {
    client: &'a C,
    page_size: u32,
    call_timeout: Duration,
    concurrency: usize,
}

impl<'a, C: LedgerClient + ?Sized> RecordFetcher<'a, C> {
    pub fn new(client: &'a C, config: &ReaderConfig) -> Self {
        Self {
            client,
            page_size: config.page_size.max(1),
            call_timeout: config.call_timeout(),
            concurrency: config.concurrency(),
        }
    }

    /// Every aggregate summary for `owner`, across all pages.
    pub async fn search_all(&self, owner: &Address) -> Result<Vec<AggregateSummary>> {
        let mut summaries = Vec::new();
        let mut page_number = 1;

        loop {
            let criteria = SearchCriteria::aggregates_for(*owner, self.page_size).with_page(page_number);
            let page = with_timeout(
                self.call_timeout,
                "search_aggregates",
                self.client.search_aggregates(&criteria),
            )
            .await?;

            debug!(
                owner = %owner,
                page = page_number,
                records = page.data.len(),
                last = page.is_last_page,
                "Fetched aggregate page"
            );

            let done = page.is_last_page || page.data.is_empty();
            summaries.extend(page.data);
            if done {
                break;
            }
            page_number += 1;
        }

        Ok(summaries)
    }

    /// Fetch the full body of each summary, in the same order.
    pub async fn hydrate(&self, summaries: &[AggregateSummary]) -> Result<Vec<AggregateRecord>> {
        stream::iter(summaries)
            .map(|summary| {
                with_timeout(
                    self.call_timeout,
                    "get_transaction",
                    self.client
                        .get_transaction(&summary.hash, TransactionGroup::Confirmed),
                )
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Search then hydrate.
    pub async fn fetch(&self, owner: &Address) -> Result<Vec<AggregateRecord>> {
        let summaries = self.search_all(owner).await?;
        let records = self.hydrate(&summaries).await?;

        debug!(owner = %owner, records = records.len(), "Hydrated aggregates");
        Ok(records)
    }
}

/// Run one ledger call under a timeout.
pub(crate) async fn with_timeout<T, F>(
    timeout: Duration,
    operation: &'static str,
    call: F,
) -> Result<T>
where
    F: Future<Output = ebp_ledger::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(ReaderError::from),
        Err(_) => Err(ReaderError::CallTimeout { operation }),
    }
}
