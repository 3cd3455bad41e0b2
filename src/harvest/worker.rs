//! Fetch worker
//!
//! Turns one locator into zero or one detail record. Every failure is
//! contained here: it is logged with the locator's URL and reported as an
//! outcome, never propagated to the batch.

use crate::harvest::extractor::extract_record;
use crate::harvest::fetcher::{FetchError, PageSource};
use crate::harvest::limiter::RateLimiter;
use crate::model::{DetailRecord, Locator};
use crate::state::ItemOutcome;
use crate::url::{host_key, parse_locator_url};
use std::sync::Arc;
use std::time::Duration;

/// Result of processing one locator
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    /// The extracted record, if any
    pub record: Option<DetailRecord>,

    /// How the attempt ended
    pub outcome: ItemOutcome,

    /// Number of dispatches made for this locator
    pub dispatches: u32,
}

impl FetchAttempt {
    fn without_record(outcome: ItemOutcome, dispatches: u32) -> Self {
        Self {
            record: None,
            outcome,
            dispatches,
        }
    }
}

/// Combines the rate limiter, page source and extractor
pub struct FetchWorker {
    source: Arc<dyn PageSource>,
    limiter: Arc<RateLimiter>,
    fetch_timeout: Duration,
    max_retries: u32,
}

impl FetchWorker {
    /// Creates a worker that skips a locator on its first failure
    pub fn new(
        source: Arc<dyn PageSource>,
        limiter: Arc<RateLimiter>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            limiter,
            fetch_timeout,
            max_retries: 0,
        }
    }

    /// Allows up to `max_retries` extra dispatches after a transport failure
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches and extracts the record for `locator`
    ///
    /// The flow per dispatch is: wait on the host's rate-limit gate, retrieve
    /// the page under the fetch timeout, run the extractor and stamp the
    /// locator's URL onto the record.
    pub async fn fetch(&self, locator: &Locator) -> FetchAttempt {
        let host = match parse_locator_url(&locator.url)
            .ok()
            .as_ref()
            .and_then(host_key)
        {
            Some(host) => host,
            None => {
                tracing::warn!(url = %locator.url, "Skipping locator with invalid URL");
                return FetchAttempt::without_record(ItemOutcome::InvalidUrl, 0);
            }
        };

        let mut dispatches = 0;
        loop {
            self.limiter.acquire(&host).await;
            dispatches += 1;
            tracing::debug!(url = %locator.url, host = %host, dispatches, "Dispatching fetch");

            let error = match self.retrieve(&locator.url).await {
                Ok(body) => return self.extract(locator, &body, dispatches),
                Err(e) => e,
            };

            if error.outcome().is_transport_failure() && dispatches <= self.max_retries {
                tracing::debug!(url = %locator.url, "Retrying after error: {}", error);
                continue;
            }

            tracing::warn!(url = %locator.url, outcome = %error.outcome(), "Fetch failed: {}", error);
            return FetchAttempt::without_record(error.outcome(), dispatches);
        }
    }

    /// Retrieves a page, bounding the source call by the fetch timeout
    async fn retrieve(&self, url: &str) -> Result<String, FetchError> {
        match tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch_page(url, self.fetch_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    fn extract(&self, locator: &Locator, body: &str, dispatches: u32) -> FetchAttempt {
        match extract_record(body, &locator.url) {
            Some(mut record) => {
                record.url = locator.url.clone();
                FetchAttempt {
                    record: Some(record),
                    outcome: ItemOutcome::Extracted,
                    dispatches,
                }
            }
            None => {
                tracing::warn!(url = %locator.url, "No product metadata found");
                FetchAttempt::without_record(ItemOutcome::NoStructuredData, dispatches)
            }
        }
    }
}
