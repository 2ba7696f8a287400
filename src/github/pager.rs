//! Cursor-based pagination over the organization repository list
//!
//! One [`RepoPager`] walks one organization's repositories front to back,
//! one page per upstream request. Transient failures are retried under the
//! injected [`RetryPolicy`]; fatal ones abort immediately. The pager is
//! restartable only from the beginning - cursors are never persisted.

use crate::github::error::ApiError;
use crate::github::transport::GithubTransport;
use crate::github::types::{parse_repositories_page, RepoNode, REPOSITORIES_QUERY};
use crate::retry::{RetryPolicy, XorShift64};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Upstream limit for the `first` argument of a connection query.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Lazily yields pages of repository nodes until the upstream cursor ends.
pub struct RepoPager {
    transport: Arc<dyn GithubTransport>,
    organization: String,
    batch_size: u32,
    retry: RetryPolicy,
    deadline: Option<Instant>,
    cursor: Option<String>,
    finished: bool,
    pages_fetched: u32,
    repos_fetched: usize,
    rng: XorShift64,
}

impl RepoPager {
    /// Creates a pager for one run.
    ///
    /// `batch_size` outside `1..=MAX_PAGE_SIZE` is rejected here with
    /// `ApiError::InvalidBatchSize` - an unbounded request is never sent.
    pub fn new(
        transport: Arc<dyn GithubTransport>,
        organization: impl Into<String>,
        batch_size: u32,
        retry: RetryPolicy,
        deadline: Option<Instant>,
    ) -> Result<Self, ApiError> {
        if batch_size == 0 || batch_size > MAX_PAGE_SIZE {
            return Err(ApiError::InvalidBatchSize {
                given: batch_size,
                max: MAX_PAGE_SIZE,
            });
        }

        Ok(Self {
            transport,
            organization: organization.into(),
            batch_size,
            retry,
            deadline,
            cursor: None,
            finished: false,
            pages_fetched: 0,
            repos_fetched: 0,
            rng: XorShift64::from_entropy(),
        })
    }

    /// Current cursor position, for error context mid-pagination.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn repos_fetched(&self) -> usize {
        self.repos_fetched
    }

    /// Fetches the next page, or `Ok(None)` once the sequence is exhausted.
    ///
    /// Each call makes at most `retry.max_attempts` upstream requests; a
    /// well-behaved upstream is asked exactly once per page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RepoNode>>, ApiError> {
        if self.finished {
            return Ok(None);
        }

        let payload = self.fetch_with_retry().await?;
        let page = parse_repositories_page(&payload)?;

        if page.page_info.has_next_page {
            match &page.page_info.end_cursor {
                Some(next) if Some(next.as_str()) != self.cursor.as_deref() => {
                    self.cursor = Some(next.clone());
                }
                Some(_) => {
                    // A repeated cursor with more pages claimed would loop forever.
                    return Err(ApiError::InvalidResponse {
                        message: "upstream returned a non-advancing cursor".to_string(),
                    });
                }
                None => {
                    return Err(ApiError::InvalidResponse {
                        message: "hasNextPage is true but endCursor is missing".to_string(),
                    });
                }
            }
        } else {
            self.finished = true;
            self.cursor = page.page_info.end_cursor.clone();
        }

        self.pages_fetched += 1;
        self.repos_fetched += page.nodes.len();
        info!(
            "Fetched page {} ({} repositories, {} total)",
            self.pages_fetched,
            page.nodes.len(),
            self.repos_fetched
        );

        Ok(Some(page.nodes))
    }

    async fn fetch_with_retry(&mut self) -> Result<serde_json::Value, ApiError> {
        let variables = json!({
            "org": self.organization,
            "limit": self.batch_size,
            "cursor": self.cursor,
        });

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    warn!("Run deadline reached before attempt {}", attempt);
                    return Err(ApiError::DeadlineExceeded);
                }
            }

            debug!(
                "Requesting page | batch: {} | cursor: {:?} | attempt: {}",
                self.batch_size, self.cursor, attempt
            );

            let error = match self
                .transport
                .execute(REPOSITORIES_QUERY, variables.clone())
                .await
            {
                Ok(payload) => return Ok(payload),
                Err(e) => e,
            };

            if !error.is_transient() {
                return Err(error);
            }

            if attempt >= self.retry.max_attempts {
                warn!(
                    "Giving up after {} attempts (last error: {})",
                    attempt, error
                );
                return Err(ApiError::UpstreamUnavailable {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            let delay = self
                .retry
                .delay_for(attempt, error.retry_hint(), &mut self.rng);

            if let Some(deadline) = self.deadline {
                if Instant::now() + delay >= deadline {
                    warn!(
                        "Next retry wait of {:?} would cross the run deadline",
                        delay
                    );
                    return Err(ApiError::DeadlineExceeded);
                }
            }

            warn!(
                "Transient upstream error ({}), retrying in {:?} (attempt {} of {})",
                error, delay, attempt, self.retry.max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }
}
