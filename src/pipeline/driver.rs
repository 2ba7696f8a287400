//! Pipeline driver
//!
//! Owns the whole run: resolve credentials, walk pagination to exhaustion,
//! aggregate, write the artifact. All run state (cursor, accumulator, retry
//! counters) lives inside one `run` call and dies with it - nothing is
//! shared across invocations.
//!
//! Stages: `Init -> Authenticated -> Fetching -> Writing -> Done`, with any
//! fatal error short-circuiting the run. No partial inventory is ever
//! written on a failure path: the single store write happens only after
//! pagination has finished cleanly.

use crate::config::ScanConfig;
use crate::github::error::ApiError;
use crate::github::pager::RepoPager;
use crate::github::transport::GithubTransport;
use crate::inventory::InventoryBuilder;
use crate::retry::RetryPolicy;
use crate::secrets::{resolve_credentials, GithubCredentials, SecretError, SecretProvider};
use crate::store::{ArtifactStore, StoreError};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info};

/// Builds a transport once credentials are resolved.
///
/// Injected so tests can hand the driver a mock transport without going
/// through credential resolution themselves.
pub type TransportFactory =
    Box<dyn Fn(&GithubCredentials) -> Arc<dyn GithubTransport> + Send + Sync>;

/// Stages of one run, used for logging and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Authenticated,
    Fetching,
    Writing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Authenticated => "authenticated",
            Stage::Fetching => "fetching",
            Stage::Writing => "writing",
            Stage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Fatal pipeline failures, each carrying enough context to diagnose
/// without a rerun.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Credential resolution failed: {0}")]
    Auth(#[from] SecretError),

    #[error("Upstream query failed (cursor: {cursor:?}): {source}")]
    Api {
        cursor: Option<String>,
        source: ApiError,
    },

    #[error("Failed to persist inventory to {destination}: {source}")]
    Persist {
        destination: String,
        source: StoreError,
    },

    #[error("Failed to serialize inventory: {message}")]
    Serialize { message: String },
}

impl PipelineError {
    /// The stage the run failed in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Auth(_) => Stage::Init,
            PipelineError::Api { .. } => Stage::Fetching,
            PipelineError::Persist { .. } | PipelineError::Serialize { .. } => Stage::Writing,
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub repositories: usize,
    pub pages: u32,
    pub destination: String,
}

/// Drives one scan invocation end to end.
pub struct ScanDriver {
    config: ScanConfig,
    secrets: Arc<dyn SecretProvider>,
    store: Arc<dyn ArtifactStore>,
    transport_factory: TransportFactory,
    retry: RetryPolicy,
}

impl ScanDriver {
    /// The retry policy is derived from the configured attempt cap; tests
    /// swap in a zero-delay policy via [`with_retry_policy`].
    ///
    /// [`with_retry_policy`]: ScanDriver::with_retry_policy
    pub fn new(
        config: ScanConfig,
        secrets: Arc<dyn SecretProvider>,
        store: Arc<dyn ArtifactStore>,
        transport_factory: TransportFactory,
    ) -> Self {
        let retry = RetryPolicy::with_max_attempts(config.max_retries);
        Self {
            config,
            secrets,
            store,
            transport_factory,
            retry,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self) -> Result<ScanOutcome, PipelineError> {
        let start = Instant::now();
        info!(
            stage = %Stage::Init,
            "Starting scan | org: {} | batch: {}",
            self.config.organization, self.config.batch_size
        );

        let credentials = resolve_credentials(
            self.secrets.as_ref(),
            &self.config.client_id,
            &self.config.secret_name,
        )
        .await?;

        let transport = (self.transport_factory)(&credentials);
        info!(
            stage = %Stage::Authenticated,
            "Credentials resolved | transport: {}",
            transport.name()
        );

        let deadline = self
            .config
            .deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut pager = RepoPager::new(
            transport,
            self.config.organization.clone(),
            self.config.batch_size,
            self.retry,
            deadline,
        )
        .map_err(|source| PipelineError::Api {
            cursor: None,
            source,
        })?;

        info!(stage = %Stage::Fetching, "Fetching repositories");
        let mut builder =
            InventoryBuilder::new(self.config.organization.clone(), self.config.batch_size);

        loop {
            match pager.next_page().await {
                Ok(Some(nodes)) => builder.push_page(&nodes),
                Ok(None) => break,
                Err(source) => {
                    error!(
                        stage = %Stage::Fetching,
                        "Aborting run at cursor {:?}: {}",
                        pager.cursor(),
                        source
                    );
                    return Err(PipelineError::Api {
                        cursor: pager.cursor().map(str::to_owned),
                        source,
                    });
                }
            }
        }

        info!(
            stage = %Stage::Writing,
            "Fetched {} repositories across {} pages",
            builder.repositories_seen(),
            pager.pages_fetched()
        );

        let document = builder.finish(Utc::now());
        let body = document
            .to_json_pretty()
            .map_err(|e| PipelineError::Serialize {
                message: e.to_string(),
            })?;

        self.store
            .put(body)
            .await
            .map_err(|source| PipelineError::Persist {
                destination: self.store.describe(),
                source,
            })?;

        let outcome = ScanOutcome {
            repositories: document.repositories.len(),
            pages: pager.pages_fetched(),
            destination: self.store.describe(),
        };

        info!(
            stage = %Stage::Done,
            "Scan complete in {:.2}s | {} repositories -> {}",
            start.elapsed().as_secs_f64(),
            outcome.repositories,
            outcome.destination
        );

        Ok(outcome)
    }
}
