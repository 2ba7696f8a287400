pub mod driver;

pub use driver::{PipelineError, ScanDriver, ScanOutcome, Stage, TransportFactory};

use crate::config::{RunMode, ScanConfig};
use crate::github::{GithubTransport, GraphqlClient};
use crate::secrets::SecretsManagerProvider;
use crate::store::{ArtifactStore, LocalStore, S3Store};
use std::sync::Arc;
use std::time::Duration;

/// Runs one scan with the production collaborators.
///
/// This is the single entry both the CLI and a serverless wrapper call:
/// credentials from Secrets Manager, queries against the public GitHub
/// GraphQL endpoint, and the artifact written to S3 or a local file
/// depending on the configured run mode. The configuration is expected to
/// be validated already.
pub async fn run_scan(config: ScanConfig) -> Result<ScanOutcome, PipelineError> {
    let secrets = Arc::new(SecretsManagerProvider::from_env().await);

    let store: Arc<dyn ArtifactStore> = match config.run_mode {
        RunMode::Production => Arc::new(
            S3Store::from_env(
                config.bucket.clone().unwrap_or_default(),
                config.key.clone().unwrap_or_default(),
            )
            .await,
        ),
        RunMode::Development => Arc::new(LocalStore::new(config.output_path.clone())),
    };

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let transport_factory: TransportFactory = Box::new(move |credentials| {
        Arc::new(GraphqlClient::with_timeout(
            credentials.token.clone(),
            timeout,
        )) as Arc<dyn GithubTransport>
    });

    ScanDriver::new(config, secrets, store, transport_factory)
        .run()
        .await
}
