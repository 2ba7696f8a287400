//! stackscan - organization-wide GitHub technology inventory scanner
//!
//! This library walks an organization's repository list through GitHub's
//! GraphQL API one page at a time, extracts per-repository technology
//! signals (languages, frameworks, infrastructure-as-code, CI/CD,
//! documentation tooling) and aggregates them into a single JSON inventory
//! document persisted to S3 or to a local file.
//!
//! # Core Concepts
//!
//! - **Transport**: a narrow GraphQL execution capability
//!   ([`GithubTransport`]) with a production `reqwest` client and an
//!   in-memory mock, so the pipeline is testable without the network
//! - **Pager**: cursor-based pagination with bounded retry/backoff under an
//!   explicit [`RetryPolicy`]
//! - **Extractor**: a pure mapping from one raw repository node to
//!   normalized technology entries
//! - **Inventory**: incremental aggregation with de-duplication and
//!   deterministic ordering
//! - **Driver**: control flow from credential resolution through
//!   pagination to the final artifact write
//!
//! # Example Usage
//!
//! ```ignore
//! use stackscan::{run_scan, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::from_env()?;
//!     config.validate()?;
//!
//!     let outcome = run_scan(config).await?;
//!     println!(
//!         "inventoried {} repositories across {} pages",
//!         outcome.repositories, outcome.pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`github`]: GraphQL transport, typed query schema, cursor pager
//! - [`extract`]: repository node to technology entry mapping
//! - [`inventory`]: aggregation and the output document schema
//! - [`secrets`]/[`store`]: the credential and persistence collaborators
//! - [`pipeline`]: the driver owning the run's state machine

// Public modules
pub mod cli;
pub mod config;
pub mod extract;
pub mod github;
pub mod inventory;
pub mod pipeline;
pub mod retry;
pub mod secrets;
pub mod store;

// Re-export key types for convenient access
pub use config::{ConfigError, RunMode, ScanConfig};
pub use github::{ApiError, GithubTransport, GraphqlClient, MockTransport, RepoPager};
pub use inventory::{InventoryBuilder, InventoryDocument, TechnologyCategory, TechnologyEntry};
pub use pipeline::{run_scan, PipelineError, ScanDriver, ScanOutcome, Stage};
pub use retry::RetryPolicy;
pub use secrets::{GithubCredentials, MemorySecrets, SecretError, SecretProvider};
pub use store::{ArtifactStore, LocalStore, MemoryStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
