pub mod error;
pub mod mock;
pub mod pager;
pub mod transport;
pub mod types;

pub use error::ApiError;
pub use mock::MockTransport;
pub use pager::{RepoPager, MAX_PAGE_SIZE};
pub use transport::{GithubTransport, GraphqlClient};
pub use types::{RepoNode, RepositoriesPage, REPOSITORIES_QUERY};
