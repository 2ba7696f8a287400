//! Typed schema for the repositories query
//!
//! Every field on [`RepoNode`] and below is optional or defaulted: a
//! repository with a missing branch ref, empty language list, or absent root
//! tree deserializes to a sparse record instead of failing the page.

use crate::github::error::ApiError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Cursor-paged repositories query.
///
/// One request per page: repository metadata, languages ordered by size,
/// and the root tree with the handful of blobs the extractor scans.
pub const REPOSITORIES_QUERY: &str = r#"
query($org: String!, $limit: Int!, $cursor: String) {
  organization(login: $org) {
    repositories(first: $limit, after: $cursor) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        name
        url
        visibility
        isArchived
        defaultBranchRef {
          name
          target {
            ... on Commit {
              committedDate
            }
          }
        }
        languages(first: 10, orderBy: {field: SIZE, direction: DESC}) {
          edges {
            size
            node {
              name
            }
          }
          totalSize
        }
        object(expression: "HEAD:") {
          ... on Tree {
            entries {
              name
              type
              object {
                ... on Blob {
                  text
                }
                ... on Tree {
                  entries {
                    name
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// One page of the repositories connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoriesPage {
    #[serde(default)]
    pub nodes: Vec<RepoNode>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// Raw repository node as returned by the upstream API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub default_branch_ref: Option<BranchRef>,
    #[serde(default)]
    pub languages: Option<Languages>,
    #[serde(default)]
    pub object: Option<TreeObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target: Option<CommitTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitTarget {
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Languages {
    #[serde(default)]
    pub edges: Vec<LanguageEdge>,
    #[serde(default)]
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEdge {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub node: Option<LanguageNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageNode {
    #[serde(default)]
    pub name: String,
}

/// Root tree of the default branch (`object(expression: "HEAD:")`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeObject {
    #[serde(default)]
    pub entries: Option<Vec<TreeEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub object: Option<EntryObject>,
}

/// Either a blob (carries text) or a nested tree (carries entry names).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryObject {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<SubEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubEntry {
    #[serde(default)]
    pub name: String,
}

impl RepoNode {
    /// Timestamp of the most recent commit on the default branch.
    pub fn last_commit(&self) -> Option<DateTime<Utc>> {
        self.default_branch_ref
            .as_ref()
            .and_then(|r| r.target.as_ref())
            .and_then(|t| t.committed_date)
    }
}

/// Extracts the repositories connection from a raw GraphQL response.
///
/// A null `organization` means the slug does not resolve for these
/// credentials; anything else missing is a malformed response.
pub fn parse_repositories_page(payload: &Value) -> Result<RepositoriesPage, ApiError> {
    let organization = payload
        .get("data")
        .and_then(|d| d.get("organization"))
        .ok_or_else(|| ApiError::InvalidResponse {
            message: "response has no data.organization".to_string(),
        })?;

    if organization.is_null() {
        return Err(ApiError::QueryFailed {
            message: "organization not found or not visible to these credentials".to_string(),
        });
    }

    let repositories = organization
        .get("repositories")
        .ok_or_else(|| ApiError::InvalidResponse {
            message: "response has no organization.repositories".to_string(),
        })?;

    serde_json::from_value(repositories.clone()).map_err(|e| ApiError::InvalidResponse {
        message: format!("unexpected repositories shape: {}", e),
    })
}
