//! Technology extraction from raw repository nodes
//!
//! Pure functions only: one [`RepoNode`] in, normalized technology entries
//! out. Missing data (no languages, no root tree, absent blobs) means fewer
//! entries, never an error - a half-populated repository must not abort the
//! run.

use crate::github::types::{RepoNode, TreeEntry};
use crate::inventory::{RepositoryInventory, TechnologyCategory, TechnologyEntry};
use tracing::debug;

/// Keyword lists scanned against README and dependency manifests.
const FRAMEWORK_KEYWORDS: &[&str] = &[
    "React",
    "Angular",
    "Vue",
    "Django",
    "Streamlit",
    "Flask",
    "Spring",
    "Hibernate",
    "Express",
    "Next.js",
    "Play",
    "Akka",
    "Lagom",
];

const DOCUMENTATION_KEYWORDS: &[&str] = &["Confluence", "MkDocs", "Sphinx", "ReadTheDocs"];

const CLOUD_KEYWORDS: &[&str] = &["AWS", "Azure", "GCP"];

/// Maps one raw repository node to its inventory record.
///
/// Returns `None` when the node has no name - there is nothing to key the
/// record on, so the caller skips it and moves on.
pub fn extract(node: &RepoNode) -> Option<RepositoryInventory> {
    let name = node.name.as_deref()?.to_string();

    let mut entries = Vec::new();
    collect_language_entries(node, &mut entries);
    collect_tree_entries(node, &mut entries);

    debug!(
        "Extracted {} technology entries from {}",
        entries.len(),
        name
    );

    Some(RepositoryInventory {
        name,
        url: node.url.clone(),
        visibility: node.visibility.clone(),
        archived: node.is_archived,
        last_commit: node.last_commit(),
        technologies: entries,
    })
}

/// Language edges become Language entries with byte counts and percentages;
/// IaC languages additionally emit their tool under InfrastructureAsCode.
fn collect_language_entries(node: &RepoNode, entries: &mut Vec<TechnologyEntry>) {
    let Some(languages) = node.languages.as_ref() else {
        return;
    };

    let total = languages.total_size;
    for edge in &languages.edges {
        let Some(lang) = edge.node.as_ref() else {
            continue;
        };
        let name = normalize(&lang.name);
        if name.is_empty() {
            continue;
        }

        match name.as_str() {
            "HCL" => entries.push(TechnologyEntry::keyword(
                "Terraform",
                TechnologyCategory::InfrastructureAsCode,
            )),
            "Dockerfile" => entries.push(TechnologyEntry::keyword(
                "Docker",
                TechnologyCategory::InfrastructureAsCode,
            )),
            _ => {}
        }

        let percentage = if total > 0 {
            Some((edge.size as f64 / total as f64) * 100.0)
        } else {
            None
        };

        entries.push(TechnologyEntry {
            name,
            category: TechnologyCategory::Language,
            bytes: Some(edge.size),
            percentage,
        });
    }
}

/// Scans the root tree: README for documentation/cloud keywords, dependency
/// manifests for framework keywords, and well-known CI directories.
fn collect_tree_entries(node: &RepoNode, entries: &mut Vec<TechnologyEntry>) {
    let Some(tree_entries) = node.object.as_ref().and_then(|o| o.entries.as_ref()) else {
        return;
    };

    let mut readme = None;
    let mut manifests: Vec<&str> = Vec::new();

    for entry in tree_entries {
        match entry.name.to_lowercase().as_str() {
            "readme.md" => readme = blob_text(entry),
            "pyproject.toml" | "package.json" => {
                if let Some(text) = blob_text(entry) {
                    manifests.push(text);
                }
            }
            _ => {}
        }

        if entry.name == ".github" && subtree_contains(entry, "workflows") {
            entries.push(TechnologyEntry::keyword(
                "GitHub Actions",
                TechnologyCategory::CiCd,
            ));
        }
        if entry.name == "ci" && subtree_entry_matches(entry, "pipeline.yml") {
            entries.push(TechnologyEntry::keyword(
                "Concourse",
                TechnologyCategory::CiCd,
            ));
        }
    }

    for manifest in manifests {
        for keyword in find_keywords(manifest, FRAMEWORK_KEYWORDS) {
            entries.push(TechnologyEntry::keyword(
                keyword,
                TechnologyCategory::Framework,
            ));
        }
    }

    if let Some(readme) = readme {
        for keyword in find_keywords(readme, DOCUMENTATION_KEYWORDS) {
            entries.push(TechnologyEntry::keyword(
                keyword,
                TechnologyCategory::Documentation,
            ));
        }
        for keyword in find_keywords(readme, CLOUD_KEYWORDS) {
            entries.push(TechnologyEntry::keyword(
                keyword,
                TechnologyCategory::CloudService,
            ));
        }
    }
}

fn blob_text(entry: &TreeEntry) -> Option<&str> {
    entry.object.as_ref().and_then(|o| o.text.as_deref())
}

fn subtree_contains(entry: &TreeEntry, name: &str) -> bool {
    entry
        .object
        .as_ref()
        .and_then(|o| o.entries.as_ref())
        .map(|entries| entries.iter().any(|e| e.name == name))
        .unwrap_or(false)
}

fn subtree_entry_matches(entry: &TreeEntry, needle: &str) -> bool {
    entry
        .object
        .as_ref()
        .and_then(|o| o.entries.as_ref())
        .map(|entries| entries.iter().any(|e| e.name.contains(needle)))
        .unwrap_or(false)
}

/// Case-insensitive substring search; each keyword is reported once.
fn find_keywords<'a>(text: &str, keywords: &[&'a str]) -> Vec<&'a str> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| haystack.contains(&k.to_lowercase()))
        .copied()
        .collect()
}

/// Trims and collapses inner whitespace so downstream de-duplication keys
/// are reliable.
pub fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::RepoNode;
    use serde_json::{from_value, json};

    fn node_from(value: serde_json::Value) -> RepoNode {
        from_value(value).unwrap()
    }

    #[test]
    fn nameless_node_is_skipped() {
        let node = node_from(json!({ "languages": null }));
        assert!(extract(&node).is_none());
    }

    #[test]
    fn repo_without_languages_yields_empty_entries() {
        let node = node_from(json!({ "name": "quiet-repo" }));
        let record = extract(&node).unwrap();
        assert_eq!(record.name, "quiet-repo");
        assert!(record.technologies.is_empty());
    }

    #[test]
    fn languages_carry_bytes_and_percentage() {
        let node = node_from(json!({
            "name": "api",
            "languages": {
                "edges": [
                    { "size": 75, "node": { "name": "Python" } },
                    { "size": 25, "node": { "name": "Go" } }
                ],
                "totalSize": 100
            }
        }));

        let record = extract(&node).unwrap();
        assert_eq!(record.technologies.len(), 2);

        let python = &record.technologies[0];
        assert_eq!(python.name, "Python");
        assert_eq!(python.category, TechnologyCategory::Language);
        assert_eq!(python.bytes, Some(75));
        assert_eq!(python.percentage, Some(75.0));
    }

    #[test]
    fn iac_languages_emit_their_tool() {
        let node = node_from(json!({
            "name": "infra",
            "languages": {
                "edges": [
                    { "size": 90, "node": { "name": "HCL" } },
                    { "size": 10, "node": { "name": "Dockerfile" } }
                ],
                "totalSize": 100
            }
        }));

        let record = extract(&node).unwrap();
        let iac: Vec<&str> = record
            .technologies
            .iter()
            .filter(|t| t.category == TechnologyCategory::InfrastructureAsCode)
            .map(|t| t.name.as_str())
            .collect();

        assert_eq!(iac, vec!["Terraform", "Docker"]);
        // The raw languages are still reported alongside the tools.
        assert!(record
            .technologies
            .iter()
            .any(|t| t.name == "HCL" && t.category == TechnologyCategory::Language));
    }

    #[test]
    fn manifests_are_scanned_for_frameworks() {
        let node = node_from(json!({
            "name": "webapp",
            "object": {
                "entries": [
                    { "name": "package.json", "type": "blob",
                      "object": { "text": "{\"dependencies\": {\"react\": \"^18\", \"express\": \"^4\"}}" } },
                    { "name": "pyproject.toml", "type": "blob",
                      "object": { "text": "[tool.poetry.dependencies]\ndjango = \"^5.0\"" } }
                ]
            }
        }));

        let record = extract(&node).unwrap();
        let frameworks: Vec<&str> = record
            .technologies
            .iter()
            .filter(|t| t.category == TechnologyCategory::Framework)
            .map(|t| t.name.as_str())
            .collect();

        assert!(frameworks.contains(&"React"));
        assert!(frameworks.contains(&"Express"));
        assert!(frameworks.contains(&"Django"));
    }

    #[test]
    fn readme_is_scanned_for_docs_and_cloud() {
        let node = node_from(json!({
            "name": "docs-heavy",
            "object": {
                "entries": [
                    { "name": "README.md", "type": "blob",
                      "object": { "text": "Docs on Confluence and ReadTheDocs, deployed to AWS and GCP." } }
                ]
            }
        }));

        let record = extract(&node).unwrap();
        let docs: Vec<&str> = record
            .technologies
            .iter()
            .filter(|t| t.category == TechnologyCategory::Documentation)
            .map(|t| t.name.as_str())
            .collect();
        let cloud: Vec<&str> = record
            .technologies
            .iter()
            .filter(|t| t.category == TechnologyCategory::CloudService)
            .map(|t| t.name.as_str())
            .collect();

        assert_eq!(docs, vec!["Confluence", "ReadTheDocs"]);
        assert_eq!(cloud, vec!["AWS", "GCP"]);
    }

    #[test]
    fn ci_directories_are_recognized() {
        let node = node_from(json!({
            "name": "pipelines",
            "object": {
                "entries": [
                    { "name": ".github", "type": "tree",
                      "object": { "entries": [ { "name": "workflows" } ] } },
                    { "name": "ci", "type": "tree",
                      "object": { "entries": [ { "name": "deploy-pipeline.yml" } ] } }
                ]
            }
        }));

        let record = extract(&node).unwrap();
        let ci: Vec<&str> = record
            .technologies
            .iter()
            .filter(|t| t.category == TechnologyCategory::CiCd)
            .map(|t| t.name.as_str())
            .collect();

        assert_eq!(ci, vec!["GitHub Actions", "Concourse"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let value = json!({
            "name": "repeatable",
            "languages": {
                "edges": [ { "size": 10, "node": { "name": "Rust" } } ],
                "totalSize": 10
            },
            "object": {
                "entries": [
                    { "name": "README.md", "type": "blob",
                      "object": { "text": "Runs on AWS" } }
                ]
            }
        });

        let a = extract(&node_from(value.clone())).unwrap();
        let b = extract(&node_from(value)).unwrap();
        assert_eq!(a.technologies.len(), b.technologies.len());
        for (x, y) in a.technologies.iter().zip(&b.technologies) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.category, y.category);
        }
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Jupyter   Notebook "), "Jupyter Notebook");
        assert_eq!(normalize("Python"), "Python");
        assert_eq!(normalize("   "), "");
    }
}
