//! Inventory aggregation and the output document schema
//!
//! The builder consumes one page of repository nodes at a time, so peak
//! memory is one page plus the running total. `finish` seals the document:
//! repositories sorted by name, statistics in `BTreeMap`s, so two runs over
//! identical upstream data serialize byte-identically apart from the
//! generation timestamp.

use crate::extract;
use crate::github::types::RepoNode;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Classification for a technology entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnologyCategory {
    Language,
    Framework,
    InfrastructureAsCode,
    CiCd,
    Documentation,
    CloudService,
}

impl fmt::Display for TechnologyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TechnologyCategory::Language => "language",
            TechnologyCategory::Framework => "framework",
            TechnologyCategory::InfrastructureAsCode => "infrastructure_as_code",
            TechnologyCategory::CiCd => "ci_cd",
            TechnologyCategory::Documentation => "documentation",
            TechnologyCategory::CloudService => "cloud_service",
        };
        write!(f, "{}", name)
    }
}

/// One normalized technology signal for a repository.
#[derive(Debug, Clone, Serialize)]
pub struct TechnologyEntry {
    pub name: String,
    pub category: TechnologyCategory,
    /// Byte count for language entries; keyword hits carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl TechnologyEntry {
    /// Entry derived from a keyword match rather than a byte count.
    pub fn keyword(name: impl Into<String>, category: TechnologyCategory) -> Self {
        Self {
            name: name.into(),
            category,
            bytes: None,
            percentage: None,
        }
    }
}

/// One repository and its de-duplicated technology entries.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInventory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<DateTime<Utc>>,
    pub technologies: Vec<TechnologyEntry>,
}

/// Repository counts for one archive group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStats {
    pub total: usize,
    pub private: usize,
    pub public: usize,
    pub internal: usize,
    pub active_last_month: usize,
    pub active_last_3months: usize,
    pub active_last_6months: usize,
}

/// Aggregated language usage across one archive group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanguageStats {
    pub repo_count: usize,
    pub average_percentage: f64,
    pub total_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub unarchived: RepoStats,
    pub archived: RepoStats,
    pub languages_unarchived: BTreeMap<String, LanguageStats>,
    pub languages_archived: BTreeMap<String, LanguageStats>,
}

/// The final artifact written at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryDocument {
    pub organization: String,
    pub generated_at: DateTime<Utc>,
    pub batch_size: u32,
    pub repositories: Vec<RepositoryInventory>,
    pub summary: InventorySummary,
}

impl InventoryDocument {
    /// Pretty-printed UTF-8 JSON with stable key order.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// Incremental aggregator fed one page at a time.
#[derive(Debug)]
pub struct InventoryBuilder {
    organization: String,
    batch_size: u32,
    repositories: Vec<RepositoryInventory>,
    skipped: usize,
}

impl InventoryBuilder {
    pub fn new(organization: impl Into<String>, batch_size: u32) -> Self {
        Self {
            organization: organization.into(),
            batch_size,
            repositories: Vec::new(),
            skipped: 0,
        }
    }

    pub fn repositories_seen(&self) -> usize {
        self.repositories.len()
    }

    /// Extracts and accumulates one page of nodes.
    ///
    /// Nodes the extractor cannot key (no name) are counted and skipped;
    /// they never fail the page.
    pub fn push_page(&mut self, nodes: &[RepoNode]) {
        for node in nodes {
            match extract::extract(node) {
                Some(mut record) => {
                    record.technologies = merge_entries(record.technologies);
                    self.repositories.push(record);
                }
                None => {
                    self.skipped += 1;
                    warn!("Skipping repository node without a name");
                }
            }
        }
        debug!(
            "Aggregated page of {} nodes ({} repositories total, {} skipped)",
            nodes.len(),
            self.repositories.len(),
            self.skipped
        );
    }

    /// Seals the document. `now` feeds both the generation timestamp and
    /// the activity windows, so tests can pin it.
    pub fn finish(mut self, now: DateTime<Utc>) -> InventoryDocument {
        // Upstream ordering is not contractual; sort by name so reruns diff
        // cleanly.
        self.repositories.sort_by(|a, b| a.name.cmp(&b.name));

        let summary = summarize(&self.repositories, now);

        InventoryDocument {
            organization: self.organization,
            generated_at: now,
            batch_size: self.batch_size,
            repositories: self.repositories,
            summary,
        }
    }
}

/// De-duplicates entries by (category, lowercased name).
///
/// The entry with the larger byte count wins; ties keep the first-seen
/// entry, and the winner stays at the first-seen position.
pub fn merge_entries(entries: Vec<TechnologyEntry>) -> Vec<TechnologyEntry> {
    let mut merged: Vec<TechnologyEntry> = Vec::with_capacity(entries.len());
    let mut index: HashMap<(TechnologyCategory, String), usize> = HashMap::new();

    for entry in entries {
        let key = (entry.category, entry.name.to_lowercase());
        match index.get(&key) {
            Some(&i) => {
                if entry.bytes.unwrap_or(0) > merged[i].bytes.unwrap_or(0) {
                    merged[i] = entry;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}

fn summarize(repositories: &[RepositoryInventory], now: DateTime<Utc>) -> InventorySummary {
    let mut unarchived = RepoStats::default();
    let mut archived = RepoStats::default();
    let mut languages_unarchived: BTreeMap<String, LanguageStats> = BTreeMap::new();
    let mut languages_archived: BTreeMap<String, LanguageStats> = BTreeMap::new();

    // Accumulate percentage sums separately; averages are finalized below.
    let mut pct_unarchived: BTreeMap<String, f64> = BTreeMap::new();
    let mut pct_archived: BTreeMap<String, f64> = BTreeMap::new();

    for repo in repositories {
        let (stats, languages, percentages) = if repo.archived {
            (&mut archived, &mut languages_archived, &mut pct_archived)
        } else {
            (
                &mut unarchived,
                &mut languages_unarchived,
                &mut pct_unarchived,
            )
        };

        stats.total += 1;
        match repo.visibility.as_deref() {
            Some("PRIVATE") => stats.private += 1,
            Some("PUBLIC") => stats.public += 1,
            Some("INTERNAL") => stats.internal += 1,
            _ => {}
        }

        if let Some(last_commit) = repo.last_commit {
            let age = now.signed_duration_since(last_commit);
            if age <= Duration::days(30) {
                stats.active_last_month += 1;
            }
            if age <= Duration::days(90) {
                stats.active_last_3months += 1;
            }
            if age <= Duration::days(180) {
                stats.active_last_6months += 1;
            }
        }

        for tech in &repo.technologies {
            if tech.category != TechnologyCategory::Language {
                continue;
            }
            let entry = languages.entry(tech.name.clone()).or_default();
            entry.repo_count += 1;
            entry.total_size += tech.bytes.unwrap_or(0);
            *percentages.entry(tech.name.clone()).or_default() += tech.percentage.unwrap_or(0.0);
        }
    }

    finalize_averages(&mut languages_unarchived, &pct_unarchived);
    finalize_averages(&mut languages_archived, &pct_archived);

    InventorySummary {
        unarchived,
        archived,
        languages_unarchived,
        languages_archived,
    }
}

fn finalize_averages(languages: &mut BTreeMap<String, LanguageStats>, sums: &BTreeMap<String, f64>) {
    for (name, stats) in languages.iter_mut() {
        if stats.repo_count > 0 {
            let average = sums.get(name).copied().unwrap_or(0.0) / stats.repo_count as f64;
            stats.average_percentage = (average * 1000.0).round() / 1000.0;
        }
    }
}
