//! Resolve a product row to the best manual in the catalog.

pub mod ratio;

use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::parser::SkuRecord;
use ratio::{full_process, ratio};

/// Products that never get a manual, whatever the catalog holds.
pub const IGNORED_SKUS: &[&str] = &[
    "SDLOGS-ODCOUG",
    "HDLOGS-ODCOUG",
    "LOGS-DRTWOOD-48",
    "LOGS-DRTWOOD-60",
    "LOGS-DRTWOOD-72",
    "DRTWOOD-JADE",
    "STFSO18",
];

const IGNORED_CATEGORY: &str = "media kits";

/// One row of the products table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    #[serde(rename = "manufacturerSKU", default)]
    pub manufacturer_sku: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "c__series", default)]
    pub series: String,
    #[serde(rename = "c__productCategory", default)]
    pub category: String,
    /// Desired file name of the copied manual.
    #[serde(rename = "installationManualFileName(.pdf)", default)]
    pub manual_file_name: String,
}

impl MatchQuery {
    fn is_ignored(&self) -> bool {
        IGNORED_SKUS.contains(&self.manufacturer_sku.as_str())
            || self.category.to_lowercase() == IGNORED_CATEGORY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Minimum best similarity (0..=100) for any candidate to count.
    pub threshold: u8,
    /// How many top-scoring records are considered.
    pub limit: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy {
            threshold: 65,
            limit: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    NoBrandManuals,
    NoCloseMatch,
}

impl NotFoundReason {
    pub fn comment(&self) -> &'static str {
        match self {
            NotFoundReason::NoBrandManuals => "Empty brand or no manuals for this brand.",
            NotFoundReason::NoCloseMatch => "Not found any matched installation manual.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchCandidate<'a> {
    pub record: &'a SkuRecord,
    /// Fuzzy similarity against the query, 0..=100.
    pub similarity: u8,
    /// Common prefix length with the query SKU; set only when ranking.
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    Ignored,
    NotFound(NotFoundReason),
    /// Ranked best first; never empty.
    Found(Vec<MatchCandidate<'a>>),
}

impl<'a> MatchOutcome<'a> {
    pub fn best(&self) -> Option<&'a SkuRecord> {
        match self {
            MatchOutcome::Found(candidates) => candidates.first().map(|c| c.record),
            _ => None,
        }
    }

    /// Absolute path of the chosen manual under the corpus root.
    pub fn manual_path(&self, manuals_root: &Path) -> Option<PathBuf> {
        self.best().map(|r| manuals_root.join(&r.pdf_location))
    }
}

pub fn find_match<'a>(query: &MatchQuery, catalog: &'a Catalog, policy: &MatchPolicy) -> MatchOutcome<'a> {
    if query.is_ignored() {
        return MatchOutcome::Ignored;
    }

    let records = match catalog.brand(&query.brand) {
        Some(records) if !query.brand.is_empty() => records,
        _ => return MatchOutcome::NotFound(NotFoundReason::NoBrandManuals),
    };

    let mut candidates = find_fuzzy(query, records, policy);
    if candidates.is_empty() {
        return MatchOutcome::NotFound(NotFoundReason::NoCloseMatch);
    }
    if candidates.len() > 1 {
        candidates.sort_by_key(|c| c.record.manual_type);
        candidates = rank_closest_sku(&query.manufacturer_sku, candidates);
    }
    MatchOutcome::Found(candidates)
}

/// Best-scoring records of one brand. SKUs are compared when the brand has
/// any; otherwise the series. Returns every record tied for the best score,
/// or nothing when the best is under the threshold.
pub fn find_fuzzy<'a>(query: &MatchQuery, records: &'a [SkuRecord], policy: &MatchPolicy) -> Vec<MatchCandidate<'a>> {
    if query.manufacturer_sku.is_empty() && query.series.is_empty() {
        return Vec::new();
    }

    let by_sku = records.iter().any(|r| !r.sku.is_empty());
    let field = |r: &'a SkuRecord| -> &'a str { if by_sku { &r.sku } else { &r.series } };
    let needle = full_process(if by_sku { &query.manufacturer_sku } else { &query.series });

    let mut scored: Vec<MatchCandidate<'a>> = records
        .iter()
        .filter(|r| !field(*r).is_empty())
        .map(|r| MatchCandidate {
            record: r,
            similarity: ratio(&needle, &full_process(field(r))),
            score: 0,
        })
        .collect();
    // stable: equal scores keep catalog order
    scored.sort_by(|a, b| b.similarity.cmp(&a.similarity));
    scored.truncate(policy.limit);

    let top = scored.first().map_or(0, |c| c.similarity);
    if top < policy.threshold {
        return Vec::new();
    }
    scored.retain(|c| c.similarity >= top);
    scored
}

/// Order candidates by how many leading characters their SKU shares with
/// `anchor`, longest first. When every candidate shares the same amount,
/// fall back to alphabetical SKU order.
pub fn rank_closest_sku<'a>(anchor: &str, mut candidates: Vec<MatchCandidate<'a>>) -> Vec<MatchCandidate<'a>> {
    for c in &mut candidates {
        c.score = common_prefix_len(&c.record.sku, anchor);
    }

    if candidates.iter().map(|c| c.score).all_equal() {
        candidates.sort_by(|a, b| a.record.sku.cmp(&b.record.sku));
    } else {
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
    }
    candidates
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
