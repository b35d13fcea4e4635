//! Per-brand SKU extraction strategies.
//!
//! Each vendor lays out its manual covers differently, so each brand gets its
//! own heuristic. Brands not listed here are unsupported.

pub mod dimplex;
pub mod duravent;
pub mod empire;
pub mod labeled;
pub mod superior;

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::MODEL_LABEL_RE;
use super::{ManualDocument, ManualType, SkuRecord};
use crate::error::ExtractError;
use crate::pdf::TextBlockSource;

static MANUAL_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"install\w+|owner").unwrap());

/// Comma+space, newline or any whitespace run.
pub(crate) static LIST_DELIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s|\n|\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Brand {
    Dimplex,
    DuraVent,
    Empire,
    Majestic,
    ModernFlames,
    Monessen,
    Superior,
    Unsupported(String),
}

impl Brand {
    /// Map a corpus directory name to its strategy.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Dimplex" => Brand::Dimplex,
            "DuraVent" => Brand::DuraVent,
            "Empire" => Brand::Empire,
            "Majestic" => Brand::Majestic,
            "Modern Flames" => Brand::ModernFlames,
            "Monessen" => Brand::Monessen,
            "Superior" => Brand::Superior,
            other => Brand::Unsupported(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Brand::Dimplex => "Dimplex",
            Brand::DuraVent => "DuraVent",
            Brand::Empire => "Empire",
            Brand::Majestic => "Majestic",
            Brand::ModernFlames => "Modern Flames",
            Brand::Monessen => "Monessen",
            Brand::Superior => "Superior",
            Brand::Unsupported(name) => name,
        }
    }

    pub fn extract(
        &self,
        doc: &ManualDocument,
        source: &dyn TextBlockSource,
    ) -> Result<Vec<SkuRecord>, ExtractError> {
        match self {
            Brand::Dimplex => dimplex::extract(doc, source),
            Brand::DuraVent => Ok(duravent::extract(doc)),
            Brand::Empire => empire::extract(doc, source),
            Brand::Majestic => labeled::extract(doc, source, &labeled::majestic()),
            Brand::ModernFlames => labeled::extract(doc, source, &labeled::modern_flames()),
            Brand::Monessen => labeled::extract(doc, source, &labeled::monessen()),
            Brand::Superior => superior::extract(doc, source),
            Brand::Unsupported(_) => Err(ExtractError::UnsupportedBrand(self.name().to_string())),
        }
    }
}

/// Layout extraction sometimes puts a "Model:" label and its SKU list in
/// adjacent blocks, so a label carries the scan over to the next block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    AwaitingLabel,
    LabelSeenScanNext,
}

impl ScanState {
    pub fn scans(self, triggered: bool) -> bool {
        triggered || self == ScanState::LabelSeenScanNext
    }

    pub fn after_block(carry_over: bool) -> Self {
        if carry_over {
            ScanState::LabelSeenScanNext
        } else {
            ScanState::AwaitingLabel
        }
    }
}

/// Remembers the first manual type announced by a block containing `keyword`.
#[derive(Debug, Clone)]
pub struct ManualTypeDetector {
    keyword: &'static str,
    found: ManualType,
}

impl ManualTypeDetector {
    pub fn new(keyword: &'static str) -> Self {
        ManualTypeDetector {
            keyword,
            found: ManualType::Unknown,
        }
    }

    pub fn observe(&mut self, text: &str) {
        if self.found != ManualType::Unknown {
            return;
        }
        let lower = text.to_lowercase();
        if !lower.contains(self.keyword) {
            return;
        }
        if let Some(m) = MANUAL_TYPE_RE.find(&lower) {
            self.found = ManualType::from_word(m.as_str());
        }
    }

    pub fn current(&self) -> ManualType {
        self.found
    }
}

/// Text after the model label(s). A block without a label (reached through
/// the carry-over) is used whole. A block may carry the label twice; the
/// pieces between labels are concatenated.
pub(crate) fn models_after_label(text: &str, labeled: bool) -> String {
    let pieces = MODEL_LABEL_RE.split(text);
    if labeled {
        pieces.skip(1).collect()
    } else {
        pieces.collect()
    }
}
