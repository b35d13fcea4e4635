//! Brands whose cover carries a "Model(s):" label followed by a loose list,
//! plus a title announcing the manual type.

use std::sync::LazyLock;

use regex::Regex;

use super::{models_after_label, ManualTypeDetector, ScanState, LIST_DELIMS};
use crate::error::ExtractError;
use crate::parser::normalize::{first_word, looks_like_sku, split_tokens};
use crate::parser::{ManualDocument, SkuRecord};
use crate::pdf::{Pages, TextBlockSource};

static BULLET_DELIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s|\n|\s+|•|—").unwrap());
static AMPERSAND_DELIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s|\n|\s+|&").unwrap());

pub struct LabelRules<'a> {
    /// Blocks containing this word announce the manual type.
    pub type_keyword: &'static str,
    /// Any of these starts a model block.
    pub triggers: &'static [&'static str],
    pub delimiters: &'a Regex,
    pub exceptions: &'static [&'static str],
}

pub fn majestic() -> LabelRules<'static> {
    LabelRules {
        type_keyword: "manual",
        triggers: &["model"],
        delimiters: &LIST_DELIMS,
        exceptions: &["warmmajic-ii"],
    }
}

pub fn modern_flames() -> LabelRules<'static> {
    LabelRules {
        type_keyword: "manual",
        triggers: &["model", "series"],
        delimiters: &BULLET_DELIMS,
        exceptions: &[],
    }
}

pub fn monessen() -> LabelRules<'static> {
    LabelRules {
        type_keyword: "manual",
        triggers: &["model"],
        delimiters: &AMPERSAND_DELIMS,
        exceptions: &["gcuf", "gruf"],
    }
}

pub fn extract(
    doc: &ManualDocument,
    source: &dyn TextBlockSource,
    rules: &LabelRules<'_>,
) -> Result<Vec<SkuRecord>, ExtractError> {
    let mut records = Vec::new();
    let mut manual_type = ManualTypeDetector::new(rules.type_keyword);
    let mut state = ScanState::default();

    for block in source.blocks(&doc.path, Pages::First)? {
        manual_type.observe(&block.text);

        let lower = block.text.to_lowercase();
        let triggered = rules.triggers.iter().any(|t| lower.contains(t));
        if !state.scans(triggered) {
            continue;
        }

        let labeled = lower.contains("model");
        let models = models_after_label(&block.text, labeled);
        records.extend(
            split_tokens(models.trim(), rules.delimiters)
                .into_iter()
                .filter(|t| looks_like_sku(t, rules.exceptions))
                .map(|t| doc.record(first_word(t), "", manual_type.current())),
        );

        state = ScanState::after_block(labeled);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::ManualType;
    use crate::pdf::testing::FixedSource;

    fn doc(brand: &str, name: &str) -> ManualDocument {
        ManualDocument::new(Path::new("/m"), &Path::new("/m").join(brand).join(name)).unwrap()
    }

    fn skus(records: &[SkuRecord]) -> Vec<&str> {
        records.iter().map(|r| r.sku.as_str()).collect()
    }

    #[test]
    fn majestic_list_with_manual_type() {
        let d = doc("Majestic", "MERID36,42 - MERIDIAN - INSTALLATION.pdf");
        let source = FixedSource::page_one(&[
            "INSTALLATION MANUAL",
            "Models: MERID36IN, MERID42IN\nMERID36IL",
        ]);
        let records = extract(&d, &source, &majestic()).unwrap();
        assert_eq!(skus(&records), vec!["MERID36IN", "MERID42IN", "MERID36IL"]);
        assert!(records.iter().all(|r| r.manual_type == ManualType::Installation));
    }

    #[test]
    fn majestic_list_in_next_block() {
        let d = doc("Majestic", "VDY18,24,30 - DUZY.pdf");
        let source = FixedSource::page_one(&[
            "Owner's Manual",
            "Model:",
            "VDY18NMP VDY24NMP\nVDY30NMP",
            "VDY99NMP",
        ]);
        let records = extract(&d, &source, &majestic()).unwrap();
        assert_eq!(skus(&records), vec!["VDY18NMP", "VDY24NMP", "VDY30NMP"]);
        assert!(records.iter().all(|r| r.manual_type == ManualType::Owner));
    }

    #[test]
    fn majestic_exception_and_noise() {
        let d = doc("Majestic", "WarmMajic-II - Installation Manual - Woodburning Fireplace.pdf");
        let source = FixedSource::page_one(&["Model: WarmMajic-II Woodburning Fireplace"]);
        let records = extract(&d, &source, &majestic()).unwrap();
        assert_eq!(skus(&records), vec!["WarmMajic-II"]);
    }

    #[test]
    fn type_is_unknown_until_detected() {
        let d = doc("Majestic", "OXDV30SP - OXFORD DV STOVE.pdf");
        let source = FixedSource::page_one(&["Model: OXDV30SP", "Installation Manual"]);
        let records = extract(&d, &source, &majestic()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].manual_type, ManualType::Unknown);
    }

    #[test]
    fn modern_flames_bullets_and_series_trigger() {
        let d = doc("Modern Flames", "Manual-Redstone.pdf");
        let source = FixedSource::page_one(&[
            "Owner's Manual",
            "Redstone Series RS-2612•RS-3612—RS-4212",
        ]);
        let records = extract(&d, &source, &modern_flames()).unwrap();
        assert_eq!(skus(&records), vec!["RS-2612", "RS-3612", "RS-4212"]);
        assert_eq!(records[0].manual_type, ManualType::Owner);
    }

    #[test]
    fn modern_flames_series_does_not_carry_over() {
        let d = doc("Modern Flames", "Manual-Landscape.pdf");
        let source = FixedSource::page_one(&["Landscape Series", "LFV2-60/15-SH"]);
        assert!(extract(&d, &source, &modern_flames()).unwrap().is_empty());
    }

    #[test]
    fn monessen_ampersand_and_exceptions() {
        let d = doc("Monessen", "GCUF-GRUF.pdf");
        let source = FixedSource::page_one(&["Installation Manual", "Models: GCUF & GRUF & BDV500"]);
        let records = extract(&d, &source, &monessen()).unwrap();
        assert_eq!(skus(&records), vec!["GCUF", "GRUF", "BDV500"]);
    }
}
