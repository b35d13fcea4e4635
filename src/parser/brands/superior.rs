use std::sync::LazyLock;

use regex::Regex;

use super::{models_after_label, ManualTypeDetector, ScanState, LIST_DELIMS};
use crate::error::ExtractError;
use crate::parser::normalize::{contains_ci, first_word, looks_like_sku, split_tokens, strip_known_noise};
use crate::parser::{ManualDocument, SkuRecord};
use crate::pdf::{Pages, TextBlockSource};

static REPORT_NO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)report\s+no.*").unwrap());
/// A barcode such as `P126718-01` can sit between the label and the list.
static BARCODE_OR_GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"P\d+-\d{2}|\s+").unwrap());

const EXCEPTIONS: &[&str] = &["capella 33", "capella 36"];
const KNOWN_NOT_SKU: &[&str] = &["F19-008", "UL127"];

/// Superior covers put "Model(s):" next to a certification report line;
/// the report line is dropped before the list is split.
pub fn extract(doc: &ManualDocument, source: &dyn TextBlockSource) -> Result<Vec<SkuRecord>, ExtractError> {
    let mut records = Vec::new();
    let mut manual_type = ManualTypeDetector::new("instructions");
    let mut state = ScanState::default();

    for block in source.blocks(&doc.path, Pages::First)? {
        manual_type.observe(&block.text);

        let labeled = contains_ci(&block.text, "model");
        if !state.scans(labeled) {
            continue;
        }

        let filtered = strip_known_noise(&block.text, &[&*REPORT_NO_RE]);
        let models = models_after_label(&filtered, labeled);
        let before = records.len();
        records.extend(
            split_tokens(models.trim(), &LIST_DELIMS)
                .into_iter()
                .filter(|t| !KNOWN_NOT_SKU.contains(t) && looks_like_sku(t, EXCEPTIONS))
                .map(|t| doc.record(first_word(t), "", manual_type.current())),
        );

        let carry_over = labeled
            || records.len() > before
            || REPORT_NO_RE.is_match(&block.text)
            || BARCODE_OR_GAP_RE.is_match(&block.text);
        state = ScanState::after_block(carry_over);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::ManualType;
    use crate::pdf::testing::FixedSource;

    fn doc() -> ManualDocument {
        ManualDocument::new(Path::new("/m"), Path::new("/m/Superior/DRT3000-Install.pdf")).unwrap()
    }

    fn skus(records: &[SkuRecord]) -> Vec<&str> {
        records.iter().map(|r| r.sku.as_str()).collect()
    }

    #[test]
    fn report_line_is_dropped() {
        let source = FixedSource::page_one(&[
            "INSTALLATION AND OPERATING INSTRUCTIONS",
            "Models: DRT3033, DRT3035\nReport No. F19-008 UL127",
        ]);
        let records = extract(&doc(), &source).unwrap();
        assert_eq!(skus(&records), vec!["DRT3033", "DRT3035"]);
        assert!(records.iter().all(|r| r.manual_type == ManualType::Installation));
    }

    #[test]
    fn known_non_skus_are_filtered() {
        let source = FixedSource::page_one(&["Model: DRT2033 F19-008 UL127"]);
        assert_eq!(skus(&extract(&doc(), &source).unwrap()), vec!["DRT2033"]);
    }

    #[test]
    fn list_after_barcode_block() {
        let source = FixedSource::page_one(&["Models:", "P126718-01", "DRT4036TEN\nDRT4045TEN"]);
        assert_eq!(
            skus(&extract(&doc(), &source).unwrap()),
            vec!["DRT4036TEN", "DRT4045TEN"]
        );
    }

    #[test]
    fn scan_stops_after_single_word_block() {
        let source = FixedSource::page_one(&["Models:", "Fireplaces", "DRT6336"]);
        assert!(extract(&doc(), &source).unwrap().is_empty());
    }

    #[test]
    fn owner_type_from_instructions_block() {
        let source = FixedSource::page_one(&["Owner's Operation Instructions", "Model: WRT4543"]);
        let records = extract(&doc(), &source).unwrap();
        assert_eq!(records[0].manual_type, ManualType::Owner);
    }
}
