use std::sync::LazyLock;

use regex::Regex;

use crate::parser::{ManualDocument, ManualType, SkuRecord};

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^duravent(.*)").unwrap());

/// DuraVent manuals are per product line and named after it
/// (`duraVentPelletVentPro.pdf`); the PDF itself is never opened.
pub fn extract(doc: &ManualDocument) -> Vec<SkuRecord> {
    let stem = doc.stem();
    let series = PREFIX_RE
        .captures(stem)
        .and_then(|c| c.get(1))
        .map_or(stem, |m| m.as_str());
    vec![doc.record("", series, ManualType::Unknown)]
}
