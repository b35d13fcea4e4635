use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractError;
use crate::parser::normalize::{contains_ci, first_word, split_tokens, MODEL_LABEL_RE};
use crate::parser::{ManualDocument, ManualType, SkuRecord};
use crate::pdf::{Pages, TextBlockSource};

static DELIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s|\n").unwrap());

/// Cover page lists `Model(s): CODE description, CODE description`.
pub fn extract(doc: &ManualDocument, source: &dyn TextBlockSource) -> Result<Vec<SkuRecord>, ExtractError> {
    let mut records = Vec::new();

    for block in source.blocks(&doc.path, Pages::First)? {
        if !contains_ci(&block.text, "model") {
            continue;
        }
        // the label may sit mid-block; only the list right after it counts
        let models = MODEL_LABEL_RE.split(&block.text).nth(1).unwrap_or_default();
        records.extend(
            split_tokens(models.trim(), &DELIMS)
                .into_iter()
                .map(first_word)
                .filter(|sku| !sku.is_empty())
                .map(|sku| doc.record(sku, "", ManualType::Unknown)),
        );
    }

    Ok(records)
}
