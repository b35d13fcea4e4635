use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractError;
use crate::parser::normalize::{first_word, split_tokens, strip_known_noise};
use crate::parser::variants::expand;
use crate::parser::{ManualDocument, ManualType, SkuRecord};
use crate::pdf::{Pages, TextBlockSource};

static MODEL_INTRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:for\suse\son|series|model\(?s?\)?:?|fireplace)(.*)").unwrap()
});
static UL_FILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)ul\sfile\sno.*").unwrap());
/// Certification and part numbers that look like SKUs.
static NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)MH30033|MH45034|Z21\.11\.2").unwrap());
static LOOSE_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)^[a-z]{2,}\(?\d").unwrap());
static DELIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s+|\s+|\n").unwrap());

const NOT_A_LIST_START: &[&str] = &["MH30033", "DFEV"];

/// Empire covers use compact variant notation (`DVC(20,26,28)IN31(N,P)`)
/// after one of several introducing phrases, on any page.
pub fn extract(doc: &ManualDocument, source: &dyn TextBlockSource) -> Result<Vec<SkuRecord>, ExtractError> {
    let mut records = Vec::new();

    for block in source.blocks(&doc.path, Pages::All)? {
        let filtered = strip_known_noise(&block.text, &[&*UL_FILE_RE]);
        let captured = MODEL_INTRO_RE
            .captures(&filtered)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .or_else(|| loose_capture(&block.text).map(str::to_string));
        let Some(captured) = captured else {
            continue;
        };

        // text layer is sometimes lowercase
        let models = strip_known_noise(&captured, &[&*NOISE_RE]).to_uppercase();
        let models = models.split_once(':').map_or(models.as_str(), |(_, rest)| rest);

        let tokens = split_tokens(models.trim(), &DELIMS);
        records.extend(
            expand(&tokens, &[])
                .iter()
                .map(|sku| doc.record(first_word(sku), "", ManualType::Unknown)),
        );
    }

    Ok(records)
}

/// Everything from the first code-like word (letters, optional `(`, digit)
/// that is not one of the known non-list prefixes.
fn loose_capture(text: &str) -> Option<&str> {
    text.char_indices().map(|(i, _)| &text[i..]).find(|rest| {
        !NOT_A_LIST_START
            .iter()
            .any(|p| rest.get(..p.len()).is_some_and(|head| head.eq_ignore_ascii_case(p)))
            && LOOSE_START_RE.is_match(rest)
    })
}
