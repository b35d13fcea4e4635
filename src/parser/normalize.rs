use std::sync::LazyLock;

use regex::Regex;

static SKU_SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[a-z]{2,}-*\d+").unwrap());

/// `Model`, `Models`, `Model(s)`, each optionally followed by a colon.
pub static MODEL_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)model\(?s?\)?:?").unwrap());

/// Whether a token plausibly is a product code: letters followed by digits,
/// and not a plain word. `exceptions` holds lowercase codes accepted as-is.
pub fn looks_like_sku(text: &str, exceptions: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    if exceptions.contains(&lower.as_str()) {
        return true;
    }
    let purely_alphabetic = text.bytes().all(|b| b.is_ascii_alphabetic());
    !purely_alphabetic && SKU_SHAPE_RE.is_match(text)
}

/// Remove every match of each noise pattern.
pub fn strip_known_noise(text: &str, patterns: &[&Regex]) -> String {
    patterns
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

/// Split on a brand's delimiter set. Empty pieces are kept; callers filter.
pub fn split_tokens<'a>(text: &'a str, delimiters: &Regex) -> Vec<&'a str> {
    delimiters.split(text).collect()
}

/// The part of a token before its first space.
pub fn first_word(token: &str) -> &str {
    token.split(' ').next().unwrap_or_default()
}

pub fn contains_ci(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(needle)
}
