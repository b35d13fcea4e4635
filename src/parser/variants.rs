//! Expansion of compact variant notation.
//!
//! Manual covers often list one base model with several size, fuel or colour
//! alternatives in a single string, e.g. `DVC(20,26,28)IN31(N,P)`. Each
//! parenthesized group is a comma-separated list of alternatives; the string
//! stands for every combination of them.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use super::normalize::looks_like_sku;

/// Up to 5 plain segments interleaved with up to 4 bracket groups, the first
/// group mandatory. Anything from a trailing `-suffix` on is discarded.
static VARIANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\S*?)(\(.*?\))(\w*)(\(.*?\))?(\w*)(\(.*?\))?(\w*)(\(.*?\))?(\S*?)-?.*",
    )
    .unwrap()
});

static BRACKETED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\((.*)\)$").unwrap());

/// Split a token into its 9 template segments (absent groups are empty).
/// `None` when the token has no bracket group at all.
pub fn decompose(token: &str) -> Option<Vec<String>> {
    let caps = VARIANT_RE.captures(token)?;
    Some(
        (1..caps.len())
            .map(|i| caps.get(i).map_or("", |m| m.as_str()).to_string())
            .collect(),
    )
}

/// Turn raw tokens into concrete SKUs.
///
/// Plain tokens that pass [`looks_like_sku`] come first, verbatim; templates
/// follow, each expanded to the full cartesian product of its alternatives.
/// A template with a single non-empty segment, such as a bare `(MF)` remote
/// annotation, is dropped.
pub fn expand<S: AsRef<str>>(tokens: &[S], exceptions: &[&str]) -> Vec<String> {
    let mut skus = Vec::new();
    let mut templates = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        match decompose(token) {
            Some(segments) => templates.push(segments),
            None if looks_like_sku(token, exceptions) => skus.push(token.to_string()),
            None => {}
        }
    }

    for segments in templates {
        if segments.iter().filter(|s| !s.is_empty()).count() > 1 {
            skus.extend(expand_template(&segments));
        }
    }

    skus
}

/// Every concrete string a template stands for, deduplicated and sorted.
/// Accepts any number of segments; a segment of the form `(a,b,...)` is
/// replaced by each alternative in turn, other segments are kept as-is.
pub fn expand_template<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    if segments.is_empty() {
        return Vec::new();
    }

    let choices: Vec<Vec<&str>> = segments
        .iter()
        .map(|s| alternatives(s.as_ref()))
        .collect();

    let combos: BTreeSet<String> = choices
        .into_iter()
        .multi_cartesian_product()
        .map(|parts| parts.concat())
        .collect();

    combos.into_iter().collect()
}

fn alternatives(segment: &str) -> Vec<&str> {
    match BRACKETED_RE.captures(segment).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().split(',').collect(),
        None => vec![segment],
    }
}
