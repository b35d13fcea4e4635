//! Normalized indel similarity between two short strings.

/// Lowercase, turn every non-word character (not alphanumeric or `_`) into
/// a space, trim.
pub fn full_process(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// `round(100 * 2 * lcs / (len(a) + len(b)))`. Equal inputs score 100, even
/// when both are empty; otherwise an empty side scores 0.
/// Inputs are compared as given; callers run [`full_process`] first.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let common = lcs_len(&a, &b);
    let total = (a.len() + b.len()) as f64;
    (200.0 * common as f64 / total).round() as u8
}

/// Longest common subsequence length, two-row table.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}
