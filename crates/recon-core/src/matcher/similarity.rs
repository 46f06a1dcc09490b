//! Merchant / vendor name similarity.

use std::collections::HashSet;

/// Edit distance over chars, two rolling rows.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Rows are sized by the shorter string.
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    let n = short.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(*lc != short[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Lowercase words with punctuation and store/terminal numbers removed.
///
/// `"CHEVRON #12345 HOUSTON TX"` becomes `"chevron houston tx"`.
pub fn normalize_merchant(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !w.chars().any(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein ratio of two normalized names in [0, 1].
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Share of the shorter name's words found in the longer name.
pub fn token_containment(a: &str, b: &str) -> f64 {
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    let (small, large) = if ta.len() <= tb.len() { (&ta, &tb) } else { (&tb, &ta) };
    if small.is_empty() {
        return 0.0;
    }
    small.iter().filter(|t| large.contains(*t)).count() as f64 / small.len() as f64
}

/// Similarity of two merchant/vendor texts in [0, 1].
///
/// The higher of the Levenshtein ratio and token containment over the
/// normalized names. A side with no usable words scores 0.
pub fn name_similarity(s1: &str, s2: &str) -> f64 {
    let a = normalize_merchant(s1);
    let b = normalize_merchant(s2);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    levenshtein_ratio(&a, &b).max(token_containment(&a, &b))
}
