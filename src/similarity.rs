//! Column-name similarity scoring.
//!
//! Scores are integers in `0..=100`. The metric is a composite over the
//! normalized forms of both names: the plain Indel ratio, the Indel ratio of
//! the whitespace-sorted token strings, and a damped best-window ratio that
//! rewards one name embedding the other (`email` inside `email_address`).
//! The window component is damped so containment scores below exact
//! equality and below strong whole-string agreement; abbreviations such as
//! `fname` still clear the default match threshold against `first_name`.
//!
//! Scoring is pure and deterministic: equal inputs always produce equal
//! scores, and no call order or prior call changes a result.

use rapidfuzz::distance::indel;

/// Damping applied to the best-window component.
const PARTIAL_DAMPING: f64 = 0.87;

/// Lowercase a column name and collapse every run of non-alphanumeric
/// characters into a single space. `First-Name`, `first_name`, and
/// `FIRST  NAME` all normalize to `first name`.
pub fn normalize_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Score how well `candidate` matches `target`, returning `0..=100`.
///
/// The score is symmetric in its arguments and reaches 100 exactly when the
/// normalized forms are equal.
pub fn score(candidate: &str, target: &str) -> u8 {
    let a = normalize_name(candidate);
    let b = normalize_name(target);
    let full = indel_ratio(&a, &b);
    let token_sort = indel_ratio(&sort_tokens(&a), &sort_tokens(&b));
    let partial = PARTIAL_DAMPING * best_window_ratio(&a, &b);
    let best = full.max(token_sort).max(partial);
    (best * 100.0).round() as u8
}

/// Pick the best-scoring candidate for `target`.
///
/// Candidates are visited in input order and a later candidate replaces an
/// earlier one only on a strictly greater score, so ties resolve to the
/// first maximum. Returns `None` only when `candidates` is empty.
pub fn best_match<'a>(target: &str, candidates: &'a [String]) -> Option<(&'a str, u8)> {
    let mut best: Option<(&'a str, u8)> = None;
    for candidate in candidates {
        let value = score(candidate, target);
        match best {
            Some((_, held)) if value <= held => {}
            _ => best = Some((candidate.as_str(), value)),
        }
    }
    best
}

fn indel_ratio(a: &str, b: &str) -> f64 {
    indel::normalized_similarity(a.chars(), b.chars())
}

fn sort_tokens(normalized: &str) -> String {
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best Indel ratio of the shorter name against every window of the longer
/// name with the same character length.
fn best_window_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    let long_chars: Vec<char> = long.chars().collect();
    if short_len == 0 || short_len == long_chars.len() {
        return indel_ratio(short, long);
    }
    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let ratio = indel::normalized_similarity(short.chars(), window.iter().copied());
        if ratio > best {
            best = ratio;
        }
    }
    best
}
