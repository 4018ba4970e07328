//! Token-set similarity between expected label text and OCR candidates
//!
//! Scores are order-insensitive and tolerate surrounding text: a candidate
//! holding every expected token scores 1.0 regardless of extra tokens or
//! reordering. The reverse does not hold, so a candidate carrying only part
//! of the expected text scores by how much of it is covered. Character-level
//! distance comes from `strsim`.

use std::collections::{BTreeSet, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Word-like runs: letters (with combining marks) and digits, any script
    static ref TOKEN_PATTERN: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+").unwrap();
}

/// Case-preserving tokens of `text`
pub fn tokens(text: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

fn token_set(text: &str) -> BTreeSet<String> {
    tokens(text).into_iter().map(str::to_lowercase).collect()
}

/// Normalized edit-distance ratio; 0.0 if either side is empty
fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

fn join_tokens<'a>(parts: impl Iterator<Item = &'a String>) -> String {
    parts.map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Similarity in `[0, 1]` between `expected` and `candidate`.
///
/// Empty input on either side scores 0.0. Text without any word tokens
/// (punctuation only) falls back to a plain case-insensitive ratio.
pub fn similarity(expected: &str, candidate: &str) -> f64 {
    let a = token_set(expected);
    let b = token_set(candidate);

    if a.is_empty() || b.is_empty() {
        return ratio(
            &expected.trim().to_lowercase(),
            &candidate.trim().to_lowercase(),
        );
    }

    let intersection = join_tokens(a.intersection(&b));
    let only_a = join_tokens(a.difference(&b));
    let only_b = join_tokens(b.difference(&a));

    let with = |rest: &str| match (intersection.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => intersection.clone(),
        (false, false) => format!("{} {}", intersection, rest),
    };
    let combined_a = with(&only_a);
    let combined_b = with(&only_b);

    // Only the expected side may be fully absorbed by the intersection
    let mut best = ratio(&combined_a, &combined_b);
    if !intersection.is_empty() {
        best = best.max(ratio(&intersection, &combined_a));
    }
    best.clamp(0.0, 1.0)
}

/// True when no token shared by both sides differs in letter case
pub fn case_preserved(expected: &str, candidate: &str) -> bool {
    let expected_tokens = tokens(expected);
    if expected_tokens.is_empty() {
        return candidate.contains(expected.trim());
    }
    let exact: HashSet<&str> = tokens(candidate).into_iter().collect();
    let folded: HashSet<String> = exact.iter().map(|t| t.to_lowercase()).collect();
    expected_tokens
        .iter()
        .all(|t| exact.contains(t) || !folded.contains(&t.to_lowercase()))
}

/// Collapse runs of whitespace and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_scores_one() {
        assert_eq!(similarity("NET WT 500g", "NET WT 500g"), 1.0);
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("NET WT 500g", ""), 0.0);
        assert_eq!(similarity("", "NET WT 500g"), 0.0);
        assert_eq!(similarity("   ", "NET WT 500g"), 0.0);
    }

    #[test]
    fn test_reordered_tokens_score_one() {
        assert_eq!(similarity("500g NET WT", "NET WT 500g"), 1.0);
    }

    #[test]
    fn test_subset_scores_one() {
        assert_eq!(
            similarity("NET WT 500g", "Best before 2026 NET WT 500g Made in Italy"),
            1.0
        );
    }

    #[test]
    fn test_partial_candidate_scores_below_one() {
        assert_eq!(similarity("Contains peanuts", "Contains"), 0.5);
        assert!(similarity("NET WT 500g", "500g") < 0.6);
        assert!(similarity("NET WT 500g", "NET WT") < 0.6);

        // Only the expected side is allowed to be a subset
        assert_eq!(similarity("Contains", "Contains peanuts"), 1.0);
    }

    #[test]
    fn test_differing_token_keeps_score_below_near() {
        let score = similarity("NET WT 500g", "NET WT 250g");
        assert!(score > 0.6 && score < 0.85, "score was {}", score);
    }

    #[test]
    fn test_ignores_case_and_punctuation() {
        assert_eq!(similarity("Net wt: 500g", "NET WT 500G"), 1.0);
    }

    #[test]
    fn test_ocr_noise_scores_high() {
        let score = similarity(
            "Ingredients: wheat flour, water, salt",
            "Ingredients: wheat flour, water, sa1t",
        );
        assert!(score > 0.85 && score < 1.0, "score was {}", score);
    }

    #[test]
    fn test_unrelated_text_scores_low() {
        let score = similarity("Contains peanuts", "Store in a cool dry place");
        assert!(score < 0.6, "score was {}", score);
    }

    #[test]
    fn test_non_ascii_input() {
        assert_eq!(similarity("Zutaten: Weizenmehl", "ZUTATEN: WEIZENMEHL"), 1.0);
        assert_eq!(similarity("成分 小麦粉", "成分 小麦粉"), 1.0);
        let score = similarity("Поля́рный", "Полярный");
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_punctuation_only_falls_back() {
        assert_eq!(similarity("***", "***"), 1.0);
        assert_eq!(similarity("***", "NET"), 0.0);
    }

    #[test]
    fn test_case_preserved() {
        assert!(case_preserved("NET WT 500g", "Total NET WT 500g"));
        assert!(!case_preserved("NET WT 500g", "Net Wt 500g"));
        assert!(case_preserved("NET WT: 500g", "NET WT 500g"));
        assert!(case_preserved("***", "a *** b"));
        assert!(case_preserved("Keep refrigerated", "Keep"));
        assert!(!case_preserved("Keep refrigerated", "keep"));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  NET   WT\n500g "), "NET WT 500g");
    }
}
