use std::collections::HashSet;

use strsim::normalized_levenshtein;

use crate::text::{normalize_search_text, tokenize};

/// Mean of character-level (normalized Levenshtein) and token-set (Jaccard) similarity.
///
/// Identical texts score 1.0; texts sharing no tokens score at most 0.5.
pub fn similarity(left: &str, right: &str) -> f64 {
    let left_norm = normalize_search_text(left);
    let right_norm = normalize_search_text(right);

    if left_norm.is_empty() && right_norm.is_empty() {
        return 1.0;
    }
    if left_norm.is_empty() || right_norm.is_empty() {
        return 0.0;
    }
    if left_norm == right_norm {
        return 1.0;
    }

    let character = normalized_levenshtein(&left_norm, &right_norm);
    let token = token_set_similarity(&left_norm, &right_norm);
    ((character + token) / 2.0).clamp(0.0, 1.0)
}

fn token_set_similarity(left: &str, right: &str) -> f64 {
    let left_tokens = tokenize(left).into_iter().collect::<HashSet<String>>();
    let right_tokens = tokenize(right).into_iter().collect::<HashSet<String>>();

    let union = left_tokens.union(&right_tokens).count();
    if union == 0 {
        return 0.0;
    }
    left_tokens.intersection(&right_tokens).count() as f64 / union as f64
}
