//! Fuzzy matching of search queries against product names
//!
//! Both sides are lowercased and reduced to ASCII alphanumeric words before
//! they reach the partial ratio scorer, so punctuation and case never count
//! against a match.

use fuzzywuzzy::fuzz;

/// Minimum score a product name needs to count as a match
pub const MATCH_THRESHOLD: u8 = 80;

/// Lowercase, turn every other run of characters into one space, trim
fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Best similarity (0-100) of the shorter string against the best aligned
/// substring of the longer one
pub fn partial_ratio(query: &str, candidate: &str) -> u8 {
    let query = normalize(query);
    let candidate = normalize(candidate);
    if query.is_empty() || candidate.is_empty() {
        return 0;
    }
    fuzz::partial_ratio(&query, &candidate)
}

/// Keep the candidates whose name scores at least [`MATCH_THRESHOLD`] against `query`
pub fn matching<'a, K: Copy>(
    query: &str,
    candidates: impl IntoIterator<Item = (K, &'a str)>,
) -> Vec<(K, u8)> {
    candidates
        .into_iter()
        .map(|(key, name)| (key, partial_ratio(query, name)))
        .filter(|(_, score)| *score >= MATCH_THRESHOLD)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_substring_scores_full_marks() {
        assert_eq!(partial_ratio("lamp", "Bamboo Lamp Deluxe"), 100);
        assert_eq!(partial_ratio("BAMBOO", "bamboo lamp"), 100);
    }

    #[test]
    fn small_typos_still_match() {
        assert!(partial_ratio("bambo lamp", "Bamboo Lamp Deluxe") >= MATCH_THRESHOLD);
        assert!(partial_ratio("lmap", "Bamboo Lamp Deluxe") < 100);
    }

    #[test]
    fn unrelated_queries_fall_below_threshold() {
        assert!(partial_ratio("keyboard", "Bamboo Lamp Deluxe") < MATCH_THRESHOLD);
        assert!(partial_ratio("xyz", "Silk scarf from Hue") < MATCH_THRESHOLD);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(partial_ratio("", "Bamboo Lamp"), 0);
        assert_eq!(partial_ratio("   ", "Bamboo Lamp"), 0);
        assert_eq!(partial_ratio("lamp", ""), 0);
    }

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(normalize("  Bamboo--LAMP, deluxe! "), "bamboo lamp deluxe");
        assert_eq!(normalize("***"), "");
    }

    #[test]
    fn punctuation_is_ignored() {
        assert_eq!(partial_ratio("t-shirt", "Cotton T Shirt Large"), 100);
    }

    #[test]
    fn matching_keeps_keys_of_hits_only() {
        let names = [(1, "Bamboo Lamp Deluxe"), (2, "Silk scarf from Hue"), (3, "Bamboo Lamp Deluxe")];
        let hits: Vec<i32> = matching("bamboo lamp", names).into_iter().map(|(k, _)| k).collect();
        assert_eq!(hits, vec![1, 3]);
    }
}
