//! Fuzzy name matching for completion.
//!
//! A candidate survives when its case-insensitive edit distance to the typed
//! text is within `max(2, len / 3)`, or when it starts with the typed text.
//! Survivors are ordered: prefix matches first, then by distance, then by
//! length, then by input order.

/// Filter and rank `candidates` against `partial`.
pub fn fuzzy_search<S: AsRef<str>>(candidates: &[S], partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    let tolerance = (partial.chars().count() / 3).max(2);

    let mut matches: Vec<(bool, usize, usize, &str)> = candidates
        .iter()
        .map(|c| c.as_ref())
        .filter_map(|name| {
            let lower = name.to_lowercase();
            let distance = levenshtein(&partial, &lower);
            let prefix = lower.starts_with(&partial);
            (prefix || distance <= tolerance).then_some((prefix, distance, name.chars().count(), name))
        })
        .collect();

    // Stable: ties keep input order.
    matches.sort_by_key(|&(prefix, distance, len, _)| (!prefix, distance, len));
    matches.into_iter().map(|(_, _, _, name)| name.to_string()).collect()
}

/// Levenshtein edit distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Use single-row optimization (space O(min(a,b)))
    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (curr_row[j] + 1) // insertion
                .min(prev_row[j + 1] + 1) // deletion
                .min(prev_row[j] + cost); // substitution
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("café", "cafe"), 1);
    }

    #[test]
    fn test_prefix_then_distance() {
        let found = fuzzy_search(&["getSomething", "getSome", "other"], "getsome");
        assert_eq!(found[..2], ["getSome".to_string(), "getSomething".to_string()]);
        // "other" is too far from "getsome" to survive at all.
        assert!(!found.contains(&"other".to_string()));
    }

    #[test]
    fn test_typo_within_tolerance() {
        let found = fuzzy_search(&["database", "datasets", "forms"], "dtabase");
        assert_eq!(found, vec!["database".to_string()]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        // Both are prefix matches at distance 1 with equal length.
        let found = fuzzy_search(&["abX", "abY"], "ab");
        assert_eq!(found, vec!["abX".to_string(), "abY".to_string()]);
    }

    #[test]
    fn test_length_breaks_distance_ties() {
        // Neither is a prefix match; both at distance 1 from "abc".
        let found = fuzzy_search(&["axbc", "xbc"], "abc");
        assert_eq!(found, vec!["xbc".to_string(), "axbc".to_string()]);
    }

    #[test]
    fn test_empty_partial_matches_everything() {
        let found = fuzzy_search(&["b", "a"], "");
        assert_eq!(found, vec!["b".to_string(), "a".to_string()]);
    }
}
