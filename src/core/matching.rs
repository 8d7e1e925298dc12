//! Contact name resolution: exact match first, then similarity ranking.

use strsim::normalized_levenshtein;

/// Minimum similarity a fuzzy candidate needs to be accepted.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.6;

/// Similarity in `[0, 1]` between a query and a contact name.
///
/// The name is compared as a whole and token by token, so a partial first name
/// ("amin") still scores well against a full name ("Amine Khoudor").
pub fn similarity(query: &str, name: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    if query.is_empty() || name.is_empty() {
        return 0.0;
    }
    name.split_whitespace()
        .map(|token| normalized_levenshtein(&query, token))
        .fold(normalized_levenshtein(&query, &name), f64::max)
}

/// Picks the candidate `query` refers to.
///
/// A case-insensitive exact match wins outright. Otherwise the highest
/// similarity at or above [`ACCEPTANCE_THRESHOLD`] wins; on equal scores the
/// earlier candidate is kept, so enumeration order is the tie-break.
pub fn best_match<'a, T, F>(query: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(exact) = candidates
        .iter()
        .find(|candidate| name_of(*candidate).trim().to_lowercase() == needle)
    {
        return Some(exact);
    }

    let mut best: Option<(&T, f64)> = None;
    for candidate in candidates {
        let score = similarity(&needle, name_of(candidate));
        if score < ACCEPTANCE_THRESHOLD {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_name<'r>(name: &'r &str) -> &'r str {
        name
    }

    fn pick<'a>(query: &str, names: &'a [&'a str]) -> Option<&'a str> {
        best_match(query, names, as_name).copied()
    }

    #[test]
    fn partial_first_name_resolves() {
        assert_eq!(pick("amin", &["Amine Khoudor"]), Some("Amine Khoudor"));
    }

    #[test]
    fn unrelated_query_is_rejected() {
        assert!(similarity("xyz", "Amine Khoudor") < ACCEPTANCE_THRESHOLD);
        assert_eq!(pick("xyz", &["Amine Khoudor"]), None);
    }

    #[test]
    fn exact_match_beats_closer_fuzzy_scores() {
        assert_eq!(pick("sara", &["Sarah", "SARA"]), Some("SARA"));
    }

    #[test]
    fn ties_keep_enumeration_order() {
        assert_eq!(pick("ali", &["Alia", "Alim"]), Some("Alia"));
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert_eq!(pick("   ", &["Amine"]), None);
    }
}
