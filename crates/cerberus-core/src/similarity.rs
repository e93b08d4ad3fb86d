//! Name and organization similarity between person mentions.
//!
//! Name similarity follows PostgreSQL `pg_trgm`: each string is lowercased and
//! split into alphanumeric words, each word is padded with two leading spaces
//! and one trailing space, and the score is the Jaccard index of the two
//! trigram sets. Scores are symmetric and lie in `[0, 1]`.

use std::collections::HashSet;

/// Trigram similarity of two names, case-insensitive.
///
/// Identical normalized names score 1.0; names sharing no trigram score 0.0.
/// A name with no alphanumeric characters has no trigrams and scores 0.0
/// against everything.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// Organization equality used while clustering.
///
/// Both organizations must be present and byte-for-byte equal. No case folding
/// or alias resolution is applied here; see [`crate::classification`] for the
/// alias-aware comparison used to classify stakeholders.
pub fn organization_matches(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn trigrams(s: &str) -> HashSet<[char; 3]> {
    let lowered = s.to_lowercase();
    let mut set = HashSet::new();

    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}
