//! Lexical ranking by query-term overlap.
//!
//! Score = number of distinct case-folded query tokens that also occur as
//! tokens in the candidate text. Tokens are maximal alphanumeric runs.
//! Zero-scoring candidates stay in the output; truncation is the caller's job.

use attune_core::memory::Recallable;
use std::collections::HashSet;

/// Split text into case-folded alphanumeric tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// How many of `terms` appear in `text`.
pub fn score(terms: &HashSet<String>, text: &str) -> usize {
    let tokens: HashSet<String> = tokenize(text).collect();
    terms.iter().filter(|t| tokens.contains(*t)).count()
}

/// Order candidates by descending score; ties keep their input order.
pub fn rank<M: Recallable>(query: &str, candidates: Vec<M>) -> Vec<M> {
    let terms: HashSet<String> = tokenize(query).collect();
    if terms.is_empty() {
        return candidates;
    }

    let mut scored: Vec<(usize, M)> = candidates
        .into_iter()
        .map(|c| (score(&terms, &c.recall_text()), c))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, c)| c).collect()
}
