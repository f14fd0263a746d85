//! Map-based aggregation of term lists: counts sum, sources union.

use std::collections::HashMap;

use super::TermCount;

/// Merges `new` into `existing` by term string.
///
/// Records with the same verbatim term string collapse into one: counts sum
/// (saturating), sources union with de-duplication on the `(company, role)`
/// pair. The result is sorted by descending count, term string breaking ties
/// so output order is deterministic.
pub fn merge_terms(existing: &[TermCount], new: &[TermCount]) -> Vec<TermCount> {
    let mut by_term: HashMap<&str, TermCount> = HashMap::new();

    for term in existing.iter().chain(new) {
        match by_term.get_mut(term.term.as_str()) {
            Some(entry) => {
                entry.count = entry.count.saturating_add(term.count);
                for source in &term.sources {
                    if !entry.sources.contains(source) {
                        entry.sources.push(source.clone());
                    }
                }
            }
            None => {
                by_term.insert(term.term.as_str(), term.clone());
            }
        }
    }

    let mut merged: Vec<TermCount> = by_term.into_values().collect();
    merged.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    merged
}

/// Total of all term counts, for the "N total mentions" summary line.
pub fn total_mentions(terms: &[TermCount]) -> u64 {
    terms.iter().map(|t| u64::from(t.count)).sum()
}
