#![allow(dead_code)]

//! Derived view state for the cloud and table presentations.
//!
//! The rendering itself lives in the frontend; these are the pure projections
//! it draws from — filtering, sorting, the role inventory behind the role
//! dropdown, and relative scale weights for cloud font sizing.

use super::{Category, TermCount};

/// The cloud renders at most this many terms.
pub const CLOUD_TERM_CAP: usize = 100;

/// Category filter shared by the cloud and table views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Responsibilities,
    Qualifications,
}

impl CategoryFilter {
    fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Responsibilities => category == Category::Responsibilities,
            CategoryFilter::Qualifications => category == Category::Qualifications,
        }
    }
}

/// Sort direction for the table's count column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Unique role strings across all sources, sorted, for the role dropdown.
pub fn available_roles(terms: &[TermCount]) -> Vec<String> {
    let mut roles: Vec<String> = terms
        .iter()
        .flat_map(|t| t.sources.iter().map(|s| s.role.clone()))
        .collect();
    roles.sort();
    roles.dedup();
    roles
}

/// Applies the category filter, the role filter (a term matches when any of
/// its sources carries the role) and a case-insensitive substring search on
/// the term text.
pub fn filter_terms<'a>(
    terms: &'a [TermCount],
    category: CategoryFilter,
    role: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a TermCount> {
    let needle = search.map(str::to_lowercase);
    terms
        .iter()
        .filter(|t| category.matches(t.category))
        .filter(|t| role.map_or(true, |r| t.sources.iter().any(|s| s.role == r)))
        .filter(|t| {
            needle
                .as_deref()
                .map_or(true, |q| t.term.to_lowercase().contains(q))
        })
        .collect()
}

/// Sorts a filtered view by count for the table's toggleable count column.
pub fn sort_by_count(terms: &mut [&TermCount], order: SortOrder) {
    terms.sort_by(|a, b| match order {
        SortOrder::Ascending => a.count.cmp(&b.count),
        SortOrder::Descending => b.count.cmp(&a.count),
    });
}

/// Relative weight of each term for cloud font scaling: `count / max_count`
/// over the first `CLOUD_TERM_CAP` terms, input order preserved. Weights are
/// in `(0.0, 1.0]` whenever any visible count is positive.
pub fn cloud_weights(terms: &[TermCount]) -> Vec<(&TermCount, f32)> {
    let visible = &terms[..terms.len().min(CLOUD_TERM_CAP)];
    let max_count = visible.iter().map(|t| t.count).max().unwrap_or(0);
    if max_count == 0 {
        return visible.iter().map(|t| (t, 0.0)).collect();
    }
    visible
        .iter()
        .map(|t| (t, t.count as f32 / max_count as f32))
        .collect()
}
