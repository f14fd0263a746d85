// Term records — the unit of aggregation behind the cloud and table views.
// Merging and view shaping are pure and fully testable; everything upstream
// of them (the model reply) is not.

pub mod merge;
pub mod view;

use serde::{Deserialize, Serialize};

/// Classification of a term within a job listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Responsibilities,
    Qualifications,
}

impl Category {
    /// Lenient mapping of model-emitted labels. Models flip between singular
    /// and plural forms; anything that is not a responsibility label counts
    /// as a qualification.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "responsibilities" | "responsibility" => Category::Responsibilities,
            _ => Category::Qualifications,
        }
    }
}

/// Where a term was observed: one job listing, identified by company and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSource {
    pub company: String,
    pub role: String,
}

/// A weighted term extracted from job-listing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u32,
    pub category: Category,
    #[serde(default)]
    pub sources: Vec<TermSource>,
}
