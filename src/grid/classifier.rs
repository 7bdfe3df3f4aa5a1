//! Picks the template set for a goal.
//!
//! Matching is a case-insensitive substring test, not a word-boundary test, so
//! "running a bakery" selects the marathon set. That behaviour is kept as is.

use serde::{Deserialize, Serialize};

/// Keywords that select the marathon template set.
pub const MARATHON_KEYWORDS: &[&str] = &["marathon", "run a", "running"];

/// Identifier of a template set in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSetId {
    Marathon,
    Generic,
}

impl std::fmt::Display for TemplateSetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marathon => write!(f, "marathon"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Classify raw goal text. Callers reject empty text before this point.
pub fn classify(goal_text: &str) -> TemplateSetId {
    let lowered = goal_text.to_lowercase();
    if MARATHON_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        TemplateSetId::Marathon
    } else {
        TemplateSetId::Generic
    }
}
