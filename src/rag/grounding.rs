//! Checks that an answer only cites chunks it was given.

use super::RetrievalContext;
use crate::timestamp::{citations, Timestamp};
use serde::Serialize;

/// Citations found in an answer, split by whether they are backed by context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grounding {
    /// Every `[MM:SS]` citation, in order of appearance.
    pub cited: Vec<Timestamp>,
    /// Distinct citations with no matching chunk in the context.
    pub ungrounded: Vec<Timestamp>,
}

impl Grounding {
    /// True when every citation points at a retrieved chunk.
    pub fn is_grounded(&self) -> bool {
        self.ungrounded.is_empty()
    }
}

/// Compare the citations in `content` with the chunks in `context`.
///
/// The answer is never rewritten; callers decide how to surface violations.
pub fn check_grounding(content: &str, context: &RetrievalContext) -> Grounding {
    let cited = citations(content);

    let mut ungrounded: Vec<Timestamp> = Vec::new();
    for ts in &cited {
        if !context.contains(*ts) && !ungrounded.contains(ts) {
            ungrounded.push(*ts);
        }
    }

    Grounding { cited, ungrounded }
}
