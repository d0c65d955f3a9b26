//! Retrieval-augmented conversation about a single video.
//!
//! A question is embedded, matched against the video's chunks, and answered
//! by the LLM from the best matches. Answers cite chunks as `[MM:SS]`.

pub mod context;
mod engine;
mod grounding;
mod retriever;
mod session;

pub use engine::{ConversationEngine, Reply};
pub use grounding::{check_grounding, Grounding};
pub use retriever::{cosine_similarity, rank, RetrievalContext, Retriever, ScoredChunk};
pub use session::{Session, SessionState, COULD_NOT_ANSWER};

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Turns are never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: Role,
    content: String,
}

impl ConversationTurn {
    /// A question from the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An answer from the assistant, possibly containing `[MM:SS]` citations.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
