//! Language-model completion for grounded answers.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use crate::rag::{ConversationTurn, RetrievalContext};
use async_trait::async_trait;

/// Everything the model sees for one answer.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Retrieved excerpts, best match first.
    pub context: &'a RetrievalContext,
    /// Earlier turns of the conversation, oldest first.
    pub history: &'a [ConversationTurn],
    /// The new question.
    pub user_text: &'a str,
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the assistant's answer text.
    ///
    /// Failures are reported as [`crate::ScrubError::ExternalService`].
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;
}
