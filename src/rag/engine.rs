//! Retrieval plus grounded answer generation.

use super::grounding::{check_grounding, Grounding};
use super::retriever::{rank, RetrievalContext, Retriever};
use super::ConversationTurn;
use crate::chunk_store::VideoChunkSet;
use crate::embedding::Embedder;
use crate::error::{Result, ScrubError};
use crate::llm::{ChatModel, CompletionRequest};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of earlier turns sent to the model.
const DEFAULT_MAX_HISTORY_TURNS: usize = 20;

/// Answers questions about stored videos.
pub struct ConversationEngine {
    retriever: Retriever,
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
    max_history_turns: usize,
}

impl ConversationEngine {
    /// Create a new engine.
    pub fn new(retriever: Retriever, embedder: Arc<dyn Embedder>, chat_model: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            embedder,
            chat_model,
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
        }
    }

    /// Limit how many earlier turns accompany each question.
    pub fn with_max_history_turns(mut self, max_history_turns: usize) -> Self {
        self.max_history_turns = max_history_turns;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `user_text` and append the question and answer to `history`.
    ///
    /// On failure `history` is left untouched.
    #[instrument(skip(self, history, user_text), fields(turns = history.len()))]
    pub async fn respond(
        &self,
        video_id: &str,
        history: &mut Vec<ConversationTurn>,
        user_text: &str,
    ) -> Result<Reply> {
        let context = self.gather_context(video_id, user_text).await?;
        let reply = self.generate(history, user_text, context).await?;

        history.push(ConversationTurn::user(user_text));
        history.push(reply.turn.clone());
        Ok(reply)
    }

    /// Embed the question and select the most similar chunks.
    #[instrument(skip(self, user_text))]
    pub async fn gather_context(&self, video_id: &str, user_text: &str) -> Result<RetrievalContext> {
        if user_text.trim().is_empty() {
            return Err(ScrubError::InvalidInput("question is empty".to_string()));
        }

        let set = self.retriever.load(video_id).await?;
        self.check_embedding_space(&set)?;

        let query_embedding = self.embedder.embed(user_text).await?;
        let context = rank(&set, &query_embedding, self.retriever.top_k())?;

        debug!("Retrieved {} of {} chunks for video {}", context.len(), set.len(), video_id);
        Ok(context)
    }

    /// Ask the model for an answer grounded in `context`.
    #[instrument(skip_all, fields(context = context.len()))]
    pub async fn generate(
        &self,
        history: &[ConversationTurn],
        user_text: &str,
        context: RetrievalContext,
    ) -> Result<Reply> {
        let recent = &history[history.len().saturating_sub(self.max_history_turns)..];

        let content = self
            .chat_model
            .complete(CompletionRequest {
                context: &context,
                history: recent,
                user_text,
            })
            .await?;

        let grounding = check_grounding(&content, &context);
        if grounding.is_grounded() {
            info!("Answer cites {} timestamps", grounding.cited.len());
        } else {
            let missing: Vec<String> = grounding.ungrounded.iter().map(|t| t.to_string()).collect();
            warn!("Answer cites timestamps not in its context: {}", missing.join(", "));
        }

        Ok(Reply {
            turn: ConversationTurn::assistant(content),
            sources: context,
            grounding,
        })
    }

    /// Catch stored sets that were embedded by a different model than the
    /// one configured for questions, before spending an embedding call.
    fn check_embedding_space(&self, set: &VideoChunkSet) -> Result<()> {
        if let Some(stored_model) = &set.embedding_model {
            if stored_model != self.embedder.model() {
                return Err(ScrubError::Config(format!(
                    "video {} was embedded with {} but questions are embedded with {}",
                    set.video_id,
                    stored_model,
                    self.embedder.model()
                )));
            }
        }

        if let Some(dims) = set.dimensions()? {
            if dims != self.embedder.dimensions() {
                return Err(ScrubError::Config(format!(
                    "video {} has {}-dimensional embeddings but the embedder is configured for {}",
                    set.video_id,
                    dims,
                    self.embedder.dimensions()
                )));
            }
        }

        Ok(())
    }
}

/// A generated answer with the material it was based on.
#[derive(Debug, Clone)]
pub struct Reply {
    /// The new assistant turn.
    pub turn: ConversationTurn,
    /// Chunks the answer was generated from, best match first.
    pub sources: RetrievalContext,
    /// Which citations in the answer are backed by `sources`.
    pub grounding: Grounding,
}
