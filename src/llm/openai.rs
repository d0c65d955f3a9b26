//! OpenAI chat completion implementation.

use super::{ChatModel, CompletionRequest};
use crate::config::Prompts;
use crate::error::{Result, ScrubError};
use crate::openai::create_client;
use crate::rag::context::format_context_for_prompt;
use crate::rag::Role;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// OpenAI-based chat model.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAIChatModel {
    /// Create a chat model with default prompts.
    pub fn new(model: &str, temperature: f32) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            temperature,
            prompts: Prompts::default(),
        })
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    fn build_messages(&self, request: &CompletionRequest<'_>) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.render_with_custom(&self.prompts.chat.system, &HashMap::new()))
                .build()
                .map_err(build_error)?
                .into(),
        ];

        for turn in request.history {
            let message: ChatCompletionRequestMessage = match turn.role() {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content())
                    .build()
                    .map_err(build_error)?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content())
                    .build()
                    .map_err(build_error)?
                    .into(),
            };
            messages.push(message);
        }

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(request.context));
        vars.insert("question".to_string(), request.user_text.to_string());

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.prompts.render_with_custom(&self.prompts.chat.user, &vars))
                .build()
                .map_err(build_error)?
                .into(),
        );

        Ok(messages)
    }
}

fn build_error(e: async_openai::error::OpenAIError) -> ScrubError {
    ScrubError::ExternalService(format!("Failed to build chat request: {}", e))
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, history = request.history.len()))]
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let messages = self.build_messages(&request)?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| ScrubError::ExternalService(format!("Chat completion failed: {}", e)))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ScrubError::ExternalService("Empty response from LLM".to_string()))?;

        debug!("Generated answer of {} characters", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_store::Chunk;
    use crate::rag::{ConversationTurn, RetrievalContext, ScoredChunk};
    use crate::timestamp::Timestamp;

    #[test]
    fn test_messages_include_history_and_context() {
        let model = OpenAIChatModel::new("gpt-4o-mini", 0.3).unwrap();

        let context = RetrievalContext::new(vec![ScoredChunk {
            chunk: Chunk::new(Timestamp::from_seconds(90), "main topic", vec![1.0]),
            score: 0.9,
        }]);
        let history = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ];

        let messages = model
            .build_messages(&CompletionRequest {
                context: &context,
                history: &history,
                user_text: "what is the main topic",
            })
            .unwrap();

        // system + two history turns + the new question
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));

        let ChatCompletionRequestMessage::User(last) = &messages[3] else {
            panic!("last message should be the user question");
        };
        let text = serde_json::to_string(&last.content).unwrap();
        assert!(text.contains("[01:30] main topic"));
        assert!(text.contains("what is the main topic"));
    }
}
