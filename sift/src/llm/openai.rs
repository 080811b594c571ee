//! Chat Completions client implementing `ChatModel`.
//!
//! Works against any OpenAI-compatible endpoint: pass an `OpenAIConfig` with
//! the api key and base URL (the engine's default configuration points it at
//! Groq's compatible API). Temperature is configurable; the engine uses 0.0
//! so grading and routing stay deterministic.

use async_trait::async_trait;
use tracing::debug;

use crate::error::WorkflowError;
use crate::llm::ChatModel;
use crate::message::Message;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

/// Chat Completions client for OpenAI-compatible endpoints.
pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiChat {
    /// Build a client with default config (API key from `OPENAI_API_KEY`).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build a client with custom config (API key, base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => {
                    ChatCompletionRequestMessage::Assistant((s.as_str()).into())
                }
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[Message]) -> Result<String, WorkflowError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::to_request(messages));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args.build().map_err(|e| {
            WorkflowError::ExecutionFailed(format!("chat request build failed: {e}"))
        })?;

        debug!(
            model = %self.model,
            message_count = messages.len(),
            temperature = ?self.temperature,
            "chat completion create"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| WorkflowError::ExecutionFailed(format!("chat API error: {e}")))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::ExecutionFailed("chat API returned no choices".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: constructors build without panicking.
    #[test]
    fn openai_chat_constructors() {
        let _ = OpenAiChat::new("llama3-8b-8192");
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("https://api.groq.com/openai/v1");
        let _ = OpenAiChat::with_config(config, "llama3-8b-8192").with_temperature(0.0);
    }

    /// **Scenario**: complete() against an unreachable base returns Err
    /// (no real API key needed).
    #[tokio::test]
    async fn complete_with_unreachable_base_returns_error() {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("https://127.0.0.1:1");
        let client = OpenAiChat::with_config(config, "llama3-8b-8192");
        let result = client.complete(&[Message::user("Hello")]).await;
        assert!(result.is_err());
    }

    /// **Scenario**: complete() against a real endpoint returns a reply when the
    /// key is present.
    #[tokio::test]
    #[ignore = "Requires OPENAI_API_KEY; run with: cargo test -p sift complete_with_real_api -- --ignored"]
    async fn complete_with_real_api_returns_reply() {
        std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set for this test");
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let client = OpenAiChat::new(model);
        let reply = client
            .complete(&[Message::user("Say exactly: ok")])
            .await
            .expect("complete should succeed");
        assert!(!reply.is_empty());
    }
}
