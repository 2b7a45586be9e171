//! Chat completions adapter implementing [`LlmGateway`].

use super::client::OpenAiClient;
use async_trait::async_trait;
use grounded_application::{GatewayError, LlmGateway};
use grounded_domain::Turn;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Batch (non-streaming) chat completion against one model.
pub struct OpenAiChatGateway {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiChatGateway {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn messages<'a>(
        system_prompt: &'a str,
        history: &'a [Turn],
        user_turn: &'a str,
    ) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: system_prompt,
        });
        messages.extend(history.iter().map(|turn| ChatMessage {
            role: turn.role().as_str(),
            content: turn.content(),
        }));
        messages.push(ChatMessage {
            role: "user",
            content: user_turn,
        });
        messages
    }
}

#[async_trait]
impl LlmGateway for OpenAiChatGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Turn],
        user_turn: &str,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: &self.model,
            messages: Self::messages(system_prompt, history, user_turn),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = self
            .client
            .post_json("/v1/chat/completions", &request)
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("no choices returned".to_string()))?;

        debug!(
            model = %self.model,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "Chat completion received"
        );

        choice
            .message
            .content
            .ok_or_else(|| GatewayError::InvalidResponse("completion has no content".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ==================== Wire Types ====================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
