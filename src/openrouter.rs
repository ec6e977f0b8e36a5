//! Client for OpenRouter's OpenAI-style chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::completion::{exchange, run_with_retry, AttemptOutcome, CompletionClient};
use crate::config::ClientConfig;
use crate::constants;
use crate::error::{ClientError, ConfigError};

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_tokens: u32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|text| !text.trim().is_empty())
    }
}

pub struct OpenRouterClient {
    http: Client,
    endpoint: String,
    config: ClientConfig,
}

impl OpenRouterClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.require_api_key(constants::OPENROUTER_API_KEY_ENV)?;
        let endpoint = format!("{}/api/v1/chat/completions", config.base());
        Ok(Self {
            http: config.http_client()?,
            endpoint,
            config,
        })
    }

    // The composed prompt already carries the persona, so it goes out as a
    // single user turn.
    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.generation.temperature,
            top_p: self.config.generation.top_p,
            max_tokens: self.config.generation.max_output_tokens,
        }
    }

    async fn attempt(&self, body: &ChatCompletionRequest<'_>) -> AttemptOutcome {
        let request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .header("X-Title", constants::OPENROUTER_APP_TITLE)
            .json(body);
        exchange(request, "openrouter", ChatCompletionResponse::first_text).await
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, ClientError> {
        let body = self.request_body(prompt);
        let body = &body;
        let text = run_with_retry(&self.config.retry, &self.config.fallbacks, || self.attempt(body)).await;
        debug!(reply_len = text.len(), "Completion resolved");
        Ok(text)
    }
}
