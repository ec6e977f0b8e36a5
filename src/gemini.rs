//! Client for the generative-language `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::completion::{exchange, run_with_retry, AttemptOutcome, CompletionClient};
use crate::config::ClientConfig;
use crate::constants;
use crate::error::{ClientError, ConfigError};

// Request body for models/{model}:generateContent
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: RequestGenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize, Debug)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Serialize, Debug)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

// Only the first candidate's first text part is consumed; everything else in
// the payload is ignored.
#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

pub struct GeminiClient {
    http: Client,
    endpoint: String,
    config: ClientConfig,
}

impl GeminiClient {
    /// Fails when no API key is configured.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.require_api_key(constants::GEMINI_API_KEY_ENV)?;
        let endpoint = format!("{}/v1beta/models/{}:generateContent", config.base(), config.model);
        Ok(Self {
            http: config.http_client()?,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        let generation = &self.config.generation;
        GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: RequestGenerationConfig {
                temperature: generation.temperature,
                top_k: generation.top_k,
                top_p: generation.top_p,
                max_output_tokens: generation.max_output_tokens,
            },
            safety_settings: constants::SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: constants::SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }

    async fn attempt(&self, body: &GenerateContentRequest<'_>) -> AttemptOutcome {
        let request = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body);
        exchange(request, "gemini", GenerateContentResponse::first_text).await
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, ClientError> {
        let body = self.request_body(prompt);
        let body = &body;
        let text = run_with_retry(&self.config.retry, &self.config.fallbacks, || self.attempt(body)).await;
        debug!(reply_len = text.len(), "Completion resolved");
        Ok(text)
    }
}
