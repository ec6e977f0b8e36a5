//! Backend-independent pieces of the completion exchange: the client trait,
//! the fallback replies shown when a backend call does not succeed, and the
//! retry policy for rate limiting and temporary unavailability.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::ClientError;

/// Sends one composed prompt and returns the text to show the user.
///
/// Transient failures (HTTP errors, transport errors, malformed payloads) are
/// resolved into fallback text and returned as `Ok`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Why a backend call produced no usable completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// HTTP 429
    Busy,
    /// HTTP 503
    Unavailable,
    /// Anything else: other statuses, transport errors, empty or malformed payloads.
    Generic,
}

impl FallbackKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => FallbackKind::Busy,
            StatusCode::SERVICE_UNAVAILABLE => FallbackKind::Unavailable,
            _ => FallbackKind::Generic,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, FallbackKind::Busy | FallbackKind::Unavailable)
    }
}

/// User-facing replies for each [`FallbackKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackMessages {
    pub busy: String,
    pub unavailable: String,
    pub generic: String,
}

impl Default for FallbackMessages {
    fn default() -> Self {
        Self {
            busy: "API अभी बहुत व्यस्त है। कृपया 2-3 मिनट बाद कोशिश करें। धैर्य रखें! 🙏".to_string(),
            unavailable: "सेवा अस्थायी रूप से अनुपलब्ध है। कृपया 5 मिनट बाद पुनः प्रयास करें। 🙏".to_string(),
            generic: "क्षमा करें, कुछ तकनीकी समस्या है। कृपया दोबारा कोशिश करें। 🙏".to_string(),
        }
    }
}

impl FallbackMessages {
    pub fn message(&self, kind: FallbackKind) -> &str {
        match kind {
            FallbackKind::Busy => &self.busy,
            FallbackKind::Unavailable => &self.unavailable,
            FallbackKind::Generic => &self.generic,
        }
    }
}

/// Exponential backoff for retryable fallbacks. Zero retries means a single
/// attempt per prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

/// Sampling and length parameters sent with each request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

/// Result of a single HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Completed(String),
    Failed(FallbackKind),
}

/// Sends one prepared request and classifies the result: transport errors,
/// non-success statuses, unparseable bodies and bodies without usable text
/// all become a [`FallbackKind`].
pub(crate) async fn exchange<T, F>(request: RequestBuilder, backend: &'static str, extract: F) -> AttemptOutcome
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Option<String>,
{
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            error!(backend, error = %e, "Failed to send completion request");
            return AttemptOutcome::Failed(FallbackKind::Generic);
        }
    };

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        error!(backend, %status, %error_body, "Completion request failed");
        return AttemptOutcome::Failed(FallbackKind::from_status(status));
    }

    match response.json::<T>().await {
        Ok(parsed) => match extract(parsed) {
            Some(text) => AttemptOutcome::Completed(text),
            None => {
                warn!(backend, "Completion response carried no text");
                AttemptOutcome::Failed(FallbackKind::Generic)
            }
        },
        Err(e) => {
            error!(backend, error = %e, "Failed to parse completion response");
            AttemptOutcome::Failed(FallbackKind::Generic)
        }
    }
}

/// Runs `attempt` until it completes, fails with a non-retryable kind, or the
/// policy's retries are used up, then maps the last failure to its message.
pub(crate) async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    fallbacks: &FallbackMessages,
    mut attempt: F,
) -> String
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            AttemptOutcome::Completed(text) => return text,
            AttemptOutcome::Failed(kind) if kind.is_retryable() && retries < policy.max_retries => {
                let delay = policy.delay_for_attempt(retries);
                warn!(?kind, retry = retries + 1, ?delay, "Backend not ready, retrying");
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            AttemptOutcome::Failed(kind) => {
                debug!(?kind, "Using fallback reply");
                return fallbacks.message(kind).to_string();
            }
        }
    }
}
